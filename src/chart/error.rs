use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while computing a weekly chart.
///
/// A failed week leaves the chart state untouched.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Week {week} is not after the last processed week {last}")]
    WeekOutOfOrder { week: NaiveDate, last: NaiveDate },

    #[error("Observation for {entity} belongs to week {found}, expected {expected}")]
    ObservationWeekMismatch {
        entity: String,
        expected: NaiveDate,
        found: NaiveDate,
    },

    #[error("Invalid chart settings: {0}")]
    InvalidSettings(String),
}
