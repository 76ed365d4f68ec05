//! Persistence of chart state and published charts.

mod schema;
mod store;

pub use schema::WEEK_FORMAT;
pub use store::{corrupt_path, format_week, parse_week, SqliteChartStore};

use crate::chart::{ChartState, WeekOutcome, WeeklyChart};
use anyhow::Result;
use chrono::NaiveDate;
use tracing::warn;

pub trait ChartStore: Send + Sync {
    /// Registry, histories and recent snapshots as of the last stored week.
    fn load_state(&self) -> Result<ChartState>;

    /// Stores a computed week and the state changes it carries, atomically.
    fn commit_week(&self, outcome: &WeekOutcome) -> Result<()>;

    /// The chart of `week`, None if the week was never processed.
    fn load_chart(&self, week: NaiveDate) -> Result<Option<WeeklyChart>>;
    fn list_weeks(&self) -> Result<Vec<NaiveDate>>;
    /// Charts of the processed weeks in `from..=to`, in week order.
    fn load_charts_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<WeeklyChart>>;
    fn load_all_charts(&self) -> Result<Vec<WeeklyChart>>;
}

/// Loads the stored state, starting over from an empty one if it can't be read.
pub fn load_state_or_default(store: &dyn ChartStore) -> ChartState {
    match store.load_state() {
        Ok(state) => state,
        Err(e) => {
            warn!("Failed to load chart state, starting from scratch: {:#}", e);
            ChartState::default()
        }
    }
}
