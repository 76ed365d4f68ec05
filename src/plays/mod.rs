//! Play ingestion: from a play log to weekly signal counts.

mod aggregator;
mod models;
mod play_log;
mod week;

pub use aggregator::{AggregatedPlays, WeeklyAggregator};
pub use models::*;
pub use play_log::{PlayLogReader, ReadSummary, SCROBBLE_TIMESTAMP_FORMAT};
pub use week::{parse_weekday, weeks_between, WeekCutover};
