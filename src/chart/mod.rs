//! Weekly chart computation and the state carried between weeks.

mod error;
mod lifecycle;
mod models;
mod pipeline;
mod ranker;
mod state;
mod summary;

pub use error::ChartError;
pub use lifecycle::{LifecycleTracker, PeakUpdate, TrackedEntry};
pub use models::{ChartEntry, ChartStatus, EntityChartHistory, WeeklyChart};
pub use pipeline::{ChartPipeline, WeekOutcome};
pub use ranker::{
    compare_scored, ChartRanker, RankedEntity, Ranking, RankingLimits, ScoredEntity,
};
pub use state::{ChartState, ChartedRegistry, ScoreSnapshot, WeekSnapshot};
pub use summary::{
    all_time_chart, number_ones, year_end_chart, AllTimeEntry, YearEndEntry, ALL_TIME_LIMIT,
};
