//! Pezzottify Charts Library
//!
//! Weekly song charts computed from a play history: ingestion, points,
//! ranking, chart lifecycle and persistence.

pub mod chart;
pub mod chart_store;
pub mod cli_style;
pub mod config;
pub mod plays;
pub mod points;
pub mod runner;

// Re-export commonly used types for convenience
pub use chart::{ChartError, ChartPipeline, ChartState, WeeklyChart};
pub use chart_store::{ChartStore, SqliteChartStore};
pub use config::AppConfig;
