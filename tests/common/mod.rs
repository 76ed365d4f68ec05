//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{play_line, TestCharts, SONG_A, ARTIST_1};
//!
//! #[test]
//! fn test_single_play() {
//!     let charts = TestCharts::new();
//!     let log = charts.write_play_log(&[play_line(SONG_A, ARTIST_1, "03 Jan 2025 12:00")]);
//!     let report = charts.run(&log).unwrap();
//!     assert_eq!(report.weeks.len(), 1);
//! }
//! ```

mod constants;
mod fixtures;

pub use constants::*;
pub use fixtures::{play_line, repeated_plays, unix_play_line, TestCharts};
