//! Play log and database fixtures.

use super::constants::ALBUM_1;
use anyhow::Result;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use pezzottify_charts::chart_store::{load_state_or_default, SqliteChartStore};
use pezzottify_charts::config::{AppConfig, CliConfig};
use pezzottify_charts::runner::{chart_pending_weeks, RunReport};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A charts database in a temporary directory, with plays in UTC.
pub struct TestCharts {
    dir: TempDir,
    pub config: AppConfig,
    logs_written: std::cell::Cell<usize>,
}

impl TestCharts {
    pub fn new() -> Self {
        Self::with_chart_limit(None)
    }

    pub fn with_chart_limit(chart_limit: Option<usize>) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cli = CliConfig {
            db_path: Some(dir.path().join("charts.db")),
            utc_offset_hours: Some(0),
            chart_limit,
        };
        let config = AppConfig::resolve(&cli, None).expect("Failed to resolve config");
        Self {
            dir,
            config,
            logs_written: std::cell::Cell::new(0),
        }
    }

    /// Writes a play log and returns its path.
    pub fn write_play_log(&self, lines: &[String]) -> PathBuf {
        let index = self.logs_written.get();
        self.logs_written.set(index + 1);
        let path = self.dir.path().join(format!("plays_{}.jsonl", index));
        std::fs::write(&path, lines.join("\n")).expect("Failed to write play log");
        path
    }

    /// Opens the database, as every command of the binary does.
    pub fn store(&self) -> SqliteChartStore {
        SqliteChartStore::new(&self.config.db_path).expect("Failed to open chart store")
    }

    /// Reads a play log and charts its new weeks, like `pezzottify-charts run`.
    pub fn run(&self, plays: &Path) -> Result<RunReport> {
        let store = self.store();
        let pipeline = self.config.pipeline()?;
        let mut state = load_state_or_default(&store);

        let mut aggregator = self.config.aggregator();
        self.config
            .play_log_reader()
            .read_file(plays, &mut aggregator)?;
        chart_pending_weeks(&pipeline, &store, &mut state, &aggregator.finish())
    }
}

pub fn play_line(title: &str, artist: &str, played_at: &str) -> String {
    serde_json::json!({
        "artist": artist,
        "title": title,
        "album": ALBUM_1,
        "played_at": played_at,
    })
    .to_string()
}

pub fn unix_play_line(title: &str, artist: &str, played_at: i64) -> String {
    serde_json::json!({
        "artist": artist,
        "title": title,
        "played_at": played_at,
    })
    .to_string()
}

/// `count` consecutive plays one minute apart, starting at noon of `day`.
pub fn repeated_plays(title: &str, artist: &str, day: &str, count: usize) -> Vec<String> {
    let start: NaiveDateTime = NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .expect("Invalid day")
        .and_hms_opt(12, 0, 0)
        .expect("Invalid time");
    (0..count)
        .map(|i| {
            let at = start + Duration::minutes(i as i64);
            play_line(title, artist, &at.format("%d %b %Y %H:%M").to_string())
        })
        .collect()
}
