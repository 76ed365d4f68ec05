//! Reading of JSON Lines play logs.
//!
//! Each line holds one play:
//!
//! ```json
//! {"artist": "Taylor Swift", "album": "1989", "title": "Style", "played_at": "03 Jan 2025 14:05"}
//! ```
//!
//! `played_at` is either a scrobble style text timestamp or Unix seconds.

use super::aggregator::WeeklyAggregator;
use super::models::{Entity, PlayEvent};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDateTime};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// Text timestamp format used by scrobble exports.
pub const SCROBBLE_TIMESTAMP_FORMAT: &str = "%d %b %Y %H:%M";

#[derive(Deserialize)]
#[serde(untagged)]
enum PlayedAt {
    Unix(i64),
    Text(String),
}

#[derive(Deserialize)]
struct PlayLine {
    artist: String,
    title: String,
    #[serde(default)]
    album: Option<String>,
    played_at: PlayedAt,
}

/// Summary of a play log read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadSummary {
    pub plays: usize,
    pub malformed: usize,
}

pub struct PlayLogReader {
    utc_offset: Duration,
}

impl PlayLogReader {
    pub fn new(utc_offset_hours: i64) -> Self {
        Self {
            utc_offset: Duration::hours(utc_offset_hours),
        }
    }

    /// Parses a timestamp and applies the configured offset.
    pub fn parse_timestamp(&self, raw: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(raw.trim(), SCROBBLE_TIMESTAMP_FORMAT)
            .ok()
            .map(|t| t + self.utc_offset)
    }

    fn parse_unix(&self, secs: i64) -> Option<NaiveDateTime> {
        DateTime::from_timestamp(secs, 0).map(|t| t.naive_utc() + self.utc_offset)
    }

    /// Parses one line, None if it is not a valid play.
    pub fn parse_line(&self, line: &str) -> Option<PlayEvent> {
        let parsed: PlayLine = serde_json::from_str(line).ok()?;
        if parsed.artist.trim().is_empty() || parsed.title.trim().is_empty() {
            return None;
        }
        let played_at = match parsed.played_at {
            PlayedAt::Unix(secs) => self.parse_unix(secs)?,
            PlayedAt::Text(text) => self.parse_timestamp(&text)?,
        };
        Some(PlayEvent {
            entity: Entity::new(
                parsed.title.trim(),
                parsed.artist.trim(),
                parsed.album.as_deref().unwrap_or("").trim(),
            ),
            played_at,
        })
    }

    /// Feeds every line of `reader` into the aggregator.
    ///
    /// Invalid lines are counted as malformed and skipped, only I/O errors
    /// abort the read.
    pub fn read_into<R: BufRead>(
        &self,
        reader: R,
        aggregator: &mut WeeklyAggregator,
    ) -> Result<ReadSummary> {
        let mut summary = ReadSummary::default();
        for (index, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", index + 1))?;
            if line.trim().is_empty() {
                continue;
            }
            match self.parse_line(&line) {
                Some(play) => {
                    aggregator.push(play);
                    summary.plays += 1;
                }
                None => {
                    debug!("Skipping malformed play at line {}", index + 1);
                    aggregator.record_malformed();
                    summary.malformed += 1;
                }
            }
        }
        Ok(summary)
    }

    pub fn read_file(&self, path: &Path, aggregator: &mut WeeklyAggregator) -> Result<ReadSummary> {
        let file =
            File::open(path).with_context(|| format!("Failed to open play log: {:?}", path))?;
        let summary = self.read_into(BufReader::new(file), aggregator)?;
        info!(
            "Read {} plays from {:?} ({} malformed)",
            summary.plays, path, summary.malformed
        );
        Ok(summary)
    }
}
