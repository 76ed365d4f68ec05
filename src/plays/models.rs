//! Play and observation models.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a chartable song.
///
/// The song name is compared case-insensitively, the artist is compared
/// exactly as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    pub name: String,
    pub artist: String,
}

impl EntityKey {
    pub fn new(name: &str, artist: &str) -> Self {
        Self {
            name: name.to_lowercase(),
            artist: artist.to_string(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.name, self.artist)
    }
}

/// A song as it should be displayed, with the casing first observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub artist: String,
    pub album: String,
}

impl Entity {
    pub fn new(name: &str, artist: &str, album: &str) -> Self {
        Self {
            name: name.to_string(),
            artist: artist.to_string(),
            album: album.to_string(),
        }
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::new(&self.name, &self.artist)
    }
}

/// A single play with an already adjusted timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayEvent {
    pub entity: Entity,
    pub played_at: NaiveDateTime,
}

/// The three chart signals of an entity for one week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalCounts {
    /// Every play counts as one stream.
    pub streams: u64,
    /// Plays that start a new run of the same song.
    pub sales: u64,
    /// Longest run of consecutive plays within the week.
    pub airplay: u64,
}

impl SignalCounts {
    pub fn new(streams: u64, sales: u64, airplay: u64) -> Self {
        Self {
            streams,
            sales,
            airplay,
        }
    }

    /// Folds a second observation of the same entity in the same week.
    pub fn merge(&mut self, other: &SignalCounts) {
        self.streams += other.streams;
        self.sales += other.sales;
        self.airplay = self.airplay.max(other.airplay);
    }
}

/// Aggregated signals of one entity in one week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyObservation {
    pub entity: Entity,
    pub week: NaiveDate,
    pub signals: SignalCounts,
}

impl WeeklyObservation {
    pub fn new(entity: Entity, week: NaiveDate, signals: SignalCounts) -> Self {
        Self {
            entity,
            week,
            signals,
        }
    }
}
