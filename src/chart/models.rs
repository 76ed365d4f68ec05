//! Chart models.

use crate::plays::{Entity, EntityKey, SignalCounts};
use crate::points::{ComponentPercentages, ComponentPoints, RetentionTerms};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Movement of an entry compared to the previous week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartStatus {
    /// First ever chart week.
    New,
    /// Back on the chart after at least one week off.
    ReEntry,
    /// Climbed by the given number of positions.
    Up(u32),
    /// Dropped by the given number of positions.
    Down(u32),
    Unchanged,
}

impl ChartStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NEW" => Some(ChartStatus::New),
            "RE" => Some(ChartStatus::ReEntry),
            "=" => Some(ChartStatus::Unchanged),
            _ => {
                if let Some(n) = s.strip_prefix('+') {
                    n.parse().ok().map(ChartStatus::Up)
                } else if let Some(n) = s.strip_prefix('-') {
                    n.parse().ok().map(ChartStatus::Down)
                } else {
                    None
                }
            }
        }
    }
}

impl fmt::Display for ChartStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartStatus::New => write!(f, "NEW"),
            ChartStatus::ReEntry => write!(f, "RE"),
            ChartStatus::Up(n) => write!(f, "+{}", n),
            ChartStatus::Down(n) => write!(f, "-{}", n),
            ChartStatus::Unchanged => write!(f, "="),
        }
    }
}

/// Lifetime chart record of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityChartHistory {
    /// Best position ever reached, `chart_limit + 1` before the first chart week.
    pub peak_position: u32,
    pub weeks_on_chart: u32,
    /// Weeks spent at the current peak position.
    pub peak_streak: u32,
    pub first_charted_week: NaiveDate,
}

impl EntityChartHistory {
    pub fn new(chart_limit: u32, first_charted_week: NaiveDate) -> Self {
        Self {
            peak_position: chart_limit + 1,
            weeks_on_chart: 0,
            peak_streak: 0,
            first_charted_week,
        }
    }
}

/// One published line of a weekly chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartEntry {
    pub week: NaiveDate,
    pub position: u32,
    pub previous_position: Option<u32>,
    pub status: ChartStatus,
    pub entity: Entity,
    pub signals: SignalCounts,
    pub raw_points: u64,
    pub weighted_points: u64,
    pub retention: RetentionTerms,
    pub component_points: ComponentPoints,
    pub component_percentages: ComponentPercentages,
    /// Change against last week's weighted points, None without last week points.
    pub percent_change: Option<f64>,
    pub is_new_peak: bool,
    pub is_repeak: bool,
    pub peak_position: u32,
    pub weeks_on_chart: u32,
    pub peak_streak: u32,
}

impl ChartEntry {
    pub fn key(&self) -> EntityKey {
        self.entity.key()
    }
}

/// The published chart of one week, entries in position order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyChart {
    pub week: NaiveDate,
    pub entries: Vec<ChartEntry>,
}

impl WeeklyChart {
    pub fn new(week: NaiveDate, entries: Vec<ChartEntry>) -> Self {
        Self { week, entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn number_one(&self) -> Option<&ChartEntry> {
        self.entries.first()
    }

    pub fn positions(&self) -> HashMap<EntityKey, u32> {
        self.entries
            .iter()
            .map(|e| (e.key(), e.position))
            .collect()
    }

    pub fn debuts(&self) -> impl Iterator<Item = &ChartEntry> {
        self.entries
            .iter()
            .filter(|e| e.status == ChartStatus::New)
    }
}
