//! Chart state carried from one week to the next.

use super::models::EntityChartHistory;
use super::pipeline::WeekOutcome;
use crate::plays::EntityKey;
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

/// Every entity that ever made the chart, with its first chart week.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartedRegistry {
    first_weeks: HashMap<EntityKey, NaiveDate>,
}

impl ChartedRegistry {
    pub fn contains(&self, key: &EntityKey) -> bool {
        self.first_weeks.contains_key(key)
    }

    pub fn first_charted(&self, key: &EntityKey) -> Option<NaiveDate> {
        self.first_weeks.get(key).copied()
    }

    /// Records `week` unless an earlier week is already known.
    pub fn record(&mut self, key: EntityKey, week: NaiveDate) {
        self.first_weeks
            .entry(key)
            .and_modify(|w| {
                if week < *w {
                    *w = week;
                }
            })
            .or_insert(week);
    }

    pub fn len(&self) -> usize {
        self.first_weeks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first_weeks.is_empty()
    }
}

/// Points of one entity in a processed week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreSnapshot {
    pub raw_points: u64,
    pub weighted_points: u64,
}

/// Frozen results of a processed week, read by the following two weeks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekSnapshot {
    pub week: NaiveDate,
    /// Every entity scored that week, charted or not.
    pub scores: HashMap<EntityKey, ScoreSnapshot>,
    /// Published positions.
    pub positions: HashMap<EntityKey, u32>,
}

impl WeekSnapshot {
    pub fn raw_points(&self, key: &EntityKey) -> u64 {
        self.scores.get(key).map(|s| s.raw_points).unwrap_or(0)
    }
}

/// Everything the chart remembers across weeks.
///
/// Owned by the caller and only changed through [`ChartState::apply`], once a
/// week has been fully computed.
#[derive(Debug, Clone, Default)]
pub struct ChartState {
    registry: ChartedRegistry,
    histories: HashMap<EntityKey, EntityChartHistory>,
    snapshots: Vec<WeekSnapshot>,
    last_week: Option<NaiveDate>,
    weeks_processed: u32,
}

impl ChartState {
    pub fn from_parts(
        registry: ChartedRegistry,
        histories: HashMap<EntityKey, EntityChartHistory>,
        snapshots: Vec<WeekSnapshot>,
        last_week: Option<NaiveDate>,
        weeks_processed: u32,
    ) -> Self {
        Self {
            registry,
            histories,
            snapshots,
            last_week,
            weeks_processed,
        }
    }

    pub fn registry(&self) -> &ChartedRegistry {
        &self.registry
    }

    pub fn history(&self, key: &EntityKey) -> Option<&EntityChartHistory> {
        self.histories.get(key)
    }

    pub fn histories(&self) -> &HashMap<EntityKey, EntityChartHistory> {
        &self.histories
    }

    pub fn snapshots(&self) -> &[WeekSnapshot] {
        &self.snapshots
    }

    pub fn last_week(&self) -> Option<NaiveDate> {
        self.last_week
    }

    pub fn weeks_processed(&self) -> u32 {
        self.weeks_processed
    }

    /// True before anything ever charted.
    pub fn is_first_week(&self) -> bool {
        self.last_week.is_none() && self.registry.is_empty()
    }

    pub fn snapshot(&self, week: NaiveDate) -> Option<&WeekSnapshot> {
        self.snapshots.iter().find(|s| s.week == week)
    }

    /// Snapshot of the calendar week `weeks_back` weeks before `week`.
    pub fn snapshot_before(&self, week: NaiveDate, weeks_back: i64) -> Option<&WeekSnapshot> {
        self.snapshot(week - Duration::days(7 * weeks_back))
    }

    /// Commits a computed week.
    pub fn apply(&mut self, outcome: WeekOutcome) {
        let week = outcome.chart.week;
        for key in outcome.debuts {
            self.registry.record(key, week);
        }
        self.histories.extend(outcome.histories);

        // The next week reads this week and the one before it.
        let oldest_needed = week - Duration::days(7);
        self.snapshots.retain(|s| s.week >= oldest_needed);
        self.snapshots.push(outcome.snapshot);

        self.last_week = Some(week);
        self.weeks_processed += 1;
    }
}
