//! Per-song chart lifecycle: peaks, streaks, weeks on chart and movement.

use super::models::{ChartEntry, ChartStatus, EntityChartHistory};
use super::ranker::RankedEntity;
use super::state::ChartState;
use crate::plays::EntityKey;
use crate::points::percent_change;
use chrono::NaiveDate;

/// Result of moving an entity's history forward by one chart week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakUpdate {
    pub history: EntityChartHistory,
    pub is_new_peak: bool,
    pub is_repeak: bool,
}

/// A published entry with the history it leaves behind.
#[derive(Debug, Clone)]
pub struct TrackedEntry {
    pub entry: ChartEntry,
    pub history: EntityChartHistory,
}

pub struct LifecycleTracker {
    chart_limit: u32,
}

impl LifecycleTracker {
    pub fn new(chart_limit: u32) -> Self {
        Self { chart_limit }
    }

    /// Moves `history` forward for a chart appearance at `position`.
    pub fn advance(
        &self,
        history: Option<&EntityChartHistory>,
        position: u32,
        first_charted_week: NaiveDate,
    ) -> PeakUpdate {
        let mut history = history
            .copied()
            .unwrap_or_else(|| EntityChartHistory::new(self.chart_limit, first_charted_week));

        let mut is_new_peak = false;
        let mut is_repeak = false;
        if position < history.peak_position {
            is_new_peak = true;
            history.peak_position = position;
            history.peak_streak = 1;
        } else if position == history.peak_position {
            is_repeak = true;
            history.peak_streak += 1;
        }
        history.weeks_on_chart += 1;

        PeakUpdate {
            history,
            is_new_peak,
            is_repeak,
        }
    }

    /// Movement of an entry, judged against the registry as it was before
    /// this week.
    pub fn classify(
        &self,
        week: NaiveDate,
        position: u32,
        previous_position: Option<u32>,
        first_charted: Option<NaiveDate>,
    ) -> ChartStatus {
        match (first_charted, previous_position) {
            (None, _) => ChartStatus::New,
            (Some(first), _) if first == week => ChartStatus::New,
            (Some(_), None) => ChartStatus::ReEntry,
            (Some(_), Some(previous)) if previous > position => ChartStatus::Up(previous - position),
            (Some(_), Some(previous)) if previous < position => {
                ChartStatus::Down(position - previous)
            }
            (Some(_), Some(_)) => ChartStatus::Unchanged,
        }
    }

    /// Builds this week's entries in position order.
    ///
    /// Reads `state` only; nothing is changed until the week is applied.
    pub fn track(
        &self,
        week: NaiveDate,
        ranked: &[RankedEntity],
        state: &ChartState,
    ) -> Vec<TrackedEntry> {
        let previous_positions = state.snapshot_before(week, 1).map(|s| &s.positions);

        ranked
            .iter()
            .map(|item| {
                let key: &EntityKey = &item.scored.key;
                let first_charted = state.registry().first_charted(key);
                let previous_position = previous_positions.and_then(|p| p.get(key).copied());

                let status = self.classify(week, item.position, previous_position, first_charted);
                let first_week = first_charted.map_or(week, |first| first.min(week));
                let update = self.advance(state.history(key), item.position, first_week);

                let scored = &item.scored;
                let entry = ChartEntry {
                    week,
                    position: item.position,
                    previous_position,
                    status,
                    entity: scored.entity.clone(),
                    signals: scored.signals,
                    raw_points: scored.raw_points,
                    weighted_points: scored.weighted_points,
                    retention: scored.retention,
                    component_points: scored.component_points,
                    component_percentages: scored.component_percentages,
                    percent_change: scored
                        .previous_weighted_points
                        .and_then(|previous| percent_change(scored.weighted_points, previous)),
                    is_new_peak: update.is_new_peak,
                    is_repeak: update.is_repeak,
                    peak_position: update.history.peak_position,
                    weeks_on_chart: update.history.weeks_on_chart,
                    peak_streak: update.history.peak_streak,
                };
                TrackedEntry {
                    entry,
                    history: update.history,
                }
            })
            .collect()
    }
}
