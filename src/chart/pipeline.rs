//! Weekly chart computation.
//!
//! A week goes through four steps:
//! 1. observations are merged per song and scored (in parallel),
//! 2. the scored songs are ranked against the registry,
//! 3. the lifecycle of every charted song is moved forward,
//! 4. the resulting [`WeekOutcome`] is applied to the [`ChartState`].
//!
//! Steps 1 to 3 only read the state, so a week that fails leaves it as it was.

use super::error::ChartError;
use super::lifecycle::LifecycleTracker;
use super::models::{EntityChartHistory, WeeklyChart};
use super::ranker::{ChartRanker, RankingLimits, ScoredEntity};
use super::state::{ChartState, ScoreSnapshot, WeekSnapshot};
use crate::plays::{Entity, EntityKey, SignalCounts, WeeklyObservation};
use crate::points::PointsCalculator;
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info};

/// Everything a processed week changes, computed before anything is changed.
#[derive(Debug, Clone)]
pub struct WeekOutcome {
    pub chart: WeeklyChart,
    pub snapshot: WeekSnapshot,
    /// Updated histories of the charted songs.
    pub histories: Vec<(EntityKey, EntityChartHistory)>,
    /// Debuts admitted to the registry this week, charted or cut by the
    /// chart limit.
    pub debuts: Vec<EntityKey>,
    /// Songs that scored this week.
    pub scored: usize,
}

pub struct ChartPipeline {
    calculator: PointsCalculator,
    ranker: ChartRanker,
    tracker: LifecycleTracker,
}

impl ChartPipeline {
    pub fn new(calculator: PointsCalculator, limits: RankingLimits) -> Result<Self, ChartError> {
        limits.validate()?;
        if calculator.weights().normalizer == 0 {
            return Err(ChartError::InvalidSettings(
                "normalizer must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            calculator,
            ranker: ChartRanker::new(limits),
            tracker: LifecycleTracker::new(limits.chart_limit as u32),
        })
    }

    pub fn calculator(&self) -> &PointsCalculator {
        &self.calculator
    }

    pub fn limits(&self) -> &RankingLimits {
        self.ranker.limits()
    }

    /// Computes the chart of `week` without touching `state`.
    pub fn compute_week(
        &self,
        state: &ChartState,
        week: NaiveDate,
        observations: &[WeeklyObservation],
    ) -> Result<WeekOutcome, ChartError> {
        if let Some(last) = state.last_week() {
            if week <= last {
                return Err(ChartError::WeekOutOfOrder { week, last });
            }
        }

        let merged = merge_observations(week, observations)?;
        let candidates = self.score(state, week, merged);
        let scored = candidates.len();

        let scores: HashMap<EntityKey, ScoreSnapshot> = candidates
            .iter()
            .map(|c| {
                (
                    c.key.clone(),
                    ScoreSnapshot {
                        raw_points: c.raw_points,
                        weighted_points: c.weighted_points,
                    },
                )
            })
            .collect();

        let ranking = self
            .ranker
            .rank(candidates, state.registry(), state.is_first_week());
        let debuts = ranking.admitted_debuts;

        let tracked = self.tracker.track(week, &ranking.entries, state);
        let mut entries = Vec::with_capacity(tracked.len());
        let mut histories = Vec::with_capacity(tracked.len());
        for t in tracked {
            histories.push((t.entry.key(), t.history));
            entries.push(t.entry);
        }

        let chart = WeeklyChart::new(week, entries);
        let snapshot = WeekSnapshot {
            week,
            scores,
            positions: chart.positions(),
        };

        Ok(WeekOutcome {
            chart,
            snapshot,
            histories,
            debuts,
            scored,
        })
    }

    /// Computes `week` and applies it to `state`.
    pub fn process_week(
        &self,
        state: &mut ChartState,
        week: NaiveDate,
        observations: &[WeeklyObservation],
    ) -> Result<WeeklyChart, ChartError> {
        let outcome = self.compute_week(state, week, observations)?;
        let chart = outcome.chart.clone();
        info!(
            "Charted week {}: {} entries from {} songs, {} debuts",
            week,
            chart.len(),
            outcome.scored,
            chart.debuts().count()
        );
        state.apply(outcome);
        Ok(chart)
    }

    fn score(
        &self,
        state: &ChartState,
        week: NaiveDate,
        merged: Vec<(Entity, SignalCounts)>,
    ) -> Vec<ScoredEntity> {
        let previous = state.snapshot_before(week, 1);
        let two_weeks_ago = state.snapshot_before(week, 2);
        let calculator = &self.calculator;

        merged
            .into_par_iter()
            .map(|(entity, signals)| {
                let key = entity.key();
                let raw_points = calculator.raw_points(&signals);
                let retention = calculator.retention_terms(
                    raw_points,
                    previous.map_or(0, |s| s.raw_points(&key)),
                    two_weeks_ago.map_or(0, |s| s.raw_points(&key)),
                );
                let previous_weighted_points =
                    previous.and_then(|s| s.scores.get(&key).map(|p| p.weighted_points));
                ScoredEntity {
                    component_points: calculator.component_points(&signals),
                    component_percentages: calculator.component_percentages(&signals),
                    weighted_points: retention.total(),
                    key,
                    entity,
                    signals,
                    raw_points,
                    retention,
                    previous_weighted_points,
                }
            })
            .collect()
    }
}

/// Collapses repeated observations of a song within the week.
fn merge_observations(
    week: NaiveDate,
    observations: &[WeeklyObservation],
) -> Result<Vec<(Entity, SignalCounts)>, ChartError> {
    let mut merged: HashMap<EntityKey, (Entity, SignalCounts)> = HashMap::new();
    for observation in observations {
        if observation.week != week {
            return Err(ChartError::ObservationWeekMismatch {
                entity: observation.entity.key().to_string(),
                expected: week,
                found: observation.week,
            });
        }
        merged
            .entry(observation.entity.key())
            .and_modify(|(entity, signals)| {
                debug!("Merging repeated observation of {}", observation.entity.key());
                if !observation.entity.album.is_empty() {
                    entity.album = observation.entity.album.clone();
                }
                signals.merge(&observation.signals);
            })
            .or_insert_with(|| (observation.entity.clone(), observation.signals));
    }
    Ok(merged.into_values().collect())
}
