//! Ordering of scored songs into the published chart.

use super::error::ChartError;
use super::state::ChartedRegistry;
use crate::plays::{Entity, EntityKey, SignalCounts};
use crate::points::{ComponentPercentages, ComponentPoints, RetentionTerms};
use std::cmp::Ordering;
use tracing::debug;

/// A song with its computed points for the week being charted.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEntity {
    pub key: EntityKey,
    pub entity: Entity,
    pub signals: SignalCounts,
    pub raw_points: u64,
    pub retention: RetentionTerms,
    pub weighted_points: u64,
    pub component_points: ComponentPoints,
    pub component_percentages: ComponentPercentages,
    /// Weighted points of the previous calendar week, if it was scored.
    pub previous_weighted_points: Option<u64>,
}

/// A song that made this week's chart.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntity {
    pub position: u32,
    pub scored: ScoredEntity,
    /// True if the song was never charted before this week.
    pub is_debut: bool,
}

/// Result of ranking one week.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    /// The published chart, in position order.
    pub entries: Vec<RankedEntity>,
    /// Debuts that passed the cap, including those cut by `chart_limit`.
    pub admitted_debuts: Vec<EntityKey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingLimits {
    pub chart_limit: usize,
    /// Debuts admitted in any week but the first.
    pub max_debuts: usize,
    /// Debuts admitted in the very first chart week.
    pub first_week_debut_limit: usize,
}

impl RankingLimits {
    pub fn validate(&self) -> Result<(), ChartError> {
        if self.chart_limit == 0 {
            return Err(ChartError::InvalidSettings(
                "chart_limit must be greater than 0".to_string(),
            ));
        }
        if self.chart_limit > u32::MAX as usize - 1 {
            return Err(ChartError::InvalidSettings(format!(
                "chart_limit {} is too large",
                self.chart_limit
            )));
        }
        Ok(())
    }
}

impl Default for RankingLimits {
    fn default() -> Self {
        Self {
            chart_limit: 100,
            max_debuts: 25,
            first_week_debut_limit: 100,
        }
    }
}

/// Higher weighted points first, then name and artist ascending.
pub fn compare_scored(a: &ScoredEntity, b: &ScoredEntity) -> Ordering {
    b.weighted_points
        .cmp(&a.weighted_points)
        .then_with(|| a.key.name.cmp(&b.key.name))
        .then_with(|| a.key.artist.cmp(&b.key.artist))
}

pub struct ChartRanker {
    limits: RankingLimits,
}

impl ChartRanker {
    pub fn new(limits: RankingLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &RankingLimits {
        &self.limits
    }

    /// Ranks this week's candidates.
    ///
    /// Songs unknown to `registry` are debuts and only the best
    /// `max_debuts` of them (`first_week_debut_limit` in the first week) may
    /// enter; returning songs are never capped. The merged list is cut at
    /// `chart_limit`.
    pub fn rank(
        &self,
        mut candidates: Vec<ScoredEntity>,
        registry: &ChartedRegistry,
        first_week: bool,
    ) -> Ranking {
        candidates.sort_by(compare_scored);

        let debut_cap = if first_week {
            self.limits.first_week_debut_limit
        } else {
            self.limits.max_debuts
        };

        let (debuts, returning): (Vec<ScoredEntity>, Vec<ScoredEntity>) = candidates
            .into_iter()
            .partition(|c| !registry.contains(&c.key));

        let debut_count = debuts.len();
        let admitted: Vec<ScoredEntity> = debuts.into_iter().take(debut_cap).collect();
        let admitted_debuts: Vec<EntityKey> = admitted.iter().map(|c| c.key.clone()).collect();
        let mut merged: Vec<(ScoredEntity, bool)> = admitted
            .into_iter()
            .map(|c| (c, true))
            .chain(returning.into_iter().map(|c| (c, false)))
            .collect();
        if debut_count > debut_cap {
            debug!(
                "{} debuts held back by the cap of {}",
                debut_count - debut_cap,
                debut_cap
            );
        }

        merged.sort_by(|(a, _), (b, _)| compare_scored(a, b));
        merged.truncate(self.limits.chart_limit);

        let entries = merged
            .into_iter()
            .enumerate()
            .map(|(index, (scored, is_debut))| RankedEntity {
                position: index as u32 + 1,
                scored,
                is_debut,
            })
            .collect();

        Ranking {
            entries,
            admitted_debuts,
        }
    }
}
