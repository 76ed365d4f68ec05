//! Chart points from weekly signals.
//!
//! Raw points combine the three signals of a week:
//!
//! ```text
//! raw = ceil((w_stream * streams + w_sale * sales + w_air * airplay) / normalizer)
//! ```
//!
//! Weighted points add what the song retained from the two previous weeks.
//! Every retention term is rounded up on its own before summing, rounding
//! once at the end gives different charts.

use crate::plays::SignalCounts;
use serde::{Deserialize, Serialize};

/// Precision of retention weights: ten-thousandths.
const RETENTION_SCALE: u64 = 10_000;

/// Largest accepted retention multiplier.
pub const MAX_RETENTION_WEIGHT: f64 = 100.0;

/// Per-signal point weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalWeights {
    pub streams: u64,
    pub sales: u64,
    pub airplay: u64,
    pub normalizer: u64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            streams: 5000,
            sales: 3000,
            airplay: 2000,
            normalizer: 1000,
        }
    }
}

/// A retention (decay) multiplier held in ten-thousandths, so that 0.3 is
/// exactly 3000/10000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RetentionWeight(u64);

impl RetentionWeight {
    /// Returns None for negative, non finite or values above
    /// [`MAX_RETENTION_WEIGHT`].
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || !(0.0..=MAX_RETENTION_WEIGHT).contains(&value) {
            return None;
        }
        Some(Self((value * RETENTION_SCALE as f64).round() as u64))
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / RETENTION_SCALE as f64
    }

    /// `ceil(self * points)`, saturating at `u64::MAX`.
    pub fn apply(&self, points: u64) -> u64 {
        ceil_div(self.0 as u128 * points as u128, RETENTION_SCALE)
    }
}

/// Retention weights of the current and the two previous weeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionWeights {
    pub current: RetentionWeight,
    pub previous: RetentionWeight,
    pub two_weeks_ago: RetentionWeight,
}

impl Default for RetentionWeights {
    fn default() -> Self {
        Self {
            current: RetentionWeight(10_000),
            previous: RetentionWeight(3_000),
            two_weeks_ago: RetentionWeight(2_000),
        }
    }
}

/// Points of each signal on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentPoints {
    pub streams: u64,
    pub sales: u64,
    pub airplay: u64,
}

/// Share of each signal in the week's points, rounded to 2 decimals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentPercentages {
    pub streams: f64,
    pub sales: f64,
    pub airplay: f64,
}

/// The three rounded terms that sum to the weighted points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionTerms {
    pub current: u64,
    pub previous: u64,
    pub two_weeks_ago: u64,
}

impl RetentionTerms {
    pub fn total(&self) -> u64 {
        self.current
            .saturating_add(self.previous)
            .saturating_add(self.two_weeks_ago)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PointsCalculator {
    weights: SignalWeights,
    retention: RetentionWeights,
}

impl PointsCalculator {
    pub fn new(weights: SignalWeights, retention: RetentionWeights) -> Self {
        Self { weights, retention }
    }

    pub fn weights(&self) -> &SignalWeights {
        &self.weights
    }

    pub fn raw_points(&self, signals: &SignalCounts) -> u64 {
        let [streams, sales, airplay] = self.weighted_signals(signals);
        ceil_div(
            streams.saturating_add(sales).saturating_add(airplay),
            self.weights.normalizer,
        )
    }

    /// `w * count` per signal, wide enough to never overflow.
    fn weighted_signals(&self, signals: &SignalCounts) -> [u128; 3] {
        [
            self.weights.streams as u128 * signals.streams as u128,
            self.weights.sales as u128 * signals.sales as u128,
            self.weights.airplay as u128 * signals.airplay as u128,
        ]
    }

    /// Decayed points given the raw points of this week and the two before.
    /// Weeks without data are passed as 0.
    pub fn retention_terms(&self, current: u64, previous: u64, two_weeks_ago: u64) -> RetentionTerms {
        RetentionTerms {
            current: self.retention.current.apply(current),
            previous: self.retention.previous.apply(previous),
            two_weeks_ago: self.retention.two_weeks_ago.apply(two_weeks_ago),
        }
    }

    pub fn weighted_points(&self, current: u64, previous: u64, two_weeks_ago: u64) -> u64 {
        self.retention_terms(current, previous, two_weeks_ago).total()
    }

    pub fn component_points(&self, signals: &SignalCounts) -> ComponentPoints {
        let [streams, sales, airplay] = self.weighted_signals(signals);
        ComponentPoints {
            streams: ceil_div(streams, self.weights.normalizer),
            sales: ceil_div(sales, self.weights.normalizer),
            airplay: ceil_div(airplay, self.weights.normalizer),
        }
    }

    /// All zeros when the song has no weighted signal at all.
    pub fn component_percentages(&self, signals: &SignalCounts) -> ComponentPercentages {
        let [streams, sales, airplay] = self.weighted_signals(signals);
        percentages(streams, sales, airplay)
    }
}

/// Shares of three weighted signal values.
pub fn percentages(streams: u128, sales: u128, airplay: u128) -> ComponentPercentages {
    if streams == 0 && sales == 0 && airplay == 0 {
        return ComponentPercentages::default();
    }
    let total = streams as f64 + sales as f64 + airplay as f64;
    let share = |value: u128| round2(value as f64 / total);
    ComponentPercentages {
        streams: share(streams),
        sales: share(sales),
        airplay: share(airplay),
    }
}

/// Relative change from `previous` to `current`, rounded to 2 decimals.
pub fn percent_change(current: u64, previous: u64) -> Option<f64> {
    if previous == 0 {
        return None;
    }
    Some(round2((current as f64 - previous as f64) / previous as f64))
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn ceil_div(numerator: u128, denominator: u64) -> u64 {
    u64::try_from(numerator.div_ceil(denominator as u128)).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_points_default_weights() {
        let calculator = PointsCalculator::default();
        // 5*10 + 3*4 + 2*3 = 68
        assert_eq!(calculator.raw_points(&SignalCounts::new(10, 4, 3)), 68);
        assert_eq!(calculator.raw_points(&SignalCounts::default()), 0);
    }

    #[test]
    fn test_raw_points_round_up() {
        let calculator = PointsCalculator::new(
            SignalWeights {
                streams: 1,
                sales: 1,
                airplay: 1,
                normalizer: 1000,
            },
            RetentionWeights::default(),
        );
        assert_eq!(calculator.raw_points(&SignalCounts::new(1, 0, 0)), 1);
        assert_eq!(calculator.raw_points(&SignalCounts::new(1000, 0, 0)), 1);
        assert_eq!(calculator.raw_points(&SignalCounts::new(1001, 0, 0)), 2);
    }

    #[test]
    fn test_decay_over_three_weeks() {
        let calculator = PointsCalculator::default();
        assert_eq!(calculator.weighted_points(100, 0, 0), 100);
        assert_eq!(calculator.weighted_points(80, 100, 0), 110);
        assert_eq!(calculator.weighted_points(50, 80, 100), 94);
    }

    #[test]
    fn test_each_retention_term_rounds_up_separately() {
        let calculator = PointsCalculator::default();
        // 0.3 * 7 = 2.1 -> 3, 0.2 * 7 = 1.4 -> 2; a single final ceil would give 14
        let terms = calculator.retention_terms(10, 7, 7);
        assert_eq!(
            terms,
            RetentionTerms {
                current: 10,
                previous: 3,
                two_weeks_ago: 2
            }
        );
        assert_eq!(terms.total(), 15);
    }

    #[test]
    fn test_retention_weight_is_exact() {
        let weight = RetentionWeight::from_f64(0.3).unwrap();
        assert_eq!(weight.apply(100), 30);
        assert_eq!(weight.apply(80), 24);
        assert!(RetentionWeight::from_f64(-0.1).is_none());
        assert!(RetentionWeight::from_f64(f64::NAN).is_none());
    }

    #[test]
    fn test_retention_weight_is_bounded() {
        assert!(RetentionWeight::from_f64(MAX_RETENTION_WEIGHT).is_some());
        assert!(RetentionWeight::from_f64(1e16).is_none());
    }

    #[test]
    fn test_huge_counts_saturate_instead_of_overflowing() {
        let calculator = PointsCalculator::new(
            SignalWeights {
                streams: u64::MAX,
                sales: u64::MAX,
                airplay: u64::MAX,
                normalizer: 1,
            },
            RetentionWeights {
                current: RetentionWeight::from_f64(MAX_RETENTION_WEIGHT).unwrap(),
                previous: RetentionWeight::from_f64(MAX_RETENTION_WEIGHT).unwrap(),
                two_weeks_ago: RetentionWeight::from_f64(MAX_RETENTION_WEIGHT).unwrap(),
            },
        );
        let signals = SignalCounts::new(u64::MAX, u64::MAX, u64::MAX);

        assert_eq!(calculator.raw_points(&signals), u64::MAX);
        assert_eq!(calculator.component_points(&signals).sales, u64::MAX);
        assert_eq!(
            calculator.weighted_points(u64::MAX, u64::MAX, u64::MAX),
            u64::MAX
        );
        let shares = calculator.component_percentages(&signals);
        assert_eq!(shares.streams, 0.33);
    }

    #[test]
    fn test_component_points() {
        let calculator = PointsCalculator::default();
        assert_eq!(
            calculator.component_points(&SignalCounts::new(10, 4, 3)),
            ComponentPoints {
                streams: 50,
                sales: 12,
                airplay: 6
            }
        );
    }

    #[test]
    fn test_percentages() {
        let shares = percentages(40, 30, 30);
        assert_eq!(shares.streams, 0.4);
        assert_eq!(shares.sales, 0.3);
        assert_eq!(shares.airplay, 0.3);
    }

    #[test]
    fn test_percentages_of_nothing_are_zero() {
        let calculator = PointsCalculator::default();
        assert_eq!(
            calculator.component_percentages(&SignalCounts::default()),
            ComponentPercentages::default()
        );
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(110, 100), Some(0.1));
        assert_eq!(percent_change(50, 100), Some(-0.5));
        assert_eq!(percent_change(50, 0), None);
    }
}
