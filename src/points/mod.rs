mod calculator;

pub use calculator::{
    percent_change, percentages, round2, ComponentPercentages, ComponentPoints, PointsCalculator,
    RetentionTerms, RetentionWeight, RetentionWeights, SignalWeights, MAX_RETENTION_WEIGHT,
};
