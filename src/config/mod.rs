mod file_config;

pub use file_config::{FileConfig, RankingConfig, RetentionConfig, WeekConfig, WeightsConfig};

use crate::chart::{ChartError, ChartPipeline, RankingLimits};
use crate::plays::{parse_weekday, PlayLogReader, WeekCutover, WeeklyAggregator};
use crate::points::{
    PointsCalculator, RetentionWeight, RetentionWeights, SignalWeights, MAX_RETENTION_WEIGHT,
};
use anyhow::{bail, Result};
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "charts.db";
pub const DEFAULT_UTC_OFFSET_HOURS: i64 = 8;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub utc_offset_hours: Option<i64>,
    pub chart_limit: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub utc_offset_hours: i64,
    pub weights: SignalWeights,
    pub retention: RetentionWeights,
    pub limits: RankingLimits,
    pub cutover: WeekCutover,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));
        if db_path.is_dir() {
            bail!("db_path is a directory: {:?}", db_path);
        }

        let utc_offset_hours = file
            .utc_offset_hours
            .or(cli.utc_offset_hours)
            .unwrap_or(DEFAULT_UTC_OFFSET_HOURS);
        if !(-14..=14).contains(&utc_offset_hours) {
            bail!(
                "utc_offset_hours must be between -14 and 14, got {}",
                utc_offset_hours
            );
        }

        let weights_file = file.weights.unwrap_or_default();
        let default_weights = SignalWeights::default();
        let weights = SignalWeights {
            streams: weights_file.streams.unwrap_or(default_weights.streams),
            sales: weights_file.sales.unwrap_or(default_weights.sales),
            airplay: weights_file.airplay.unwrap_or(default_weights.airplay),
            normalizer: weights_file
                .normalizer
                .unwrap_or(default_weights.normalizer),
        };
        if weights.normalizer == 0 {
            bail!("weights.normalizer must be greater than 0");
        }

        let retention_file = file.retention.unwrap_or_default();
        let default_retention = RetentionWeights::default();
        let retention = RetentionWeights {
            current: resolve_retention("current", retention_file.current, default_retention.current)?,
            previous: resolve_retention(
                "previous",
                retention_file.previous,
                default_retention.previous,
            )?,
            two_weeks_ago: resolve_retention(
                "two_weeks_ago",
                retention_file.two_weeks_ago,
                default_retention.two_weeks_ago,
            )?,
        };

        let ranking_file = file.ranking.unwrap_or_default();
        let default_limits = RankingLimits::default();
        let limits = RankingLimits {
            chart_limit: ranking_file
                .chart_limit
                .or(cli.chart_limit)
                .unwrap_or(default_limits.chart_limit),
            max_debuts: ranking_file.max_debuts.unwrap_or(default_limits.max_debuts),
            first_week_debut_limit: ranking_file
                .first_week_debut_limit
                .unwrap_or(default_limits.first_week_debut_limit),
        };
        limits.validate()?;

        let week_file = file.week.unwrap_or_default();
        let default_cutover = WeekCutover::default();
        let weekday = match week_file.cutover_weekday {
            Some(s) => match parse_weekday(&s) {
                Some(weekday) => weekday,
                None => bail!("Unknown week.cutover_weekday {:?}", s),
            },
            None => default_cutover.weekday(),
        };
        let hour = week_file.cutover_hour.unwrap_or(default_cutover.hour());
        let cutover = match WeekCutover::new(weekday, hour) {
            Some(cutover) => cutover,
            None => bail!("week.cutover_hour must be between 0 and 23, got {}", hour),
        };

        Ok(Self {
            db_path,
            utc_offset_hours,
            weights,
            retention,
            limits,
            cutover,
        })
    }

    pub fn calculator(&self) -> PointsCalculator {
        PointsCalculator::new(self.weights, self.retention)
    }

    pub fn pipeline(&self) -> Result<ChartPipeline, ChartError> {
        ChartPipeline::new(self.calculator(), self.limits)
    }

    pub fn play_log_reader(&self) -> PlayLogReader {
        PlayLogReader::new(self.utc_offset_hours)
    }

    pub fn aggregator(&self) -> WeeklyAggregator {
        WeeklyAggregator::new(self.cutover)
    }
}

fn resolve_retention(
    name: &str,
    value: Option<f64>,
    default: RetentionWeight,
) -> Result<RetentionWeight> {
    match value {
        Some(v) => match RetentionWeight::from_f64(v) {
            Some(weight) => Ok(weight),
            None => bail!(
                "retention.{} must be between 0 and {}, got {}",
                name,
                MAX_RETENTION_WEIGHT,
                v
            ),
        },
        None => Ok(default),
    }
}
