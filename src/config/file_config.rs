use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_path: Option<String>,
    pub utc_offset_hours: Option<i64>,

    pub weights: Option<WeightsConfig>,
    pub retention: Option<RetentionConfig>,
    pub ranking: Option<RankingConfig>,
    pub week: Option<WeekConfig>,
}

/// `[weights]`: points per signal unit, divided by `normalizer`.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct WeightsConfig {
    pub streams: Option<u64>,
    pub sales: Option<u64>,
    pub airplay: Option<u64>,
    pub normalizer: Option<u64>,
}

/// `[retention]`: share of raw points carried by the current and previous weeks.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RetentionConfig {
    pub current: Option<f64>,
    pub previous: Option<f64>,
    pub two_weeks_ago: Option<f64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RankingConfig {
    pub chart_limit: Option<usize>,
    pub max_debuts: Option<usize>,
    pub first_week_debut_limit: Option<usize>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct WeekConfig {
    /// e.g. "Fri" or "friday"
    pub cutover_weekday: Option<String>,
    pub cutover_hour: Option<u32>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
