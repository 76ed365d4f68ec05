//! Charting of aggregated plays week after week, persisting each week.

use crate::chart::{ChartPipeline, ChartState};
use crate::chart_store::ChartStore;
use crate::plays::{weeks_between, AggregatedPlays, Entity};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{info, warn};

/// What a charted week produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekReport {
    pub week: NaiveDate,
    pub entries: usize,
    pub debuts: usize,
    pub number_one: Option<Entity>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub weeks: Vec<WeekReport>,
    /// Weeks with plays at or before the last stored week, left untouched.
    pub skipped_weeks: usize,
}

/// Charts every week from the first unprocessed week with plays through the
/// last one, weeks without plays included.
///
/// Each week is stored before it is applied to `state`, so a failure leaves
/// `state` matching what the store holds.
pub fn chart_pending_weeks(
    pipeline: &ChartPipeline,
    store: &dyn ChartStore,
    state: &mut ChartState,
    plays: &AggregatedPlays,
) -> Result<RunReport> {
    let mut report = RunReport::default();

    let pending = |week: &NaiveDate| state.last_week().map_or(true, |last| *week > last);
    report.skipped_weeks = plays.weeks.keys().filter(|w| !pending(w)).count();
    if report.skipped_weeks > 0 {
        warn!(
            "Ignoring plays of {} weeks already charted (last charted week {})",
            report.skipped_weeks,
            state
                .last_week()
                .map_or_else(|| "none".to_string(), |w| w.to_string())
        );
    }

    let first = plays.weeks.keys().copied().find(|w| pending(w));
    let (Some(first), Some(last)) = (first, plays.last_week()) else {
        info!("No new weeks to chart");
        return Ok(report);
    };

    for week in weeks_between(first, last) {
        let outcome = pipeline
            .compute_week(state, week, plays.observations_for(week))
            .with_context(|| format!("Failed to chart week {}", week))?;
        store
            .commit_week(&outcome)
            .with_context(|| format!("Failed to store week {}", week))?;

        report.weeks.push(WeekReport {
            week,
            entries: outcome.chart.len(),
            debuts: outcome.chart.debuts().count(),
            number_one: outcome.chart.number_one().map(|e| e.entity.clone()),
        });
        info!(
            "Charted week {}: {} entries, {} debuts",
            week,
            outcome.chart.len(),
            outcome.chart.debuts().count()
        );
        state.apply(outcome);
    }

    Ok(report)
}
