//! Summaries built from stored weekly charts.

use super::models::{ChartEntry, WeeklyChart};
use crate::plays::{Entity, EntityKey, SignalCounts};
use crate::points::{round2, ComponentPercentages, ComponentPoints};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

/// Songs kept by default in the all-time chart.
pub const ALL_TIME_LIMIT: usize = 200;

/// One line of a year-end chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearEndEntry {
    pub position: u32,
    pub entity: Entity,
    pub total_points: u64,
    pub signals: SignalCounts,
    pub weeks_on_chart: u32,
    pub peak_position: u32,
    /// Peak streak as of the last charted week of the year.
    pub peak_streak: u32,
    /// Weighted points of the last charted week of the year.
    pub last_week_points: u64,
    pub last_week: NaiveDate,
}

/// One line of the all-time chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllTimeEntry {
    pub position: u32,
    pub entity: Entity,
    pub total_points: u64,
    pub signals: SignalCounts,
    pub component_points: ComponentPoints,
    /// Mean of the weekly component percentages.
    pub average_percentages: ComponentPercentages,
    /// Lifetime figures as of the latest charted week.
    pub weeks_on_chart: u32,
    pub peak_position: u32,
    pub peak_streak: u32,
    pub last_week: NaiveDate,
}

/// Running sums of one song over a set of weekly charts.
struct SongTotals {
    entity: Entity,
    total_points: u64,
    signals: SignalCounts,
    component_points: ComponentPoints,
    percent_sums: [f64; 3],
    weeks: u32,
    best_position: u32,
    latest: ChartEntry,
}

impl SongTotals {
    fn new(entry: &ChartEntry) -> Self {
        Self {
            entity: entry.entity.clone(),
            total_points: 0,
            signals: SignalCounts::default(),
            component_points: ComponentPoints::default(),
            percent_sums: [0.0; 3],
            weeks: 0,
            best_position: entry.position,
            latest: entry.clone(),
        }
    }

    fn add(&mut self, entry: &ChartEntry) {
        self.total_points = self.total_points.saturating_add(entry.weighted_points);
        self.signals.streams = self.signals.streams.saturating_add(entry.signals.streams);
        self.signals.sales = self.signals.sales.saturating_add(entry.signals.sales);
        self.signals.airplay = self.signals.airplay.saturating_add(entry.signals.airplay);
        let points = &mut self.component_points;
        points.streams = points.streams.saturating_add(entry.component_points.streams);
        points.sales = points.sales.saturating_add(entry.component_points.sales);
        points.airplay = points.airplay.saturating_add(entry.component_points.airplay);
        self.percent_sums[0] += entry.component_percentages.streams;
        self.percent_sums[1] += entry.component_percentages.sales;
        self.percent_sums[2] += entry.component_percentages.airplay;
        self.weeks += 1;
        self.best_position = self.best_position.min(entry.position);
        if entry.week >= self.latest.week {
            self.latest = entry.clone();
        }
    }
}

/// Sums every entry per song, best total first, ties by song key.
fn ranked_totals<'a>(
    charts: impl Iterator<Item = &'a WeeklyChart>,
    limit: usize,
) -> Vec<SongTotals> {
    let mut totals: HashMap<EntityKey, SongTotals> = HashMap::new();
    for chart in charts {
        for entry in &chart.entries {
            totals
                .entry(entry.key())
                .or_insert_with(|| SongTotals::new(entry))
                .add(entry);
        }
    }

    let mut ranked: Vec<SongTotals> = totals.into_values().collect();
    ranked.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| a.entity.key().cmp(&b.entity.key()))
    });
    ranked.truncate(limit);
    ranked
}

/// Ranks every song charted in `year` by the weighted points it collected
/// over the year's weekly charts.
pub fn year_end_chart(charts: &[WeeklyChart], year: i32, limit: usize) -> Vec<YearEndEntry> {
    ranked_totals(charts.iter().filter(|c| c.week.year() == year), limit)
        .into_iter()
        .enumerate()
        .map(|(index, totals)| YearEndEntry {
            position: index as u32 + 1,
            entity: totals.entity,
            total_points: totals.total_points,
            signals: totals.signals,
            weeks_on_chart: totals.weeks,
            peak_position: totals.best_position,
            peak_streak: totals.latest.peak_streak,
            last_week_points: totals.latest.weighted_points,
            last_week: totals.latest.week,
        })
        .collect()
}

/// Ranks every song ever charted by the weighted points it collected over
/// all stored weeks.
pub fn all_time_chart(charts: &[WeeklyChart], limit: usize) -> Vec<AllTimeEntry> {
    ranked_totals(charts.iter(), limit)
        .into_iter()
        .enumerate()
        .map(|(index, totals)| {
            let weeks = totals.weeks.max(1) as f64;
            AllTimeEntry {
                position: index as u32 + 1,
                entity: totals.entity,
                total_points: totals.total_points,
                signals: totals.signals,
                component_points: totals.component_points,
                average_percentages: ComponentPercentages {
                    streams: round2(totals.percent_sums[0] / weeks),
                    sales: round2(totals.percent_sums[1] / weeks),
                    airplay: round2(totals.percent_sums[2] / weeks),
                },
                weeks_on_chart: totals.latest.weeks_on_chart,
                peak_position: totals.latest.peak_position,
                peak_streak: totals.latest.peak_streak,
                last_week: totals.latest.week,
            }
        })
        .collect()
}

/// The number one of every week, in week order.
pub fn number_ones(charts: &[WeeklyChart]) -> Vec<ChartEntry> {
    let mut ones: Vec<ChartEntry> = charts
        .iter()
        .filter_map(|c| c.number_one().cloned())
        .collect();
    ones.sort_by_key(|e| e.week);
    ones
}
