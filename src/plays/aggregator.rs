//! Collapses a play log into weekly per-song signal counts.

use super::models::{Entity, EntityKey, PlayEvent, SignalCounts, WeeklyObservation};
use super::week::WeekCutover;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Weekly observations produced by a [`WeeklyAggregator`].
#[derive(Debug, Default)]
pub struct AggregatedPlays {
    /// Observations grouped by week, weeks in increasing order.
    pub weeks: BTreeMap<NaiveDate, Vec<WeeklyObservation>>,
    /// Plays that were counted.
    pub plays: usize,
    /// Input records that were skipped.
    pub malformed: usize,
}

impl AggregatedPlays {
    pub fn first_week(&self) -> Option<NaiveDate> {
        self.weeks.keys().next().copied()
    }

    pub fn last_week(&self) -> Option<NaiveDate> {
        self.weeks.keys().next_back().copied()
    }

    pub fn observations_for(&self, week: NaiveDate) -> &[WeeklyObservation] {
        self.weeks.get(&week).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

struct Run {
    key: EntityKey,
    week: NaiveDate,
    length: u64,
}

/// Buckets plays into chart weeks and derives streams, sales and airplay.
///
/// All plays form a single chronological stream, so a run of the same song
/// is recognized even when it crosses a week boundary.
pub struct WeeklyAggregator {
    cutover: WeekCutover,
    plays: Vec<PlayEvent>,
    malformed: usize,
}

impl WeeklyAggregator {
    pub fn new(cutover: WeekCutover) -> Self {
        Self {
            cutover,
            plays: Vec::new(),
            malformed: 0,
        }
    }

    pub fn push(&mut self, play: PlayEvent) {
        self.plays.push(play);
    }

    /// Counts an input record that could not be turned into a play.
    pub fn record_malformed(&mut self) {
        self.malformed += 1;
    }

    pub fn finish(mut self) -> AggregatedPlays {
        // Stable, so plays sharing a timestamp keep their input order.
        self.plays.sort_by_key(|p| p.played_at);

        let mut counts: BTreeMap<NaiveDate, HashMap<EntityKey, SignalCounts>> = BTreeMap::new();
        let mut entities: HashMap<EntityKey, Entity> = HashMap::new();
        let mut run: Option<Run> = None;

        for play in &self.plays {
            let key = play.entity.key();
            let week = self.cutover.week_of(play.played_at);

            entities
                .entry(key.clone())
                .and_modify(|e| {
                    if !play.entity.album.is_empty() {
                        e.album = play.entity.album.clone();
                    }
                })
                .or_insert_with(|| play.entity.clone());

            let continues_run = run.as_ref().is_some_and(|r| r.key == key);
            let run_length = match run.take() {
                Some(mut r) if r.key == key && r.week == week => {
                    r.length += 1;
                    let length = r.length;
                    run = Some(r);
                    length
                }
                _ => {
                    run = Some(Run {
                        key: key.clone(),
                        week,
                        length: 1,
                    });
                    1
                }
            };

            let signals = counts.entry(week).or_default().entry(key).or_default();
            signals.streams += 1;
            if !continues_run {
                signals.sales += 1;
            }
            signals.airplay = signals.airplay.max(run_length);
        }

        let weeks = counts
            .into_iter()
            .map(|(week, by_entity)| {
                let mut observations: Vec<WeeklyObservation> = by_entity
                    .into_iter()
                    .filter_map(|(key, signals)| {
                        entities
                            .get(&key)
                            .map(|entity| WeeklyObservation::new(entity.clone(), week, signals))
                    })
                    .collect();
                observations.sort_by(|a, b| a.entity.key().cmp(&b.entity.key()));
                debug!("Week {}: {} songs played", week, observations.len());
                (week, observations)
            })
            .collect();

        AggregatedPlays {
            weeks,
            plays: self.plays.len(),
            malformed: self.malformed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn play(name: &str, artist: &str, at: &str) -> PlayEvent {
        PlayEvent {
            entity: Entity::new(name, artist, "Album"),
            played_at: NaiveDateTime::parse_from_str(at, "%Y-%m-%d %H:%M").unwrap(),
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn signals_of(result: &AggregatedPlays, week: &str, name: &str) -> SignalCounts {
        result
            .observations_for(date(week))
            .iter()
            .find(|o| o.entity.key().name == name.to_lowercase())
            .map(|o| o.signals)
            .unwrap()
    }

    #[test]
    fn test_streams_sales_and_airplay() {
        let mut aggregator = WeeklyAggregator::new(WeekCutover::default());
        // A A B A A A within the week starting Friday 2025-01-03
        for (name, at) in [
            ("A", "2025-01-04 10:00"),
            ("A", "2025-01-04 10:04"),
            ("B", "2025-01-04 10:08"),
            ("A", "2025-01-04 10:12"),
            ("A", "2025-01-04 10:16"),
            ("A", "2025-01-04 10:20"),
        ] {
            aggregator.push(play(name, "X", at));
        }
        let result = aggregator.finish();

        assert_eq!(result.plays, 6);
        assert_eq!(signals_of(&result, "2025-01-03", "A"), SignalCounts::new(5, 2, 3));
        assert_eq!(signals_of(&result, "2025-01-03", "B"), SignalCounts::new(1, 1, 1));
    }

    #[test]
    fn test_run_across_week_boundary_is_not_a_new_sale() {
        let mut aggregator = WeeklyAggregator::new(WeekCutover::default());
        aggregator.push(play("A", "X", "2025-01-10 05:50"));
        aggregator.push(play("A", "X", "2025-01-10 05:55"));
        aggregator.push(play("A", "X", "2025-01-10 06:01"));
        let result = aggregator.finish();

        assert_eq!(signals_of(&result, "2025-01-03", "A"), SignalCounts::new(2, 1, 2));
        assert_eq!(signals_of(&result, "2025-01-10", "A"), SignalCounts::new(1, 0, 1));
    }

    #[test]
    fn test_plays_are_sorted_before_counting() {
        let mut aggregator = WeeklyAggregator::new(WeekCutover::default());
        // Newest first, as exported by scrobbling services
        aggregator.push(play("A", "X", "2025-01-04 10:08"));
        aggregator.push(play("B", "X", "2025-01-04 10:04"));
        aggregator.push(play("A", "X", "2025-01-04 10:00"));
        let result = aggregator.finish();

        assert_eq!(signals_of(&result, "2025-01-03", "A"), SignalCounts::new(2, 2, 1));
    }

    #[test]
    fn test_name_case_collapses_into_first_seen_casing() {
        let mut aggregator = WeeklyAggregator::new(WeekCutover::default());
        aggregator.push(play("Shake It Off", "X", "2025-01-04 10:00"));
        aggregator.push(play("shake it off", "X", "2025-01-04 10:04"));
        let result = aggregator.finish();

        let observations = result.observations_for(date("2025-01-03"));
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].entity.name, "Shake It Off");
        assert_eq!(observations[0].signals, SignalCounts::new(2, 1, 2));
    }

    #[test]
    fn test_malformed_records_are_counted() {
        let mut aggregator = WeeklyAggregator::new(WeekCutover::default());
        aggregator.record_malformed();
        aggregator.record_malformed();
        let result = aggregator.finish();
        assert_eq!(result.malformed, 2);
        assert!(result.weeks.is_empty());
        assert_eq!(result.first_week(), None);
    }
}
