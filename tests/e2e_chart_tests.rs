//! End-to-end tests: play logs in, stored weekly charts out.

mod common;

use chrono::NaiveDate;
use common::*;
use pezzottify_charts::chart::{
    all_time_chart, number_ones, year_end_chart, ChartStatus, ALL_TIME_LIMIT,
};
use pezzottify_charts::chart_store::{corrupt_path, ChartStore};
use pezzottify_charts::plays::EntityKey;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[test]
fn test_run_charts_every_week_of_the_log() {
    let charts = TestCharts::new();
    let mut lines = repeated_plays(SONG_A, ARTIST_1, WEEK_1, 4);
    lines.push(play_line(SONG_B, ARTIST_1, "03 Jan 2025 13:00"));
    lines.extend(repeated_plays(SONG_B, ARTIST_1, WEEK_2, 3));
    let log = charts.write_play_log(&lines);

    let report = charts.run(&log).unwrap();
    assert_eq!(report.weeks.len(), 2);
    assert_eq!(report.weeks[0].debuts, 2);

    let store = charts.store();
    let week_1 = store.load_chart(date(WEEK_1)).unwrap().unwrap();
    assert_eq!(week_1.len(), 2);
    let a = &week_1.entries[0];
    assert_eq!(a.entity.name, SONG_A);
    assert_eq!(a.entity.album, ALBUM_1);
    assert_eq!((a.signals.streams, a.signals.sales, a.signals.airplay), (4, 1, 4));
    // ceil((5000 * 4 + 3000 + 2000 * 4) / 1000)
    assert_eq!(a.raw_points, 31);
    assert_eq!(a.status, ChartStatus::New);
    assert_eq!(week_1.entries[1].weighted_points, 10);

    let week_2 = store.load_chart(date(WEEK_2)).unwrap().unwrap();
    assert_eq!(week_2.len(), 1);
    let b = &week_2.entries[0];
    assert_eq!(b.entity.name, SONG_B);
    // The run continues from last week's final play, so no new sale
    assert_eq!((b.signals.streams, b.signals.sales, b.signals.airplay), (3, 0, 3));
    assert_eq!(b.raw_points, 21);
    assert_eq!(b.retention.previous, 3);
    assert_eq!(b.weighted_points, 24);
    assert_eq!(b.previous_position, Some(2));
    assert_eq!(b.status, ChartStatus::Up(1));
    assert_eq!(b.percent_change, Some(1.4));
    assert!(b.is_new_peak);
    assert_eq!(b.weeks_on_chart, 2);
}

#[test]
fn test_second_run_resumes_from_stored_state() {
    let charts = TestCharts::new();
    let mut first = repeated_plays(SONG_A, ARTIST_1, WEEK_1, 4);
    first.push(play_line(SONG_B, ARTIST_1, "03 Jan 2025 13:00"));
    charts.run(&charts.write_play_log(&first)).unwrap();

    let second = vec![
        play_line(SONG_A, ARTIST_1, "10 Jan 2025 12:00"),
        play_line(SONG_C, ARTIST_2, "10 Jan 2025 13:00"),
    ];
    let report = charts.run(&charts.write_play_log(&second)).unwrap();
    assert_eq!(report.weeks.len(), 1);

    let week_2 = charts.store().load_chart(date(WEEK_2)).unwrap().unwrap();
    let a = &week_2.entries[0];
    assert_eq!(a.entity.name, SONG_A);
    // 10 + ceil(0.3 * 31)
    assert_eq!(a.weighted_points, 20);
    assert_eq!(a.status, ChartStatus::Unchanged);
    assert!(a.is_repeak);
    assert_eq!(a.peak_streak, 2);
    assert_eq!(week_2.entries[1].status, ChartStatus::New);

    let third = vec![play_line(SONG_B, ARTIST_1, "17 Jan 2025 12:00")];
    charts.run(&charts.write_play_log(&third)).unwrap();

    let week_3 = charts.store().load_chart(date(WEEK_3)).unwrap().unwrap();
    let b = &week_3.entries[0];
    // Nothing last week, 10 raw points two weeks ago
    assert_eq!(b.weighted_points, 12);
    assert_eq!(b.status, ChartStatus::ReEntry);
    assert_eq!(b.previous_position, None);
    assert_eq!(b.percent_change, None);
    assert_eq!(b.weeks_on_chart, 2);
}

#[test]
fn test_rerunning_the_same_log_changes_nothing() {
    let charts = TestCharts::new();
    let log = charts.write_play_log(&repeated_plays(SONG_A, ARTIST_1, WEEK_1, 2));
    charts.run(&log).unwrap();

    let report = charts.run(&log).unwrap();
    assert!(report.weeks.is_empty());
    assert_eq!(report.skipped_weeks, 1);

    let state = charts.store().load_state().unwrap();
    assert_eq!(state.weeks_processed(), 1);
    assert_eq!(
        state
            .history(&EntityKey::new(SONG_A, ARTIST_1))
            .unwrap()
            .weeks_on_chart,
        1
    );
}

#[test]
fn test_run_across_the_cutover_is_not_a_new_sale() {
    let charts = TestCharts::new();
    let log = charts.write_play_log(&[
        play_line(SONG_A, ARTIST_1, "03 Jan 2025 05:59"),
        play_line(SONG_A, ARTIST_1, "03 Jan 2025 06:00"),
    ]);
    let report = charts.run(&log).unwrap();
    let weeks: Vec<NaiveDate> = report.weeks.iter().map(|w| w.week).collect();
    assert_eq!(weeks, vec![date(WEEK_2024), date(WEEK_1)]);

    let week_1 = charts.store().load_chart(date(WEEK_1)).unwrap().unwrap();
    let a = &week_1.entries[0];
    assert_eq!((a.signals.streams, a.signals.sales, a.signals.airplay), (1, 0, 1));
    // ceil(5000 / 1000 + 2000 / 1000) + ceil(0.3 * 10)
    assert_eq!(a.raw_points, 7);
    assert_eq!(a.weighted_points, 10);
}

#[test]
fn test_malformed_lines_are_skipped() {
    let charts = TestCharts::new();
    let log = charts.write_play_log(&[
        "not json at all".to_string(),
        r#"{"artist": "No Title", "played_at": "03 Jan 2025 12:00"}"#.to_string(),
        play_line(SONG_A, ARTIST_1, "yesterday at noon"),
        String::new(),
        play_line(SONG_A, ARTIST_1, "03 Jan 2025 12:00"),
        unix_play_line(SONG_B, ARTIST_2, 1735905600 + 60),
    ]);

    let report = charts.run(&log).unwrap();
    assert_eq!(report.weeks.len(), 1);

    let chart = charts.store().load_chart(date(WEEK_1)).unwrap().unwrap();
    let names: Vec<&str> = chart.entries.iter().map(|e| e.entity.name.as_str()).collect();
    assert_eq!(names, vec![SONG_A, SONG_B]);
    assert_eq!(chart.entries[1].entity.album, "");
}

#[test]
fn test_debut_cut_by_chart_limit_returns_as_re_entry() {
    let charts = TestCharts::with_chart_limit(Some(2));
    let mut lines = repeated_plays(SONG_A, ARTIST_1, WEEK_1, 3);
    lines.extend(repeated_plays(SONG_B, ARTIST_1, "2025-01-04", 2));
    lines.push(play_line(SONG_C, ARTIST_2, "05 Jan 2025 12:00"));
    lines.extend(repeated_plays(SONG_C, ARTIST_2, WEEK_2, 5));
    charts.run(&charts.write_play_log(&lines)).unwrap();

    let store = charts.store();
    let week_1 = store.load_chart(date(WEEK_1)).unwrap().unwrap();
    assert_eq!(week_1.len(), 2);
    assert!(week_1.entries.iter().all(|e| e.entity.name != SONG_C));

    let week_2 = store.load_chart(date(WEEK_2)).unwrap().unwrap();
    let c = &week_2.entries[0];
    assert_eq!(c.entity.name, SONG_C);
    // Admitted in week 1 even though the chart limit left it out
    assert_eq!(c.status, ChartStatus::ReEntry);
    assert_eq!(c.previous_position, None);
    assert_eq!(c.weeks_on_chart, 1);
    assert_eq!(c.retention.previous, 3);
    assert_eq!(week_2.debuts().count(), 0);

    let state = store.load_state().unwrap();
    assert_eq!(
        state.registry().first_charted(&EntityKey::new(SONG_C, ARTIST_2)),
        Some(date(WEEK_1))
    );
}

#[test]
fn test_number_ones_and_year_end() {
    let charts = TestCharts::new();
    let mut lines = repeated_plays(SONG_A, ARTIST_1, WEEK_2024, 2);
    lines.push(play_line(SONG_B, ARTIST_1, "03 Jan 2025 12:00"));
    lines.push(play_line(SONG_A, ARTIST_1, "03 Jan 2025 13:00"));
    lines.extend(repeated_plays(SONG_B, ARTIST_1, WEEK_4, 4));
    charts.run(&charts.write_play_log(&lines)).unwrap();

    let store = charts.store();
    assert_eq!(
        store.list_weeks().unwrap(),
        vec![date(WEEK_2024), date(WEEK_1), date(WEEK_2), date(WEEK_3), date(WEEK_4)]
    );
    let all = store.load_all_charts().unwrap();
    assert!(all[2].is_empty() && all[3].is_empty());

    let ones: Vec<(NaiveDate, String)> = number_ones(&all)
        .into_iter()
        .map(|e| (e.week, e.entity.name))
        .collect();
    assert_eq!(
        ones,
        vec![
            (date(WEEK_2024), SONG_A.to_string()),
            (date(WEEK_1), SONG_A.to_string()),
            (date(WEEK_4), SONG_B.to_string()),
        ]
    );

    let year = store
        .load_charts_between(date("2025-01-01"), date("2025-12-31"))
        .unwrap();
    let year_end = year_end_chart(&year, 2025, 10);
    // B: 10 + ceil((20000 + 3000 + 8000) / 1000), A: 10 + ceil(0.3 * 17)
    assert_eq!(year_end[0].entity.name, SONG_B);
    assert_eq!(year_end[0].total_points, 41);
    assert_eq!(year_end[0].weeks_on_chart, 2);
    assert_eq!(year_end[1].entity.name, SONG_A);
    assert_eq!(year_end[1].total_points, 16);
    // Back at number one after the 2024 week
    assert_eq!(year_end[1].peak_streak, 2);

    let last_year = year_end_chart(&all, 2024, 10);
    assert_eq!(last_year.len(), 1);
    assert_eq!(last_year[0].total_points, 17);
}

#[test]
fn test_all_time_chart_spans_years() {
    let charts = TestCharts::new();
    let mut lines = repeated_plays(SONG_A, ARTIST_1, WEEK_2024, 2);
    lines.push(play_line(SONG_B, ARTIST_1, "03 Jan 2025 12:00"));
    lines.push(play_line(SONG_A, ARTIST_1, "03 Jan 2025 13:00"));
    lines.extend(repeated_plays(SONG_B, ARTIST_1, WEEK_4, 4));
    charts.run(&charts.write_play_log(&lines)).unwrap();

    let all = charts.store().load_all_charts().unwrap();
    let all_time = all_time_chart(&all, ALL_TIME_LIMIT);

    assert_eq!(all_time.len(), 2);
    let b = &all_time[0];
    assert_eq!(b.entity.name, SONG_B);
    assert_eq!(b.total_points, 41);
    assert_eq!((b.signals.streams, b.signals.sales, b.signals.airplay), (5, 2, 5));
    assert_eq!(b.peak_position, 1);
    assert_eq!(b.last_week, date(WEEK_4));

    let a = &all_time[1];
    assert_eq!(a.entity.name, SONG_A);
    // 17 in 2024, 16 in 2025
    assert_eq!(a.total_points, 33);
    assert_eq!(a.weeks_on_chart, 2);
    assert_eq!(a.peak_streak, 2);
    // Sales share 0.18 in 2024 and 0.3 in 2025
    assert_eq!(a.average_percentages.sales, 0.24);
}

#[test]
fn test_unreadable_database_starts_over() {
    let charts = TestCharts::new();
    let db_path = charts.config.db_path.clone();
    std::fs::write(&db_path, "garbage ".repeat(128)).unwrap();

    let log = charts.write_play_log(&repeated_plays(SONG_A, ARTIST_1, WEEK_1, 2));
    let report = charts.run(&log).unwrap();

    assert_eq!(report.weeks.len(), 1);
    assert!(corrupt_path(&db_path).exists());
    let week_1 = charts.store().load_chart(date(WEEK_1)).unwrap().unwrap();
    assert_eq!(week_1.entries[0].status, ChartStatus::New);
}
