//! Schema definition for the chart tables.
//!
//! Weeks are stored as `%Y-%m-%d` text so they sort chronologically.

pub const WEEK_FORMAT: &str = "%Y-%m-%d";

pub const CHART_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS ever_charted (
        name TEXT NOT NULL,
        artist TEXT NOT NULL,
        first_week TEXT NOT NULL,
        PRIMARY KEY (name, artist)
    );

    CREATE TABLE IF NOT EXISTS chart_history (
        name TEXT NOT NULL,
        artist TEXT NOT NULL,
        peak_position INTEGER NOT NULL,
        weeks_on_chart INTEGER NOT NULL,
        peak_streak INTEGER NOT NULL,
        first_charted_week TEXT NOT NULL,
        PRIMARY KEY (name, artist)
    );

    CREATE TABLE IF NOT EXISTS week_snapshots (
        week TEXT NOT NULL,
        name TEXT NOT NULL,
        artist TEXT NOT NULL,
        raw_points INTEGER NOT NULL,
        weighted_points INTEGER NOT NULL,
        position INTEGER,
        PRIMARY KEY (week, name, artist)
    );

    CREATE TABLE IF NOT EXISTS chart_meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS chart_weeks (
        week TEXT PRIMARY KEY,
        entries INTEGER NOT NULL,
        scored INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS chart_entries (
        week TEXT NOT NULL,
        position INTEGER NOT NULL,
        name TEXT NOT NULL,
        artist TEXT NOT NULL,
        status TEXT NOT NULL,
        weighted_points INTEGER NOT NULL,
        data TEXT NOT NULL,
        PRIMARY KEY (week, position)
    );

    CREATE INDEX IF NOT EXISTS idx_chart_entries_entity ON chart_entries(name, artist);
"#;
