//! SQLite implementation of [`ChartStore`].

use super::schema::{CHART_SCHEMA, WEEK_FORMAT};
use super::ChartStore;
use crate::chart::{
    ChartEntry, ChartState, ChartedRegistry, EntityChartHistory, ScoreSnapshot, WeekOutcome,
    WeekSnapshot, WeeklyChart,
};
use crate::plays::EntityKey;
use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

const META_LAST_WEEK: &str = "last_week";
const META_WEEKS_PROCESSED: &str = "weeks_processed";

pub fn format_week(week: NaiveDate) -> String {
    week.format(WEEK_FORMAT).to_string()
}

pub fn parse_week(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, WEEK_FORMAT).ok()
}

/// Where an unreadable database file is moved before starting over.
pub fn corrupt_path(db_path: &Path) -> PathBuf {
    let mut name = db_path.as_os_str().to_os_string();
    name.push(".corrupt");
    PathBuf::from(name)
}

/// Chart state and published charts in a single SQLite database.
#[derive(Clone)]
pub struct SqliteChartStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteChartStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        if !path.exists() {
            info!("Creating new chart database at {:?}", path);
        }
        match Self::open_file(path) {
            Ok(store) => Ok(store),
            Err(err) if path.exists() => {
                let corrupt = corrupt_path(path);
                warn!(
                    "Chart database {:?} is unreadable ({:#}), moving it to {:?} and starting fresh",
                    path, err, corrupt
                );
                std::fs::rename(path, &corrupt).with_context(|| {
                    format!("Failed to move unreadable chart database {:?} aside", path)
                })?;
                Self::open_file(path)
            }
            Err(err) => Err(err),
        }
    }

    fn open_file(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open chart database {:?}", path))?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory chart database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(CHART_SCHEMA)
            .context("Failed to initialize chart schema")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn get_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
        let value = conn
            .query_row(
                "SELECT value FROM chart_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn load_registry(conn: &Connection) -> Result<ChartedRegistry> {
        let mut stmt = conn.prepare("SELECT name, artist, first_week FROM ever_charted")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut registry = ChartedRegistry::default();
        for row in rows {
            match row {
                Ok((name, artist, first_week)) => match parse_week(&first_week) {
                    Some(week) => registry.record(EntityKey::new(&name, &artist), week),
                    None => warn!(
                        "Skipping charted song {} - {} with invalid week {:?}",
                        name, artist, first_week
                    ),
                },
                Err(e) => warn!("Skipping unreadable ever_charted row: {}", e),
            }
        }
        Ok(registry)
    }

    fn load_histories(conn: &Connection) -> Result<HashMap<EntityKey, EntityChartHistory>> {
        let mut stmt = conn.prepare(
            "SELECT name, artist, peak_position, weeks_on_chart, peak_streak, first_charted_week
             FROM chart_history",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                EntityKey::new(&row.get::<_, String>(0)?, &row.get::<_, String>(1)?),
                row.get::<_, u32>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, u32>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut histories = HashMap::new();
        for row in rows {
            match row {
                Ok((key, peak_position, weeks_on_chart, peak_streak, first_week)) => {
                    let Some(first_charted_week) = parse_week(&first_week) else {
                        warn!("Skipping history of {} with invalid week {:?}", key, first_week);
                        continue;
                    };
                    histories.insert(
                        key,
                        EntityChartHistory {
                            peak_position,
                            weeks_on_chart,
                            peak_streak,
                            first_charted_week,
                        },
                    );
                }
                Err(e) => warn!("Skipping unreadable chart_history row: {}", e),
            }
        }
        Ok(histories)
    }

    fn load_snapshots(conn: &Connection) -> Result<Vec<WeekSnapshot>> {
        let mut stmt = conn.prepare(
            "SELECT week, name, artist, raw_points, weighted_points, position
             FROM week_snapshots ORDER BY week",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                EntityKey::new(&row.get::<_, String>(1)?, &row.get::<_, String>(2)?),
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, Option<u32>>(5)?,
            ))
        })?;

        let mut snapshots: BTreeMap<NaiveDate, WeekSnapshot> = BTreeMap::new();
        for row in rows {
            let (week, key, raw_points, weighted_points, position) = match row {
                Ok(row) => row,
                Err(e) => {
                    warn!("Skipping unreadable week_snapshots row: {}", e);
                    continue;
                }
            };
            let Some(week) = parse_week(&week) else {
                warn!("Skipping snapshot of {} with invalid week {:?}", key, week);
                continue;
            };
            let snapshot = snapshots.entry(week).or_insert_with(|| WeekSnapshot {
                week,
                scores: HashMap::new(),
                positions: HashMap::new(),
            });
            if let Some(position) = position {
                snapshot.positions.insert(key.clone(), position);
            }
            snapshot.scores.insert(
                key,
                ScoreSnapshot {
                    raw_points: raw_points.max(0) as u64,
                    weighted_points: weighted_points.max(0) as u64,
                },
            );
        }
        Ok(snapshots.into_values().collect())
    }

    fn load_weeks(conn: &Connection, from: &str, to: &str) -> Result<Vec<NaiveDate>> {
        let mut stmt =
            conn.prepare("SELECT week FROM chart_weeks WHERE week BETWEEN ?1 AND ?2 ORDER BY week")?;
        let weeks = stmt
            .query_map(params![from, to], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(weeks
            .into_iter()
            .filter_map(|w| {
                let parsed = parse_week(&w);
                if parsed.is_none() {
                    warn!("Skipping chart week with invalid date {:?}", w);
                }
                parsed
            })
            .collect())
    }

    fn load_charts(conn: &Connection, from: &str, to: &str) -> Result<Vec<WeeklyChart>> {
        let weeks = Self::load_weeks(conn, from, to)?;

        let mut stmt = conn.prepare(
            "SELECT week, position, data FROM chart_entries
             WHERE week BETWEEN ?1 AND ?2 ORDER BY week, position",
        )?;
        let rows = stmt.query_map(params![from, to], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut entries: HashMap<NaiveDate, Vec<ChartEntry>> = HashMap::new();
        for row in rows {
            let (week, position, data) = match row {
                Ok(row) => row,
                Err(e) => {
                    warn!("Skipping unreadable chart_entries row: {}", e);
                    continue;
                }
            };
            let Some(week_date) = parse_week(&week) else {
                warn!("Skipping chart entry with invalid week {:?}", week);
                continue;
            };
            match serde_json::from_str::<ChartEntry>(&data) {
                Ok(entry) => entries.entry(week_date).or_default().push(entry),
                Err(e) => warn!("Skipping chart entry {} of week {}: {}", position, week, e),
            }
        }

        Ok(weeks
            .into_iter()
            .map(|week| WeeklyChart::new(week, entries.remove(&week).unwrap_or_default()))
            .collect())
    }
}

impl ChartStore for SqliteChartStore {
    fn load_state(&self) -> Result<ChartState> {
        let conn = self.conn.lock().unwrap();

        let registry = Self::load_registry(&conn).context("Failed to load chart registry")?;
        let histories = Self::load_histories(&conn).context("Failed to load chart histories")?;
        let snapshots = Self::load_snapshots(&conn).context("Failed to load week snapshots")?;

        let last_week = match Self::get_meta(&conn, META_LAST_WEEK)? {
            Some(value) => {
                let parsed = parse_week(&value);
                if parsed.is_none() {
                    warn!("Ignoring invalid last processed week {:?}", value);
                }
                parsed
            }
            None => None,
        };
        let weeks_processed = match Self::get_meta(&conn, META_WEEKS_PROCESSED)? {
            Some(value) => value.parse().unwrap_or_else(|_| {
                warn!("Ignoring invalid processed week count {:?}", value);
                0
            }),
            None => 0,
        };

        info!(
            "Loaded chart state: {} charted songs, {} weeks processed, last week {}",
            registry.len(),
            weeks_processed,
            last_week.map_or_else(|| "none".to_string(), |w| w.to_string())
        );

        Ok(ChartState::from_parts(
            registry,
            histories,
            snapshots,
            last_week,
            weeks_processed,
        ))
    }

    fn commit_week(&self, outcome: &WeekOutcome) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let week = outcome.chart.week;
        let week_str = format_week(week);

        if let Some(last) = Self::get_meta(&conn, META_LAST_WEEK)?
            .as_deref()
            .and_then(parse_week)
        {
            if week <= last {
                bail!("Week {} is not after the last stored week {}", week, last);
            }
        }

        let tx = conn.transaction()?;

        for key in &outcome.debuts {
            tx.execute(
                "INSERT OR IGNORE INTO ever_charted (name, artist, first_week) VALUES (?1, ?2, ?3)",
                params![key.name, key.artist, week_str],
            )?;
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO chart_history
                 (name, artist, peak_position, weeks_on_chart, peak_streak, first_charted_week)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(name, artist) DO UPDATE SET
                 peak_position = ?3, weeks_on_chart = ?4, peak_streak = ?5,
                 first_charted_week = ?6",
            )?;
            for (key, history) in &outcome.histories {
                stmt.execute(params![
                    key.name,
                    key.artist,
                    history.peak_position,
                    history.weeks_on_chart,
                    history.peak_streak,
                    format_week(history.first_charted_week),
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO week_snapshots
                 (week, name, artist, raw_points, weighted_points, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (key, score) in &outcome.snapshot.scores {
                stmt.execute(params![
                    week_str,
                    key.name,
                    key.artist,
                    score.raw_points as i64,
                    score.weighted_points as i64,
                    outcome.snapshot.positions.get(key).copied(),
                ])?;
            }
        }
        // Only this week and the one before feed the next week's decay.
        tx.execute(
            "DELETE FROM week_snapshots WHERE week < ?1",
            params![format_week(week - Duration::days(7))],
        )?;

        tx.execute("DELETE FROM chart_entries WHERE week = ?1", params![week_str])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO chart_entries (week, position, name, artist, status, weighted_points, data)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for entry in &outcome.chart.entries {
                let key = entry.key();
                let data = serde_json::to_string(entry)
                    .with_context(|| format!("Failed to serialize chart entry {}", key))?;
                stmt.execute(params![
                    week_str,
                    entry.position,
                    key.name,
                    key.artist,
                    entry.status.to_string(),
                    entry.weighted_points as i64,
                    data,
                ])?;
            }
        }
        tx.execute(
            "INSERT OR REPLACE INTO chart_weeks (week, entries, scored) VALUES (?1, ?2, ?3)",
            params![week_str, outcome.chart.len() as i64, outcome.scored as i64],
        )?;

        tx.execute(
            "INSERT OR REPLACE INTO chart_meta (key, value) VALUES (?1, ?2)",
            params![META_LAST_WEEK, week_str],
        )?;
        tx.execute(
            "INSERT INTO chart_meta (key, value) VALUES (?1, '1')
             ON CONFLICT(key) DO UPDATE SET value = CAST(value AS INTEGER) + 1",
            params![META_WEEKS_PROCESSED],
        )?;

        tx.commit()
            .with_context(|| format!("Failed to commit chart week {}", week))?;
        debug!(
            "Stored week {} with {} entries and {} scored songs",
            week,
            outcome.chart.len(),
            outcome.snapshot.scores.len()
        );
        Ok(())
    }

    fn load_chart(&self, week: NaiveDate) -> Result<Option<WeeklyChart>> {
        let conn = self.conn.lock().unwrap();
        let week = format_week(week);
        Ok(Self::load_charts(&conn, &week, &week)?.into_iter().next())
    }

    fn list_weeks(&self) -> Result<Vec<NaiveDate>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT week FROM chart_weeks ORDER BY week")?;
        let weeks = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(weeks.iter().filter_map(|w| parse_week(w)).collect())
    }

    fn load_charts_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<WeeklyChart>> {
        let conn = self.conn.lock().unwrap();
        Self::load_charts(&conn, &format_week(from), &format_week(to))
    }

    fn load_all_charts(&self) -> Result<Vec<WeeklyChart>> {
        let conn = self.conn.lock().unwrap();
        // Every stored week sorts between these two strings.
        Self::load_charts(&conn, "0000-00-00", "9999-99-99")
    }
}
