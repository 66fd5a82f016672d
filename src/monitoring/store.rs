//! Persistence boundary for monitored regions, thresholds and alerts.

use crate::error::{Result, UrbanError};
use crate::providers::BoundingBox;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Comparison applied by a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = ">")]
    Above,
    #[serde(rename = "<")]
    Below,
}

impl Operator {
    /// Whether `value` breaches `limit`. Equality never triggers.
    pub fn triggers(&self, value: f64, limit: f64) -> bool {
        match self {
            Operator::Above => value > limit,
            Operator::Below => value < limit,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Above => ">",
            Operator::Below => "<",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = UrbanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            ">" => Ok(Operator::Above),
            "<" => Ok(Operator::Below),
            other => Err(UrbanError::InvalidParameter(format!(
                "unknown threshold operator '{}'",
                other
            ))),
        }
    }
}

/// Alerting rule for one metric of one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub metric: String,
    pub operator: Operator,
    pub value: f64,
    pub enabled: bool,
}

impl Threshold {
    pub fn new(metric: impl Into<String>, operator: Operator, value: f64) -> Self {
        Self {
            metric: metric.into(),
            operator,
            value,
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// A monitored region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub id: u64,
    pub name: String,
    pub bbox: BoundingBox,
    pub created_at: NaiveDateTime,
}

/// A logged threshold breach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub timestamp: NaiveDateTime,
    pub region_name: String,
    pub metric: String,
    pub value: f64,
    pub message: String,
    pub read: bool,
}

/// Storage used by the monitor.
pub trait PersistenceStore {
    /// Register a region. `None` when the name is already taken.
    fn add_region(&mut self, name: &str, bbox: BoundingBox, created_at: NaiveDateTime) -> Result<Option<u64>>;
    fn get_all_regions(&self) -> Result<Vec<RegionRecord>>;
    /// Remove a region and its thresholds. Returns whether it existed.
    fn delete_region(&mut self, region_id: u64) -> Result<bool>;
    /// Insert or replace the threshold for `(region_id, threshold.metric)`.
    fn set_threshold(&mut self, region_id: u64, threshold: Threshold) -> Result<()>;
    fn get_thresholds(&self, region_id: u64) -> Result<Vec<Threshold>>;
    fn log_alert(&mut self, alert: Alert) -> Result<()>;
    /// Newest first.
    fn get_recent_alerts(&self, limit: usize) -> Result<Vec<Alert>>;
    fn get_unread_count(&self) -> Result<usize>;
    /// Returns the number of alerts marked.
    fn mark_all_read(&mut self) -> Result<usize>;
    fn save_preference(&mut self, key: &str, value: &str) -> Result<()>;
    fn get_preference(&self, key: &str) -> Result<Option<String>>;
}

#[derive(Debug, Clone, Default)]
struct StoreState {
    next_region_id: u64,
    regions: Vec<RegionRecord>,
    thresholds: BTreeMap<u64, Vec<Threshold>>,
    alerts: Vec<Alert>,
    preferences: BTreeMap<String, String>,
}

impl StoreState {
    fn add_region(&mut self, name: &str, bbox: BoundingBox, created_at: NaiveDateTime) -> Option<u64> {
        if self.regions.iter().any(|r| r.name == name) {
            return None;
        }
        self.next_region_id += 1;
        let id = self.next_region_id;
        self.regions.push(RegionRecord {
            id,
            name: name.to_string(),
            bbox,
            created_at,
        });
        Some(id)
    }

    fn delete_region(&mut self, region_id: u64) -> bool {
        self.thresholds.remove(&region_id);
        let before = self.regions.len();
        self.regions.retain(|r| r.id != region_id);
        self.regions.len() != before
    }

    fn set_threshold(&mut self, region_id: u64, threshold: Threshold) {
        let rules = self.thresholds.entry(region_id).or_default();
        match rules.iter_mut().find(|t| t.metric == threshold.metric) {
            Some(existing) => *existing = threshold,
            None => rules.push(threshold),
        }
    }

    fn recent_alerts(&self, limit: usize) -> Vec<Alert> {
        let mut alerts = self.alerts.clone();
        // Stable sort keeps insertion order among equal timestamps; reverse
        // afterwards so the latest insert comes first.
        alerts.sort_by_key(|a| a.timestamp);
        alerts.reverse();
        alerts.truncate(limit);
        alerts
    }

    fn mark_all_read(&mut self) -> usize {
        let mut marked = 0;
        for alert in self.alerts.iter_mut().filter(|a| !a.read) {
            alert.read = true;
            marked += 1;
        }
        marked
    }
}

/// Volatile store for tests and single-session use.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: StoreState,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistenceStore for InMemoryStore {
    fn add_region(&mut self, name: &str, bbox: BoundingBox, created_at: NaiveDateTime) -> Result<Option<u64>> {
        Ok(self.state.add_region(name, bbox, created_at))
    }

    fn get_all_regions(&self) -> Result<Vec<RegionRecord>> {
        Ok(self.state.regions.clone())
    }

    fn delete_region(&mut self, region_id: u64) -> Result<bool> {
        Ok(self.state.delete_region(region_id))
    }

    fn set_threshold(&mut self, region_id: u64, threshold: Threshold) -> Result<()> {
        self.state.set_threshold(region_id, threshold);
        Ok(())
    }

    fn get_thresholds(&self, region_id: u64) -> Result<Vec<Threshold>> {
        Ok(self.state.thresholds.get(&region_id).cloned().unwrap_or_default())
    }

    fn log_alert(&mut self, alert: Alert) -> Result<()> {
        self.state.alerts.push(alert);
        Ok(())
    }

    fn get_recent_alerts(&self, limit: usize) -> Result<Vec<Alert>> {
        Ok(self.state.recent_alerts(limit))
    }

    fn get_unread_count(&self) -> Result<usize> {
        Ok(self.state.alerts.iter().filter(|a| !a.read).count())
    }

    fn mark_all_read(&mut self) -> Result<usize> {
        Ok(self.state.mark_all_read())
    }

    fn save_preference(&mut self, key: &str, value: &str) -> Result<()> {
        self.state.preferences.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_preference(&self, key: &str) -> Result<Option<String>> {
        Ok(self.state.preferences.get(key).cloned())
    }
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS preferences (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS regions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        bbox TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS thresholds (
        region_id INTEGER NOT NULL REFERENCES regions(id) ON DELETE CASCADE,
        metric TEXT NOT NULL,
        operator TEXT NOT NULL,
        value REAL NOT NULL,
        enabled INTEGER NOT NULL DEFAULT 1,
        PRIMARY KEY (region_id, metric)
    );
    CREATE TABLE IF NOT EXISTS alerts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL,
        region_name TEXT NOT NULL,
        metric TEXT NOT NULL,
        value REAL NOT NULL,
        message TEXT NOT NULL,
        read INTEGER NOT NULL DEFAULT 0
    );
";

/// SQLite-backed store. Every call goes to the database, so a dashboard
/// and a separate monitoring process see each other's writes.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        let store = Self::initialize(conn)?;
        debug!(path = %path.display(), "opened monitoring store");
        Ok(store)
    }

    /// Private database that disappears with the store.
    pub fn open_in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA busy_timeout = 5000;
            PRAGMA foreign_keys = ON;
            ",
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }
}

fn region_from_row(row: &Row<'_>) -> rusqlite::Result<(i64, String, String, NaiveDateTime)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn alert_from_row(row: &Row<'_>) -> rusqlite::Result<Alert> {
    Ok(Alert {
        timestamp: row.get(0)?,
        region_name: row.get(1)?,
        metric: row.get(2)?,
        value: row.get(3)?,
        message: row.get(4)?,
        read: row.get(5)?,
    })
}

impl PersistenceStore for SqliteStore {
    fn add_region(&mut self, name: &str, bbox: BoundingBox, created_at: NaiveDateTime) -> Result<Option<u64>> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO regions (name, bbox, created_at) VALUES (?1, ?2, ?3)",
            params![name, serde_json::to_string(&bbox)?, created_at],
        )?;
        if inserted == 0 {
            debug!(region = name, "region name already registered");
            return Ok(None);
        }
        Ok(Some(self.conn.last_insert_rowid() as u64))
    }

    fn get_all_regions(&self) -> Result<Vec<RegionRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, bbox, created_at FROM regions ORDER BY id")?;
        let rows = stmt.query_map([], region_from_row)?;
        let mut regions = Vec::new();
        for row in rows {
            let (id, name, bbox, created_at) = row?;
            regions.push(RegionRecord {
                id: id as u64,
                name,
                bbox: serde_json::from_str(&bbox)?,
                created_at,
            });
        }
        Ok(regions)
    }

    fn delete_region(&mut self, region_id: u64) -> Result<bool> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM thresholds WHERE region_id = ?1",
            params![region_id as i64],
        )?;
        let removed = tx.execute("DELETE FROM regions WHERE id = ?1", params![region_id as i64])?;
        tx.commit()?;
        Ok(removed > 0)
    }

    fn set_threshold(&mut self, region_id: u64, threshold: Threshold) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO thresholds (region_id, metric, operator, value, enabled)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                region_id as i64,
                threshold.metric,
                threshold.operator.symbol(),
                threshold.value,
                threshold.enabled
            ],
        )?;
        Ok(())
    }

    fn get_thresholds(&self, region_id: u64) -> Result<Vec<Threshold>> {
        let mut stmt = self.conn.prepare(
            "SELECT metric, operator, value, enabled FROM thresholds
             WHERE region_id = ?1 ORDER BY metric",
        )?;
        let rows = stmt.query_map(params![region_id as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, bool>(3)?,
            ))
        })?;
        let mut thresholds = Vec::new();
        for row in rows {
            let (metric, operator, value, enabled) = row?;
            thresholds.push(Threshold {
                metric,
                operator: operator.parse()?,
                value,
                enabled,
            });
        }
        Ok(thresholds)
    }

    fn log_alert(&mut self, alert: Alert) -> Result<()> {
        self.conn.execute(
            "INSERT INTO alerts (timestamp, region_name, metric, value, message, read)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                alert.timestamp,
                alert.region_name,
                alert.metric,
                alert.value,
                alert.message,
                alert.read
            ],
        )?;
        Ok(())
    }

    fn get_recent_alerts(&self, limit: usize) -> Result<Vec<Alert>> {
        let mut stmt = self.conn.prepare(
            "SELECT timestamp, region_name, metric, value, message, read FROM alerts
             ORDER BY timestamp DESC, id DESC LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let alerts = stmt
            .query_map(params![limit], alert_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(alerts)
    }

    fn get_unread_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM alerts WHERE read = 0", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn mark_all_read(&mut self) -> Result<usize> {
        Ok(self.conn.execute("UPDATE alerts SET read = 1 WHERE read = 0", [])?)
    }

    fn save_preference(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO preferences (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn get_preference(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }
}
