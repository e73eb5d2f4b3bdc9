use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use thiserror::Error;

use super::models::{FieldValue, SensorField, SensorReading};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("could not (de)serialize reading: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("stored reading is corrupt: {0}")]
    Corrupt(String),
}

/// Append-only home of accepted readings
pub trait ReadingStore: Send + Sync {
    fn insert(&self, reading: &SensorReading) -> Result<(), StoreError>;

    /// Most recent reading by timestamp
    fn latest(&self) -> Result<Option<SensorReading>, StoreError>;
}

pub struct SqliteReadingStore {
    conn: Mutex<Connection>,
}

impl SqliteReadingStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        std::fs::create_dir_all(path.parent().unwrap_or(Path::new("")))?;
        log::debug!("Opening reading store at {}", path.display());

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS readings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ts_ms INTEGER NOT NULL,
                ts TEXT NOT NULL,
                fields TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS readings_ts_ms ON readings (ts_ms);",
        )?;

        Ok(SqliteReadingStore {
            conn: Mutex::new(conn),
        })
    }

    #[cfg(test)]
    fn count(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM readings", [], |r| r.get(0))?;
        Ok(n as u64)
    }
}

impl ReadingStore for SqliteReadingStore {
    fn insert(&self, reading: &SensorReading) -> Result<(), StoreError> {
        let fields = serde_json::to_string(&reading.fields)?;
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.prepare_cached("INSERT INTO readings (ts_ms, ts, fields) VALUES (?1, ?2, ?3)")?
            .execute(params![
                reading.timestamp.timestamp_millis(),
                reading.timestamp.to_rfc3339(),
                fields
            ])?;
        Ok(())
    }

    fn latest(&self) -> Result<Option<SensorReading>, StoreError> {
        let row = {
            let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
            conn.query_row(
                "SELECT ts, fields FROM readings ORDER BY ts_ms DESC, id DESC LIMIT 1",
                [],
                |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)),
            )
            .optional()?
        };

        row.map(|(ts, fields)| decode_row(&ts, &fields)).transpose()
    }
}

fn decode_row(ts: &str, fields_json: &str) -> Result<SensorReading, StoreError> {
    let timestamp = DateTime::parse_from_rfc3339(ts)
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp '{ts}': {e}")))?
        .with_timezone(&Utc);

    let raw: BTreeMap<String, Value> = serde_json::from_str(fields_json)?;
    let mut fields = BTreeMap::new();
    for (name, value) in raw {
        let field = name.parse::<SensorField>().map_err(StoreError::Corrupt)?;
        let typed = FieldValue::from_raw(field, &value)
            .ok_or_else(|| StoreError::Corrupt(format!("bad value {value} for '{name}'")))?;
        fields.insert(field, typed);
    }

    Ok(SensorReading { timestamp, fields })
}

/// Volatile store, mainly for tests and embedding
#[derive(Default)]
pub struct MemoryReadingStore {
    readings: Mutex<Vec<SensorReading>>,
}

impl MemoryReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All readings in insertion order
    pub fn all(&self) -> Vec<SensorReading> {
        self.readings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ReadingStore for MemoryReadingStore {
    fn insert(&self, reading: &SensorReading) -> Result<(), StoreError> {
        self.readings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(reading.clone());
        Ok(())
    }

    fn latest(&self) -> Result<Option<SensorReading>, StoreError> {
        let readings = self.readings.lock().unwrap_or_else(PoisonError::into_inner);
        // max_by_key keeps the last of equal keys, i.e. the newest insert
        Ok(readings.iter().max_by_key(|r| r.timestamp).cloned())
    }
}
