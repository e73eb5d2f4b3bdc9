use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

const TABLENAME: &str = "kvstore";
const KEY_FIELD: &str = "key";
const VALUE_FIELD: &str = "value";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum KVStoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("could not (de)serialize value: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    IOError(#[from] std::io::Error),
}

/// JSON-valued key-value store on top of a single SQLite table
pub struct KVDb(Connection);

impl KVDb {
    /// Open (or create) the store at `path`. `":memory:"` gives a private in-memory store.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, KVStoreError> {
        let path = path.as_ref();
        // Create directory for DB if it doesn't already exist
        std::fs::create_dir_all(path.parent().unwrap_or(Path::new("")))?;
        log::debug!("Opening key-value store at {}", path.display());

        let connection = Connection::open(path)?;
        connection.busy_timeout(BUSY_TIMEOUT)?;
        connection.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS '{TABLENAME}' (
                {KEY_FIELD} TEXT PRIMARY KEY NOT NULL,
                {VALUE_FIELD} TEXT NOT NULL
                )"
            ),
            [],
        )?;
        Ok(KVDb(connection))
    }

    fn select(&self, key: &str) -> Result<Option<String>, KVStoreError> {
        self.0
            .query_row(
                &format!("SELECT {VALUE_FIELD} FROM '{TABLENAME}' WHERE {KEY_FIELD} = ?1"),
                [key],
                |r| r.get::<_, String>(0),
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn get<T: DeserializeOwned>(&self, key: impl AsRef<str>) -> Result<Option<T>, KVStoreError> {
        self.select(key.as_ref())?
            .map(|v| serde_json::from_str::<T>(&v))
            .transpose()
            .map_err(Into::into)
    }

    /// Store an already-serialized JSON document under `key`
    fn set_raw(&self, key: &str, value_json: &str) -> Result<(), KVStoreError> {
        let mut stmt = self.0.prepare_cached(&format!(
            "INSERT INTO '{TABLENAME}' ({KEY_FIELD}, {VALUE_FIELD}) VALUES (?1, ?2)
            ON CONFLICT({KEY_FIELD}) DO UPDATE SET {VALUE_FIELD}=?2",
        ))?;
        stmt.execute(params![key, value_json])?;
        log::trace!("Set {key} = {value_json}");
        Ok(())
    }

    pub fn set<V: Serialize + ?Sized>(&self, key: impl AsRef<str>, value: &V) -> Result<(), KVStoreError> {
        self.set_raw(key.as_ref(), &serde_json::to_string(value)?)
    }
}
