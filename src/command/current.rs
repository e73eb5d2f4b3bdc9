use anyhow::Result;
use serde_json::{json, Value};

use crate::data_mgmt::{ReadingStore, SqliteReadingStore};
use crate::interfaces::kvpath;

/// Print the most recent stored reading, or `{}` if there is none yet
pub fn current() -> Result<()> {
    let store = SqliteReadingStore::open(kvpath::SQLITE_READINGS.as_path())?;
    let value: Value = match store.latest()? {
        Some(reading) => serde_json::to_value(reading)?,
        None => json!({}),
    };
    print!("{}", value);
    Ok(())
}
