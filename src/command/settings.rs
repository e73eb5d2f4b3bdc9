use anyhow::Result;
use kvstore::KVDb;

use crate::data_mgmt::ConfigStore;
use crate::interfaces::kvpath;

/// Print the persisted sensor settings, initializing them on first use
pub fn settings() -> Result<()> {
    let kvs = KVDb::new(kvpath::SQLITE_STORE.as_path())?;
    let store = ConfigStore::load_or_default(kvs)?;
    print!("{}", serde_json::to_string(&store.get())?);
    Ok(())
}
