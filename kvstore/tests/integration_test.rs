use kvstore::{KVDb, KVStoreError};
use serde::{Deserialize, Serialize};

const SQLITE_FILE: &str = "kvs-db/kvstore.db";

#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct Flags {
    name: String,
    enabled: Vec<bool>,
    revision: u64,
}

#[test]
fn value_survives_reopen() -> Result<(), KVStoreError> {
    let tempdir = tempfile::tempdir()?;
    let sqlite_db = tempdir.path().join(SQLITE_FILE);

    let db = KVDb::new(&sqlite_db)?;
    let flags = Flags {
        name: String::from("bench"),
        enabled: vec![true, false, true],
        revision: 3,
    };
    db.set("flags", &flags)?;
    drop(db);

    let db2 = KVDb::new(&sqlite_db)?;
    let flags2: Flags = db2.get("flags")?.expect("value should persist");
    assert_eq!(flags2, flags);
    Ok(())
}

#[test]
fn two_connections_see_each_others_writes() -> Result<(), KVStoreError> {
    let tempdir = tempfile::tempdir()?;
    let sqlite_db = tempdir.path().join(SQLITE_FILE);

    let writer = KVDb::new(&sqlite_db)?;
    let reader = KVDb::new(&sqlite_db)?;

    writer.set("revision", &7u64)?;
    assert_eq!(reader.get::<u64>("revision")?, Some(7));
    Ok(())
}
