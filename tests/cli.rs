use std::ffi::OsStr;

use assert_cmd::{assert::Assert, Command};
use predicates::prelude::*;
use serde_json::{json, Value};

fn sensorhub_assert(data_dir: impl AsRef<OsStr>, subcommand: &str) -> Assert {
    let mut cmd = Command::cargo_bin("sensorhub").unwrap();
    cmd.env("SENSORHUB_DATA_DIR", data_dir)
        .arg(subcommand)
        .assert()
}

fn stdout_json(assert: Assert) -> Value {
    let output = assert.success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn settings_default_to_all_enabled() {
    let tempdir = tempfile::tempdir().unwrap();

    let value = stdout_json(sensorhub_assert(tempdir.path(), "settings"));
    assert_eq!(
        value,
        json!({
            "temperature": true,
            "humidity": true,
            "movement": true,
            "sound": true,
            "light": true,
            "distance": true
        })
    );
    assert!(tempdir.path().join("kvs-db/kvstore.db").exists());
}

#[test]
fn current_is_empty_object_before_first_reading() {
    let tempdir = tempfile::tempdir().unwrap();

    sensorhub_assert(tempdir.path(), "current")
        .success()
        .stdout("{}");
}

#[test]
fn current_prints_latest_stored_reading() {
    use sensorhub::data_mgmt::{
        models::{FieldValue, SensorField},
        ReadingStore, SensorReading, SqliteReadingStore,
    };
    use std::collections::BTreeMap;

    let tempdir = tempfile::tempdir().unwrap();
    let store = SqliteReadingStore::open(tempdir.path().join("readings.db")).unwrap();
    for (secs, sound) in [(1_700_000_000, 100), (1_700_000_060, 200)] {
        store
            .insert(&SensorReading {
                timestamp: chrono::DateTime::from_timestamp(secs, 0).unwrap(),
                fields: BTreeMap::from([(SensorField::Sound, FieldValue::Int(sound))]),
            })
            .unwrap();
    }

    let value = stdout_json(sensorhub_assert(tempdir.path(), "current"));
    assert_eq!(value, json!({"timestamp": "2023-11-14T22:14:20Z", "sound": 200}));
}

#[test]
fn unknown_subcommand_fails() {
    let tempdir = tempfile::tempdir().unwrap();

    sensorhub_assert(tempdir.path(), "kvs-get")
        .failure()
        .stdout("")
        .stderr(predicate::str::contains(
            "Subcommand must be one of 'run', 'settings', 'current'",
        ));
}
