//! Turns a parsed device line into an accepted reading.
//!
//! Two steps, both free of I/O: project the raw map onto the enabled fields,
//! then validate every remaining field. A single bad field rejects the whole
//! reading; no subset is ever kept.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use super::models::{FieldValue, FilteredReading, RawReading, SensorConfig, SensorField, SensorReading};
use super::validate::validate;

#[derive(Error, Debug, PartialEq)]
#[error("value {value} is not valid for field '{field}'")]
pub struct ValidationFailure {
    pub field: SensorField,
    pub value: Value,
}

/// Keep only the keys that name a field enabled in `config`, and stamp the result
pub fn project(raw: &RawReading, config: &SensorConfig, timestamp: DateTime<Utc>) -> FilteredReading {
    let fields = raw
        .iter()
        .filter_map(|(name, value)| {
            let field = name.parse::<SensorField>().ok()?;
            config.is_enabled(field).then(|| (field, value.clone()))
        })
        .collect();

    FilteredReading { timestamp, fields }
}

/// Validate every field of `filtered`, all or nothing
pub fn accept(filtered: FilteredReading) -> Result<SensorReading, ValidationFailure> {
    let mut fields = BTreeMap::new();
    for (field, value) in filtered.fields {
        if !validate(field, &value) {
            return Err(ValidationFailure { field, value });
        }
        if let Some(typed) = FieldValue::from_raw(field, &value) {
            fields.insert(field, typed);
        }
    }

    Ok(SensorReading {
        timestamp: filtered.timestamp,
        fields,
    })
}
