use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One of the six quantities reported by the device
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorField {
    Temperature,
    Humidity,
    Movement,
    Sound,
    Light,
    Distance,
}

impl SensorField {
    pub const ALL: [SensorField; 6] = [
        SensorField::Temperature,
        SensorField::Humidity,
        SensorField::Movement,
        SensorField::Sound,
        SensorField::Light,
        SensorField::Distance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorField::Temperature => "temperature",
            SensorField::Humidity => "humidity",
            SensorField::Movement => "movement",
            SensorField::Sound => "sound",
            SensorField::Light => "light",
            SensorField::Distance => "distance",
        }
    }
}

impl fmt::Display for SensorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SensorField::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("unknown sensor field '{s}'"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum MovementState {
    #[serde(rename = "detected")]
    Detected,
    #[serde(rename = "not-detected")]
    NotDetected,
}

impl MovementState {
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "detected" => Some(MovementState::Detected),
            "not-detected" => Some(MovementState::NotDetected),
            _ => None,
        }
    }
}

/// A typed field value, as stored
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Float(f64),
    Int(i64),
    Movement(MovementState),
}

impl FieldValue {
    /// Interpret a raw JSON value as the type `field` carries.
    ///
    /// Numeric fields also take numeric strings, and integer fields truncate
    /// fractional numbers toward zero. Returns `None` on a type mismatch; range
    /// is not checked here.
    pub fn from_raw(field: SensorField, raw: &Value) -> Option<Self> {
        match field {
            SensorField::Temperature | SensorField::Humidity | SensorField::Distance => {
                decimal(raw).map(FieldValue::Float)
            }
            SensorField::Sound | SensorField::Light => truncated(raw).map(FieldValue::Int),
            SensorField::Movement => raw
                .as_str()
                .and_then(MovementState::from_wire)
                .map(FieldValue::Movement),
        }
    }
}

fn decimal(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn truncated(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Unvalidated field map straight off the wire
pub type RawReading = serde_json::Map<String, Value>;

/// Enabled fields of one line, timestamped but not yet validated
#[derive(Clone, Debug, PartialEq)]
pub struct FilteredReading {
    pub timestamp: DateTime<Utc>,
    pub fields: BTreeMap<SensorField, Value>,
}

/// An accepted reading as persisted and served
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SensorReading {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: BTreeMap<SensorField, FieldValue>,
}

/// Per-field enable flags. Missing flags in a stored document default to enabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SensorConfig {
    pub temperature: bool,
    pub humidity: bool,
    pub movement: bool,
    pub sound: bool,
    pub light: bool,
    pub distance: bool,
}

impl SensorConfig {
    pub fn all_disabled() -> Self {
        SensorConfig {
            temperature: false,
            humidity: false,
            movement: false,
            sound: false,
            light: false,
            distance: false,
        }
    }

    pub fn is_enabled(&self, field: SensorField) -> bool {
        match field {
            SensorField::Temperature => self.temperature,
            SensorField::Humidity => self.humidity,
            SensorField::Movement => self.movement,
            SensorField::Sound => self.sound,
            SensorField::Light => self.light,
            SensorField::Distance => self.distance,
        }
    }

    pub fn set(&mut self, field: SensorField, enabled: bool) {
        let flag = match field {
            SensorField::Temperature => &mut self.temperature,
            SensorField::Humidity => &mut self.humidity,
            SensorField::Movement => &mut self.movement,
            SensorField::Sound => &mut self.sound,
            SensorField::Light => &mut self.light,
            SensorField::Distance => &mut self.distance,
        };
        *flag = enabled;
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        SensorConfig {
            temperature: true,
            humidity: true,
            movement: true,
            sound: true,
            light: true,
            distance: true,
        }
    }
}
