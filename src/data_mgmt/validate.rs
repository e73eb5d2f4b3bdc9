use serde_json::Value;

use super::models::{FieldValue, SensorField};

const TEMPERATURE_RANGE: (f64, f64) = (-40.0, 80.0);
const HUMIDITY_RANGE: (f64, f64) = (0.0, 100.0);
const DISTANCE_RANGE: (f64, f64) = (0.0, 400.0);
const ANALOG_RANGE: (i64, i64) = (0, 1023);

/// Decide whether `value` is a well-typed, in-range value for `field`.
///
/// Never fails: type mismatches are reported as `false`.
pub fn validate(field: SensorField, value: &Value) -> bool {
    FieldValue::from_raw(field, value).is_some_and(|v| in_range(field, &v))
}

/// Range check on an already-typed value. Bounds are inclusive.
fn in_range(field: SensorField, value: &FieldValue) -> bool {
    match (field, value) {
        (SensorField::Temperature, FieldValue::Float(v)) => within(*v, TEMPERATURE_RANGE),
        (SensorField::Humidity, FieldValue::Float(v)) => within(*v, HUMIDITY_RANGE),
        (SensorField::Distance, FieldValue::Float(v)) => within(*v, DISTANCE_RANGE),
        (SensorField::Sound | SensorField::Light, FieldValue::Int(v)) => within(*v, ANALOG_RANGE),
        (SensorField::Movement, FieldValue::Movement(_)) => true,
        _ => false,
    }
}

fn within<T: PartialOrd>(v: T, (lo, hi): (T, T)) -> bool {
    lo <= v && v <= hi
}
