#![allow(dead_code)]
// Each integration test binary uses a different subset of these

pub const ALL_FIELDS: &[u8] = br#"{"temperature": 22.5, "humidity": 40, "movement": "not-detected", "sound": 310, "light": 512, "distance": 87.2}"#;
pub const TEMPERATURE_OUT_OF_RANGE: &[u8] = br#"{"temperature": 85, "humidity": 50}"#;
pub const MALFORMED: &[u8] = b"{not json";

/// A valid line whose `sound` value identifies it
pub fn tagged(sound: u32) -> Vec<u8> {
    format!(r#"{{"humidity": 40.5, "sound": {sound}, "movement": "detected"}}"#).into_bytes()
}
