use std::str::{from_utf8, Utf8Error};

use serde_json::Value;
use thiserror::Error;

use super::models::RawReading;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("line is not valid UTF-8: {0}")]
    Encoding(#[from] Utf8Error),
    #[error("malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Parse one line of device output.
///
/// Blank lines yield `Ok(None)`; they are skipped rather than reported.
pub fn parse_line(raw: &[u8]) -> Result<Option<RawReading>, ParseError> {
    let line = from_utf8(raw)?.trim();
    if line.is_empty() {
        return Ok(None);
    }

    match serde_json::from_str::<Value>(line)? {
        Value::Object(map) => Ok(Some(map)),
        other => Err(ParseError::NotAnObject(json_kind(&other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_object_with_surrounding_whitespace() {
        let reading = parse_line(b"  {\"temperature\": 22.5, \"sound\": 900}\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(reading.get("temperature"), Some(&json!(22.5)));
        assert_eq!(reading.get("sound"), Some(&json!(900)));
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert!(parse_line(b"").unwrap().is_none());
        assert!(parse_line(b" \t\r\n").unwrap().is_none());
    }

    #[test]
    fn truncated_json_is_malformed() {
        assert!(matches!(
            parse_line(b"{not json"),
            Err(ParseError::Malformed(_))
        ));
    }

    #[test]
    fn non_object_json_is_rejected() {
        assert!(matches!(
            parse_line(b"[1, 2, 3]"),
            Err(ParseError::NotAnObject("an array"))
        ));
    }

    #[test]
    fn invalid_utf8_is_an_encoding_error() {
        assert!(matches!(
            parse_line(&[b'{', 0xff, b'}']),
            Err(ParseError::Encoding(_))
        ));
    }
}
