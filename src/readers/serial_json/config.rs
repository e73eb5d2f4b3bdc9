//! Static configuration for the serial device and the ingestion loop timing

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::constants::{defaults, envvars};

#[derive(Error, Debug, PartialEq)]
pub enum DeviceConfigError {
    #[error("invalid baud rate '{0}'")]
    BaudRate(String),
}

/// Where and how to open the device
#[derive(Clone, Debug, PartialEq)]
pub struct SerialDeviceConfig {
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout: Duration,
}

impl SerialDeviceConfig {
    /// Build from environment, with explicit values taking precedence
    pub fn from_env(
        port: Option<String>,
        baud_rate: Option<u32>,
    ) -> Result<Self, DeviceConfigError> {
        let port = port
            .or_else(|| env::var(envvars::SERIAL_PORT).ok())
            .unwrap_or_else(|| defaults::SERIAL_PORT.to_string());

        let baud_rate = match baud_rate {
            Some(baud) => baud,
            None => match env::var(envvars::BAUD_RATE) {
                Ok(raw) => parse_baud_rate(&raw)?,
                Err(_) => defaults::BAUD_RATE,
            },
        };

        Ok(SerialDeviceConfig {
            port,
            baud_rate,
            read_timeout: defaults::READ_TIMEOUT,
        })
    }
}

pub fn parse_baud_rate(raw: &str) -> Result<u32, DeviceConfigError> {
    match raw.trim().parse::<u32>() {
        Ok(baud) if baud > 0 => Ok(baud),
        _ => Err(DeviceConfigError::BaudRate(raw.to_string())),
    }
}

/// Delays used by the ingestion loop
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoopTiming {
    pub reconnect_delay: Duration,
    pub poll_interval: Duration,
}

impl Default for LoopTiming {
    fn default() -> Self {
        LoopTiming {
            reconnect_delay: defaults::RECONNECT_DELAY,
            poll_interval: defaults::POLL_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_values_win() {
        let config = SerialDeviceConfig::from_env(Some("/dev/ttyUSB3".into()), Some(115200)).unwrap();
        assert_eq!(config.port, "/dev/ttyUSB3");
        assert_eq!(config.baud_rate, 115200);
        assert_eq!(config.read_timeout, defaults::READ_TIMEOUT);
    }

    #[test]
    fn baud_rate_must_be_positive_integer() {
        assert_eq!(parse_baud_rate(" 9600 "), Ok(9600));
        assert!(parse_baud_rate("0").is_err());
        assert!(parse_baud_rate("fast").is_err());
    }

    #[test]
    fn default_timing_matches_reference_behaviour() {
        let timing = LoopTiming::default();
        assert_eq!(timing.reconnect_delay, Duration::from_secs(5));
        assert_eq!(timing.poll_interval, Duration::from_millis(100));
    }
}
