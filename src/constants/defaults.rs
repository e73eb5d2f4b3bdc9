use std::time::Duration;

pub const LOG_LEVEL: &str = "INFO";
pub const SERIAL_PORT: &str = "/dev/ttyACM0";
pub const BAUD_RATE: u32 = 9600;
pub const LISTEN_ADDR: &str = "0.0.0.0:5000";

/// Bounded wait for one line from the device
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);
/// Wait before retrying a failed device open
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);
/// Pause between read attempts on a live connection
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);
