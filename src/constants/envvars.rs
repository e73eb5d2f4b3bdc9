pub const LOG_LEVEL: &str = "LOGGING_LEVEL";

pub const SERIAL_PORT: &str = "SENSORHUB_SERIAL_PORT";
pub const BAUD_RATE: &str = "SENSORHUB_BAUD_RATE";
pub const LISTEN_ADDR: &str = "SENSORHUB_LISTEN_ADDR";
pub const DATA_DIR: &str = "SENSORHUB_DATA_DIR";
