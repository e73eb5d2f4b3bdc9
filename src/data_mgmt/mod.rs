pub mod models;
pub mod parse;
pub mod process;
pub mod reading_store;
pub mod settings;
pub mod validate;

pub use models::{SensorConfig, SensorField, SensorReading};
pub use reading_store::{MemoryReadingStore, ReadingStore, SqliteReadingStore, StoreError};
pub use settings::{ConfigStore, InvalidConfig, SettingsError};
