// Keys in the settings key-value store
pub const SETTINGS: &str = "settings";
