use std::path::PathBuf;

use crate::helpers::base_path;

/// Load `./.env`, then `$SENSORHUB_DATA_DIR/.env`. Returns the files that were read.
///
/// Runs before logging is set up, so the caller reports what was loaded.
pub fn load_dotenv() -> Vec<PathBuf> {
    let mut loaded = Vec::new();
    if let Ok(path) = dotenv::dotenv() {
        loaded.push(path);
    }
    let data_dir_dotenv = base_path::DATA_DIR.join(".env");
    if dotenv::from_path(&data_dir_dotenv).is_ok() {
        loaded.push(data_dir_dotenv);
    }
    loaded
}
