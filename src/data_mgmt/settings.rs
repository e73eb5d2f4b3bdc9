use std::sync::{Mutex, PoisonError, RwLock};

use kvstore::{KVDb, KVStoreError};
use serde_json::Value;
use thiserror::Error;

use crate::constants::keys;

use super::models::{SensorConfig, SensorField};

#[derive(Error, Debug, PartialEq)]
pub enum InvalidConfig {
    #[error("settings must be a JSON object")]
    NotAnObject,
    #[error("unknown sensor field '{0}'")]
    UnknownField(String),
    #[error("value for '{0}' must be a boolean")]
    NotBoolean(String),
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error(transparent)]
    Invalid(#[from] InvalidConfig),
    #[error("could not persist settings: {0}")]
    Persist(#[from] KVStoreError),
}

/// Holder of the single active `SensorConfig`.
///
/// Readers get a copy taken under a read lock, so they never see a half-applied
/// update. Writers are serialized by the write lock, which is held while the new
/// configuration is persisted.
pub struct ConfigStore {
    current: RwLock<SensorConfig>,
    kvs: Option<Mutex<KVDb>>,
}

impl ConfigStore {
    /// Volatile store starting from the all-enabled default
    pub fn in_memory() -> Self {
        ConfigStore {
            current: RwLock::new(SensorConfig::default()),
            kvs: None,
        }
    }

    /// Load the persisted configuration, writing the default on first boot
    pub fn load_or_default(kvs: KVDb) -> Result<Self, KVStoreError> {
        let config = match kvs.get::<SensorConfig>(keys::SETTINGS)? {
            Some(config) => config,
            None => {
                log::info!("No stored settings; initializing with all sensors enabled");
                let config = SensorConfig::default();
                kvs.set(keys::SETTINGS, &config)?;
                config
            }
        };

        Ok(ConfigStore {
            current: RwLock::new(config),
            kvs: Some(Mutex::new(kvs)),
        })
    }

    pub fn get(&self) -> SensorConfig {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Swap in the configuration described by `payload`.
    ///
    /// Every key must name a sensor field and every value must be a boolean.
    /// Fields not mentioned are disabled. On any error the active
    /// configuration is left untouched.
    pub fn replace(&self, payload: &Value) -> Result<SensorConfig, SettingsError> {
        let mut next = SensorConfig::all_disabled();
        for (field, enabled) in parse_update(payload)? {
            next.set(field, enabled);
        }

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(kvs) = &self.kvs {
            kvs.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .set(keys::SETTINGS, &next)?;
        }

        *current = next;
        log::info!("Sensor settings updated: {:?}", next);
        Ok(next)
    }
}

fn parse_update(payload: &Value) -> Result<Vec<(SensorField, bool)>, InvalidConfig> {
    let map = payload.as_object().ok_or(InvalidConfig::NotAnObject)?;
    map.iter()
        .map(|(name, value)| -> Result<(SensorField, bool), InvalidConfig> {
            let field = name
                .parse::<SensorField>()
                .map_err(|_| InvalidConfig::UnknownField(name.clone()))?;
            let enabled = value
                .as_bool()
                .ok_or_else(|| InvalidConfig::NotBoolean(name.clone()))?;
            Ok((field, enabled))
        })
        .collect()
}
