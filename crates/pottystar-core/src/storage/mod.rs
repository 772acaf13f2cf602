mod config;
pub mod database;
mod rewards;

pub use config::{AudioConfig, Config, TimerConfig};
pub use database::Database;
pub use rewards::{RewardCounter, STAR_COUNT_KEY};

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{ConfigError, DatabaseError};

/// Returns the data directory, creating it if needed.
///
/// `POTTYSTAR_DATA_DIR` wins when set. Otherwise `~/.config/pottystar[-dev]/`,
/// with the `-dev` suffix selected by `POTTYSTAR_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("POTTYSTAR_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("POTTYSTAR_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pottystar-dev")
            } else {
                base_dir.join("pottystar")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// String key-value persistence, the "local storage" of the app.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), DatabaseError>;
}

/// Non-persistent store for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.values.insert(key.to_string(), value.to_string());
        store
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
