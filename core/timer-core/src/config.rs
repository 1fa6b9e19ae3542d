//! Configuration loading and saving.
//!
//! `config.json` is optional. A missing or malformed file yields defaults so a
//! bad edit never keeps the timer from starting.

use fs_err as fs;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, TimerError};
use crate::storage::StorageConfig;
use crate::store::atomic_write;
use crate::tick::DEFAULT_SAVE_INTERVAL;

pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;

/// Tick and save cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Save every N ticks.
    pub save_interval_ticks: u32,
    /// Wall-clock length of one tick.
    pub tick_interval_ms: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            save_interval_ticks: DEFAULT_SAVE_INTERVAL,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

/// Reads the config file, reporting why it could not be used.
pub fn read_config(storage: &StorageConfig) -> Result<Option<TimerConfig>> {
    let path = storage.config_file();
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(TimerError::io(format!("reading {}", path.display()), err)),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| TimerError::Config {
            path,
            details: e.to_string(),
        })
}

/// Loads the configuration, returning defaults if the file is absent or bad.
pub fn load_config(storage: &StorageConfig) -> TimerConfig {
    match read_config(storage) {
        Ok(config) => config.unwrap_or_default(),
        Err(err) => {
            warn!(error = %err, "Using default configuration");
            TimerConfig::default()
        }
    }
}

pub fn save_config(storage: &StorageConfig, config: &TimerConfig) -> Result<()> {
    let root = storage.root();
    fs::create_dir_all(root)
        .map_err(|e| TimerError::io(format!("creating {}", root.display()), e))?;
    let content = serde_json::to_string_pretty(config).map_err(|e| TimerError::Json {
        context: "serializing config".to_string(),
        source: e,
    })?;
    atomic_write(&storage.config_file(), &content)
}
