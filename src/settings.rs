use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
    time::Duration,
};

use crate::{
    session::DEFAULT_HISTORY_CAPACITY,
    store::{FileStore, MemoryStore, Persistence, SqliteStore},
    timer::DEFAULT_TICK_INTERVAL,
};

pub const DATA_DIR_ENV: &str = "DEBATE_TIMER_DATA_DIR";
pub const STORAGE_ENV: &str = "DEBATE_TIMER_STORAGE";
pub const DEBUG_ENV: &str = "DEBATE_TIMER_DEBUG";

const CONFIG_FILE: &str = "config.json";
const SQLITE_FILE: &str = "debate-timer.sqlite3";
const APP_DIR_NAME: &str = "debate-timer";
const FALLBACK_DIR: &str = ".debate-timer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Sqlite,
    Memory,
}

impl StorageBackend {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "file" | "json" => Some(Self::File),
            "sqlite" | "db" => Some(Self::Sqlite),
            "memory" | "mem" => Some(Self::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub storage: StorageBackend,
    pub tick_interval_ms: u64,
    pub history_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::File,
            tick_interval_ms: DEFAULT_TICK_INTERVAL.as_millis() as u64,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl AppConfig {
    /// Zero would spin the ticker; clamp to 1ms.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn history_capacity(&self) -> usize {
        self.history_capacity.max(1)
    }

    /// Layers environment values over the file values. `lookup` is
    /// `std::env::var` outside tests.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(STORAGE_ENV) {
            match StorageBackend::parse(&raw) {
                Some(storage) => self.storage = storage,
                None => warn!("Ignoring {STORAGE_ENV}={raw}: expected file, sqlite or memory"),
            }
        }
    }
}

/// Read before the config file so the logger can be set up first.
pub fn debug_requested<F>(lookup: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(DEBUG_ENV).is_some_and(|raw| {
        matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
    })
}

/// Resolves the data directory: `DEBATE_TIMER_DATA_DIR`, then the platform's
/// local data dir, then `./.debate-timer`.
pub fn resolve_data_dir<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = lookup(DATA_DIR_ENV).filter(|dir| !dir.trim().is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::data_local_dir()
        .map(|base| base.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_DIR))
}

pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Builds the persistence backend the config asks for.
pub fn open_store(config: &AppConfig, data_dir: &Path) -> Result<Arc<dyn Persistence>> {
    let store: Arc<dyn Persistence> = match config.storage {
        StorageBackend::File => Arc::new(
            FileStore::new(data_dir.to_path_buf())
                .with_context(|| format!("failed to open file store in {}", data_dir.display()))?,
        ),
        StorageBackend::Sqlite => Arc::new(SqliteStore::new(data_dir.join(SQLITE_FILE))?),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<AppConfig>,
}

impl SettingsStore {
    /// Reads `config.json` from `data_dir`. Missing or garbled files fall back
    /// to defaults.
    pub fn new(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring unreadable {}: {err}", path.display());
                AppConfig::default()
            })
        } else {
            AppConfig::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> AppConfig {
        self.data
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn update(&self, config: AppConfig) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.persist(&config)?;
        *guard = config;
        Ok(())
    }

    fn persist(&self, data: &AppConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
