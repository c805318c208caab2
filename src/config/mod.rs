//! Configuration loading and management

use crate::core::error::{LedgerError, LedgerResult};
use crate::core::keyspace::validate_key;
use crate::invoice::{DEFAULT_PREFIX, DEFAULT_SEED_KEY};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which state store backend to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    InMemory,
    Lmdb,
}

/// State store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Environment directory, required for `lmdb`
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// LMDB map size in megabytes
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,
}

fn default_map_size_mb() -> usize {
    256
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: None,
            map_size_mb: default_map_size_mb(),
        }
    }
}

#[cfg(feature = "lmdb")]
impl StorageConfig {
    /// Open the LMDB environment described by this config
    pub fn open_lmdb(&self) -> LedgerResult<crate::storage::LmdbStateStore> {
        let path = self.path.as_ref().ok_or_else(|| LedgerError::Config {
            message: "storage.path is required for the lmdb backend".to_string(),
        })?;
        let options = crate::storage::LmdbOptions {
            map_size_mb: self.map_size_mb,
            ..Default::default()
        };
        Ok(crate::storage::LmdbStateStore::open_with(path, &options)?)
    }
}

/// Where invoice records live in the key space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeySpaceConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default = "default_seed_key")]
    pub seed_key: String,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_seed_key() -> String {
    DEFAULT_SEED_KEY.to_string()
}

impl Default for KeySpaceConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            seed_key: default_seed_key(),
        }
    }
}

/// Record event bus settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Broadcast buffer size; slow subscribers past this lag and lose events
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    1024
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

/// Complete configuration for the invoice ledger
///
/// Every section is optional in YAML; missing sections take their defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub key_space: KeySpaceConfig,

    #[serde(default)]
    pub events: EventsConfig,
}

impl LedgerConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration for testing
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Check the settings are consistent with each other
    pub fn validate(&self) -> LedgerResult<()> {
        let invalid = |message: String| Err(LedgerError::Config { message });

        if self.key_space.prefix.is_empty() {
            return invalid("key_space.prefix must not be empty".to_string());
        }
        if let Err(e) = validate_key(&self.key_space.seed_key) {
            return invalid(format!("key_space.seed_key: {}", e));
        }
        if !self.key_space.seed_key.starts_with(&self.key_space.prefix) {
            return invalid(format!(
                "key_space.seed_key '{}' is outside prefix '{}'",
                self.key_space.seed_key, self.key_space.prefix
            ));
        }
        if self.events.capacity == 0 {
            return invalid("events.capacity must be at least 1".to_string());
        }
        if self.storage.backend == StorageBackend::Lmdb {
            if self.storage.path.is_none() {
                return invalid("storage.path is required for the lmdb backend".to_string());
            }
            if self.storage.map_size_mb == 0 {
                return invalid("storage.map_size_mb must be at least 1".to_string());
            }
        }
        Ok(())
    }
}
