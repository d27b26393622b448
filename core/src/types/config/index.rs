use super::BackendKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Database file name inside the configured directory.
pub const DB_FILE: &str = "nidx.redb";

/// Names index configuration, persisted as nidx.toml.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub backend: BackendKind,
    /// Directory holding the database file. Absent means in-memory.
    #[serde(default)]
    pub file: Option<PathBuf>,
    /// Number of reusable encoding buffers.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// Expected number of records, used to size the large backend.
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
    /// Reload from the authoritative source when counts disagree at startup.
    #[serde(default = "default_true")]
    pub verify: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            file: None,
            pool_size: default_pool_size(),
            max_entries: default_max_entries(),
            verify: default_true(),
        }
    }
}

impl IndexConfig {
    /// Returns the config file path within the given data directory.
    pub fn path(data_dir: &Path) -> PathBuf {
        data_dir.join("nidx.toml")
    }

    pub fn memory() -> Self {
        Self {
            backend: BackendKind::Memory,
            ..Self::default()
        }
    }

    pub fn embedded(dir: impl Into<PathBuf>) -> Self {
        Self {
            file: Some(dir.into()),
            ..Self::default()
        }
    }

    /// Database file inside the configured directory.
    pub fn db_path(&self) -> Option<PathBuf> {
        self.file.as_ref().map(|dir| dir.join(DB_FILE))
    }

    /// Loads config from a TOML file. Returns default config if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, IndexConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), IndexConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates config values and returns list of validation errors.
    /// Returns empty vec if config is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.pool_size == 0 {
            errors.push("pool_size must be at least 1".to_string());
        }

        if self.max_entries == 0 {
            errors.push("max_entries must be at least 1".to_string());
        }

        if self.backend == BackendKind::Memory && self.file.is_some() {
            errors.push("memory backend does not use a file location".to_string());
        }

        errors
    }

    /// Returns a validated config, replacing invalid values with defaults.
    pub fn with_defaults_for_invalid(&self) -> Self {
        let defaults = Self::default();
        Self {
            backend: self.backend,
            file: if self.backend == BackendKind::Memory {
                None
            } else {
                self.file.clone()
            },
            pool_size: if self.pool_size == 0 {
                defaults.pool_size
            } else {
                self.pool_size
            },
            max_entries: if self.max_entries == 0 {
                defaults.max_entries
            } else {
                self.max_entries
            },
            verify: self.verify,
        }
    }
}

fn default_pool_size() -> usize {
    8
}

fn default_max_entries() -> u64 {
    1_000_000
}

fn default_true() -> bool {
    true
}

/// Errors that can occur when loading or saving config.
#[derive(Debug, Error)]
pub enum IndexConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
