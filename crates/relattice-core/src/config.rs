//! # Engine Configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! storage_path = "data/graph.json"   # omit for an in-memory engine
//! create_if_missing = true
//! id_prefix = "node"
//! max_traversal_depth = 100
//! pretty = false
//! ```

use crate::RelatticeError;
use crate::primitives::{DEFAULT_ID_PREFIX, MAX_TRAVERSAL_DEPTH};
use crate::storage::{FileStore, StorageBackend};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Settings for opening an `Engine`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Backing file. `None` keeps everything in memory.
    #[serde(default)]
    pub storage_path: Option<PathBuf>,

    /// Treat a missing storage file as a first run instead of an error.
    #[serde(default = "default_create_if_missing")]
    pub create_if_missing: bool,

    /// Prefix for ids generated by `save`.
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,

    /// Hard cap on `traverse` depth.
    #[serde(default = "default_max_traversal_depth")]
    pub max_traversal_depth: usize,

    /// Pretty-print the persisted JSON.
    #[serde(default)]
    pub pretty: bool,
}

fn default_create_if_missing() -> bool {
    true
}

fn default_id_prefix() -> String {
    DEFAULT_ID_PREFIX.to_string()
}

fn default_max_traversal_depth() -> usize {
    MAX_TRAVERSAL_DEPTH
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage_path: None,
            create_if_missing: default_create_if_missing(),
            id_prefix: default_id_prefix(),
            max_traversal_depth: default_max_traversal_depth(),
            pretty: false,
        }
    }
}

impl EngineConfig {
    /// Configuration for a volatile engine.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Configuration for an engine persisted at `path`.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, RelatticeError> {
        let config: Self =
            toml::from_str(source).map_err(|e| RelatticeError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RelatticeError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            RelatticeError::ConfigError(format!("read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&source)
    }

    /// Reject settings no engine can run with.
    pub fn validate(&self) -> Result<(), RelatticeError> {
        if self.id_prefix.is_empty() {
            return Err(RelatticeError::ConfigError(
                "id_prefix must not be empty".to_string(),
            ));
        }
        if self.max_traversal_depth == 0 {
            return Err(RelatticeError::ConfigError(
                "max_traversal_depth must be at least 1".to_string(),
            ));
        }
        if self.max_traversal_depth > MAX_TRAVERSAL_DEPTH {
            return Err(RelatticeError::ConfigError(format!(
                "max_traversal_depth {} exceeds the limit of {}",
                self.max_traversal_depth, MAX_TRAVERSAL_DEPTH
            )));
        }
        Ok(())
    }

    /// Build the storage backend these settings describe.
    #[must_use]
    pub fn backend(&self) -> StorageBackend {
        match &self.storage_path {
            Some(path) => StorageBackend::File(
                FileStore::new(path)
                    .create_if_missing(self.create_if_missing)
                    .pretty(self.pretty),
            ),
            None => StorageBackend::InMemory,
        }
    }
}
