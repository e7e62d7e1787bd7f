//! # Storage Module
//!
//! Where an engine keeps its state between process runs.
//!
//! - `InMemory`: nothing is written; state dies with the process
//! - `File`: one JSON document per engine, rewritten atomically on every flush

mod file_store;

pub use file_store::FileStore;

use crate::RelatticeError;
use crate::formats::GraphDocument;
use std::path::Path;

/// Storage backend for an engine.
#[derive(Debug, Default)]
pub enum StorageBackend {
    /// Volatile; flushes are no-ops.
    #[default]
    InMemory,
    /// Single-file JSON persistence.
    File(FileStore),
}

impl StorageBackend {
    /// Read the persisted document, if there is one.
    pub fn load(&self) -> Result<Option<GraphDocument>, RelatticeError> {
        match self {
            Self::InMemory => Ok(None),
            Self::File(store) => store.load(),
        }
    }

    /// Write the full document.
    pub fn flush(&self, document: &GraphDocument) -> Result<(), RelatticeError> {
        match self {
            Self::InMemory => Ok(()),
            Self::File(store) => store.flush(document),
        }
    }

    /// The backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::InMemory => None,
            Self::File(store) => Some(store.path()),
        }
    }

    /// Check if writes reach disk.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::File(_))
    }
}
