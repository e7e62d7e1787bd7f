//! # File-backed Graph Storage
//!
//! Persists the whole graph as one JSON document.
//!
//! Every flush writes `<path>.tmp`, syncs it, then renames it over `<path>`,
//! so a crash mid-write leaves either the old file or the new one, never a
//! torn mix.

use crate::RelatticeError;
use crate::formats::{GraphDocument, document_from_bytes, document_to_bytes};
use crate::primitives::{MAX_PERSISTENCE_PAYLOAD_SIZE, TEMP_SUFFIX};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// A single-file JSON store.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    /// Treat a missing file as an empty first-run graph.
    create_if_missing: bool,
    /// Pretty-print the JSON.
    pretty: bool,
}

impl FileStore {
    /// Create a store for `path`. Nothing is touched on disk yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            create_if_missing: true,
            pretty: false,
        }
    }

    /// Set whether a missing file is tolerated.
    #[must_use]
    pub fn create_if_missing(mut self, allow: bool) -> Self {
        self.create_if_missing = allow;
        self
    }

    /// Set whether the file is pretty-printed.
    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored document.
    ///
    /// Returns `Ok(None)` for a missing file when `create_if_missing` is set.
    /// A file that exists but cannot be read or parsed is always an error.
    pub fn load(&self) -> Result<Option<GraphDocument>, RelatticeError> {
        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if self.create_if_missing {
                    tracing::warn!(path = %self.path.display(), "storage file missing, starting empty");
                    return Ok(None);
                }
                return Err(RelatticeError::StorageMissing(self.path.clone()));
            }
            Err(e) => return Err(io_error("stat", &self.path, &e)),
        };

        if metadata.len() > MAX_PERSISTENCE_PAYLOAD_SIZE {
            return Err(RelatticeError::DeserializationError(format!(
                "{} is {} bytes, maximum allowed is {} bytes",
                self.path.display(),
                metadata.len(),
                MAX_PERSISTENCE_PAYLOAD_SIZE
            )));
        }

        let bytes = fs::read(&self.path).map_err(|e| io_error("read", &self.path, &e))?;
        document_from_bytes(&bytes).map(Some)
    }

    /// Atomically replace the stored document.
    pub fn flush(&self, document: &GraphDocument) -> Result<(), RelatticeError> {
        let bytes = document_to_bytes(document, self.pretty)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| io_error("create dir", parent, &e))?;
        }

        let tmp = self.temp_path();
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)
            .map_err(|e| io_error("open", &tmp, &e))?;
        file.write_all(&bytes)
            .map_err(|e| io_error("write", &tmp, &e))?;
        file.sync_all().map_err(|e| io_error("sync", &tmp, &e))?;
        drop(file);

        fs::rename(&tmp, &self.path).map_err(|e| io_error("rename", &self.path, &e))?;
        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "graph flushed");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(TEMP_SUFFIX);
        PathBuf::from(tmp)
    }
}

fn io_error(action: &str, path: &Path, err: &std::io::Error) -> RelatticeError {
    RelatticeError::IoError(format!("{} {}: {}", action, path.display(), err))
}

// =============================================================================
// TESTS
// =============================================================================
