//! # Engine Primitives
//!
//! Hardcoded constants for the Relattice engine.
//! These are compiled into the binary and are immutable at runtime.

/// Current persisted document format version.
///
/// Increment this when making breaking changes to the file layout.
/// Files without a `version` field are read as version 1.
pub const FORMAT_VERSION: u32 = 1;

/// Maximum traversal depth for bounded BFS.
///
/// All queries must be computationally bounded. `EngineConfig` may lower
/// this, never raise it.
pub const MAX_TRAVERSAL_DEPTH: usize = 100;

/// Maximum allowed size of a persisted graph file.
///
/// Checked BEFORE deserialization so a corrupted or hostile file cannot
/// exhaust memory.
pub const MAX_PERSISTENCE_PAYLOAD_SIZE: u64 = 512 * 1024 * 1024; // 512 MB

/// Extension appended to the storage path for the write-then-rename step.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Default prefix for ids generated by `save`.
pub const DEFAULT_ID_PREFIX: &str = "node";
