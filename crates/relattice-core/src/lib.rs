//! # relattice-core
//!
//! A relational lattice graph engine: typed nodes carrying opaque JSON
//! state, labeled directed edges, and the reasoning that runs over them.
//!
//! ## Layers
//!
//! - `graph` / `index`: the node table and the indexed edge multiset
//! - `lattice`: subsumption over `IS_A` (entails, meet, compare)
//! - `provenance`: derivation chains over `DERIVES_FROM`
//! - `traversal`: kind-agnostic BFS, shortest paths, components
//! - `formats` / `storage`: single-file JSON persistence, atomic writes
//! - `engine`: the facade, with flush-on-write and the audit log
//!
//! ## Guarantees
//!
//! - No edge ever names a missing node, not even mid-delete
//! - Every walk keeps a visited set, so cycles terminate
//! - All iteration orders are deterministic (`BTreeMap`/`BTreeSet`)
//! - The library never installs a `tracing` subscriber

// =============================================================================
// MODULES
// =============================================================================

pub mod config;
pub mod engine;
pub mod formats;
pub mod graph;
pub mod history;
pub mod index;
pub mod lattice;
pub mod primitives;
pub mod protocol;
pub mod provenance;
pub mod query;
pub mod shared;
pub mod storage;
pub mod traversal;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Direction, Edge, EdgeKey, EdgeKind, Endpoint, Metadata, Node, NodeId, RelatticeError, State,
};

// =============================================================================
// RE-EXPORTS: Graph Engine
// =============================================================================

pub use config::EngineConfig;
pub use engine::Engine;
pub use graph::{Graph, GraphStore};
pub use history::{AuditLog, HistoryEntry};
pub use index::EdgeIndex;
pub use lattice::{LatticeAlgebra, Relation};
pub use protocol::DataAgent;
pub use provenance::Provenance;
pub use query::{Query, QueryResult};
pub use shared::SharedEngine;
pub use traversal::{Subgraph, Traversal};

// =============================================================================
// RE-EXPORTS: Persistence
// =============================================================================

pub use formats::{ExtraFields, GraphDocument, document_from_bytes, document_to_bytes};
pub use storage::{FileStore, StorageBackend};
