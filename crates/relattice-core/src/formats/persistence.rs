//! # Persistence Format
//!
//! JSON document layout for Relattice graphs.
//!
//! ```text
//! {
//!   "version": 1,
//!   "nodes":   { "<id>": <state>, ... },
//!   "edges":   [ { "source", "kind", "target", "metadata" }, ... ],
//!   "history": [ { "seq", "state" }, ... ],   // omitted when empty
//!   ...                                       // unknown fields, kept verbatim
//! }
//! ```
//!
//! Unknown top-level fields survive a load/flush cycle. Unknown fields
//! inside an edge record are dropped.
//!
//! ## Validation
//!
//! Everything that can be checked before building a graph is checked:
//! - Payload size limit (`MAX_PERSISTENCE_PAYLOAD_SIZE`), before parsing
//! - Format version
//! - Referential integrity of every edge

use crate::graph::{Graph, GraphStore};
use crate::history::{AuditLog, HistoryEntry};
use crate::primitives::{FORMAT_VERSION, MAX_PERSISTENCE_PAYLOAD_SIZE};
use crate::{Edge, NodeId, RelatticeError, State};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level fields this version does not understand.
pub type ExtraFields = BTreeMap<String, serde_json::Value>;

/// Serializable snapshot of the full engine state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default = "legacy_version")]
    pub version: u32,
    #[serde(default)]
    pub nodes: BTreeMap<NodeId, State>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryEntry>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Documents written before the `version` field existed.
fn legacy_version() -> u32 {
    1
}

impl Default for GraphDocument {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            history: Vec::new(),
            extra: ExtraFields::new(),
        }
    }
}

impl GraphDocument {
    /// Snapshot a graph, its audit log and any carried-over fields.
    #[must_use]
    pub fn capture(graph: &Graph, history: &AuditLog, extra: &ExtraFields) -> Self {
        Self {
            version: FORMAT_VERSION,
            nodes: graph
                .nodes()
                .map(|node| (node.id.clone(), node.state.clone()))
                .collect(),
            edges: graph.edges().cloned().collect(),
            history: history.entries().to_vec(),
            extra: extra.clone(),
        }
    }

    /// Rebuild the in-memory structures.
    ///
    /// An edge naming a node absent from `nodes` makes the whole document
    /// invalid; it is never silently dropped.
    pub fn into_parts(self) -> Result<(Graph, AuditLog, ExtraFields), RelatticeError> {
        let mut graph = Graph::new();
        for (id, state) in self.nodes {
            graph.add_node(id, state);
        }

        for (position, edge) in self.edges.into_iter().enumerate() {
            graph.add_edge(edge, false).map_err(|e| {
                RelatticeError::DeserializationError(format!("edge #{}: {}", position, e))
            })?;
        }

        Ok((graph, AuditLog::from_entries(self.history), self.extra))
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a document to bytes.
///
/// This is a pure transformation - no file I/O.
pub fn document_to_bytes(document: &GraphDocument, pretty: bool) -> Result<Vec<u8>, RelatticeError> {
    let encoded = if pretty {
        serde_json::to_vec_pretty(document)
    } else {
        serde_json::to_vec(document)
    };
    encoded.map_err(|e| RelatticeError::SerializationError(e.to_string()))
}

/// Deserialize a document from bytes.
///
/// This is a pure transformation - no file I/O. The size limit is enforced
/// before any parsing happens.
pub fn document_from_bytes(bytes: &[u8]) -> Result<GraphDocument, RelatticeError> {
    if bytes.len() as u64 > MAX_PERSISTENCE_PAYLOAD_SIZE {
        return Err(RelatticeError::DeserializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_PERSISTENCE_PAYLOAD_SIZE
        )));
    }

    let document: GraphDocument = serde_json::from_slice(bytes).map_err(|e| {
        RelatticeError::DeserializationError(format!("Failed to parse graph document: {}", e))
    })?;

    if document.version > FORMAT_VERSION {
        return Err(RelatticeError::DeserializationError(format!(
            "Unsupported version: {} (expected at most {})",
            document.version, FORMAT_VERSION
        )));
    }

    Ok(document)
}

// =============================================================================
// TESTS
// =============================================================================
