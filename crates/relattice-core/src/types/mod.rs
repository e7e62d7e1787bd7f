//! # Core Type Definitions
//!
//! This module contains all core types for the Relattice graph engine:
//! - Node identifiers and payloads (`NodeId`, `State`, `Node`)
//! - Labeled edges (`EdgeKind`, `Edge`, `Metadata`, `Direction`)
//! - Error types (`RelatticeError`, `Endpoint`)
//!
//! ## Determinism Guarantees
//!
//! All key types implement `Ord` so that every index in the engine can be a
//! `BTreeMap`/`BTreeSet`, and iteration order never depends on hashing.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// NODE IDENTIFIERS & PAYLOADS
// =============================================================================

/// Opaque unique key of a node, caller-supplied or engine-generated.
///
/// `NodeId` borrows as `str`, so every map keyed by `NodeId` can be queried
/// with a plain `&str`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a node id from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&NodeId> for NodeId {
    fn from(id: &NodeId) -> Self {
        id.clone()
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller-defined node payload. The engine stores and persists it verbatim.
pub type State = serde_json::Value;

/// Arbitrary key-value mapping attached to an edge, never interpreted.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// A node in the graph: an id and its opaque state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub state: State,
}

impl Node {
    /// Create a new node.
    #[must_use]
    pub fn new(id: impl Into<NodeId>, state: State) -> Self {
        Self {
            id: id.into(),
            state,
        }
    }
}

// =============================================================================
// EDGE KINDS
// =============================================================================

/// Label of a directed edge.
///
/// The lattice algebra reads only `IsA`; provenance reads only `DerivesFrom`.
/// Every kind, including `Custom`, is visible to generic traversal.
///
/// Serialized as its upper snake-case name (`IS_A`, `DERIVES_FROM`, ...).
/// Any other name round-trips as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum EdgeKind {
    IsA,
    HasA,
    Uses,
    DerivesFrom,
    Contradicts,
    Synthesizes,
    RelatedTo,
    /// Open-set extension for kinds outside the fixed vocabulary.
    Custom(String),
}

impl EdgeKind {
    /// The wire name of this kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::IsA => "IS_A",
            Self::HasA => "HAS_A",
            Self::Uses => "USES",
            Self::DerivesFrom => "DERIVES_FROM",
            Self::Contradicts => "CONTRADICTS",
            Self::Synthesizes => "SYNTHESIZES",
            Self::RelatedTo => "RELATED_TO",
            Self::Custom(name) => name,
        }
    }
}

impl From<String> for EdgeKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "IS_A" => Self::IsA,
            "HAS_A" => Self::HasA,
            "USES" => Self::Uses,
            "DERIVES_FROM" => Self::DerivesFrom,
            "CONTRADICTS" => Self::Contradicts,
            "SYNTHESIZES" => Self::Synthesizes,
            "RELATED_TO" => Self::RelatedTo,
            _ => Self::Custom(s),
        }
    }
}

impl From<&str> for EdgeKind {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<EdgeKind> for String {
    fn from(kind: EdgeKind) -> Self {
        match kind {
            EdgeKind::Custom(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// EDGE
// =============================================================================

/// Identity of an edge. At most one physical edge exists per key.
pub type EdgeKey = (NodeId, EdgeKind, NodeId);

/// A labeled directed edge with opaque metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub kind: EdgeKind,
    pub target: NodeId,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Edge {
    /// Create an edge with empty metadata.
    #[must_use]
    pub fn new(source: impl Into<NodeId>, kind: EdgeKind, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            kind,
            target: target.into(),
            metadata: Metadata::new(),
        }
    }

    /// Attach metadata to the edge.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// The same edge pointing the other way. Kind and metadata are kept.
    #[must_use]
    pub fn reverse(&self) -> Self {
        Self {
            source: self.target.clone(),
            kind: self.kind.clone(),
            target: self.source.clone(),
            metadata: self.metadata.clone(),
        }
    }

    /// The (source, kind, target) identity of this edge.
    #[must_use]
    pub fn key(&self) -> EdgeKey {
        (self.source.clone(), self.kind.clone(), self.target.clone())
    }

    /// Check whether either endpoint is `id`.
    #[must_use]
    pub fn touches(&self, id: &str) -> bool {
        self.source == *id || self.target == *id
    }
}

/// Which incident edges of a node to select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Edges whose source is the node.
    Out,
    /// Edges whose target is the node.
    In,
    /// Union of `Out` and `In`.
    Both,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// The endpoint of an edge that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Source,
    Target,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Target => f.write_str("target"),
        }
    }
}

/// Errors that can occur in the Relattice engine.
///
/// - No silent failures
/// - Read-only graph queries never return an error for unknown ids
/// - Durability failures propagate immediately
#[derive(Debug, Error)]
pub enum RelatticeError {
    /// An edge endpoint does not exist. `endpoint` says which one.
    #[error("{endpoint} node not found: {id}")]
    NodeNotFound { endpoint: Endpoint, id: NodeId },

    /// The storage file is absent and the engine is not allowed to create it.
    #[error("storage file not found: {0}")]
    StorageMissing(PathBuf),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred (corrupt or unsupported file).
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// The configuration could not be parsed or is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A writer panicked while holding the shared engine lock.
    #[error("engine lock poisoned")]
    LockPoisoned,
}

impl RelatticeError {
    /// The missing endpoint, if this is a `NodeNotFound` error.
    #[must_use]
    pub fn endpoint(&self) -> Option<Endpoint> {
        match self {
            Self::NodeNotFound { endpoint, .. } => Some(*endpoint),
            _ => None,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_kind_wire_names() {
        assert_eq!(EdgeKind::IsA.as_str(), "IS_A");
        assert_eq!(EdgeKind::DerivesFrom.as_str(), "DERIVES_FROM");
        assert_eq!(EdgeKind::from("RELATED_TO"), EdgeKind::RelatedTo);
        assert_eq!(
            EdgeKind::from("PART_OF"),
            EdgeKind::Custom("PART_OF".to_string())
        );
    }

    #[test]
    fn edge_kind_serializes_as_string() {
        let json = serde_json::to_string(&EdgeKind::HasA).expect("serialize");
        assert_eq!(json, "\"HAS_A\"");

        let custom: EdgeKind = serde_json::from_str("\"CITES\"").expect("deserialize");
        assert_eq!(custom, EdgeKind::Custom("CITES".to_string()));
        assert_eq!(
            serde_json::to_string(&custom).expect("serialize"),
            "\"CITES\""
        );
    }

    #[test]
    fn reverse_swaps_endpoints_and_keeps_metadata() {
        let mut metadata = Metadata::new();
        metadata.insert("weight".to_string(), serde_json::json!(3));
        let edge = Edge::new("a", EdgeKind::RelatedTo, "b").with_metadata(metadata.clone());

        let reversed = edge.reverse();
        assert_eq!(reversed.source, "b");
        assert_eq!(reversed.target, "a");
        assert_eq!(reversed.kind, EdgeKind::RelatedTo);
        assert_eq!(reversed.metadata, metadata);
    }

    #[test]
    fn node_id_borrows_as_str() {
        let mut map = BTreeMap::new();
        map.insert(NodeId::new("x"), 1);
        assert_eq!(map.get("x"), Some(&1));
    }

    #[test]
    fn node_not_found_names_the_endpoint() {
        let err = RelatticeError::NodeNotFound {
            endpoint: Endpoint::Target,
            id: NodeId::new("ghost"),
        };
        assert_eq!(err.to_string(), "target node not found: ghost");
        assert_eq!(err.endpoint(), Some(Endpoint::Target));
    }
}
