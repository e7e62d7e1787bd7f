//! # Query Module
//!
//! Structured, serializable read queries.
//!
//! A `Query` names one read operation of the engine and its arguments;
//! `Engine::execute` runs it and wraps the answer in a `QueryResult`. This
//! is the request/response shape an external front-end relays as JSON.
//! There is no query language: every variant maps to exactly one method.

use crate::lattice::Relation;
use crate::traversal::Subgraph;
use crate::{Edge, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Read operations supported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Query {
    /// Whether `a` is-a `b`, transitively.
    Entails { a: NodeId, b: NodeId },

    /// Nearest common `IS_A` ancestor.
    Meet { a: NodeId, b: NodeId },

    /// Position of `a` relative to `b` in the subsumption order.
    Compare { a: NodeId, b: NodeId },

    /// First-inserted `DERIVES_FROM` chain from `id`.
    Lineage { id: NodeId },

    /// Everything deriving from `id`.
    Descendants { id: NodeId },

    /// Shortest forward `DERIVES_FROM` path. `None` when unreachable.
    DerivationPath { a: NodeId, b: NodeId },

    /// Bounded BFS along outgoing edges.
    Traverse { start: NodeId, depth: usize },

    /// Fewest-edge directed path of any kind.
    FindPath { a: NodeId, b: NodeId },

    /// Undirected partition of all nodes.
    ConnectedComponents,
}

/// Answer to a `Query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum QueryResult {
    Bool(bool),
    Node(Option<NodeId>),
    Relation(Relation),
    /// Ordered predecessor ids (lineage).
    Chain(Vec<NodeId>),
    /// Node ids from `a` to `b`, both included. `None` when unreachable.
    Derivation(Option<Vec<NodeId>>),
    NodeSet(BTreeSet<NodeId>),
    Subgraph(Subgraph),
    /// `None` when the target is unreachable.
    Path(Option<Vec<Edge>>),
    Components(Vec<BTreeSet<NodeId>>),
}

// =============================================================================
// TESTS
// =============================================================================
