//! # Graph Store
//!
//! The in-memory node table and edge multiset for the Relattice engine.
//!
//! This module implements the `GraphStore` trait.
//! All data structures use `BTreeMap` for deterministic ordering.

use crate::index::EdgeIndex;
use crate::{Direction, Edge, EdgeKind, Endpoint, Node, NodeId, RelatticeError, State};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// GRAPHSTORE TRAIT
// =============================================================================

/// The GraphStore trait defines raw CRUD and adjacency operations.
///
/// Referential integrity is the implementor's job: no edge may ever name a
/// node that is not in the node table, not even between two statements of
/// a cascading delete.
pub trait GraphStore {
    /// Insert or overwrite a node. Returns the previous state, if any.
    fn add_node(&mut self, id: NodeId, state: State) -> Option<State>;

    /// Get a node by id.
    fn get_node(&self, id: &str) -> Option<&Node>;

    /// Check if a node exists.
    fn node_exists(&self, id: &str) -> bool;

    /// Delete a node and every edge touching it.
    /// Returns whether the node existed.
    fn delete_node(&mut self, id: &str) -> bool;

    /// All node ids.
    fn list_nodes(&self) -> BTreeSet<NodeId>;

    /// Insert an edge (and its reverse when `bidirectional`).
    ///
    /// Fails with `NodeNotFound` naming the missing endpoint. The source is
    /// checked first.
    fn add_edge(&mut self, edge: Edge, bidirectional: bool) -> Result<(), RelatticeError>;

    /// Remove exactly the (source, kind, target) edge. Returns whether it existed.
    fn remove_edge(&mut self, source: &str, kind: &EdgeKind, target: &str) -> bool;

    /// Edges incident to `node`, optionally filtered by kind.
    fn get_edges(&self, node: &str, direction: Direction, kind: Option<&EdgeKind>) -> Vec<Edge>;
}

// =============================================================================
// GRAPH IMPLEMENTATION
// =============================================================================

/// The main Graph structure.
///
/// Uses `BTreeMap` exclusively for deterministic ordering.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// Node storage: NodeId -> Node
    nodes: BTreeMap<NodeId, Node>,

    /// Edge storage with source/target/kind lookups.
    edges: EdgeIndex,
}

impl Graph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Borrowing adjacency lookup used by the query algorithms.
    pub fn edges_of<'a>(
        &'a self,
        node: &str,
        direction: Direction,
        kind: Option<&'a EdgeKind>,
    ) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.edges_of(node, direction, kind)
    }

    /// All edges of one kind, in insertion order, without scanning the rest.
    pub fn edges_of_kind<'a>(&'a self, kind: &EdgeKind) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.edges_of_kind(kind)
    }

    /// Look up a single edge by its identity.
    #[must_use]
    pub fn get_edge(&self, source: &str, kind: &EdgeKind, target: &str) -> Option<&Edge> {
        self.edges.get(source, kind, target)
    }

    /// Get the total number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get the total number of physical edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn check_endpoints(&self, edge: &Edge) -> Result<(), RelatticeError> {
        if !self.nodes.contains_key(edge.source.as_str()) {
            return Err(RelatticeError::NodeNotFound {
                endpoint: Endpoint::Source,
                id: edge.source.clone(),
            });
        }
        if !self.nodes.contains_key(edge.target.as_str()) {
            return Err(RelatticeError::NodeNotFound {
                endpoint: Endpoint::Target,
                id: edge.target.clone(),
            });
        }
        Ok(())
    }
}

impl GraphStore for Graph {
    fn add_node(&mut self, id: NodeId, state: State) -> Option<State> {
        match self.nodes.entry(id) {
            Entry::Occupied(mut slot) => Some(std::mem::replace(&mut slot.get_mut().state, state)),
            Entry::Vacant(slot) => {
                let id = slot.key().clone();
                slot.insert(Node::new(id, state));
                None
            }
        }
    }

    fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    fn node_exists(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    fn delete_node(&mut self, id: &str) -> bool {
        if !self.nodes.contains_key(id) {
            return false;
        }
        // Edges go first so no edge ever names a missing node.
        self.edges.remove_touching(id);
        self.nodes.remove(id).is_some()
    }

    fn list_nodes(&self) -> BTreeSet<NodeId> {
        self.nodes.keys().cloned().collect()
    }

    fn add_edge(&mut self, edge: Edge, bidirectional: bool) -> Result<(), RelatticeError> {
        self.check_endpoints(&edge)?;
        if bidirectional {
            let reverse = edge.reverse();
            self.edges.insert(edge);
            self.edges.insert(reverse);
        } else {
            self.edges.insert(edge);
        }
        Ok(())
    }

    fn remove_edge(&mut self, source: &str, kind: &EdgeKind, target: &str) -> bool {
        self.edges.remove(source, kind, target).is_some()
    }

    fn get_edges(&self, node: &str, direction: Direction, kind: Option<&EdgeKind>) -> Vec<Edge> {
        self.edges
            .edges_of(node, direction, kind)
            .cloned()
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn graph_with(ids: &[&str]) -> Graph {
        let mut graph = Graph::new();
        for id in ids {
            graph.add_node(NodeId::new(*id), json!({ "name": id }));
        }
        graph
    }

    #[test]
    fn add_and_get_node() {
        let graph = graph_with(&["a"]);
        let node = graph.get_node("a").expect("node");
        assert_eq!(node.state, json!({ "name": "a" }));
        assert!(graph.get_node("missing").is_none());
    }

    #[test]
    fn add_node_upserts() {
        let mut graph = graph_with(&["a"]);
        let previous = graph.add_node(NodeId::new("a"), json!("replaced"));

        assert_eq!(previous, Some(json!({ "name": "a" })));
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.get_node("a").map(|n| &n.state), Some(&json!("replaced")));
    }

    #[test]
    fn delete_node_reports_existence_once() {
        let mut graph = graph_with(&["a"]);
        assert!(graph.delete_node("a"));
        assert!(!graph.delete_node("a"));
        assert!(!graph.node_exists("a"));
    }

    #[test]
    fn delete_node_cascades_both_directions() {
        let mut graph = graph_with(&["a", "b", "c"]);
        graph
            .add_edge(Edge::new("a", EdgeKind::IsA, "b"), false)
            .expect("edge");
        graph
            .add_edge(Edge::new("c", EdgeKind::Uses, "a"), false)
            .expect("edge");
        graph
            .add_edge(Edge::new("b", EdgeKind::Uses, "c"), false)
            .expect("edge");

        assert!(graph.delete_node("a"));

        assert_eq!(graph.edge_count(), 1);
        for id in graph.list_nodes() {
            assert!(
                graph
                    .get_edges(id.as_str(), Direction::Both, None)
                    .iter()
                    .all(|e| !e.touches("a"))
            );
        }
    }

    #[test]
    fn add_edge_distinguishes_missing_endpoint() {
        let mut graph = graph_with(&["a"]);

        let err = graph
            .add_edge(Edge::new("ghost", EdgeKind::IsA, "a"), false)
            .expect_err("missing source");
        assert_eq!(err.endpoint(), Some(Endpoint::Source));

        let err = graph
            .add_edge(Edge::new("a", EdgeKind::IsA, "ghost"), false)
            .expect_err("missing target");
        assert_eq!(err.endpoint(), Some(Endpoint::Target));
        assert!(err.to_string().contains("target"));

        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn bidirectional_materializes_both_edges() {
        let mut graph = graph_with(&["a", "b"]);
        graph
            .add_edge(Edge::new("a", EdgeKind::RelatedTo, "b"), true)
            .expect("edge");

        assert_eq!(graph.edge_count(), 2);
        assert!(graph.get_edge("b", &EdgeKind::RelatedTo, "a").is_some());

        // Each direction is an independent edge.
        assert!(graph.remove_edge("a", &EdgeKind::RelatedTo, "b"));
        assert!(graph.get_edge("b", &EdgeKind::RelatedTo, "a").is_some());
    }

    #[test]
    fn remove_edge_matches_exact_triple() {
        let mut graph = graph_with(&["a", "b"]);
        graph
            .add_edge(Edge::new("a", EdgeKind::IsA, "b"), false)
            .expect("edge");

        assert!(!graph.remove_edge("a", &EdgeKind::Uses, "b"));
        assert!(graph.remove_edge("a", &EdgeKind::IsA, "b"));
        assert!(!graph.remove_edge("a", &EdgeKind::IsA, "b"));
    }

    #[test]
    fn get_edges_filters_by_kind() {
        let mut graph = graph_with(&["a", "b", "c"]);
        graph
            .add_edge(Edge::new("a", EdgeKind::IsA, "b"), false)
            .expect("edge");
        graph
            .add_edge(Edge::new("a", EdgeKind::HasA, "c"), false)
            .expect("edge");

        let is_a = graph.get_edges("a", Direction::Out, Some(&EdgeKind::IsA));
        assert_eq!(is_a.len(), 1);
        assert_eq!(is_a[0].target, "b");
        assert!(graph.get_edges("a", Direction::In, None).is_empty());
    }

    #[test]
    fn edges_of_kind_tracks_cascade() {
        let mut graph = graph_with(&["a", "b", "c"]);
        for (s, kind, t) in [
            ("c", EdgeKind::IsA, "b"),
            ("a", EdgeKind::Uses, "b"),
            ("a", EdgeKind::IsA, "b"),
        ] {
            graph.add_edge(Edge::new(s, kind, t), false).expect("edge");
        }

        let sources: Vec<_> = graph
            .edges_of_kind(&EdgeKind::IsA)
            .map(|e| e.source.as_str())
            .collect();
        assert_eq!(sources, ["c", "a"]);

        assert!(graph.delete_node("c"));
        assert_eq!(graph.edges_of_kind(&EdgeKind::IsA).count(), 1);
        assert!(graph.edges_of_kind(&EdgeKind::from("UNSEEN")).next().is_none());
    }
}
