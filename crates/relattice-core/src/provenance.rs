//! # Provenance
//!
//! Derivation chains over `DERIVES_FROM` edges. An edge
//! `(successor, DERIVES_FROM, predecessor)` records that `successor` was
//! derived from `predecessor`.

use crate::graph::{Graph, GraphStore};
use crate::{Direction, EdgeKind, NodeId};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Provenance queries over a graph.
pub struct Provenance;

impl Provenance {
    /// Chain of predecessors of `id`, nearest first, excluding `id`.
    ///
    /// At each step the first-inserted outgoing `DERIVES_FROM` edge is
    /// followed. The walk stops at a node with no such edge, or just before
    /// it would revisit a node (cyclic provenance).
    pub fn lineage(graph: &Graph, id: &str) -> Vec<NodeId> {
        let mut chain = Vec::new();
        if !graph.node_exists(id) {
            return chain;
        }

        let mut visited = BTreeSet::new();
        visited.insert(NodeId::new(id));
        let mut current = NodeId::new(id);

        loop {
            let next = graph
                .edges_of(current.as_str(), Direction::Out, Some(&EdgeKind::DerivesFrom))
                .next()
                .map(|edge| edge.target.clone());
            let Some(next) = next else {
                break;
            };
            if !visited.insert(next.clone()) {
                break;
            }
            chain.push(next.clone());
            current = next;
        }
        chain
    }

    /// Every node that derives, directly or transitively, from `id`.
    /// `id` itself is never included, even on a cycle.
    pub fn descendants(graph: &Graph, id: &str) -> BTreeSet<NodeId> {
        let mut found = BTreeSet::new();
        if !graph.node_exists(id) {
            return found;
        }

        let mut queue = VecDeque::new();
        queue.push_back(NodeId::new(id));

        while let Some(current) = queue.pop_front() {
            for edge in graph.edges_of(current.as_str(), Direction::In, Some(&EdgeKind::DerivesFrom))
            {
                if edge.source != *id && found.insert(edge.source.clone()) {
                    queue.push_back(edge.source.clone());
                }
            }
        }
        found
    }

    /// Shortest directed `DERIVES_FROM` path from `a` to `b`, both ends
    /// included. `None` when `b` is unreachable or either node is missing.
    pub fn derivation_path(graph: &Graph, a: &str, b: &str) -> Option<Vec<NodeId>> {
        if !graph.node_exists(a) || !graph.node_exists(b) {
            return None;
        }
        if a == b {
            return Some(vec![NodeId::new(a)]);
        }

        let mut parents: BTreeMap<NodeId, NodeId> = BTreeMap::new();
        let mut queue = VecDeque::new();
        queue.push_back(NodeId::new(a));

        while let Some(current) = queue.pop_front() {
            for edge in graph.edges_of(current.as_str(), Direction::Out, Some(&EdgeKind::DerivesFrom))
            {
                if edge.target == *a || parents.contains_key(edge.target.as_str()) {
                    continue;
                }
                parents.insert(edge.target.clone(), current.clone());
                if edge.target == *b {
                    return Some(unwind(&parents, a, &edge.target));
                }
                queue.push_back(edge.target.clone());
            }
        }
        None
    }
}

/// Rebuild the node path from `start` to `end` out of BFS parent pointers.
fn unwind(parents: &BTreeMap<NodeId, NodeId>, start: &str, end: &NodeId) -> Vec<NodeId> {
    let mut path = vec![end.clone()];
    let mut current = end;
    while *current != *start {
        match parents.get(current) {
            Some(parent) => {
                path.push(parent.clone());
                current = parent;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

// =============================================================================
// TESTS
// =============================================================================
