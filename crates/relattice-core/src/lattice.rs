//! # Lattice Algebra
//!
//! Subsumption reasoning over `IS_A` edges. An edge `(child, IS_A, parent)`
//! reads "child is-a parent"; entailment is the reflexive-transitive closure
//! of that relation. Every other edge kind is invisible here.
//!
//! All walks keep a visited set, so `IS_A` cycles terminate.

use crate::graph::{Graph, GraphStore};
use crate::{Direction, EdgeKind, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

/// Outcome of comparing two nodes in the subsumption order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    /// Same node.
    #[serde(rename = "a=b")]
    Equal,
    /// `a` entails `b`.
    #[serde(rename = "a≤b")]
    Below,
    /// `b` entails `a`.
    #[serde(rename = "b≤a")]
    Above,
    /// Neither entails the other.
    #[serde(rename = "incomparable")]
    Incomparable,
}

impl Relation {
    /// The relation seen from the other side: `compare(b, a)`.
    #[must_use]
    pub const fn mirror(self) -> Self {
        match self {
            Self::Below => Self::Above,
            Self::Above => Self::Below,
            other => other,
        }
    }

    /// Wire name of the relation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "a=b",
            Self::Below => "a≤b",
            Self::Above => "b≤a",
            Self::Incomparable => "incomparable",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subsumption queries over a graph.
pub struct LatticeAlgebra;

impl LatticeAlgebra {
    /// Whether `a` is-a `b`: `a == b`, or `b` is reachable from `a` along
    /// `IS_A` edges. False when either node does not exist.
    pub fn entails(graph: &Graph, a: &str, b: &str) -> bool {
        if !graph.node_exists(a) || !graph.node_exists(b) {
            return false;
        }
        if a == b {
            return true;
        }

        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::new();
        visited.insert(a.to_string());
        queue.push_back(a.to_string());

        while let Some(current) = queue.pop_front() {
            for edge in graph.edges_of(&current, Direction::Out, Some(&EdgeKind::IsA)) {
                if edge.target == *b {
                    return true;
                }
                if visited.insert(edge.target.to_string()) {
                    queue.push_back(edge.target.to_string());
                }
            }
        }
        false
    }

    /// Nearest common ancestor of `a` and `b` in the `IS_A` closure.
    ///
    /// Both ancestor closures are explored by a lock-step BFS: each round
    /// expands one level from `a`, then one level from `b`. A node becomes a
    /// candidate the moment the second side reaches it. The winner minimizes
    /// the sum of its two BFS distances; ties go to the earliest candidate.
    /// Either node may be the answer (e.g. `meet(x, parent) == parent`).
    pub fn meet(graph: &Graph, a: &str, b: &str) -> Option<NodeId> {
        if !graph.node_exists(a) || !graph.node_exists(b) {
            return None;
        }
        if a == b {
            return Some(NodeId::new(a));
        }

        let mut side_a = Frontier::new(a);
        let mut side_b = Frontier::new(b);
        // (distance sum, discovery rank) -> node
        let mut candidates: BTreeMap<(usize, usize), NodeId> = BTreeMap::new();
        let mut rank = 0usize;

        while !side_a.is_exhausted() || !side_b.is_exhausted() {
            for found in side_a.expand(graph) {
                if let Some(&db) = side_b.distances.get(&found) {
                    let da = side_a.distances.get(&found).copied().unwrap_or_default();
                    candidates.insert((da.saturating_add(db), rank), found);
                    rank = rank.saturating_add(1);
                }
            }
            for found in side_b.expand(graph) {
                if let Some(&da) = side_a.distances.get(&found) {
                    let db = side_b.distances.get(&found).copied().unwrap_or_default();
                    candidates.insert((da.saturating_add(db), rank), found);
                    rank = rank.saturating_add(1);
                }
            }
        }

        candidates.into_values().next()
    }

    /// Three-way comparison in the subsumption order.
    ///
    /// `Equal` iff the ids are identical; otherwise `Below` if `a` entails
    /// `b`, `Above` if `b` entails `a`, else `Incomparable`.
    pub fn compare(graph: &Graph, a: &str, b: &str) -> Relation {
        if a == b {
            Relation::Equal
        } else if Self::entails(graph, a, b) {
            Relation::Below
        } else if Self::entails(graph, b, a) {
            Relation::Above
        } else {
            Relation::Incomparable
        }
    }
}

/// One side of the lock-step BFS used by `meet`.
struct Frontier {
    distances: BTreeMap<NodeId, usize>,
    level: Vec<NodeId>,
    depth: usize,
    /// Seed not yet reported to the caller.
    pending_seed: Option<NodeId>,
}

impl Frontier {
    fn new(seed: &str) -> Self {
        let seed = NodeId::new(seed);
        let mut distances = BTreeMap::new();
        distances.insert(seed.clone(), 0);
        Self {
            distances,
            level: vec![seed.clone()],
            depth: 0,
            pending_seed: Some(seed),
        }
    }

    fn is_exhausted(&self) -> bool {
        self.level.is_empty() && self.pending_seed.is_none()
    }

    /// Advance one level. Returns the newly discovered nodes in discovery
    /// order; the first call reports the seed itself.
    fn expand(&mut self, graph: &Graph) -> Vec<NodeId> {
        if let Some(seed) = self.pending_seed.take() {
            return vec![seed];
        }

        let next_depth = self.depth.saturating_add(1);
        let mut discovered = Vec::new();
        for current in std::mem::take(&mut self.level) {
            for edge in graph.edges_of(current.as_str(), Direction::Out, Some(&EdgeKind::IsA)) {
                if !self.distances.contains_key(edge.target.as_str()) {
                    self.distances.insert(edge.target.clone(), next_depth);
                    discovered.push(edge.target.clone());
                }
            }
        }
        self.depth = next_depth;
        self.level.clone_from(&discovered);
        discovered
    }
}

// =============================================================================
// TESTS
// =============================================================================
