//! # Edge Index
//!
//! Owns the edge multiset and its secondary lookups (by source, by target,
//! by kind). Every edge gets a monotonically increasing sequence number on
//! first insertion; all lookups return edges in that order, which is what
//! makes "first inserted" tie-breaks deterministic.
//!
//! The query algorithms only walk adjacency. The kind lookup serves callers
//! that list a whole relation at once (every `IS_A` edge of a taxonomy, say)
//! through `Graph::edges_of_kind` and `Engine::edges_of_kind`.
//!
//! The index never checks node existence. `Graph` does that before calling in.

use crate::{Direction, Edge, EdgeKey, EdgeKind, NodeId};
use std::collections::{BTreeMap, BTreeSet};

/// Sequence number of an edge (insertion order).
type Seq = u64;

/// Edge storage with incremental secondary indexes.
#[derive(Debug, Clone, Default)]
pub struct EdgeIndex {
    /// Primary storage: seq -> edge.
    edges: BTreeMap<Seq, Edge>,
    /// Identity lookup: (source, kind, target) -> seq.
    by_key: BTreeMap<EdgeKey, Seq>,
    /// Outgoing adjacency: source -> seqs.
    by_source: BTreeMap<NodeId, BTreeSet<Seq>>,
    /// Incoming adjacency: target -> seqs.
    by_target: BTreeMap<NodeId, BTreeSet<Seq>>,
    /// Kind lookup: kind -> seqs.
    by_kind: BTreeMap<EdgeKind, BTreeSet<Seq>>,
    /// Next sequence number to assign.
    next_seq: Seq,
}

impl EdgeIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an edge.
    ///
    /// Returns `true` if the (source, kind, target) triple was new. When the
    /// triple already exists its metadata is replaced and it keeps its
    /// original position in insertion order.
    pub fn insert(&mut self, edge: Edge) -> bool {
        let key = edge.key();
        if let Some(&seq) = self.by_key.get(&key) {
            if let Some(existing) = self.edges.get_mut(&seq) {
                existing.metadata = edge.metadata;
            }
            return false;
        }

        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);

        self.by_source
            .entry(edge.source.clone())
            .or_default()
            .insert(seq);
        self.by_target
            .entry(edge.target.clone())
            .or_default()
            .insert(seq);
        self.by_kind.entry(edge.kind.clone()).or_default().insert(seq);
        self.by_key.insert(key, seq);
        self.edges.insert(seq, edge);
        true
    }

    /// Remove exactly the matching triple. Returns the removed edge.
    pub fn remove(&mut self, source: &str, kind: &EdgeKind, target: &str) -> Option<Edge> {
        let key = (NodeId::new(source), kind.clone(), NodeId::new(target));
        let seq = self.by_key.get(&key).copied()?;
        self.remove_seq(seq)
    }

    /// Remove every edge whose source or target is `id`.
    ///
    /// Returns the removed edges in insertion order. After this call no
    /// secondary index holds an entry for `id`.
    pub fn remove_touching(&mut self, id: &str) -> Vec<Edge> {
        let seqs: BTreeSet<Seq> = self
            .by_source
            .get(id)
            .into_iter()
            .chain(self.by_target.get(id))
            .flatten()
            .copied()
            .collect();

        seqs.into_iter()
            .filter_map(|seq| self.remove_seq(seq))
            .collect()
    }

    fn remove_seq(&mut self, seq: Seq) -> Option<Edge> {
        let edge = self.edges.remove(&seq)?;
        self.by_key.remove(&edge.key());
        detach(&mut self.by_source, &edge.source, seq);
        detach(&mut self.by_target, &edge.target, seq);
        detach(&mut self.by_kind, &edge.kind, seq);
        Some(edge)
    }

    /// Edges incident to `node` in the given direction, optionally filtered
    /// by kind, in insertion order. A self-loop appears once under `Both`.
    pub fn edges_of<'a>(
        &'a self,
        node: &str,
        direction: Direction,
        kind: Option<&'a EdgeKind>,
    ) -> impl Iterator<Item = &'a Edge> + 'a {
        let outgoing = matches!(direction, Direction::Out | Direction::Both)
            .then(|| self.by_source.get(node))
            .flatten();
        let incoming = matches!(direction, Direction::In | Direction::Both)
            .then(|| self.by_target.get(node))
            .flatten();

        let seqs: BTreeSet<Seq> = outgoing
            .into_iter()
            .chain(incoming)
            .flatten()
            .copied()
            .collect();

        seqs.into_iter()
            .filter_map(move |seq| self.edges.get(&seq))
            .filter(move |edge| kind.is_none_or(|k| &edge.kind == k))
    }

    /// All edges of one kind, in insertion order.
    pub fn edges_of_kind<'a>(&'a self, kind: &EdgeKind) -> impl Iterator<Item = &'a Edge> + 'a {
        self.by_kind
            .get(kind)
            .into_iter()
            .flatten()
            .filter_map(move |seq| self.edges.get(seq))
    }

    /// Look up a single edge by its identity.
    #[must_use]
    pub fn get(&self, source: &str, kind: &EdgeKind, target: &str) -> Option<&Edge> {
        let key = (NodeId::new(source), kind.clone(), NodeId::new(target));
        self.by_key.get(&key).and_then(|seq| self.edges.get(seq))
    }

    /// All edges in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Number of physical edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Check if the index holds no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Drop `seq` from a secondary index, removing the bucket once it is empty.
fn detach<K: Ord>(index: &mut BTreeMap<K, BTreeSet<Seq>>, key: &K, seq: Seq) {
    if let Some(bucket) = index.get_mut(key) {
        bucket.remove(&seq);
        if bucket.is_empty() {
            index.remove(key);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
