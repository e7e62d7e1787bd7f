//! # Engine
//!
//! The public entry point. An `Engine` owns the graph, the audit log and the
//! storage backend, and routes every call to the component that answers it.
//!
//! ## Durability
//!
//! Every successful mutation is applied in memory first and then flushed as
//! a full snapshot before the call returns. A failed flush is reported to the
//! caller but the in-memory mutation is not rolled back: the next successful
//! flush carries it to disk.

use crate::config::EngineConfig;
use crate::formats::{ExtraFields, GraphDocument};
use crate::graph::{Graph, GraphStore};
use crate::history::AuditLog;
use crate::lattice::{LatticeAlgebra, Relation};
use crate::provenance::Provenance;
use crate::query::{Query, QueryResult};
use crate::storage::StorageBackend;
use crate::traversal::{Subgraph, Traversal};
use crate::{Direction, Edge, EdgeKind, Metadata, Node, NodeId, RelatticeError, State};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// A relational lattice graph with optional single-file persistence.
#[derive(Debug)]
pub struct Engine {
    graph: Graph,
    history: AuditLog,
    backend: StorageBackend,
    config: EngineConfig,
    /// Top-level document fields carried through from the loaded file.
    extra: ExtraFields,
    /// Next candidate suffix for generated ids.
    next_id: u64,
}

impl Engine {
    /// Open an engine, loading any existing state from the configured file.
    ///
    /// A corrupt or unreadable file is an error. A missing file is an empty
    /// first run unless `create_if_missing` is off.
    pub fn open(config: EngineConfig) -> Result<Self, RelatticeError> {
        config.validate()?;
        let backend = config.backend();

        let (graph, history, extra) = match backend.load()? {
            Some(document) => document.into_parts()?,
            None => (Graph::new(), AuditLog::new(), ExtraFields::new()),
        };

        tracing::info!(
            path = ?backend.path(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            history = history.len(),
            "engine opened"
        );

        let next_id = u64::try_from(history.len())
            .unwrap_or(u64::MAX)
            .saturating_add(1);

        Ok(Self {
            graph,
            history,
            backend,
            config,
            extra,
            next_id,
        })
    }

    /// A volatile engine. Nothing is ever written to disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            graph: Graph::new(),
            history: AuditLog::new(),
            backend: StorageBackend::InMemory,
            config: EngineConfig::in_memory(),
            extra: ExtraFields::new(),
            next_id: 1,
        }
    }

    /// Open an engine persisted at `path` with default settings.
    pub fn open_path(path: impl Into<PathBuf>) -> Result<Self, RelatticeError> {
        Self::open(EngineConfig::at(path))
    }

    /// The settings this engine was opened with.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Read-only access to the underlying graph.
    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The backing file, if the engine is persistent.
    #[must_use]
    pub fn storage_path(&self) -> Option<&Path> {
        self.backend.path()
    }

    /// Write the full state to the backing file. No-op in memory.
    ///
    /// Takes `&mut self`: every flush rewrites the same `<path>.tmp`, so two
    /// flushes of one engine must never overlap.
    pub fn flush(&mut self) -> Result<(), RelatticeError> {
        if !self.backend.is_persistent() {
            return Ok(());
        }
        let document = GraphDocument::capture(&self.graph, &self.history, &self.extra);
        self.backend.flush(&document)
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Insert or overwrite a node, record its state in the audit log, flush.
    pub fn add_node(&mut self, id: impl Into<NodeId>, state: State) -> Result<(), RelatticeError> {
        let id = id.into();
        tracing::debug!(%id, "add_node");
        self.history.record(state.clone());
        self.graph.add_node(id, state);
        self.flush()
    }

    /// Insert an edge (and its reverse when `bidirectional`), then flush.
    ///
    /// Fails with `NodeNotFound` naming the missing endpoint; nothing is
    /// inserted or flushed in that case.
    pub fn add_edge(
        &mut self,
        source: impl Into<NodeId>,
        kind: impl Into<EdgeKind>,
        target: impl Into<NodeId>,
        metadata: Metadata,
        bidirectional: bool,
    ) -> Result<(), RelatticeError> {
        let edge = Edge::new(source, kind.into(), target).with_metadata(metadata);
        tracing::debug!(
            source = %edge.source,
            kind = %edge.kind,
            target = %edge.target,
            bidirectional,
            "add_edge"
        );
        self.graph.add_edge(edge, bidirectional)?;
        self.flush()
    }

    /// Delete a node and every edge touching it. Flushes only if it existed.
    pub fn delete_node(&mut self, id: &str) -> Result<bool, RelatticeError> {
        if !self.graph.delete_node(id) {
            return Ok(false);
        }
        tracing::debug!(id, "delete_node");
        self.flush()?;
        Ok(true)
    }

    /// Remove exactly one edge. Flushes only if it existed.
    pub fn remove_edge(
        &mut self,
        source: &str,
        kind: &EdgeKind,
        target: &str,
    ) -> Result<bool, RelatticeError> {
        if !self.graph.remove_edge(source, kind, target) {
            return Ok(false);
        }
        tracing::debug!(source, %kind, target, "remove_edge");
        self.flush()?;
        Ok(true)
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    #[must_use]
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.graph.get_node(id)
    }

    #[must_use]
    pub fn node_exists(&self, id: &str) -> bool {
        self.graph.node_exists(id)
    }

    #[must_use]
    pub fn list_nodes(&self) -> BTreeSet<NodeId> {
        self.graph.list_nodes()
    }

    #[must_use]
    pub fn get_edges(&self, node: &str, direction: Direction, kind: Option<&EdgeKind>) -> Vec<Edge> {
        self.graph.get_edges(node, direction, kind)
    }

    /// Every edge of one kind, in insertion order.
    #[must_use]
    pub fn edges_of_kind(&self, kind: &EdgeKind) -> Vec<Edge> {
        self.graph.edges_of_kind(kind).cloned().collect()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    // =========================================================================
    // LATTICE
    // =========================================================================

    /// Whether `a` is-a `b`, transitively.
    #[must_use]
    pub fn entails(&self, a: &str, b: &str) -> bool {
        LatticeAlgebra::entails(&self.graph, a, b)
    }

    /// Nearest common `IS_A` ancestor.
    #[must_use]
    pub fn meet(&self, a: &str, b: &str) -> Option<NodeId> {
        LatticeAlgebra::meet(&self.graph, a, b)
    }

    #[must_use]
    pub fn compare(&self, a: &str, b: &str) -> Relation {
        LatticeAlgebra::compare(&self.graph, a, b)
    }

    // =========================================================================
    // PROVENANCE
    // =========================================================================

    #[must_use]
    pub fn lineage(&self, id: &str) -> Vec<NodeId> {
        Provenance::lineage(&self.graph, id)
    }

    #[must_use]
    pub fn descendants(&self, id: &str) -> BTreeSet<NodeId> {
        Provenance::descendants(&self.graph, id)
    }

    #[must_use]
    pub fn derivation_path(&self, a: &str, b: &str) -> Option<Vec<NodeId>> {
        Provenance::derivation_path(&self.graph, a, b)
    }

    // =========================================================================
    // TRAVERSAL
    // =========================================================================

    /// Bounded outgoing BFS. `depth` is capped at `max_traversal_depth`.
    #[must_use]
    pub fn traverse(&self, start: &str, depth: usize) -> Subgraph {
        let depth = depth.min(self.config.max_traversal_depth);
        tracing::trace!(start, depth, "traverse");
        Traversal::traverse(&self.graph, start, depth)
    }

    #[must_use]
    pub fn find_path(&self, a: &str, b: &str) -> Option<Vec<Edge>> {
        Traversal::find_path(&self.graph, a, b)
    }

    #[must_use]
    pub fn connected_components(&self) -> Vec<BTreeSet<NodeId>> {
        Traversal::connected_components(&self.graph)
    }

    /// Run a structured read query.
    #[must_use]
    pub fn execute(&self, query: &Query) -> QueryResult {
        tracing::trace!(?query, "execute");
        match query {
            Query::Entails { a, b } => QueryResult::Bool(self.entails(a.as_str(), b.as_str())),
            Query::Meet { a, b } => QueryResult::Node(self.meet(a.as_str(), b.as_str())),
            Query::Compare { a, b } => {
                QueryResult::Relation(self.compare(a.as_str(), b.as_str()))
            }
            Query::Lineage { id } => QueryResult::Chain(self.lineage(id.as_str())),
            Query::Descendants { id } => QueryResult::NodeSet(self.descendants(id.as_str())),
            Query::DerivationPath { a, b } => {
                QueryResult::Derivation(self.derivation_path(a.as_str(), b.as_str()))
            }
            Query::Traverse { start, depth } => {
                QueryResult::Subgraph(self.traverse(start.as_str(), *depth))
            }
            Query::FindPath { a, b } => QueryResult::Path(self.find_path(a.as_str(), b.as_str())),
            Query::ConnectedComponents => {
                QueryResult::Components(self.connected_components())
            }
        }
    }

    // =========================================================================
    // AUDIT LOG
    // =========================================================================

    /// Store `state` under a freshly generated id and return the id.
    ///
    /// Ids are `<id_prefix>-<n>` with `n` counting up; ids already taken by
    /// caller-supplied nodes are skipped.
    pub fn save(&mut self, state: State) -> Result<NodeId, RelatticeError> {
        let id = self.fresh_id();
        self.add_node(id.clone(), state)?;
        Ok(id)
    }

    /// Written states, most recent first, truncated to `limit` when given.
    #[must_use]
    pub fn history(&self, limit: Option<usize>) -> Vec<State> {
        self.history.recent(limit)
    }

    /// Snapshot of every current node's state.
    #[must_use]
    pub fn load(&self) -> BTreeMap<NodeId, State> {
        self.graph
            .nodes()
            .map(|node| (node.id.clone(), node.state.clone()))
            .collect()
    }

    fn fresh_id(&mut self) -> NodeId {
        loop {
            let id = NodeId::new(format!("{}-{}", self.config.id_prefix, self.next_id));
            self.next_id = self.next_id.saturating_add(1);
            if !self.graph.node_exists(id.as_str()) {
                return id;
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_meta() -> Metadata {
        Metadata::new()
    }

    #[test]
    fn history_is_reverse_chronological() {
        let mut engine = Engine::in_memory();
        engine.add_node("x", json!("First")).expect("add");
        engine.add_node("y", json!("Second")).expect("add");

        assert_eq!(engine.history(None), vec![json!("Second"), json!("First")]);
        assert_eq!(engine.history(Some(1)), vec![json!("Second")]);
    }

    #[test]
    fn overwrite_appends_history() {
        let mut engine = Engine::in_memory();
        engine.add_node("x", json!(1)).expect("add");
        engine.add_node("x", json!(2)).expect("add");

        assert_eq!(engine.node_count(), 1);
        assert_eq!(engine.get_node("x").map(|n| &n.state), Some(&json!(2)));
        assert_eq!(engine.history(None), vec![json!(2), json!(1)]);
    }

    #[test]
    fn save_generates_unique_ids() {
        let mut engine = Engine::in_memory();
        engine.add_node("node-1", json!("taken")).expect("add");

        let first = engine.save(json!({ "a": 1 })).expect("save");
        let second = engine.save(json!({ "b": 2 })).expect("save");

        assert_ne!(first, second);
        assert_ne!(first.as_str(), "node-1");
        assert_eq!(engine.get_node("node-1").map(|n| &n.state), Some(&json!("taken")));
        assert_eq!(engine.load().len(), 3);
    }

    #[test]
    fn add_edge_reports_missing_endpoint() {
        let mut engine = Engine::in_memory();
        engine.add_node("a", json!(null)).expect("add");

        let err = engine
            .add_edge("ghost", EdgeKind::IsA, "a", no_meta(), false)
            .expect_err("missing source");
        assert_eq!(err.endpoint(), Some(crate::Endpoint::Source));

        let err = engine
            .add_edge("a", EdgeKind::IsA, "ghost", no_meta(), false)
            .expect_err("missing target");
        assert_eq!(err.endpoint(), Some(crate::Endpoint::Target));
        assert_eq!(engine.edge_count(), 0);
    }

    #[test]
    fn delete_and_remove_report_existence() {
        let mut engine = Engine::in_memory();
        engine.add_node("a", json!(1)).expect("add");
        engine.add_node("b", json!(2)).expect("add");
        engine
            .add_edge("a", "USES", "b", no_meta(), false)
            .expect("edge");

        assert!(engine.remove_edge("a", &EdgeKind::Uses, "b").expect("remove"));
        assert!(!engine.remove_edge("a", &EdgeKind::Uses, "b").expect("remove"));
        assert!(engine.delete_node("a").expect("delete"));
        assert!(!engine.delete_node("a").expect("delete"));
    }

    #[test]
    fn traverse_respects_configured_cap() {
        let mut engine = Engine::open(EngineConfig {
            max_traversal_depth: 1,
            ..EngineConfig::in_memory()
        })
        .expect("open");
        for id in ["a", "b", "c"] {
            engine.add_node(id, json!(null)).expect("add");
        }
        engine.add_edge("a", "RELATED_TO", "b", no_meta(), false).expect("edge");
        engine.add_edge("b", "RELATED_TO", "c", no_meta(), false).expect("edge");

        let sub = engine.traverse("a", 5);
        assert_eq!(sub.nodes.len(), 2);
        assert!(!sub.nodes.contains("c"));
    }

    #[test]
    fn execute_dispatches_queries() {
        let mut engine = Engine::in_memory();
        for id in ["dog", "mammal", "animal"] {
            engine.add_node(id, json!(null)).expect("add");
        }
        engine.add_edge("dog", EdgeKind::IsA, "mammal", no_meta(), false).expect("edge");
        engine.add_edge("mammal", EdgeKind::IsA, "animal", no_meta(), false).expect("edge");

        let result = engine.execute(&Query::Entails {
            a: "dog".into(),
            b: "animal".into(),
        });
        assert_eq!(result, QueryResult::Bool(true));

        let result = engine.execute(&Query::Compare {
            a: "animal".into(),
            b: "dog".into(),
        });
        assert_eq!(result, QueryResult::Relation(Relation::Above));

        let result = engine.execute(&Query::ConnectedComponents);
        assert!(matches!(result, QueryResult::Components(ref c) if c.len() == 1));
    }

    #[test]
    fn edges_of_kind_lists_whole_relation() {
        let mut engine = Engine::in_memory();
        for id in ["dog", "cat", "mammal"] {
            engine.add_node(id, json!(null)).expect("add");
        }
        engine.add_edge("dog", EdgeKind::IsA, "mammal", no_meta(), false).expect("edge");
        engine.add_edge("dog", "LIKES", "cat", no_meta(), true).expect("edge");
        engine.add_edge("cat", EdgeKind::IsA, "mammal", no_meta(), false).expect("edge");

        let taxonomy = engine.edges_of_kind(&EdgeKind::IsA);
        let children: Vec<_> = taxonomy.iter().map(|e| e.source.as_str()).collect();
        assert_eq!(children, ["dog", "cat"]);
        assert_eq!(engine.edges_of_kind(&EdgeKind::from("LIKES")).len(), 2);
    }

    #[test]
    fn execute_keeps_unreachable_derivation_distinct() {
        let mut engine = Engine::in_memory();
        for id in ["draft", "source", "island"] {
            engine.add_node(id, json!(null)).expect("add");
        }
        engine
            .add_edge("draft", EdgeKind::DerivesFrom, "source", no_meta(), false)
            .expect("edge");

        let result = engine.execute(&Query::DerivationPath {
            a: "draft".into(),
            b: "source".into(),
        });
        assert_eq!(
            result,
            QueryResult::Derivation(Some(vec!["draft".into(), "source".into()]))
        );

        let result = engine.execute(&Query::DerivationPath {
            a: "draft".into(),
            b: "island".into(),
        });
        assert_eq!(result, QueryResult::Derivation(None));

        let result = engine.execute(&Query::Lineage { id: "island".into() });
        assert_eq!(result, QueryResult::Chain(Vec::new()));
    }

    #[test]
    fn persistent_engine_reloads_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("graph.json");
        {
            let mut engine = Engine::open_path(&path).expect("open");
            engine.add_node("x", json!("First")).expect("add");
            engine.add_node("y", json!("Second")).expect("add");
            engine
                .add_edge("x", EdgeKind::DerivesFrom, "y", no_meta(), false)
                .expect("edge");
        }

        let engine = Engine::open_path(&path).expect("reopen");
        assert_eq!(engine.storage_path(), Some(path.as_path()));
        assert_eq!(engine.node_count(), 2);
        assert_eq!(engine.lineage("x"), vec![NodeId::new("y")]);
        assert_eq!(engine.history(None), vec![json!("Second"), json!("First")]);
    }

    #[test]
    fn save_after_reload_does_not_collide() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("graph.json");
        let first = {
            let mut engine = Engine::open_path(&path).expect("open");
            engine.save(json!(1)).expect("save")
        };

        let mut engine = Engine::open_path(&path).expect("reopen");
        let second = engine.save(json!(2)).expect("save");
        assert_ne!(first, second);
        assert_eq!(engine.node_count(), 2);
    }

    #[test]
    fn required_file_missing_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = EngineConfig {
            create_if_missing: false,
            ..EngineConfig::at(dir.path().join("absent.json"))
        };
        assert!(matches!(
            Engine::open(config),
            Err(RelatticeError::StorageMissing(_))
        ));
    }
}
