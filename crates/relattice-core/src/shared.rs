//! # Shared Engine Handle
//!
//! A cloneable, thread-safe handle around one `Engine`.
//!
//! Mutations hold the write lock across "mutate in memory, then flush", so
//! two writers never race on the backing file and no reader ever sees a
//! half-applied mutation. An explicit `flush` takes the write lock too.
//! Reads share the read lock.

use crate::engine::Engine;
use crate::lattice::Relation;
use crate::query::{Query, QueryResult};
use crate::traversal::Subgraph;
use crate::{Direction, Edge, EdgeKind, Metadata, Node, NodeId, RelatticeError, State};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared ownership of an engine.
#[derive(Debug, Clone)]
pub struct SharedEngine {
    inner: Arc<RwLock<Engine>>,
}

impl SharedEngine {
    #[must_use]
    pub fn new(engine: Engine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    /// Run `f` under the read lock.
    pub fn read<T>(&self, f: impl FnOnce(&Engine) -> T) -> Result<T, RelatticeError> {
        let guard = self.read_guard()?;
        Ok(f(&*guard))
    }

    /// Run `f` under the write lock.
    pub fn write<T>(&self, f: impl FnOnce(&mut Engine) -> T) -> Result<T, RelatticeError> {
        let mut guard = self.write_guard()?;
        Ok(f(&mut *guard))
    }

    fn read_guard(&self) -> Result<RwLockReadGuard<'_, Engine>, RelatticeError> {
        self.inner.read().map_err(|_| {
            tracing::error!("engine lock poisoned");
            RelatticeError::LockPoisoned
        })
    }

    fn write_guard(&self) -> Result<RwLockWriteGuard<'_, Engine>, RelatticeError> {
        self.inner.write().map_err(|_| {
            tracing::error!("engine lock poisoned");
            RelatticeError::LockPoisoned
        })
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    pub fn add_node(&self, id: impl Into<NodeId>, state: State) -> Result<(), RelatticeError> {
        self.write_guard()?.add_node(id, state)
    }

    pub fn add_edge(
        &self,
        source: impl Into<NodeId>,
        kind: impl Into<EdgeKind>,
        target: impl Into<NodeId>,
        metadata: Metadata,
        bidirectional: bool,
    ) -> Result<(), RelatticeError> {
        self.write_guard()?
            .add_edge(source, kind, target, metadata, bidirectional)
    }

    pub fn delete_node(&self, id: &str) -> Result<bool, RelatticeError> {
        self.write_guard()?.delete_node(id)
    }

    pub fn remove_edge(
        &self,
        source: &str,
        kind: &EdgeKind,
        target: &str,
    ) -> Result<bool, RelatticeError> {
        self.write_guard()?.remove_edge(source, kind, target)
    }

    pub fn save(&self, state: State) -> Result<NodeId, RelatticeError> {
        self.write_guard()?.save(state)
    }

    pub fn flush(&self) -> Result<(), RelatticeError> {
        self.write_guard()?.flush()
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Owned copy of a node; the lock is released before returning.
    pub fn get_node(&self, id: &str) -> Result<Option<Node>, RelatticeError> {
        self.read(|engine| engine.get_node(id).cloned())
    }

    pub fn node_exists(&self, id: &str) -> Result<bool, RelatticeError> {
        self.read(|engine| engine.node_exists(id))
    }

    pub fn list_nodes(&self) -> Result<BTreeSet<NodeId>, RelatticeError> {
        self.read(Engine::list_nodes)
    }

    pub fn get_edges(
        &self,
        node: &str,
        direction: Direction,
        kind: Option<&EdgeKind>,
    ) -> Result<Vec<Edge>, RelatticeError> {
        self.read(|engine| engine.get_edges(node, direction, kind))
    }

    pub fn edges_of_kind(&self, kind: &EdgeKind) -> Result<Vec<Edge>, RelatticeError> {
        self.read(|engine| engine.edges_of_kind(kind))
    }

    pub fn entails(&self, a: &str, b: &str) -> Result<bool, RelatticeError> {
        self.read(|engine| engine.entails(a, b))
    }

    pub fn meet(&self, a: &str, b: &str) -> Result<Option<NodeId>, RelatticeError> {
        self.read(|engine| engine.meet(a, b))
    }

    pub fn compare(&self, a: &str, b: &str) -> Result<Relation, RelatticeError> {
        self.read(|engine| engine.compare(a, b))
    }

    pub fn lineage(&self, id: &str) -> Result<Vec<NodeId>, RelatticeError> {
        self.read(|engine| engine.lineage(id))
    }

    pub fn descendants(&self, id: &str) -> Result<BTreeSet<NodeId>, RelatticeError> {
        self.read(|engine| engine.descendants(id))
    }

    pub fn derivation_path(&self, a: &str, b: &str) -> Result<Option<Vec<NodeId>>, RelatticeError> {
        self.read(|engine| engine.derivation_path(a, b))
    }

    pub fn traverse(&self, start: &str, depth: usize) -> Result<Subgraph, RelatticeError> {
        self.read(|engine| engine.traverse(start, depth))
    }

    pub fn find_path(&self, a: &str, b: &str) -> Result<Option<Vec<Edge>>, RelatticeError> {
        self.read(|engine| engine.find_path(a, b))
    }

    pub fn connected_components(&self) -> Result<Vec<BTreeSet<NodeId>>, RelatticeError> {
        self.read(Engine::connected_components)
    }

    pub fn execute(&self, query: &Query) -> Result<QueryResult, RelatticeError> {
        self.read(|engine| engine.execute(query))
    }

    pub fn history(&self, limit: Option<usize>) -> Result<Vec<State>, RelatticeError> {
        self.read(|engine| engine.history(limit))
    }

    pub fn load(&self) -> Result<BTreeMap<NodeId, State>, RelatticeError> {
        self.read(Engine::load)
    }
}

impl From<Engine> for SharedEngine {
    fn from(engine: Engine) -> Self {
        Self::new(engine)
    }
}

// =============================================================================
// TESTS
// =============================================================================
