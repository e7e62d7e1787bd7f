//! # Data Agent Protocol
//!
//! The narrow save/load surface external state stores expect. Anything that
//! can mint an id for a state and hand back a snapshot of all states is a
//! data agent; the graph algebra is not part of the contract.

use crate::engine::Engine;
use crate::shared::SharedEngine;
use crate::{NodeId, RelatticeError, State};
use std::collections::BTreeMap;

/// A store of opaque states addressed by generated ids.
pub trait DataAgent {
    /// Persist `state` under a fresh id.
    fn save(&mut self, state: State) -> Result<NodeId, RelatticeError>;

    /// Every stored state by id.
    fn load(&self) -> Result<BTreeMap<NodeId, State>, RelatticeError>;
}

impl DataAgent for Engine {
    fn save(&mut self, state: State) -> Result<NodeId, RelatticeError> {
        Engine::save(self, state)
    }

    fn load(&self) -> Result<BTreeMap<NodeId, State>, RelatticeError> {
        Ok(Engine::load(self))
    }
}

impl DataAgent for SharedEngine {
    fn save(&mut self, state: State) -> Result<NodeId, RelatticeError> {
        SharedEngine::save(self, state)
    }

    fn load(&self) -> Result<BTreeMap<NodeId, State>, RelatticeError> {
        SharedEngine::load(self)
    }
}
