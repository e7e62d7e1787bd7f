//! # Audit Log
//!
//! Append-only record of every state written through the engine, kept
//! separately from the node table. Overwriting a node appends a new entry;
//! deleting a node removes nothing from here.

use crate::State;
use serde::{Deserialize, Serialize};

/// One audit record: the sequence number and the state that was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub seq: u64,
    pub state: State,
}

/// Chronological log of created states.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    entries: Vec<HistoryEntry>,
    next_seq: u64,
}

impl AuditLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from persisted entries. Entries are re-sorted by `seq`
    /// and new records continue after the highest one.
    #[must_use]
    pub fn from_entries(mut entries: Vec<HistoryEntry>) -> Self {
        entries.sort_by_key(|entry| entry.seq);
        let next_seq = entries
            .last()
            .map(|entry| entry.seq.saturating_add(1))
            .unwrap_or(0);
        Self { entries, next_seq }
    }

    /// Append a state. Returns its sequence number.
    pub fn record(&mut self, state: State) -> u64 {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        self.entries.push(HistoryEntry { seq, state });
        seq
    }

    /// States, most recent first, truncated to `limit` when given.
    #[must_use]
    pub fn recent(&self, limit: Option<usize>) -> Vec<State> {
        let take = limit.unwrap_or(self.entries.len());
        self.entries
            .iter()
            .rev()
            .take(take)
            .map(|entry| entry.state.clone())
            .collect()
    }

    /// All entries in chronological order.
    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
