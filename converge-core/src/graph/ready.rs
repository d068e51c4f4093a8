//! Ready Queue
//!
//! Vertices whose dependencies have all finished wait here, ordered by
//! priority. Besides insert and extract-min the queue supports removing an
//! arbitrary entry in O(log n): a relationship added while a run is live can
//! make a ready vertex unsafe to start.

use std::collections::BTreeSet;

use super::vertex::VertexId;

/// Scheduling priority. Lower runs first.
pub type Priority = u64;

/// Priority-ordered set of runnable vertices.
///
/// Entries are keyed by `(priority, vertex)`, so two vertices sharing a
/// priority still both fit and leave in id order.
#[derive(Debug, Clone, Default)]
pub struct ReadyQueue {
    entries: BTreeSet<(Priority, VertexId)>,
}

impl ReadyQueue {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex. Returns false if it was already queued at that priority.
    pub fn insert(&mut self, priority: Priority, vertex: VertexId) -> bool {
        self.entries.insert((priority, vertex))
    }

    /// Take the lowest-priority vertex.
    pub fn pop(&mut self) -> Option<VertexId> {
        self.entries.pop_first().map(|(_, vertex)| vertex)
    }

    /// Retract a vertex. Returns true if it was queued.
    pub fn remove(&mut self, priority: Priority, vertex: VertexId) -> bool {
        self.entries.remove(&(priority, vertex))
    }

    /// Whether `vertex` is queued at `priority`.
    pub fn contains(&self, priority: Priority, vertex: VertexId) -> bool {
        self.entries.contains(&(priority, vertex))
    }

    /// Whether nothing is ready.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
