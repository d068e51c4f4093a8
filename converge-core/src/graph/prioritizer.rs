//! Priorities
//!
//! A prioritizer decides where each vertex sits among vertices that become
//! ready at the same time. The sequential prioritizer hands out increasing
//! numbers in insertion order, so independent resources run in the order
//! they were declared.

use std::collections::HashMap;

use tracing::warn;

use super::ready::Priority;
use super::vertex::VertexId;

/// Largest priority a caller may choose. `Priority::MAX` is kept for the
/// sequence so it can always step past recorded priorities.
pub const MAX_PRIORITY: Priority = Priority::MAX - 1;

/// Assigns and remembers vertex priorities.
pub trait Prioritizer {
    /// Assign a fresh priority to `vertex` and remember it.
    fn generate_priority_for(&mut self, vertex: VertexId) -> Priority;

    /// Remember a caller-chosen priority for `vertex`. Callers keep
    /// `priority` at or below [`MAX_PRIORITY`].
    fn record_priority_for(&mut self, vertex: VertexId, priority: Priority);

    /// The priority assigned to `vertex`, if any.
    fn priority_of(&self, vertex: VertexId) -> Option<Priority>;

    /// Drop the priority of a removed vertex.
    fn forget(&mut self, vertex: VertexId);
}

/// Priorities in insertion order. Numbers are never reused.
#[derive(Debug, Clone, Default)]
pub struct SequentialPrioritizer {
    next: Priority,
    priorities: HashMap<VertexId, Priority>,
}

impl SequentialPrioritizer {
    /// Start the sequence at zero.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Prioritizer for SequentialPrioritizer {
    fn generate_priority_for(&mut self, vertex: VertexId) -> Priority {
        let priority = self.next;
        match self.next.checked_add(1) {
            Some(next) => self.next = next,
            None => warn!(%vertex, "priority sequence exhausted, priorities will repeat"),
        }
        self.priorities.insert(vertex, priority);
        priority
    }

    fn record_priority_for(&mut self, vertex: VertexId, priority: Priority) {
        self.priorities.insert(vertex, priority);
        let after = priority.min(MAX_PRIORITY) + 1;
        self.next = self.next.max(after);
    }

    fn priority_of(&self, vertex: VertexId) -> Option<Priority> {
        self.priorities.get(&vertex).copied()
    }

    fn forget(&mut self, vertex: VertexId) {
        self.priorities.remove(&vertex);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priorities_follow_insertion_order() {
        let mut prioritizer = SequentialPrioritizer::new();
        let first = prioritizer.generate_priority_for(VertexId::new(7));
        let second = prioritizer.generate_priority_for(VertexId::new(2));
        assert!(first < second);
        assert_eq!(prioritizer.priority_of(VertexId::new(7)), Some(first));
    }

    #[test]
    fn forgotten_priorities_are_not_reused() {
        let mut prioritizer = SequentialPrioritizer::new();
        let first = prioritizer.generate_priority_for(VertexId::new(0));
        prioritizer.forget(VertexId::new(0));
        assert_eq!(prioritizer.priority_of(VertexId::new(0)), None);

        let second = prioritizer.generate_priority_for(VertexId::new(1));
        assert_ne!(first, second);
    }

    #[test]
    fn recorded_priorities_push_the_sequence_forward() {
        let mut prioritizer = SequentialPrioritizer::new();
        prioritizer.record_priority_for(VertexId::new(0), 41);
        assert_eq!(prioritizer.priority_of(VertexId::new(0)), Some(41));
        assert_eq!(prioritizer.generate_priority_for(VertexId::new(1)), 42);
    }

    #[test]
    fn recording_the_largest_priority_keeps_the_sequence_going() {
        let mut prioritizer = SequentialPrioritizer::new();
        prioritizer.record_priority_for(VertexId::new(0), MAX_PRIORITY);

        let next = prioritizer.generate_priority_for(VertexId::new(1));
        assert_eq!(next, Priority::MAX);
        assert!(next > MAX_PRIORITY);

        // The sequence is exhausted but generation still does not panic.
        assert_eq!(prioritizer.generate_priority_for(VertexId::new(2)), Priority::MAX);
    }
}
