//! Graph Identifiers
//!
//! Vertices and edges live in arenas owned by the graph. They are addressed
//! by index newtypes rather than references, so mutually dependent
//! resources never need to borrow each other.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a vertex within one graph.
///
/// Ids are handed out in insertion order and never reused, even after the
/// vertex is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(usize);

impl VertexId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the arena index.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Stable identifier of an edge within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(usize);

impl EdgeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the arena index.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Which way to follow edges from a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Follow edges backwards, towards the vertices this one depends on.
    In,

    /// Follow edges forwards, towards the vertices that depend on this one.
    Out,
}

impl Direction {
    /// The opposite direction.
    pub fn reverse(self) -> Self {
        match self {
            Direction::In => Direction::Out,
            Direction::Out => Direction::In,
        }
    }
}
