//! Error types for graph construction, scheduling and property changes.
//!
//! Structural and cycle errors surface synchronously at the point they are
//! detected. Per-resource apply failures are not represented here: the
//! scheduler only sequences vertices, it never judges their outcome.

use thiserror::Error;

use crate::graph::{CycleReport, EventSpec, VertexId};

/// Errors raised while building or traversing a dependency graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A relationship names an event it can fire but no callback to fire.
    ///
    /// Any concrete event other than the "none" and "any" sentinels must be
    /// paired with a callback.
    #[error("invalid relationship: event '{event}' has no callback")]
    InvalidRelationship {
        /// The event the relationship was declared with.
        event: EventSpec,
    },

    /// The graph contains at least one directed cycle.
    ///
    /// Raised before any vertex is handed to the apply step.
    #[error("{0}")]
    CycleDetected(CycleReport),

    /// A vertex id does not refer to a live vertex of this graph.
    #[error("unknown vertex: {0}")]
    UnknownVertex(VertexId),

    /// An argument to a graph query was out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Errors raised while applying a [`PropertyChange`](crate::change::PropertyChange).
#[derive(Debug, Error)]
pub enum ChangeError {
    /// `forward` or `backward` was called with no active run context.
    #[error("property '{property}' cannot be changed outside of a run")]
    NotInRun {
        /// Name of the property the change was for.
        property: String,
    },

    /// The property's sync action failed.
    #[error("could not sync property '{property}': {source}")]
    SyncFailed {
        /// Name of the property the change was for.
        property: String,
        /// Error returned by the sync action.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed traversal config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for graph operations.
pub type Result<T, E = GraphError> = std::result::Result<T, E>;
