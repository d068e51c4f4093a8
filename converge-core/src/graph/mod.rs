//! Dependency Graph
//!
//! This module implements the graph of resources and the relationships
//! between them, and the scheduler that applies resources in dependency
//! order.
//!
//! # Overview
//!
//! The dependency graph is a directed graph where:
//!
//! - Vertices represent resources
//! - Edges represent relationships: if B depends on A, there is an edge from
//!   A to B. An edge may also carry an event and a callback, so that an event
//!   emitted while applying A triggers the callback on B
//!
//! [`Graph`] is the plain storage. [`RelationshipGraph`] wraps it with
//! priorities and the per-run blocker bookkeeping, and drives a
//! [`RunPolicy`] through [`RelationshipGraph::traverse`].
//!
//! # Design Decisions
//!
//! 1. Vertices and edges live in arenas and are referred to by index, so
//!    cyclic structures need no shared ownership.
//!
//! 2. Both adjacency directions are stored, so dependencies and dependents
//!    are equally cheap to walk.
//!
//! 3. The graph accepts cycles while it is being assembled. They are
//!    rejected when a traversal starts.

mod cycles;
mod policy;
mod prioritizer;
mod ready;
mod relationship;
mod scheduler;
mod simple;
mod vertex;

pub use cycles::{CycleInfo, CycleReport};
pub use policy::{DefaultPolicy, RunPolicy, TraverseOptions};
pub use prioritizer::{Prioritizer, SequentialPrioritizer, MAX_PRIORITY};
pub use ready::{Priority, ReadyQueue};
pub use relationship::{Callback, EventName, EventSpec, Relationship};
pub use scheduler::{RelationshipGraph, TraversalSummary};
pub use simple::{Edge, Graph};
pub use vertex::{Direction, EdgeId, VertexId};
