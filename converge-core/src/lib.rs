//! Converge Core
//!
//! This crate provides the core of the Converge configuration engine. Once
//! a catalog of resources has been compiled, it applies those resources in
//! an order consistent with their declared dependencies. It implements:
//!
//! - A directed dependency graph with cycle detection and diagnostics
//! - A priority-ordered scheduler with deferred-resource handling
//! - Property changes that sync a resource toward its desired state
//! - Event routing that turns changes into refresh callbacks
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: the dependency graph and the relationship scheduler
//! - `change`: properties, property changes, events and the run context
//! - `notify`: routing of events along relationships to callbacks
//! - `config`: traversal configuration
//! - `resource`: resource references, the usual vertex type
//!
//! # Example
//!
//! ```rust,ignore
//! use converge_core::graph::{Callback, DefaultPolicy, Relationship, RelationshipGraph};
//! use converge_core::resource::ResourceRef;
//!
//! let package = ResourceRef::new("package", "nginx");
//! let config = ResourceRef::new("file", "/etc/nginx/nginx.conf");
//! let service = ResourceRef::new("service", "nginx");
//!
//! let mut graph = RelationshipGraph::new();
//! graph.add_relationship(package.clone(), config.clone(), Relationship::ordering());
//! graph.add_relationship(config, service, Relationship::subscribe(Callback::refresh()));
//!
//! // Runs the package, then the file, then the service.
//! graph.traverse(&mut DefaultPolicy, |_, resource, _| println!("applying {resource}"))?;
//! ```

pub mod change;
pub mod config;
pub mod error;
pub mod graph;
pub mod notify;
pub mod resource;

pub use config::TraversalConfig;
pub use error::{ChangeError, ConfigError, GraphError, Result};
