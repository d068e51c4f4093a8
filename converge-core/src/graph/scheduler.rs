//! Relationship Scheduler
//!
//! The scheduler decides the order in which resources are applied. It
//! ensures that a resource only runs once every resource it depends on has
//! finished.
//!
//! # Algorithm
//!
//! Every vertex gets a priority when it is first added. A run then works
//! from three pieces of state:
//!
//! 1. `blockers`: for each vertex, how many direct dependencies have not
//!    finished yet
//! 2. `ready`: vertices with no blockers left, ordered by priority
//! 3. `done`: vertices that have finished
//!
//! The loop pops the lowest-priority ready vertex and asks the
//! [`RunPolicy`] whether it can run now:
//!
//! - If it can, it is applied and finished. Finishing unblocks each
//!   dependent and enqueues the ones with no blockers left
//! - If it cannot, it is deferred. Once the ready queue drains, deferred
//!   vertices are retried if anything finished in the meantime, and
//!   force-finished as overly deferred if nothing did
//!
//! A failed apply still finishes its vertex. The scheduler sequences
//! resources; it never judges them.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::hash::Hash;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, error, trace, warn};

use super::cycles::CycleReport;
use super::policy::RunPolicy;
use super::prioritizer::{Prioritizer, SequentialPrioritizer, MAX_PRIORITY};
use super::ready::{Priority, ReadyQueue};
use super::relationship::{EventSpec, Relationship};
use super::simple::{Edge, Graph};
use super::vertex::{EdgeId, VertexId};
use crate::change::RunContext;
use crate::config::TraversalConfig;
use crate::error::{GraphError, Result};

/// What happened to each vertex during one traversal.
///
/// Every list keeps the order in which vertices were processed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TraversalSummary {
    /// Vertices handed to the apply closure.
    pub applied: Vec<VertexId>,
    /// Vertices finished without being applied because they never became
    /// suitable.
    pub overly_deferred: Vec<VertexId>,
    /// Vertices finished without being applied because the run was
    /// cancelled.
    pub canceled: Vec<VertexId>,
}

impl TraversalSummary {
    /// Whether the run stopped early.
    pub fn is_canceled(&self) -> bool {
        !self.canceled.is_empty()
    }

    /// Number of vertices the run went through, applied or not.
    pub fn processed(&self) -> usize {
        self.applied.len() + self.overly_deferred.len() + self.canceled.len()
    }
}

/// Bookkeeping for a single run. Rebuilt from scratch by every traversal.
#[derive(Debug, Default)]
struct RunState {
    ready: ReadyQueue,
    blockers: HashMap<VertexId, usize>,
    done: HashSet<VertexId>,
}

/// A dependency graph of resources that knows how to run itself.
#[derive(Debug)]
pub struct RelationshipGraph<V, P = SequentialPrioritizer> {
    graph: Graph<V, Relationship>,
    prioritizer: P,
    config: TraversalConfig,
    run: RunState,
}

impl<V> RelationshipGraph<V>
where
    V: Clone + Eq + Hash + fmt::Display,
{
    /// Create an empty graph with the default configuration.
    pub fn new() -> Self {
        Self::with_config(TraversalConfig::default())
    }

    /// Create an empty graph with `config`.
    pub fn with_config(config: TraversalConfig) -> Self {
        Self::with_prioritizer(SequentialPrioritizer::new(), config)
    }

    /// Take over an assembled graph. Priorities follow vertex insertion
    /// order.
    pub fn from_graph(graph: Graph<V, Relationship>, config: TraversalConfig) -> Self {
        let mut relationships = Self::with_config(config);
        relationships.graph = graph;
        relationships.assign_priorities();
        relationships
    }
}

impl<V> Default for RelationshipGraph<V>
where
    V: Clone + Eq + Hash + fmt::Display,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V, P> RelationshipGraph<V, P>
where
    V: Clone + Eq + Hash + fmt::Display,
    P: Prioritizer,
{
    /// Create an empty graph that takes priorities from `prioritizer`.
    pub fn with_prioritizer(prioritizer: P, config: TraversalConfig) -> Self {
        Self {
            graph: Graph::new(),
            prioritizer,
            config,
            run: RunState::default(),
        }
    }

    /// The underlying graph, for queries.
    pub fn graph(&self) -> &Graph<V, Relationship> {
        &self.graph
    }

    /// Settings for cycle reports and graph output.
    pub fn config(&self) -> &TraversalConfig {
        &self.config
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    /// Whether the graph has no vertices.
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Id of `vertex`, if it is in the graph.
    pub fn lookup(&self, vertex: &V) -> Option<VertexId> {
        self.graph.lookup(vertex)
    }

    /// The vertex stored under `id`.
    pub fn vertex(&self, id: VertexId) -> Option<&V> {
        self.graph.vertex(id)
    }

    /// Priority assigned to `id`.
    pub fn priority_of(&self, id: VertexId) -> Option<Priority> {
        self.prioritizer.priority_of(id)
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Add a vertex. A vertex added for the first time gets the next
    /// priority; re-adding keeps the priority it already has.
    pub fn add_vertex(&mut self, vertex: V) -> VertexId {
        let id = self.graph.add_vertex(vertex);
        self.priority(id);
        id
    }

    /// Add a vertex with a caller-chosen priority.
    ///
    /// If the vertex already has a priority it is kept. Priorities above
    /// [`MAX_PRIORITY`] are rejected before the vertex is added.
    pub fn add_vertex_with_priority(&mut self, vertex: V, priority: Priority) -> Result<VertexId> {
        if priority > MAX_PRIORITY {
            return Err(GraphError::InvalidArgument(format!(
                "priority {priority} is above the largest allowed priority {MAX_PRIORITY}"
            )));
        }
        let id = self.graph.add_vertex(vertex);
        if self.prioritizer.priority_of(id).is_none() {
            self.prioritizer.record_priority_for(id, priority);
        }
        Ok(id)
    }

    /// Remove a vertex and its edges.
    ///
    /// During a run, dependents waiting on an unfinished vertex stop
    /// waiting for it.
    pub fn remove_vertex(&mut self, id: VertexId) -> Option<V> {
        if !self.graph.has_vertex(id) {
            return None;
        }

        if !self.run.done.contains(&id) {
            for dependent in self.graph.direct_dependents_of(id) {
                if self.run.blockers.contains_key(&dependent) && self.unblock(dependent) {
                    self.enqueue(dependent);
                }
            }
        }

        if let Some(priority) = self.prioritizer.priority_of(id) {
            self.run.ready.remove(priority, id);
        }
        self.prioritizer.forget(id);
        self.run.blockers.remove(&id);
        self.run.done.remove(&id);
        self.graph.remove_vertex(id)
    }

    /// Declare that `target` depends on `source`, adding either if missing.
    pub fn add_relationship(&mut self, source: V, target: V, relationship: Relationship) -> EdgeId {
        let source = self.add_vertex(source);
        let target = self.add_vertex(target);
        let edge = self.graph.link(source, target, relationship);
        self.block(source, target);
        edge
    }

    /// Declare a relationship between two existing vertices.
    pub fn add_edge_between(&mut self, source: VertexId, target: VertexId, relationship: Relationship) -> Result<EdgeId> {
        let edge = self.graph.add_edge_between(source, target, relationship)?;
        self.block(source, target);
        Ok(edge)
    }

    /// Remove one relationship.
    ///
    /// During a run, a target that no longer waits on anything becomes
    /// ready.
    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge<Relationship>> {
        let edge = self.graph.remove_edge(id)?;
        let (source, target) = (edge.source(), edge.target());

        let still_linked = self.graph.has_edge(source, target);
        if !still_linked
            && !self.run.done.contains(&source)
            && self.run.blockers.contains_key(&target)
            && self.unblock(target)
        {
            self.enqueue(target);
        }
        Some(edge)
    }

    /// A new edge from an unfinished source makes its target wait again.
    fn block(&mut self, source: VertexId, target: VertexId) {
        if self.run.done.contains(&source) || self.run.done.contains(&target) {
            return;
        }

        if let Some(priority) = self.prioritizer.priority_of(target) {
            if self.run.ready.remove(priority, target) {
                trace!(vertex = %self.graph.label(target), "retracted from ready queue");
            }
        }

        // Several edges between one pair count as a single blocker.
        if self.graph.edges_between(source, target).len() == 1 {
            if let Some(count) = self.run.blockers.get_mut(&target) {
                *count += 1;
            }
        }
    }

    fn priority(&mut self, id: VertexId) -> Priority {
        match self.prioritizer.priority_of(id) {
            Some(priority) => priority,
            None => self.prioritizer.generate_priority_for(id),
        }
    }

    fn assign_priorities(&mut self) {
        let ids: Vec<VertexId> = self.graph.vertex_ids().collect();
        for id in ids {
            self.priority(id);
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Vertices that transitively depend on `id`.
    pub fn dependents(&self, id: VertexId) -> Vec<VertexId> {
        self.graph.dependents(id)
    }

    /// Vertices `id` transitively depends on.
    pub fn dependencies(&self, id: VertexId) -> Vec<VertexId> {
        self.graph.dependencies(id)
    }

    /// Out-edges of `source` that an emitted event propagates along.
    pub fn matching_edges(&self, source: VertexId, event: &EventSpec) -> Vec<EdgeId> {
        self.graph.matching_edges(source, event)
    }

    /// Describe every cycle in the graph, if there are any.
    pub fn report_cycles(&self) -> Option<CycleReport> {
        self.graph.report_cycles(&self.config)
    }

    /// Write the graph as `<name>.dot` into the configured graph directory.
    ///
    /// Returns the file written, or `None` when no directory is configured.
    pub fn write_graph(&self, name: &str) -> io::Result<Option<PathBuf>> {
        let Some(dir) = &self.config.graph_dir else {
            return Ok(None);
        };

        fs::create_dir_all(dir)?;
        let file = dir.join(format!("{name}.dot"));
        fs::write(&file, self.graph.to_dot(name))?;
        debug!(file = %file.display(), "wrote graph");
        Ok(Some(file))
    }

    // ========================================================================
    // Run primitives
    // ========================================================================

    /// Compute blocker counts for every vertex and enqueue the ones that
    /// wait on nothing.
    pub fn enqueue_roots(&mut self) {
        let ids: Vec<VertexId> = self.graph.vertex_ids().collect();
        for id in ids {
            let count = self.pending_dependencies(id);
            self.run.blockers.insert(id, count);
            if count == 0 {
                self.enqueue(id);
            }
        }
    }

    /// Make a vertex ready. Finished vertices are never re-queued.
    pub fn enqueue(&mut self, id: VertexId) {
        if self.run.done.contains(&id) || !self.graph.has_vertex(id) {
            return;
        }
        let priority = self.priority(id);
        self.run.ready.insert(priority, id);
    }

    /// Take the ready vertex with the lowest priority.
    pub fn next_resource(&mut self) -> Option<VertexId> {
        self.run.ready.pop()
    }

    /// Record that one dependency of `id` finished.
    ///
    /// Returns true when `id` has no unfinished dependencies left.
    pub fn unblock(&mut self, id: VertexId) -> bool {
        let count = match self.run.blockers.get(&id) {
            Some(count) => *count,
            None => self.pending_dependencies(id),
        };

        let remaining = match count.checked_sub(1) {
            Some(remaining) => remaining,
            None => {
                warn!(vertex = %self.graph.label(id), "blocker count went negative, clamping to zero");
                0
            }
        };
        self.run.blockers.insert(id, remaining);
        remaining == 0
    }

    /// Mark `id` done and release its dependents.
    ///
    /// Finishing a vertex twice has no further effect.
    pub fn finish(&mut self, id: VertexId) {
        if !self.graph.has_vertex(id) {
            warn!(vertex = %id, "finish called for unknown vertex");
            return;
        }
        if self.run.done.contains(&id) {
            trace!(vertex = %self.graph.label(id), "already finished");
            return;
        }

        for dependent in self.graph.direct_dependents_of(id) {
            if self.unblock(dependent) {
                self.enqueue(dependent);
            }
        }
        self.run.done.insert(id);
    }

    /// Whether `id` has finished in the current run.
    pub fn is_done(&self, id: VertexId) -> bool {
        self.run.done.contains(&id)
    }

    /// Whether `id` is waiting in the ready queue.
    pub fn is_ready(&self, id: VertexId) -> bool {
        self.prioritizer
            .priority_of(id)
            .is_some_and(|priority| self.run.ready.contains(priority, id))
    }

    /// Tracked blocker count of `id`, if the current run has computed one.
    pub fn blockers(&self, id: VertexId) -> Option<usize> {
        self.run.blockers.get(&id).copied()
    }

    fn pending_dependencies(&self, id: VertexId) -> usize {
        self.graph
            .direct_dependencies_of(id)
            .into_iter()
            .filter(|dependency| !self.run.done.contains(dependency))
            .count()
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Run every vertex through `apply` in dependency order.
    ///
    /// `apply` also gets read access to the graph, so it can route the
    /// events a vertex emits along its relationships.
    ///
    /// Fails with [`GraphError::CycleDetected`] before anything is applied
    /// if the graph has a cycle. Otherwise every vertex is processed exactly
    /// once: applied, overly deferred, or cancelled.
    pub fn traverse<Pol, F>(&mut self, policy: &mut Pol, mut apply: F) -> Result<TraversalSummary>
    where
        Pol: RunPolicy<V> + ?Sized,
        F: FnMut(VertexId, &V, &Graph<V, Relationship>),
    {
        self.assign_priorities();

        if self.graph.is_cyclic() {
            let report = self.graph.report_cycles(&self.config).unwrap_or_default();
            error!(cycles = report.len(), "{report}");
            return Err(GraphError::CycleDetected(report));
        }

        let context = RunContext::begin();
        debug!(run = %context.run_id(), vertices = self.graph.len(), "starting traversal");

        self.run = RunState::default();
        self.enqueue_roots();

        let mut summary = TraversalSummary::default();
        let mut deferred: Vec<VertexId> = Vec::new();
        let mut made_progress = false;
        let mut canceled = false;

        loop {
            if self.run.ready.is_empty() {
                if deferred.is_empty() {
                    break;
                }

                if made_progress {
                    debug!(deferred = deferred.len(), "retrying deferred resources");
                    for id in std::mem::take(&mut deferred) {
                        if self.run.blockers.get(&id).copied().unwrap_or(0) == 0 {
                            self.enqueue(id);
                        }
                    }
                } else {
                    for id in std::mem::take(&mut deferred) {
                        if let Some(vertex) = self.graph.vertex(id) {
                            warn!(vertex = %vertex, "resource never became suitable, finishing it without applying");
                            policy.on_overly_deferred(id, vertex);
                        }
                        summary.overly_deferred.push(id);
                        self.finish(id);
                    }
                }
                made_progress = false;
                continue;
            }

            if !policy.should_continue() {
                canceled = true;
                break;
            }

            let Some(id) = self.next_resource() else {
                break;
            };
            let Some(vertex) = self.graph.vertex(id) else {
                continue;
            };

            if policy.is_suitable(id, vertex) {
                policy.pre_process(id, vertex);
                trace!(vertex = %vertex, "applying");
                apply(id, vertex, &self.graph);
                summary.applied.push(id);
                made_progress = true;
                self.finish(id);
            } else {
                trace!(vertex = %vertex, "deferring");
                deferred.push(id);
            }
        }

        if canceled {
            for id in deferred {
                self.enqueue(id);
            }
            while let Some(id) = self.next_resource() {
                if let Some(vertex) = self.graph.vertex(id) {
                    warn!(vertex = %vertex, "skipping resource, run was canceled");
                    policy.on_canceled(id, vertex);
                }
                summary.canceled.push(id);
                self.finish(id);
            }
        }

        policy.teardown();
        self.run = RunState::default();

        debug!(
            run = %context.run_id(),
            applied = summary.applied.len(),
            overly_deferred = summary.overly_deferred.len(),
            canceled = summary.canceled.len(),
            "finished traversal"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Callback, DefaultPolicy, TraverseOptions};
    use std::cell::Cell;

    type Names = RelationshipGraph<&'static str>;

    fn chain(names: &[&'static str]) -> Names {
        let mut graph = Names::new();
        for name in names {
            graph.add_vertex(name);
        }
        for pair in names.windows(2) {
            graph.add_relationship(pair[0], pair[1], Relationship::ordering());
        }
        graph
    }

    fn run(graph: &mut Names) -> Vec<&'static str> {
        let mut order = Vec::new();
        graph
            .traverse(&mut DefaultPolicy, |_, name, _| order.push(*name))
            .unwrap();
        order
    }

    fn id(graph: &Names, name: &'static str) -> VertexId {
        graph.lookup(&name).unwrap()
    }

    #[test]
    fn chain_runs_in_dependency_order() {
        let mut graph = Names::new();
        // Declared out of order: dependency order wins over priority.
        graph.add_vertex("c");
        graph.add_relationship("b", "c", Relationship::ordering());
        graph.add_relationship("a", "b", Relationship::ordering());

        assert_eq!(run(&mut graph), vec!["a", "b", "c"]);
    }

    #[test]
    fn independent_vertices_run_in_declaration_order() {
        let mut graph = Names::new();
        graph.add_vertex("x");
        graph.add_vertex("y");
        graph.add_vertex("z");

        assert_eq!(run(&mut graph), vec!["x", "y", "z"]);
    }

    #[test]
    fn explicit_priorities_break_ties() {
        let mut graph = Names::new();
        graph.add_vertex_with_priority("late", 100).unwrap();
        graph.add_vertex_with_priority("early", 1).unwrap();
        // Re-adding keeps the first priority.
        graph.add_vertex_with_priority("late", 0).unwrap();

        assert_eq!(graph.priority_of(id(&graph, "late")), Some(100));
        assert_eq!(run(&mut graph), vec!["early", "late"]);
    }

    #[test]
    fn out_of_range_priority_is_rejected() {
        let mut graph = Names::new();
        let err = graph.add_vertex_with_priority("pinned", Priority::MAX).unwrap_err();
        assert!(matches!(err, GraphError::InvalidArgument(_)));
        assert!(graph.lookup(&"pinned").is_none());

        graph.add_vertex_with_priority("pinned", MAX_PRIORITY).unwrap();
        graph.add_vertex("next");
        assert!(graph.priority_of(id(&graph, "next")) > graph.priority_of(id(&graph, "pinned")));
        assert_eq!(run(&mut graph), vec!["pinned", "next"]);
    }

    #[test]
    fn re_adding_a_vertex_keeps_its_priority() {
        let mut graph = Names::new();
        let a = graph.add_vertex("a");
        graph.add_vertex("b");
        let priority = graph.priority_of(a);
        assert_eq!(graph.add_vertex("a"), a);
        assert_eq!(graph.priority_of(a), priority);
    }

    #[test]
    fn cycle_is_reported_before_anything_runs() {
        let mut graph = Names::new();
        graph.add_relationship("a", "b", Relationship::ordering());
        graph.add_relationship("b", "a", Relationship::ordering());

        let mut applied = 0;
        let err = graph
            .traverse(&mut DefaultPolicy, |_, _, _| applied += 1)
            .unwrap_err();

        assert_eq!(applied, 0);
        match err {
            GraphError::CycleDetected(report) => {
                assert_eq!(report.len(), 1);
                assert!(report.to_string().contains("a => b => a"));
            }
            other => panic!("expected a cycle, got {other}"),
        }
    }

    #[test]
    fn enqueue_roots_counts_direct_dependencies() {
        let mut graph = Names::new();
        graph.add_relationship("a", "c", Relationship::ordering());
        graph.add_relationship("b", "c", Relationship::ordering());
        // A second edge between the same pair is not a second blocker.
        graph.add_relationship("b", "c", Relationship::subscribe(Callback::refresh()));
        graph.enqueue_roots();

        let (a, b, c) = (id(&graph, "a"), id(&graph, "b"), id(&graph, "c"));
        assert_eq!(graph.blockers(c), Some(2));
        assert!(graph.is_ready(a));
        assert!(graph.is_ready(b));
        assert!(!graph.is_ready(c));

        assert_eq!(graph.next_resource(), Some(a));
        graph.finish(a);
        assert_eq!(graph.blockers(c), Some(1));
        assert!(!graph.is_ready(c));

        assert_eq!(graph.next_resource(), Some(b));
        graph.finish(b);
        assert!(graph.is_ready(c));
        assert_eq!(graph.next_resource(), Some(c));
        assert_eq!(graph.next_resource(), None);
    }

    #[test]
    fn finishing_twice_does_not_unblock_twice() {
        let mut graph = Names::new();
        graph.add_relationship("a", "c", Relationship::ordering());
        graph.add_relationship("b", "c", Relationship::ordering());
        graph.enqueue_roots();

        let (a, c) = (id(&graph, "a"), id(&graph, "c"));
        graph.finish(a);
        graph.finish(a);

        assert_eq!(graph.blockers(c), Some(1));
        assert!(!graph.is_ready(c));
        assert!(graph.is_done(a));
    }

    #[test]
    fn unblock_computes_untracked_counts_lazily() {
        let mut graph = chain(&["a", "b"]);
        let b = id(&graph, "b");
        assert_eq!(graph.blockers(b), None);

        assert!(graph.unblock(b));
        assert_eq!(graph.blockers(b), Some(0));
    }

    #[test]
    fn negative_blocker_counts_clamp_to_zero() {
        let mut graph = chain(&["a", "b"]);
        let b = id(&graph, "b");
        graph.enqueue_roots();

        assert!(graph.unblock(b));
        assert!(graph.unblock(b));
        assert_eq!(graph.blockers(b), Some(0));
    }

    #[test]
    fn new_relationship_retracts_a_ready_target() {
        let mut graph = Names::new();
        graph.add_vertex("a");
        graph.add_vertex("b");
        graph.enqueue_roots();
        let (a, b) = (id(&graph, "a"), id(&graph, "b"));
        assert!(graph.is_ready(b));

        graph.add_edge_between(a, b, Relationship::ordering()).unwrap();
        assert!(!graph.is_ready(b));
        assert_eq!(graph.blockers(b), Some(1));

        assert_eq!(graph.next_resource(), Some(a));
        graph.finish(a);
        assert_eq!(graph.next_resource(), Some(b));
    }

    #[test]
    fn relationship_from_finished_source_leaves_target_ready() {
        let mut graph = Names::new();
        graph.add_vertex("a");
        graph.add_vertex("b");
        graph.enqueue_roots();
        let (a, b) = (id(&graph, "a"), id(&graph, "b"));

        assert_eq!(graph.next_resource(), Some(a));
        graph.finish(a);
        graph.add_edge_between(a, b, Relationship::ordering()).unwrap();

        assert!(graph.is_ready(b));
        assert_eq!(graph.blockers(b), Some(0));
    }

    #[test]
    fn removing_an_edge_releases_its_target() {
        let mut graph = Names::new();
        let edge = graph.add_relationship("a", "b", Relationship::ordering());
        graph.enqueue_roots();
        let b = id(&graph, "b");
        assert!(!graph.is_ready(b));

        assert!(graph.remove_edge(edge).is_some());
        assert!(graph.is_ready(b));
    }

    #[test]
    fn removing_a_vertex_forgets_it() {
        let mut graph = chain(&["a", "b"]);
        let a = id(&graph, "a");
        assert_eq!(graph.remove_vertex(a), Some("a"));
        assert_eq!(graph.priority_of(a), None);
        assert_eq!(graph.remove_vertex(a), None);
        assert_eq!(run(&mut graph), vec!["b"]);
    }

    #[test]
    fn deferred_vertex_is_retried_after_progress() {
        let mut graph = Names::new();
        graph.add_vertex("b");
        graph.add_vertex("a");
        let refusals = Cell::new(0);

        let mut options = TraverseOptions::<&str>::new().with_suitable(|_, name| {
            if *name == "b" && refusals.get() == 0 {
                refusals.set(1);
                return false;
            }
            true
        });
        let mut order = Vec::new();
        let summary = graph.traverse(&mut options, |_, name, _| order.push(*name)).unwrap();

        assert_eq!(order, vec!["a", "b"]);
        assert!(summary.overly_deferred.is_empty());
    }

    #[test]
    fn overly_deferred_vertex_is_finished_once() {
        let mut graph = Names::new();
        graph.add_vertex("a");
        graph.add_relationship("b", "c", Relationship::ordering());
        let hook_calls = Cell::new(0);

        let mut options = TraverseOptions::<&str>::new()
            .with_suitable(|_, name| *name != "b")
            .with_overly_deferred(|_, _| hook_calls.set(hook_calls.get() + 1));
        let mut order = Vec::new();
        let summary = graph.traverse(&mut options, |_, name, _| order.push(*name)).unwrap();
        drop(options);

        assert_eq!(order, vec!["a", "c"]);
        assert_eq!(hook_calls.get(), 1);
        assert_eq!(summary.overly_deferred, vec![id(&graph, "b")]);
        assert_eq!(summary.processed(), 3);
    }

    #[test]
    fn cancellation_finishes_remaining_vertices_without_applying() {
        let mut graph = chain(&["a", "b", "c"]);
        let applied = Cell::new(0);
        let canceled = Cell::new(0);
        let torn_down = Cell::new(false);

        let mut options = TraverseOptions::<&str>::new()
            .with_continue_while(|| applied.get() < 1)
            .with_canceled(|_, _| canceled.set(canceled.get() + 1))
            .with_teardown(|| torn_down.set(true));
        let summary = graph
            .traverse(&mut options, |_, _, _| applied.set(applied.get() + 1))
            .unwrap();
        drop(options);

        assert!(summary.is_canceled());
        assert_eq!(summary.applied, vec![id(&graph, "a")]);
        assert_eq!(summary.canceled, vec![id(&graph, "b"), id(&graph, "c")]);
        assert_eq!(canceled.get(), 2);
        assert!(torn_down.get());
    }

    #[test]
    fn traversal_runs_inside_a_run_context() {
        let mut graph = chain(&["a"]);
        let mut active = false;
        graph
            .traverse(&mut DefaultPolicy, |_, _, _| active = RunContext::is_active())
            .unwrap();

        assert!(active);
        assert!(!RunContext::is_active());
    }

    #[test]
    fn run_state_is_reset_between_traversals() {
        let mut graph = chain(&["a", "b", "c"]);
        assert_eq!(run(&mut graph), vec!["a", "b", "c"]);
        assert_eq!(run(&mut graph), vec!["a", "b", "c"]);
        assert!(!graph.is_done(id(&graph, "a")));
        assert_eq!(graph.blockers(id(&graph, "b")), None);
    }

    #[test]
    fn from_graph_assigns_priorities_in_insertion_order() {
        let mut raw: Graph<&'static str> = Graph::new();
        raw.add_vertex("first");
        raw.add_vertex("second");
        let mut graph = RelationshipGraph::from_graph(raw, TraversalConfig::default());

        let (first, second) = (id(&graph, "first"), id(&graph, "second"));
        assert!(graph.priority_of(first) < graph.priority_of(second));
        assert_eq!(run(&mut graph), vec!["first", "second"]);
    }

    #[test]
    fn matching_edges_delegates_to_the_graph() {
        let mut graph = Names::new();
        graph.add_relationship("file", "service", Relationship::subscribe(Callback::refresh()));
        graph.add_relationship("file", "package", Relationship::ordering());
        let file = id(&graph, "file");

        let edges = graph.matching_edges(file, &EventSpec::named("file_changed"));
        assert_eq!(edges.len(), 1);
    }

    #[test]
    fn write_graph_without_directory_writes_nothing() {
        let graph = chain(&["a", "b"]);
        assert_eq!(graph.write_graph("relationships").unwrap(), None);
    }
}
