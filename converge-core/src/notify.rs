//! Event Routing
//!
//! Events emitted while applying a resource travel along its outgoing
//! relationships. Every relationship that matches an event and names a
//! callback queues that callback, with the events that triggered it, on the
//! relationship's target. When the target's turn comes, the queued callbacks
//! are taken and run once each, however many events asked for them.
//!
//! Running a callback is up to the caller; [`EventManager::process_events`]
//! only decides whether to run it and records the outcome as events.

use std::collections::HashMap;
use std::hash::Hash;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::change::{BoxError, Event, EventStatus};
use crate::graph::{Callback, Graph, Relationship, VertexId};
use crate::resource::ResourceRef;

/// A callback waiting to run on a target, with the events that asked for it.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedCallback {
    pub callback: Callback,
    pub events: Vec<Event>,
}

impl QueuedCallback {
    /// True when every triggering event was a noop. The callback should be
    /// reported, not run.
    pub fn is_noop(&self) -> bool {
        self.events.iter().all(Event::is_noop)
    }
}

/// How a changed resource treats its own events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelfRefresh {
    /// Only relationships route the events.
    #[default]
    Off,
    /// The resource also refreshes itself.
    On,
    /// The resource refreshes itself but is being removed, so it is not
    /// refreshed.
    Deleting,
}

impl SelfRefresh {
    /// Whether a refresh should be queued on the resource itself.
    pub fn queues_refresh(self) -> bool {
        self == SelfRefresh::On
    }
}

/// Collects the events of a run and routes them to callbacks.
#[derive(Debug, Default)]
pub struct EventManager {
    events: Vec<Event>,
    queues: HashMap<VertexId, IndexMap<Callback, Vec<Event>>>,
}

impl EventManager {
    /// An empty manager with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event seen so far, in arrival order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Record the events `source` emitted and queue callbacks on every
    /// target whose relationship matches.
    ///
    /// With [`SelfRefresh::On`] a refresh carrying the events is also queued
    /// on `source` itself, whether or not any relationship matched.
    pub fn queue_events<V>(
        &mut self,
        graph: &Graph<V, Relationship>,
        source: VertexId,
        events: Vec<Event>,
        self_refresh: SelfRefresh,
    ) where
        V: Clone + Eq + Hash,
    {
        if self_refresh.queues_refresh() && !events.is_empty() {
            self.queue_for(source, source, Callback::refresh(), events.clone());
        }

        for event in events {
            for id in graph.matching_edges(source, &event.spec()) {
                let Some(edge) = graph.edge(id) else {
                    continue;
                };
                let Some(callback) = edge.label().callback() else {
                    continue;
                };
                self.queue_for(source, edge.target(), callback.clone(), vec![event.clone()]);
            }

            if event.invalidate_refreshes {
                self.dequeue(source, &Callback::refresh());
            }
            self.events.push(event);
        }
    }

    /// Queue `callback` on `target` directly.
    pub fn queue_for(&mut self, source: VertexId, target: VertexId, callback: Callback, events: Vec<Event>) {
        debug!(%source, %target, %callback, "scheduling callback");
        self.queues
            .entry(target)
            .or_default()
            .entry(callback)
            .or_default()
            .extend(events);
    }

    /// Drop a queued callback. Returns true if one was queued.
    pub fn dequeue(&mut self, target: VertexId, callback: &Callback) -> bool {
        let Some(queue) = self.queues.get_mut(&target) else {
            return false;
        };
        let removed = queue.shift_remove(callback).is_some();
        if removed {
            debug!(%target, %callback, "unscheduling callback");
        }
        if queue.is_empty() {
            self.queues.remove(&target);
        }
        removed
    }

    /// Whether any callback is waiting on `target`.
    pub fn has_queued(&self, target: VertexId) -> bool {
        self.queues.contains_key(&target)
    }

    /// Take every callback queued on `target`, in the order first queued.
    pub fn take_queued(&mut self, target: VertexId) -> Vec<QueuedCallback> {
        self.queues
            .remove(&target)
            .map(|queue| {
                queue
                    .into_iter()
                    .map(|(callback, events)| QueuedCallback { callback, events })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Run the callbacks queued on `target` through `invoke`.
    ///
    /// Callbacks triggered only by noop events, or any callback when `noop`
    /// is set, are not run; they produce a `noop_restart` event. A callback
    /// that runs produces a `restarted` event. A failing callback is logged
    /// and produces a failure event; the rest still run.
    ///
    /// The returned events belong to `target`; pass them to
    /// [`queue_events`](Self::queue_events) to route them onward.
    pub fn process_events<F>(&mut self, target: VertexId, resource: &ResourceRef, noop: bool, mut invoke: F) -> Vec<Event>
    where
        F: FnMut(&Callback, &[Event]) -> Result<(), BoxError>,
    {
        let mut produced = Vec::new();
        for queued in self.take_queued(target) {
            if noop || queued.is_noop() {
                debug!(%resource, callback = %queued.callback, "would have triggered callback");
                produced.push(
                    Event::new("noop_restart", resource.clone())
                        .with_status(EventStatus::Noop)
                        .with_message(format!("Would have triggered '{}' from {} events", queued.callback, queued.events.len())),
                );
                continue;
            }

            match invoke(&queued.callback, &queued.events) {
                Ok(()) => {
                    debug!(%resource, callback = %queued.callback, "triggered callback");
                    produced.push(
                        Event::new("restarted", resource.clone())
                            .with_message(format!("Triggered '{}' from {} events", queued.callback, queued.events.len())),
                    );
                }
                Err(err) => {
                    warn!(%resource, callback = %queued.callback, error = %err, "callback failed");
                    produced.push(
                        Event::new("restart_failed", resource.clone())
                            .with_status(EventStatus::Failure)
                            .with_message(format!("Failed to call {}: {err}", queued.callback)),
                    );
                }
            }
        }
        produced
    }
}
