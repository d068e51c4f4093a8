//! Run Policy
//!
//! The scheduler only sequences vertices. Everything it needs to ask about a
//! vertex at run time, and every hook it offers, goes through [`RunPolicy`],
//! which the apply layer implements.
//!
//! [`TraverseOptions`] implements the policy from optional closures for
//! callers that do not want a dedicated type.

use super::vertex::VertexId;

/// Run-time decisions and hooks for one traversal.
///
/// Every method has a permissive default, so an empty implementation runs
/// every vertex as soon as it is ready.
pub trait RunPolicy<V> {
    /// Checked once before each vertex is taken from the ready queue.
    /// Returning false cancels the rest of the run.
    fn should_continue(&mut self) -> bool {
        true
    }

    /// Whether `vertex` can run now. Unsuitable vertices are deferred.
    fn is_suitable(&mut self, _id: VertexId, _vertex: &V) -> bool {
        true
    }

    /// Called right before `vertex` is applied.
    fn pre_process(&mut self, _id: VertexId, _vertex: &V) {}

    /// Called for a vertex that stayed unsuitable through a pass in which
    /// nothing else made progress. It is finished without being applied.
    fn on_overly_deferred(&mut self, _id: VertexId, _vertex: &V) {}

    /// Called for each vertex skipped because the run was cancelled.
    fn on_canceled(&mut self, _id: VertexId, _vertex: &V) {}

    /// Called once when the traversal loop exits.
    fn teardown(&mut self) {}
}

/// Policy that runs everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicy;

impl<V> RunPolicy<V> for DefaultPolicy {}

type Predicate<'a> = Box<dyn FnMut() -> bool + 'a>;
type VertexPredicate<'a, V> = Box<dyn FnMut(VertexId, &V) -> bool + 'a>;
type VertexHook<'a, V> = Box<dyn FnMut(VertexId, &V) + 'a>;

/// A [`RunPolicy`] assembled from closures.
///
/// ```rust,ignore
/// let mut stop = false;
/// let mut options = TraverseOptions::new()
///     .with_continue_while(|| !stop)
///     .with_overly_deferred(|_, resource| eprintln!("{resource} never became suitable"));
/// graph.traverse(&mut options, |_, resource, _| apply(resource))?;
/// ```
pub struct TraverseOptions<'a, V> {
    continue_while: Option<Predicate<'a>>,
    suitable: Option<VertexPredicate<'a, V>>,
    pre_process: Option<VertexHook<'a, V>>,
    overly_deferred: Option<VertexHook<'a, V>>,
    canceled: Option<VertexHook<'a, V>>,
    teardown: Option<Box<dyn FnMut() + 'a>>,
}

impl<'a, V> TraverseOptions<'a, V> {
    pub fn new() -> Self {
        Self {
            continue_while: None,
            suitable: None,
            pre_process: None,
            overly_deferred: None,
            canceled: None,
            teardown: None,
        }
    }

    /// Keep running while `predicate` holds.
    pub fn with_continue_while(mut self, predicate: impl FnMut() -> bool + 'a) -> Self {
        self.continue_while = Some(Box::new(predicate));
        self
    }

    /// Decide whether a ready vertex can run now.
    pub fn with_suitable(mut self, predicate: impl FnMut(VertexId, &V) -> bool + 'a) -> Self {
        self.suitable = Some(Box::new(predicate));
        self
    }

    /// Run `hook` just before a vertex is applied.
    pub fn with_pre_process(mut self, hook: impl FnMut(VertexId, &V) + 'a) -> Self {
        self.pre_process = Some(Box::new(hook));
        self
    }

    /// Report vertices force-finished after never becoming suitable.
    pub fn with_overly_deferred(mut self, hook: impl FnMut(VertexId, &V) + 'a) -> Self {
        self.overly_deferred = Some(Box::new(hook));
        self
    }

    /// Report vertices skipped because the run was canceled.
    pub fn with_canceled(mut self, hook: impl FnMut(VertexId, &V) + 'a) -> Self {
        self.canceled = Some(Box::new(hook));
        self
    }

    /// Run `hook` once when the run ends.
    pub fn with_teardown(mut self, hook: impl FnMut() + 'a) -> Self {
        self.teardown = Some(Box::new(hook));
        self
    }
}

impl<V> Default for TraverseOptions<'_, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> RunPolicy<V> for TraverseOptions<'_, V> {
    fn should_continue(&mut self) -> bool {
        self.continue_while.as_mut().map_or(true, |predicate| predicate())
    }

    fn is_suitable(&mut self, id: VertexId, vertex: &V) -> bool {
        self.suitable.as_mut().map_or(true, |predicate| predicate(id, vertex))
    }

    fn pre_process(&mut self, id: VertexId, vertex: &V) {
        if let Some(hook) = self.pre_process.as_mut() {
            hook(id, vertex);
        }
    }

    fn on_overly_deferred(&mut self, id: VertexId, vertex: &V) {
        if let Some(hook) = self.overly_deferred.as_mut() {
            hook(id, vertex);
        }
    }

    fn on_canceled(&mut self, id: VertexId, vertex: &V) {
        if let Some(hook) = self.canceled.as_mut() {
            hook(id, vertex);
        }
    }

    fn teardown(&mut self) {
        if let Some(hook) = self.teardown.as_mut() {
            hook();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn empty_options_allow_everything() {
        let mut options = TraverseOptions::<&str>::new();
        assert!(options.should_continue());
        assert!(options.is_suitable(VertexId::new(0), &"a"));
        options.pre_process(VertexId::new(0), &"a");
        options.teardown();
    }

    #[test]
    fn closures_are_invoked() {
        let torn_down = Cell::new(false);
        let deferred = Cell::new(0);

        let mut options = TraverseOptions::<&str>::new()
            .with_continue_while(|| false)
            .with_suitable(|_, name| *name != "blocked")
            .with_overly_deferred(|_, _| deferred.set(deferred.get() + 1))
            .with_teardown(|| torn_down.set(true));

        assert!(!options.should_continue());
        assert!(options.is_suitable(VertexId::new(0), &"open"));
        assert!(!options.is_suitable(VertexId::new(1), &"blocked"));
        options.on_overly_deferred(VertexId::new(1), &"blocked");
        options.teardown();
        drop(options);

        assert_eq!(deferred.get(), 1);
        assert!(torn_down.get());
    }

    #[test]
    fn default_policy_runs_everything() {
        let mut policy = DefaultPolicy;
        assert!(RunPolicy::<u32>::should_continue(&mut policy));
        assert!(policy.is_suitable(VertexId::new(0), &1u32));
    }
}
