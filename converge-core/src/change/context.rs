//! Run Context
//!
//! Property changes may only be applied while a run is in progress. A run
//! is marked by a [`RunContext`] guard: entering pushes the run's id on a
//! thread-local stack, and dropping the guard pops it again.
//!
//! The scheduler enters a context for the duration of
//! [`traverse`](crate::graph::RelationshipGraph::traverse), so changes
//! applied from inside the apply closure see an active run.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

thread_local! {
    static RUN_STACK: RefCell<Vec<RunId>> = const { RefCell::new(Vec::new()) };
}

/// Unique identifier of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(u64);

impl RunId {
    /// Generate a new unique run ID.
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

/// Guard marking the current thread as inside a run.
///
/// The guard is tied to the thread that created it.
pub struct RunContext {
    run_id: RunId,
    _thread_bound: PhantomData<*const ()>,
}

impl RunContext {
    /// Enter a run. The run stays active until the guard is dropped.
    pub fn enter(run_id: RunId) -> Self {
        RUN_STACK.with(|stack| stack.borrow_mut().push(run_id));
        Self {
            run_id,
            _thread_bound: PhantomData,
        }
    }

    /// Enter a run under a freshly generated id.
    pub fn begin() -> Self {
        Self::enter(RunId::next())
    }

    /// Id of the run this guard marks.
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Check if there is an active run on this thread.
    pub fn is_active() -> bool {
        RUN_STACK.with(|stack| !stack.borrow().is_empty())
    }

    /// The innermost active run, if any.
    pub fn current() -> Option<RunId> {
        RUN_STACK.with(|stack| stack.borrow().last().copied())
    }
}

impl Drop for RunContext {
    fn drop(&mut self) {
        RUN_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();
            debug_assert_eq!(
                popped,
                Some(self.run_id),
                "RunContext mismatch: expected {}, got {:?}",
                self.run_id,
                popped
            );
        });
    }
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext").field("run_id", &self.run_id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_marks_run_active() {
        assert!(!RunContext::is_active());
        assert!(RunContext::current().is_none());

        {
            let ctx = RunContext::begin();
            assert!(RunContext::is_active());
            assert_eq!(RunContext::current(), Some(ctx.run_id()));
        }

        assert!(!RunContext::is_active());
        assert!(RunContext::current().is_none());
    }

    #[test]
    fn nested_contexts_restore_outer_run() {
        let outer = RunContext::begin();
        {
            let inner = RunContext::begin();
            assert_eq!(RunContext::current(), Some(inner.run_id()));
        }
        assert_eq!(RunContext::current(), Some(outer.run_id()));
    }

    #[test]
    fn run_ids_are_unique() {
        assert_ne!(RunId::next(), RunId::next());
    }
}
