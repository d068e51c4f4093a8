//! Property Changes
//!
//! This module covers what happens to one resource once the scheduler hands
//! it over:
//!
//! - [`Property`]: a managed attribute that can be read and synced
//! - [`PropertyChange`]: one property moving toward its desired value
//! - [`Event`]: what a change reports, matched against relationships to
//!   trigger callbacks on other resources
//! - [`RunContext`]: marks the thread as inside a run; changes refuse to
//!   apply outside one

#[allow(clippy::module_inception)]
mod change;
mod context;
mod event;
mod property;

pub use change::PropertyChange;
pub use context::{RunContext, RunId};
pub use event::{Event, EventStatus};
pub use property::{change_message, BoxError, Emitted, Property, SyncOutput};
