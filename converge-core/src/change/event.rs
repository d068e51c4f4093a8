//! Events emitted by applied property changes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::{EventName, EventSpec};
use crate::resource::ResourceRef;

/// Outcome recorded on an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Success,
    Noop,
    Failure,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventStatus::Success => write!(f, "success"),
            EventStatus::Noop => write!(f, "noop"),
            EventStatus::Failure => write!(f, "failure"),
        }
    }
}

/// Something that happened to a resource while it was applied.
///
/// Events are matched against the resource's outgoing relationships to
/// decide which callbacks fire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub name: EventName,
    pub resource: ResourceRef,
    pub property: Option<String>,
    pub status: EventStatus,
    pub message: Option<String>,
    pub previous: Option<String>,
    pub desired: Option<String>,

    /// Drop refreshes already queued for the source resource.
    #[serde(default)]
    pub invalidate_refreshes: bool,
}

impl Event {
    /// A successful event with no property details.
    pub fn new(name: impl Into<EventName>, resource: ResourceRef) -> Self {
        Self {
            name: name.into(),
            resource,
            property: None,
            status: EventStatus::Success,
            message: None,
            previous: None,
            desired: None,
            invalidate_refreshes: false,
        }
    }

    /// Name the property that changed.
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    /// Set the outcome.
    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    /// Attach a human-readable message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Record the values the property moved between.
    pub fn with_values(mut self, previous: Option<String>, desired: Option<String>) -> Self {
        self.previous = previous;
        self.desired = desired;
        self
    }

    /// Mark the event as cancelling refreshes queued for its resource.
    pub fn invalidating_refreshes(mut self) -> Self {
        self.invalidate_refreshes = true;
        self
    }

    /// The [`EventSpec`] relationships are matched against.
    pub fn spec(&self) -> EventSpec {
        EventSpec::Named(self.name.clone())
    }

    /// Whether the change was only simulated.
    pub fn is_noop(&self) -> bool {
        self.status == EventStatus::Noop
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource)?;
        if let Some(property) = &self.property {
            write!(f, "/{property}")?;
        }
        write!(f, ": {}", self.name)?;
        if let Some(message) = &self.message {
            write!(f, " ({message})")?;
        }
        Ok(())
    }
}
