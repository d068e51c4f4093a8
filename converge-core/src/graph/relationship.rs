//! Relationship Labels
//!
//! Every edge of a relationship graph carries a [`Relationship`]: the event
//! it listens for and the callback to run on its target when that event is
//! emitted by its source. Plain ordering edges listen for nothing.
//!
//! # Matching
//!
//! An emitted event propagates along an edge when:
//!
//! - neither the emitted event nor the edge's event is [`EventSpec::None`], and
//! - either side is [`EventSpec::Any`], or both name the same event.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};

/// Name of an emitted event, e.g. `file_changed`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventName(String);

impl EventName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EventName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of the callback a relationship invokes on its target, e.g. `refresh`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Callback(String);

impl Callback {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The conventional restart/reload callback.
    pub fn refresh() -> Self {
        Self::new("refresh")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Callback {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The event side of a relationship, or of an emitted event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSpec {
    /// Never matches anything.
    None,

    /// Matches every event except [`EventSpec::None`].
    Any,

    /// A concrete event.
    Named(EventName),
}

impl EventSpec {
    /// A concrete event spec.
    pub fn named(name: impl Into<EventName>) -> Self {
        EventSpec::Named(name.into())
    }

    /// True for the two sentinels, which never require a callback.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, EventSpec::None | EventSpec::Any)
    }

    /// Whether an edge listening for `self` propagates `emitted`.
    pub fn matches(&self, emitted: &EventSpec) -> bool {
        match (self, emitted) {
            (EventSpec::None, _) | (_, EventSpec::None) => false,
            (EventSpec::Any, _) | (_, EventSpec::Any) => true,
            (EventSpec::Named(listening), EventSpec::Named(fired)) => listening == fired,
        }
    }
}

impl Default for EventSpec {
    fn default() -> Self {
        EventSpec::None
    }
}

impl fmt::Display for EventSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventSpec::None => f.write_str("NONE"),
            EventSpec::Any => f.write_str("ALL_EVENTS"),
            EventSpec::Named(name) => name.fmt(f),
        }
    }
}

/// Label of a dependency edge. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Relationship {
    event: EventSpec,
    callback: Option<Callback>,
}

impl Relationship {
    /// Create a relationship, rejecting a concrete event without a callback.
    pub fn new(event: EventSpec, callback: Option<Callback>) -> Result<Self> {
        if !event.is_sentinel() && callback.is_none() {
            return Err(GraphError::InvalidRelationship { event });
        }
        Ok(Self { event, callback })
    }

    /// A pure ordering edge: the target runs after the source, nothing fires.
    pub fn ordering() -> Self {
        Self::default()
    }

    /// A notifying edge: any event of the source triggers `callback` on the target.
    pub fn subscribe(callback: Callback) -> Self {
        Self {
            event: EventSpec::Any,
            callback: Some(callback),
        }
    }

    /// Events this relationship listens for.
    pub fn event(&self) -> &EventSpec {
        &self.event
    }

    /// Callback fired on the target when an event matches.
    pub fn callback(&self) -> Option<&Callback> {
        self.callback.as_ref()
    }

    /// True for edges that only order their endpoints.
    pub fn is_ordering(&self) -> bool {
        self.event == EventSpec::None && self.callback.is_none()
    }

    /// Whether an event emitted by this edge's source propagates along it.
    pub fn matches(&self, emitted: &EventSpec) -> bool {
        self.event.matches(emitted)
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.callback {
            Some(callback) => write!(f, "{} => {}", self.event, callback),
            None if self.event == EventSpec::None => Ok(()),
            None => write!(f, "{}", self.event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> EventSpec {
        EventSpec::named(name)
    }

    #[test]
    fn none_never_matches() {
        for edge in [EventSpec::None, EventSpec::Any, named("restart")] {
            assert!(!edge.matches(&EventSpec::None), "{edge} matched NONE");
        }
        for emitted in [EventSpec::Any, named("restart")] {
            assert!(!EventSpec::None.matches(&emitted));
        }
    }

    #[test]
    fn any_matches_every_real_event() {
        assert!(EventSpec::Any.matches(&named("file_changed")));
        assert!(EventSpec::Any.matches(&EventSpec::Any));
        assert!(named("file_changed").matches(&EventSpec::Any));
    }

    #[test]
    fn named_events_match_exactly() {
        assert!(named("file_changed").matches(&named("file_changed")));
        assert!(!named("file_changed").matches(&named("file_removed")));
    }

    #[test]
    fn concrete_event_requires_callback() {
        let err = Relationship::new(named("file_changed"), None).unwrap_err();
        assert!(matches!(err, GraphError::InvalidRelationship { .. }));

        assert!(Relationship::new(named("file_changed"), Some(Callback::refresh())).is_ok());
        assert!(Relationship::new(EventSpec::Any, None).is_ok());
        assert!(Relationship::new(EventSpec::None, None).is_ok());
    }

    #[test]
    fn ordering_edges_never_fire() {
        let edge = Relationship::ordering();
        assert!(edge.is_ordering());
        assert!(!edge.matches(&named("anything")));
        assert!(!edge.matches(&EventSpec::Any));
    }

    #[test]
    fn subscribe_edges_fire_on_anything() {
        let edge = Relationship::subscribe(Callback::refresh());
        assert!(!edge.is_ordering());
        assert_eq!(edge.callback(), Some(&Callback::refresh()));
        assert!(edge.matches(&named("service_started")));
    }

    #[test]
    fn display_shows_event_and_callback() {
        assert_eq!(Relationship::subscribe(Callback::refresh()).to_string(), "ALL_EVENTS => refresh");
        assert_eq!(Relationship::ordering().to_string(), "");
    }
}
