//! Property Changes
//!
//! A [`PropertyChange`] captures one property moving from the value the
//! system has to the value the catalog wants. Applying it runs the
//! property's sync and turns whatever the sync reports into [`Event`]s.
//!
//! Changes can only be applied inside a run (see
//! [`RunContext`](super::RunContext)).

use std::fmt;

use tracing::{debug, trace};

use super::context::RunContext;
use super::event::{Event, EventStatus};
use super::property::{change_message, Emitted, Property};
use crate::error::ChangeError;
use crate::graph::EventName;

/// One property moving from `is` to `should`.
pub struct PropertyChange<P: Property> {
    property: P,
    is: Option<P::Value>,
    should: Option<P::Value>,
    /// Value the system had before the last successful sync.
    before: Option<Option<P::Value>>,
    changed: bool,
}

impl<P: Property> PropertyChange<P> {
    /// Create a change from an already retrieved current value.
    pub fn new(property: P, is: Option<P::Value>) -> Self {
        let should = property.should();
        Self {
            property,
            is,
            should,
            before: None,
            changed: false,
        }
    }

    /// Create a change by retrieving the current value from the system.
    pub fn from_property(property: P) -> Self {
        let is = property.retrieve();
        Self::new(property, is)
    }

    /// The property being changed.
    pub fn property(&self) -> &P {
        &self.property
    }

    pub fn into_property(self) -> P {
        self.property
    }

    /// Current value as last observed.
    pub fn is(&self) -> Option<&P::Value> {
        self.is.as_ref()
    }

    /// Desired value.
    pub fn should(&self) -> Option<&P::Value> {
        self.should.as_ref()
    }

    /// Whether the last apply synced anything.
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// True when applying would not touch the system: the property is in
    /// sync already, or it is in noop mode.
    pub fn is_skip(&self) -> bool {
        self.property.is_insync(self.is.as_ref()) || self.property.noop()
    }

    /// Describe the change, e.g. `mode changed '0644' to '0600'`.
    pub fn message(&self) -> String {
        change_message(self.property.name(), self.is.as_ref(), self.should.as_ref())
    }

    /// Name given to events the sync leaves unnamed.
    pub fn default_event_name(&self) -> EventName {
        self.property
            .event_name()
            .unwrap_or_else(|| EventName::new(format!("{}_changed", self.property.resource().kind())))
    }

    /// Apply the change.
    ///
    /// Returns the events the sync produced. An in-sync property produces
    /// none; a noop property produces a single noop event without syncing.
    pub fn forward(&mut self) -> Result<Vec<Event>, ChangeError> {
        self.require_run()?;
        self.go()
    }

    /// Apply the change in reverse, moving the property back to the value
    /// it had before.
    pub fn backward(&mut self) -> Result<Vec<Event>, ChangeError> {
        self.require_run()?;

        self.should = match self.before.take() {
            Some(before) => before,
            None => self.is.clone(),
        };
        self.property.set_should(self.should.clone());
        self.is = self.property.retrieve();

        if self.property.is_insync(self.is.as_ref()) {
            trace!(property = self.property.name(), "already in sync after reversal");
            return Ok(Vec::new());
        }
        self.go()
    }

    /// A failure event describing why the change could not be applied.
    pub fn failure_event(&self, error: &ChangeError) -> Event {
        let message = format!(
            "change from {} to {} failed: {error}",
            show(self.is.as_ref()),
            show(self.should.as_ref())
        );
        self.event(self.default_event_name())
            .with_status(EventStatus::Failure)
            .with_message(message)
    }

    fn require_run(&self) -> Result<(), ChangeError> {
        if RunContext::is_active() {
            Ok(())
        } else {
            Err(ChangeError::NotInRun {
                property: self.property.name().to_string(),
            })
        }
    }

    fn go(&mut self) -> Result<Vec<Event>, ChangeError> {
        self.changed = false;

        if self.property.is_insync(self.is.as_ref()) {
            trace!(property = self.property.name(), resource = %self.property.resource(), "in sync");
            return Ok(Vec::new());
        }

        if self.property.noop() {
            let message = format!(
                "current_value {}, should be {} (noop)",
                show(self.is.as_ref()),
                show(self.should.as_ref())
            );
            return Ok(vec![self
                .event(self.default_event_name())
                .with_status(EventStatus::Noop)
                .with_message(message)]);
        }

        let message = self.message();
        debug!(property = self.property.name(), resource = %self.property.resource(), "{message}");

        let output = self.property.sync().map_err(|source| ChangeError::SyncFailed {
            property: self.property.name().to_string(),
            source,
        })?;

        let events = output
            .into_vec()
            .into_iter()
            .map(|emitted| match emitted {
                Emitted::Event(event) => event,
                Emitted::Named(name) => self.event(name).with_message(message.clone()),
                Emitted::Unnamed => self.event(self.default_event_name()).with_message(message.clone()),
            })
            .collect();

        self.before = Some(std::mem::replace(&mut self.is, self.property.retrieve()));
        self.changed = true;
        Ok(events)
    }

    fn event(&self, name: EventName) -> Event {
        Event::new(name, self.property.resource().clone())
            .with_property(self.property.name())
            .with_values(
                self.is.as_ref().map(ToString::to_string),
                self.should.as_ref().map(ToString::to_string),
            )
    }
}

impl<P: Property> fmt::Debug for PropertyChange<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyChange")
            .field("property", &self.property.name())
            .field("resource", self.property.resource())
            .field("is", &show(self.is.as_ref()))
            .field("should", &show(self.should.as_ref()))
            .field("changed", &self.changed)
            .finish()
    }
}

fn show<T: fmt::Display>(value: Option<&T>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "absent".to_string(),
    }
}
