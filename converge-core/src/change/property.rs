//! Property Handles
//!
//! A [`Property`] is one managed attribute of one resource: a file's mode,
//! a package's version. It knows the value it should have, can read the
//! value the system currently has, and can sync one to the other.
//!
//! What syncing does to the managed system is up to the implementation.

use std::fmt;

use super::event::Event;
use crate::graph::EventName;
use crate::resource::ResourceRef;

/// Error type returned by [`Property::sync`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An event produced by a sync, before it is named.
#[derive(Debug, Clone, PartialEq)]
pub enum Emitted {
    /// A fully formed event, kept as it is.
    Event(Event),
    /// A named occurrence; the change fills in the rest.
    Named(EventName),
    /// Something changed; the change picks the name.
    Unnamed,
}

/// What a sync reports back.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SyncOutput {
    /// Nothing worth announcing.
    #[default]
    Nothing,
    One(Emitted),
    Many(Vec<Emitted>),
}

impl SyncOutput {
    /// Flatten into a list of emissions.
    pub fn into_vec(self) -> Vec<Emitted> {
        match self {
            SyncOutput::Nothing => Vec::new(),
            SyncOutput::One(emitted) => vec![emitted],
            SyncOutput::Many(emitted) => emitted,
        }
    }
}

impl From<Emitted> for SyncOutput {
    fn from(emitted: Emitted) -> Self {
        SyncOutput::One(emitted)
    }
}

impl From<Vec<Emitted>> for SyncOutput {
    fn from(emitted: Vec<Emitted>) -> Self {
        SyncOutput::Many(emitted)
    }
}

/// One managed attribute of a resource.
///
/// Values are `None` when the attribute is absent on the system, or when
/// nothing is desired for it.
pub trait Property {
    type Value: Clone + PartialEq + fmt::Display;

    fn name(&self) -> &str;

    /// The resource the property belongs to.
    fn resource(&self) -> &ResourceRef;

    /// The desired value.
    fn should(&self) -> Option<Self::Value>;

    fn set_should(&mut self, value: Option<Self::Value>);

    /// Read the current value from the system.
    fn retrieve(&self) -> Option<Self::Value>;

    /// Whether `is` already satisfies the desired value.
    ///
    /// With nothing desired, any value is in sync.
    fn is_insync(&self, is: Option<&Self::Value>) -> bool {
        match self.should() {
            Some(should) => is == Some(&should),
            None => true,
        }
    }

    /// Report changes instead of making them.
    fn noop(&self) -> bool {
        false
    }

    /// Move the system to the desired value.
    fn sync(&mut self) -> Result<SyncOutput, BoxError>;

    /// Name for events the sync leaves unnamed. `None` falls back to
    /// `<type>_changed`.
    fn event_name(&self) -> Option<EventName> {
        None
    }
}

/// Describe moving a property from `is` to `should`.
pub fn change_message<T: fmt::Display>(name: &str, is: Option<&T>, should: Option<&T>) -> String {
    match (is, should) {
        (None, Some(should)) => format!("defined '{name}' as '{should}'"),
        (Some(is), None) => format!("undefined {name} from '{is}'"),
        (Some(is), Some(should)) => format!("{name} changed '{is}' to '{should}'"),
        (None, None) => format!("{name} unchanged"),
    }
}
