//! Resource References
//!
//! A resource reference names one managed resource by its type and title,
//! e.g. `File[/etc/motd]`. It is the usual vertex type of a relationship
//! graph and the source identity carried by every emitted event.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a managed resource.
///
/// The type is stored lower-cased; [`Display`](fmt::Display) capitalizes
/// each `::`-separated segment of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceRef {
    kind: String,
    title: String,
}

impl ResourceRef {
    /// Create a reference from a resource type and title.
    pub fn new(kind: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            kind: kind.into().to_lowercase(),
            title: title.into(),
        }
    }

    /// Parse a reference written as `Type[title]`.
    ///
    /// Returns `None` if the text is not in that form or either part is empty.
    pub fn parse(text: &str) -> Option<Self> {
        let open = text.find('[')?;
        let inner = text[open + 1..].strip_suffix(']')?;
        let kind = &text[..open];
        if kind.is_empty() || inner.is_empty() {
            return None;
        }
        Some(Self::new(kind, inner))
    }

    /// The resource type, lower-cased.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The resource title.
    pub fn title(&self) -> &str {
        &self.title
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.kind.split("::").enumerate() {
            if i > 0 {
                f.write_str("::")?;
            }
            let mut chars = segment.chars();
            if let Some(first) = chars.next() {
                write!(f, "{}{}", first.to_uppercase(), chars.as_str())?;
            }
        }
        write!(f, "[{}]", self.title)
    }
}
