//! Frame identifiers and marker attributes.

use std::fmt;

/// Attribute naming the frame an element represents.
pub const FRAME_ATTR: &str = "data-frame";

/// Attribute marking a frame as the start candidate.
pub const DEFAULT_ATTR: &str = "data-default";

/// Attribute holding the URL a frame's content is lazily loaded from.
pub const URL_ATTR: &str = "data-url";

/// Identifier of a frame, the value of its `data-frame` attribute.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FrameId(String);

impl FrameId {
    /// Create a frame id from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FrameId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for FrameId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for FrameId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A frame as seen at the moment a transition or load started.
///
/// Either side may be missing: the outgoing frame is `None` before the first
/// transition, and a frame id may name no element at all.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRef<E> {
    /// Frame identifier
    pub id: Option<FrameId>,
    /// Element carrying the identifier, if one exists
    pub element: Option<E>,
}

impl<E> FrameRef<E> {
    /// Create a frame reference.
    pub fn new(id: Option<FrameId>, element: Option<E>) -> Self {
        Self { id, element }
    }

    /// A reference with neither id nor element.
    pub fn empty() -> Self {
        Self {
            id: None,
            element: None,
        }
    }

    /// Check whether an element exists for this frame.
    #[inline]
    pub fn exists(&self) -> bool {
        self.element.is_some()
    }
}
