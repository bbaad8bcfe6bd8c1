//! Location fragment parsing.
//!
//! The fragment has the shape `#<frame>` or `#<frame>;<context>`. Only the
//! first form is ever written back.

use std::fmt;

use crate::FrameId;

/// Separator between the frame id and the context literal.
pub const CONTEXT_SEPARATOR: char = ';';

/// A parsed, non-empty location fragment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    /// Frame named by the fragment
    pub frame: FrameId,
    /// Literal context following the separator, if any
    pub context: Option<String>,
}

impl Fragment {
    /// Fragment naming a frame with no context literal.
    pub fn new(frame: FrameId) -> Self {
        Self {
            frame,
            context: None,
        }
    }

    /// Parse a raw location fragment.
    ///
    /// Returns `None` when the fragment is absent or blank after trimming.
    /// A leading `#` is stripped. Everything up to the first `;` is the frame
    /// id; the segment after it (up to a further `;`) is the context literal.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use hashnav_core::{Fragment, FrameId};
    ///
    /// let fragment = Fragment::parse("#orders;42").unwrap();
    /// assert_eq!(fragment.frame, FrameId::from("orders"));
    /// assert_eq!(fragment.context.as_deref(), Some("42"));
    ///
    /// assert!(Fragment::parse("  ").is_none());
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        if is_blank(raw) {
            return None;
        }

        let body = raw.strip_prefix('#').unwrap_or(raw);
        let mut segments = body.split(CONTEXT_SEPARATOR);
        let frame = FrameId::from(segments.next().unwrap_or_default());
        let context = segments.next().map(str::to_string);

        Some(Self { frame, context })
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(context) => write!(f, "#{}{}{}", self.frame, CONTEXT_SEPARATOR, context),
            None => write!(f, "#{}", self.frame),
        }
    }
}

/// Check if a fragment carries nothing: empty, whitespace, or a bare `#`.
pub fn is_blank(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed == "#"
}
