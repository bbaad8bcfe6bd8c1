//! Collaborator interfaces between a router and its host.
//!
//! The router reads the document through [`FrameTree`] and [`Navigation`] and
//! never mutates it directly. Every mutation, fetch, animation and event is
//! handed to the host as an [`Effect`]. Effects carrying a [`Ticket`] are
//! asynchronous: the host reports their completion back to the router on a
//! later turn.

use crate::events::RouterEvent;
use crate::transition::Ticket;
use crate::FrameId;

/// Read-only view of the frames under a router's container.
pub trait FrameTree {
    /// Handle to an element; cheap to clone and comparable by identity.
    type Element: Clone + PartialEq;

    /// Frame id of the first descendant carrying both `data-default` and
    /// `data-frame`.
    fn default_frame(&self) -> Option<FrameId>;

    /// Frame id of the first direct child carrying `data-frame`.
    fn first_frame(&self) -> Option<FrameId>;

    /// Element carrying `data-frame` equal to `id`.
    fn frame_element(&self, id: &FrameId) -> Option<Self::Element>;

    /// Value of the element's `data-url` attribute.
    fn source_url(&self, element: &Self::Element) -> Option<String>;

    /// Check whether the element currently has any child content.
    fn has_content(&self, element: &Self::Element) -> bool;
}

/// Read side of the browser location.
///
/// Writes go through [`Effect::SetFragment`], and the change subscription is
/// requested with [`Effect::Listen`].
pub trait Navigation {
    /// Current location fragment, with or without the leading `#`.
    fn fragment(&self) -> String;
}

/// A side effect the host must carry out, in queue order.
#[derive(Debug)]
pub enum Effect<E, C> {
    /// Hide every direct child of the container.
    HideChildren,
    /// Start delivering fragment changes to `FrameRouter::fragment_changed`.
    Listen,
    /// Set the location fragment, e.g. `#orders`.
    SetFragment(String),
    /// Fade the element out, then call `FrameRouter::finish_fade`.
    FadeOut { element: E, ticket: Ticket },
    /// Fade the element in, then call `FrameRouter::finish_fade`.
    FadeIn { element: E, ticket: Ticket },
    /// Fetch `url`, then call `FrameRouter::finish_fetch` exactly once.
    Fetch { url: String, ticket: Ticket },
    /// Call `FrameRouter::resume` on a later turn. No I/O is involved.
    Defer { ticket: Ticket },
    /// Replace the element's content with fetched markup.
    SetContent { element: E, content: String },
    /// Replace the element's content with a single hidden, empty child.
    SetPlaceholder { element: E },
    /// Dispatch an event to listeners.
    Emit(RouterEvent<E, C>),
}

impl<E, C> Effect<E, C> {
    /// Ticket the host must complete, for asynchronous effects.
    pub fn ticket(&self) -> Option<Ticket> {
        match self {
            Effect::FadeOut { ticket, .. }
            | Effect::FadeIn { ticket, .. }
            | Effect::Fetch { ticket, .. }
            | Effect::Defer { ticket } => Some(*ticket),
            _ => None,
        }
    }

    /// The event, for `Emit` effects.
    pub fn event(&self) -> Option<&RouterEvent<E, C>> {
        match self {
            Effect::Emit(event) => Some(event),
            _ => None,
        }
    }
}

/// Markup used as the inert placeholder after a failed load.
pub const PLACEHOLDER_HTML: &str = r#"<div style="display:none"></div>"#;
