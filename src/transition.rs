//! Transition payloads shared by the events of one `display` call.

use std::fmt;

use crate::FrameRef;

/// Handle for an asynchronous effect the host completes later.
///
/// Tickets are unique for the lifetime of a router and are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(pub(crate) u64);

impl Ticket {
    /// Raw ticket number, for hosts that key their own tables by it.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Context delivered with a transition.
#[derive(Clone, Debug, PartialEq)]
pub enum Context<C> {
    /// Value stored by a display command for this frame
    Value(C),
    /// Literal taken from the `;` segment of the location fragment
    Fragment(String),
}

impl<C> Context<C> {
    /// The stored value, if this context came from a command.
    pub fn value(&self) -> Option<&C> {
        match self {
            Context::Value(value) => Some(value),
            Context::Fragment(_) => None,
        }
    }

    /// The fragment literal, if this context came from the location.
    pub fn literal(&self) -> Option<&str> {
        match self {
            Context::Value(_) => None,
            Context::Fragment(literal) => Some(literal),
        }
    }
}

/// Immutable snapshot of a transition, built before `before` fires and
/// reused for `show` and `after`.
#[derive(Debug, PartialEq)]
pub struct Transition<E, C> {
    /// Frame being left
    pub previous: FrameRef<E>,
    /// Frame being entered
    pub next: FrameRef<E>,
    /// Context read for the next frame
    pub context: Option<Context<C>>,
}

impl<E, C> Transition<E, C> {
    /// Create a transition snapshot.
    pub fn new(previous: FrameRef<E>, next: FrameRef<E>, context: Option<Context<C>>) -> Self {
        Self {
            previous,
            next,
            context,
        }
    }
}
