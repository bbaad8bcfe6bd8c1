//! Lifecycle events and a typed publish/subscribe bus.

use std::fmt;
use std::rc::Rc;

use crate::transition::Transition;
use crate::FrameRef;

/// Kind of a router event, also its DOM event name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EventKind {
    Before,
    Show,
    After,
    Load,
    Fail,
}

impl EventKind {
    /// Event name as dispatched on the container or frame element.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::Before => "before",
            EventKind::Show => "show",
            EventKind::After => "after",
            EventKind::Load => "load",
            EventKind::Fail => "fail",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Event emitted by a router.
///
/// `Before`, `Show` and `After` of one transition share the same payload.
/// `Load` and `Fail` are scoped to the frame whose content was loaded.
#[derive(Debug)]
pub enum RouterEvent<E, C> {
    Before(Rc<Transition<E, C>>),
    Show(Rc<Transition<E, C>>),
    After(Rc<Transition<E, C>>),
    Load(FrameRef<E>),
    Fail(FrameRef<E>),
}

impl<E, C> RouterEvent<E, C> {
    /// Kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            RouterEvent::Before(_) => EventKind::Before,
            RouterEvent::Show(_) => EventKind::Show,
            RouterEvent::After(_) => EventKind::After,
            RouterEvent::Load(_) => EventKind::Load,
            RouterEvent::Fail(_) => EventKind::Fail,
        }
    }

    /// Transition payload, for transition events.
    pub fn transition(&self) -> Option<&Transition<E, C>> {
        match self {
            RouterEvent::Before(t) | RouterEvent::Show(t) | RouterEvent::After(t) => Some(t),
            RouterEvent::Load(_) | RouterEvent::Fail(_) => None,
        }
    }

    /// Frame reference, for load events.
    pub fn frame(&self) -> Option<&FrameRef<E>> {
        match self {
            RouterEvent::Load(frame) | RouterEvent::Fail(frame) => Some(frame),
            _ => None,
        }
    }
}

impl<E, C> Clone for RouterEvent<E, C>
where
    E: Clone,
{
    fn clone(&self) -> Self {
        match self {
            RouterEvent::Before(t) => RouterEvent::Before(Rc::clone(t)),
            RouterEvent::Show(t) => RouterEvent::Show(Rc::clone(t)),
            RouterEvent::After(t) => RouterEvent::After(Rc::clone(t)),
            RouterEvent::Load(frame) => RouterEvent::Load(frame.clone()),
            RouterEvent::Fail(frame) => RouterEvent::Fail(frame.clone()),
        }
    }
}

/// Identifier returned by [`EventBus::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Handler<E, C> = Box<dyn FnMut(&RouterEvent<E, C>)>;

/// Typed publish/subscribe bus for router events.
///
/// Handlers subscribe to one [`EventKind`] and run in subscription order.
///
/// ## Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use hashnav_core::{EventBus, EventKind, FrameRef, RouterEvent};
///
/// let mut bus: EventBus<(), ()> = EventBus::new();
/// let loads = Rc::new(Cell::new(0));
/// let seen = Rc::clone(&loads);
/// bus.subscribe(EventKind::Load, move |_| seen.set(seen.get() + 1));
///
/// bus.publish(&RouterEvent::Load(FrameRef::new(Some("a".into()), None)));
/// bus.publish(&RouterEvent::Fail(FrameRef::new(Some("a".into()), None)));
/// assert_eq!(loads.get(), 1);
/// ```
pub struct EventBus<E, C> {
    listeners: Vec<(ListenerId, EventKind, Handler<E, C>)>,
    next_id: u64,
}

impl<E, C> Default for EventBus<E, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, C> fmt::Debug for EventBus<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<E, C> EventBus<E, C> {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    /// Subscribe `handler` to events of `kind`.
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> ListenerId
    where
        F: FnMut(&RouterEvent<E, C>) + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, kind, Box::new(handler)));
        id
    }

    /// Remove a listener. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _, _)| *listener != id);
        self.listeners.len() != before
    }

    /// Number of listeners subscribed to `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.iter().filter(|(_, k, _)| *k == kind).count()
    }

    /// Deliver `event` to every listener of its kind.
    ///
    /// Returns the number of handlers invoked.
    pub fn publish(&mut self, event: &RouterEvent<E, C>) -> usize {
        let kind = event.kind();
        let mut delivered = 0;
        for (_, _, handler) in self.listeners.iter_mut().filter(|(_, k, _)| *k == kind) {
            handler(event);
            delivered += 1;
        }
        delivered
    }

    /// Deliver a batch of events in order.
    pub fn publish_all<'a, I>(&mut self, events: I) -> usize
    where
        I: IntoIterator<Item = &'a RouterEvent<E, C>>,
        E: 'a,
        C: 'a,
    {
        events.into_iter().map(|event| self.publish(event)).sum()
    }
}
