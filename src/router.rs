//! Frame router state machine.

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::error::{FetchError, RouterError};
use crate::events::RouterEvent;
use crate::fragment::Fragment;
use crate::host::{Effect, FrameTree, Navigation};
use crate::loader::{LoadState, LoadTable};
use crate::options::{Command, RouterOptions};
use crate::transition::{Context, Ticket, Transition};
use crate::{FrameId, FrameRef};

/// A transition whose visual tail is still running.
#[derive(Debug)]
struct Tail<E, C> {
    transition: Rc<Transition<E, C>>,
    generation: u64,
}

/// What the router is waiting for behind a ticket.
#[derive(Debug)]
enum Pending<E, C> {
    /// Fade out of the visible frame; `then` is faded in afterwards, or
    /// `after` fires when there is nothing to reveal.
    FadeOut { tail: Tail<E, C>, then: Option<E> },
    FadeIn { tail: Tail<E, C> },
    /// `deferred` loads have no source url and are completed by `resume`.
    Load {
        frame: FrameId,
        element: Option<E>,
        deferred: bool,
    },
}

/// Shows one frame of a container at a time, following the location
/// fragment.
///
/// The router is host-driven: it never touches the document itself. Reads go
/// through [`FrameTree`] and [`Navigation`], side effects are queued as
/// [`Effect`]s which the host drains with [`poll_effect`](Self::poll_effect),
/// and asynchronous effects are completed through
/// [`finish_fade`](Self::finish_fade), [`finish_fetch`](Self::finish_fetch)
/// and [`resume`](Self::resume).
///
/// ## Example
///
/// ```rust
/// use hashnav_core::memory::MemoryDocument;
/// use hashnav_core::{Effect, EventKind, FrameRouter, RouterOptions};
///
/// let mut doc = MemoryDocument::new();
/// doc.add_frame("home");
/// doc.add_frame("about");
///
/// let mut router: FrameRouter<_, ()> = FrameRouter::attach(&doc, RouterOptions::new());
/// assert_eq!(router.current_frame().map(|f| f.as_str()), Some("home"));
///
/// let mut fade = None;
/// while let Some(effect) = router.poll_effect() {
///     doc.apply(&effect);
///     if let Effect::FadeIn { ticket, .. } = effect {
///         fade = Some(ticket);
///     }
/// }
///
/// // `show` and `after` wait for the fade to complete.
/// router.finish_fade(fade.unwrap()).unwrap();
/// let kinds: Vec<_> = router
///     .drain_effects()
///     .filter_map(|e| e.event().map(|ev| ev.kind()))
///     .collect();
/// assert_eq!(kinds, vec![EventKind::Show, EventKind::After]);
/// ```
#[derive(Debug)]
pub struct FrameRouter<E, C> {
    options: RouterOptions,
    /// Frame passed to the last `display`, with or without an element
    current: Option<FrameId>,
    /// Element most recently faded in and not yet faded out
    visible: Option<E>,
    /// Pending context per frame, created on first write
    contexts: Option<HashMap<FrameId, C>>,
    loads: LoadTable<Tail<E, C>>,
    pending: HashMap<Ticket, Pending<E, C>>,
    effects: VecDeque<Effect<E, C>>,
    listening: bool,
    generation: u64,
    next_ticket: u64,
}

impl<E, C> FrameRouter<E, C>
where
    E: Clone + PartialEq,
{
    /// Attach a router to the container described by `doc`.
    ///
    /// Hides every direct child, then resolves the initial frame. When no
    /// frame resolves the router stays inert: it does not listen to fragment
    /// changes and shows nothing until it receives a display command.
    pub fn attach<D>(doc: &D, options: RouterOptions) -> Self
    where
        D: FrameTree<Element = E> + Navigation,
    {
        let mut router = Self {
            options,
            current: None,
            visible: None,
            contexts: None,
            loads: LoadTable::default(),
            pending: HashMap::new(),
            effects: VecDeque::new(),
            listening: false,
            generation: 0,
            next_ticket: 0,
        };
        router.effects.push_back(Effect::HideChildren);

        match router.resolve(doc) {
            Some(start) => {
                router.listen();
                router.display(doc, start);
            }
            None => debug!("no frame resolved, router stays inert"),
        }
        router
    }

    /// Resolve the frame named by the current location fragment.
    ///
    /// With an empty fragment this falls back to the `start` option, then
    /// the first `data-default` frame, then the first child frame.
    pub fn resolve<D>(&self, doc: &D) -> Option<FrameId>
    where
        D: FrameTree<Element = E> + Navigation,
    {
        match Fragment::parse(&doc.fragment()) {
            Some(fragment) => Some(fragment.frame),
            None => self
                .options
                .start
                .clone()
                .or_else(|| doc.default_frame())
                .or_else(|| doc.first_frame()),
        }
    }

    /// Handle a change of the location fragment.
    ///
    /// Ignored while the router is inert.
    pub fn fragment_changed<D>(&mut self, doc: &D)
    where
        D: FrameTree<Element = E> + Navigation,
    {
        if !self.listening {
            trace!("fragment change ignored by inert router");
            return;
        }
        let frame = self.resolve(doc);
        self.display(doc, frame);
    }

    /// Transition to `frame`.
    ///
    /// Does nothing when `frame` is already current. Otherwise queues
    /// `before`, then either the load of the next frame followed by its
    /// reveal, or the reveal alone, and makes `frame` current.
    pub fn display<D>(&mut self, doc: &D, frame: impl Into<Option<FrameId>>)
    where
        D: FrameTree<Element = E> + Navigation,
    {
        let frame = frame.into();
        if frame == self.current {
            trace!(frame = ?frame, "frame already current");
            return;
        }

        self.generation += 1;
        let generation = self.generation;
        debug!(from = ?self.current, to = ?frame, generation, "frame transition");

        let prev_element = self.current.as_ref().and_then(|id| doc.frame_element(id));
        let next_element = frame.as_ref().and_then(|id| doc.frame_element(id));
        let context = self.read_context(doc, frame.as_ref());

        let transition = Rc::new(Transition::new(
            FrameRef::new(self.current.clone(), prev_element),
            FrameRef::new(frame.clone(), next_element.clone()),
            context,
        ));
        self.emit(RouterEvent::Before(Rc::clone(&transition)));

        let tail = Tail {
            transition,
            generation,
        };
        match (frame.as_ref(), next_element) {
            (Some(id), Some(element)) => {
                match self.loads.observe(id, || doc.has_content(&element)) {
                    LoadState::Unloaded => match doc.source_url(&element) {
                        Some(url) => {
                            self.start_load(id, Some(element), Some(url));
                            self.wait_or_reveal(id, tail);
                        }
                        None => self.reveal(tail),
                    },
                    LoadState::Loading => self.wait_or_reveal(id, tail),
                    LoadState::Loaded | LoadState::Failed => self.reveal(tail),
                }
            }
            _ => self.conceal(tail),
        }

        self.current = frame;
    }

    /// Execute a command.
    ///
    /// `Display` stores its context and sets the location fragment; the
    /// transition itself happens when the host reports the fragment change.
    /// `Load` re-fetches the frame's content unconditionally.
    pub fn command<D>(&mut self, doc: &D, command: Command<C>)
    where
        D: FrameTree<Element = E>,
    {
        match command {
            Command::Display { frame, context } => {
                if let Some(context) = context {
                    self.write_context(frame.clone(), context);
                }
                if !self.listening {
                    self.listen();
                }
                self.effects
                    .push_back(Effect::SetFragment(Fragment::new(frame).to_string()));
            }
            Command::Load { frame } => self.load(doc, &frame),
        }
    }

    /// Force a load of `frame`, even if it already has content.
    ///
    /// A frame without a source url fails on the next turn.
    pub fn load<D>(&mut self, doc: &D, frame: &FrameId)
    where
        D: FrameTree<Element = E>,
    {
        let element = doc.frame_element(frame);
        let url = element.as_ref().and_then(|el| doc.source_url(el));
        self.start_load(frame, element, url);
    }

    /// Store a context value for the next transition to `frame`.
    ///
    /// Replaces any value still pending for that frame.
    pub fn write_context(&mut self, frame: FrameId, context: C) {
        self.contexts
            .get_or_insert_with(HashMap::new)
            .insert(frame, context);
    }

    /// Take the context for a transition to `frame`.
    ///
    /// A stored value is removed as it is read. Without one, the literal
    /// after `;` in the location fragment is returned, if present.
    pub fn read_context<N>(&mut self, nav: &N, frame: Option<&FrameId>) -> Option<Context<C>>
    where
        N: Navigation + ?Sized,
    {
        let stored = frame.and_then(|id| self.contexts.as_mut()?.remove(id));
        if let Some(value) = stored {
            return Some(Context::Value(value));
        }
        Fragment::parse(&nav.fragment())
            .and_then(|fragment| fragment.context)
            .map(Context::Fragment)
    }

    /// Report that the fade behind `ticket` has completed.
    pub fn finish_fade(&mut self, ticket: Ticket) -> Result<(), RouterError> {
        match self.pending.remove(&ticket) {
            Some(Pending::FadeOut { tail, then }) => {
                if self.is_superseded(&tail) {
                    return Ok(());
                }
                match then {
                    Some(next) => self.fade_in(tail, next),
                    None => self.emit(RouterEvent::After(tail.transition)),
                }
                Ok(())
            }
            Some(Pending::FadeIn { tail }) => {
                if self.is_superseded(&tail) {
                    return Ok(());
                }
                self.emit(RouterEvent::Show(Rc::clone(&tail.transition)));
                self.emit(RouterEvent::After(tail.transition));
                Ok(())
            }
            Some(other) => {
                self.pending.insert(ticket, other);
                Err(RouterError::TicketMismatch(ticket))
            }
            None => Err(RouterError::UnknownTicket(ticket)),
        }
    }

    /// Report the outcome of the fetch behind `ticket`.
    ///
    /// Success replaces the frame's content and emits `load`; failure puts
    /// the hidden placeholder in place and emits `fail`. Either way the frame
    /// is settled and transitions waiting on it are revealed.
    pub fn finish_fetch(
        &mut self,
        ticket: Ticket,
        result: Result<String, FetchError>,
    ) -> Result<(), RouterError> {
        let (frame, element) = match self.pending.remove(&ticket) {
            Some(Pending::Load { frame, element, .. }) => (frame, element),
            Some(other) => {
                self.pending.insert(ticket, other);
                return Err(RouterError::TicketMismatch(ticket));
            }
            None => return Err(RouterError::UnknownTicket(ticket)),
        };

        let Some(waiters) = self.loads.settle(&frame, ticket, result.is_ok()) else {
            debug!(%frame, %ticket, "discarding result of superseded load");
            return Ok(());
        };

        let frame_ref = FrameRef::new(Some(frame.clone()), element.clone());
        match result {
            Ok(content) => {
                debug!(%frame, bytes = content.len(), "frame content loaded");
                if let Some(element) = element {
                    self.effects
                        .push_back(Effect::SetContent { element, content });
                }
                self.emit(RouterEvent::Load(frame_ref));
            }
            Err(error) => {
                warn!(%frame, %error, "frame content failed to load");
                if let Some(element) = element {
                    self.effects.push_back(Effect::SetPlaceholder { element });
                }
                self.emit(RouterEvent::Fail(frame_ref));
            }
        }

        for tail in waiters {
            self.reveal(tail);
        }
        Ok(())
    }

    /// Complete a deferred load of a frame that has no source url.
    pub fn resume(&mut self, ticket: Ticket) -> Result<(), RouterError> {
        let frame = match self.pending.get(&ticket) {
            Some(Pending::Load {
                frame,
                deferred: true,
                ..
            }) => frame.clone(),
            Some(_) => return Err(RouterError::TicketMismatch(ticket)),
            None => return Err(RouterError::UnknownTicket(ticket)),
        };
        self.finish_fetch(ticket, Err(FetchError::MissingSource(frame)))
    }

    /// Take the next queued effect.
    #[inline]
    pub fn poll_effect(&mut self) -> Option<Effect<E, C>> {
        self.effects.pop_front()
    }

    /// Take every queued effect, in order.
    pub fn drain_effects(&mut self) -> std::collections::vec_deque::Drain<'_, Effect<E, C>> {
        self.effects.drain(..)
    }

    /// Number of effects waiting to be taken.
    #[inline]
    pub fn pending_effects(&self) -> usize {
        self.effects.len()
    }

    /// Frame passed to the last `display`.
    #[inline]
    pub fn current_frame(&self) -> Option<&FrameId> {
        self.current.as_ref()
    }

    /// Check whether the router follows fragment changes.
    #[inline]
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Load state of `frame`, if the router has seen it.
    pub fn load_state(&self, frame: &FrameId) -> Option<LoadState> {
        self.loads.state(frame)
    }

    /// Options the router was attached with.
    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    /// Stop following fragment changes, e.g. after the host dropped its
    /// listener. A later display command starts listening again.
    pub fn stop_listening(&mut self) {
        if self.listening {
            debug!("router stopped listening for fragment changes");
        }
        self.listening = false;
    }

    fn listen(&mut self) {
        self.listening = true;
        self.effects.push_back(Effect::Listen);
    }

    fn emit(&mut self, event: RouterEvent<E, C>) {
        trace!(event = %event.kind(), "emit");
        self.effects.push_back(Effect::Emit(event));
    }

    fn ticket(&mut self) -> Ticket {
        self.next_ticket += 1;
        Ticket(self.next_ticket)
    }

    fn is_superseded(&self, tail: &Tail<E, C>) -> bool {
        let superseded = tail.generation != self.generation;
        if superseded {
            debug!(
                generation = tail.generation,
                current = self.generation,
                "superseded transition dropped"
            );
        }
        superseded
    }

    fn start_load(&mut self, frame: &FrameId, element: Option<E>, url: Option<String>) {
        let ticket = self.ticket();
        self.loads.begin(frame, ticket);
        self.pending.insert(
            ticket,
            Pending::Load {
                frame: frame.clone(),
                element,
                deferred: url.is_none(),
            },
        );
        match url {
            Some(url) => {
                debug!(%frame, %url, %ticket, "fetching frame content");
                self.effects.push_back(Effect::Fetch { url, ticket });
            }
            None => {
                debug!(%frame, %ticket, "frame has no source url, failing on next turn");
                self.effects.push_back(Effect::Defer { ticket });
            }
        }
    }

    fn wait_or_reveal(&mut self, frame: &FrameId, tail: Tail<E, C>) {
        if let Err(tail) = self.loads.wait(frame, tail) {
            self.reveal(tail);
        }
    }

    /// Fade out the visible frame, then fade in the next one.
    fn reveal(&mut self, tail: Tail<E, C>) {
        if self.is_superseded(&tail) {
            return;
        }
        let Some(next) = tail.transition.next.element.clone() else {
            self.conceal(tail);
            return;
        };

        match self.visible.take() {
            Some(visible) if visible != next => {
                let ticket = self.ticket();
                self.effects.push_back(Effect::FadeOut {
                    element: visible,
                    ticket,
                });
                self.pending.insert(
                    ticket,
                    Pending::FadeOut {
                        tail,
                        then: Some(next),
                    },
                );
            }
            _ => self.fade_in(tail, next),
        }
    }

    fn fade_in(&mut self, tail: Tail<E, C>, element: E) {
        self.visible = Some(element.clone());
        let ticket = self.ticket();
        self.effects.push_back(Effect::FadeIn { element, ticket });
        self.pending.insert(ticket, Pending::FadeIn { tail });
    }

    /// Nothing to reveal: fade out the visible frame, then fire `after`.
    fn conceal(&mut self, tail: Tail<E, C>) {
        match self.visible.take() {
            Some(visible) => {
                let ticket = self.ticket();
                self.effects.push_back(Effect::FadeOut {
                    element: visible,
                    ticket,
                });
                self.pending
                    .insert(ticket, Pending::FadeOut { tail, then: None });
            }
            None => self.emit(RouterEvent::After(tail.transition)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::host::PLACEHOLDER_HTML;
    use crate::memory::{MemoryDocument, NodeId};
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    type Router = FrameRouter<NodeId, &'static str>;
    type Fx = Effect<NodeId, &'static str>;

    /// Plays the host: applies effects to the document and records them.
    struct Harness {
        doc: MemoryDocument,
        router: Router,
        log: Vec<Fx>,
        completed: HashSet<Ticket>,
    }

    impl Harness {
        fn attach(doc: MemoryDocument, options: RouterOptions) -> Self {
            let router = FrameRouter::attach(&doc, options);
            let mut harness = Self {
                doc,
                router,
                log: Vec::new(),
                completed: HashSet::new(),
            };
            harness.pump();
            harness
        }

        fn pump(&mut self) {
            for effect in self.router.drain_effects() {
                self.doc.apply(&effect);
                self.log.push(effect);
            }
        }

        /// Complete fades until the router stops queueing new ones.
        fn finish_fades(&mut self) {
            loop {
                let open: Vec<Ticket> = self
                    .log
                    .iter()
                    .filter(|e| matches!(e, Effect::FadeIn { .. } | Effect::FadeOut { .. }))
                    .filter_map(Effect::ticket)
                    .filter(|t| !self.completed.contains(t))
                    .collect();
                if open.is_empty() {
                    break;
                }
                for ticket in open {
                    self.completed.insert(ticket);
                    self.router.finish_fade(ticket).unwrap();
                }
                self.pump();
            }
        }

        fn navigate(&mut self, fragment: &str) {
            self.doc.set_fragment(fragment);
            self.router.fragment_changed(&self.doc);
            self.pump();
        }

        /// Run a command, delivering the resulting fragment change the way a
        /// browser would on a later turn.
        fn command(&mut self, command: Command<&'static str>) {
            let start = self.log.len();
            self.router.command(&self.doc, command);
            self.pump();
            let changed = self.log[start..]
                .iter()
                .any(|e| matches!(e, Effect::SetFragment(_)));
            if changed {
                self.router.fragment_changed(&self.doc);
                self.pump();
            }
        }

        fn fetches(&self) -> Vec<(String, Ticket)> {
            self.log
                .iter()
                .filter_map(|e| match e {
                    Effect::Fetch { url, ticket } => Some((url.clone(), *ticket)),
                    _ => None,
                })
                .collect()
        }

        fn defers(&self) -> Vec<Ticket> {
            self.log
                .iter()
                .filter_map(|e| match e {
                    Effect::Defer { ticket } => Some(*ticket),
                    _ => None,
                })
                .collect()
        }

        fn events(&self) -> Vec<EventKind> {
            self.log
                .iter()
                .filter_map(|e| e.event().map(|ev| ev.kind()))
                .collect()
        }

        fn transitions(&self, kind: EventKind) -> Vec<&Transition<NodeId, &'static str>> {
            self.log
                .iter()
                .filter_map(Effect::event)
                .filter(|ev| ev.kind() == kind)
                .filter_map(|ev| ev.transition())
                .collect()
        }

        fn clear(&mut self) {
            self.log.clear();
        }
    }

    /// Frames `a` (default) and `b` (lazily loaded from /b.html).
    fn scenario_doc() -> (MemoryDocument, NodeId, NodeId) {
        let mut doc = MemoryDocument::new();
        let a = doc.add_frame("a");
        doc.mark_default(a);
        doc.append(a);
        let b = doc.add_frame("b");
        doc.set_source(b, "/b.html");
        (doc, a, b)
    }

    #[test]
    fn test_inert_without_frames() {
        let mut doc = MemoryDocument::new();
        doc.append(doc.container());

        let mut h = Harness::attach(doc, RouterOptions::new());
        assert!(!h.router.is_listening());
        assert_eq!(h.router.current_frame(), None);
        assert!(matches!(h.log.as_slice(), [Effect::HideChildren]));

        h.clear();
        h.navigate("#x");
        assert!(h.log.is_empty());
    }

    #[test]
    fn test_default_marker_wins_regardless_of_order() {
        let mut doc = MemoryDocument::new();
        doc.add_frame("first");
        doc.add_frame("second");
        let wrapper = doc.append(doc.container());
        let nested = doc.append(wrapper);
        doc.set_attr(nested, crate::FRAME_ATTR, "nested");
        doc.mark_default(nested);

        let router: Router = FrameRouter::attach(&doc, RouterOptions::new());
        assert_eq!(router.current_frame(), Some(&FrameId::from("nested")));
    }

    #[test]
    fn test_default_marker_skips_elements_without_frame_id() {
        let mut doc = MemoryDocument::new();
        let plain = doc.append(doc.container());
        doc.mark_default(plain);
        doc.add_frame("a");
        let b = doc.add_frame("b");
        doc.mark_default(b);

        let router: Router = FrameRouter::attach(&doc, RouterOptions::new());
        assert_eq!(router.current_frame(), Some(&FrameId::from("b")));
    }

    #[test]
    fn test_start_option_and_first_child_fallback() {
        let mut doc = MemoryDocument::new();
        doc.add_frame("one");
        let two = doc.add_frame("two");
        doc.mark_default(two);

        let router: Router = FrameRouter::attach(&doc, RouterOptions::new().with_start("one"));
        assert_eq!(router.current_frame(), Some(&FrameId::from("one")));

        let mut plain = MemoryDocument::new();
        plain.add_frame("one");
        plain.add_frame("two");
        let router: Router = FrameRouter::attach(&plain, RouterOptions::new());
        assert_eq!(router.current_frame(), Some(&FrameId::from("one")));
    }

    #[test]
    fn test_fragment_overrides_defaults() {
        let (mut doc, _, _) = scenario_doc();
        doc.add_frame("c");
        doc.set_fragment("#c;page=3");

        let h = Harness::attach(doc, RouterOptions::new().with_start("a"));
        assert_eq!(h.router.current_frame(), Some(&FrameId::from("c")));
        let before = h.transitions(EventKind::Before);
        assert_eq!(before[0].context, Some(Context::Fragment("page=3".into())));
    }

    #[test]
    fn test_initial_display_reveals_without_load() {
        let (doc, a, _) = scenario_doc();
        let mut h = Harness::attach(doc, RouterOptions::new());

        assert!(h.router.is_listening());
        assert!(matches!(
            h.log.as_slice(),
            [Effect::HideChildren, Effect::Listen, Effect::Emit(RouterEvent::Before(_)), Effect::FadeIn { .. }]
        ));

        h.finish_fades();
        assert_eq!(h.events(), vec![EventKind::Before, EventKind::Show, EventKind::After]);
        assert!(h.fetches().is_empty());
        assert!(!h.doc.is_hidden(a));
        assert_eq!(h.router.load_state(&"a".into()), Some(LoadState::Loaded));
    }

    #[test]
    fn test_display_same_frame_is_noop() {
        let (doc, _, _) = scenario_doc();
        let mut h = Harness::attach(doc, RouterOptions::new());
        h.finish_fades();
        h.clear();

        h.router.display(&h.doc, FrameId::from("a"));
        assert_eq!(h.router.pending_effects(), 0);

        h.navigate("#b");
        h.clear();
        h.navigate("#b");
        assert!(h.log.is_empty());
        assert_eq!(h.fetches().len(), 0);
    }

    #[test]
    fn test_scenario_lazy_load_ordering() {
        let (doc, a, b) = scenario_doc();
        let mut h = Harness::attach(doc, RouterOptions::new());
        h.finish_fades();
        h.clear();

        h.command(Command::display("b"));
        assert_eq!(h.doc.fragment(), "#b");
        let fetches = h.fetches();
        assert_eq!(fetches.len(), 1);
        assert_eq!(fetches[0].0, "/b.html");
        // `a` stays visible while `b` loads.
        assert!(!h.doc.is_hidden(a));

        h.router
            .finish_fetch(fetches[0].1, Ok("<p>b</p>".into()))
            .unwrap();
        h.pump();
        assert_eq!(h.doc.markup(b), Some("<p>b</p>"));
        assert_eq!(h.events(), vec![EventKind::Before, EventKind::Load]);

        h.finish_fades();
        assert_eq!(
            h.events(),
            vec![EventKind::Before, EventKind::Load, EventKind::Show, EventKind::After]
        );
        assert!(h.doc.is_hidden(a));
        assert!(!h.doc.is_hidden(b));

        let after = h.transitions(EventKind::After);
        assert_eq!(after[0].previous, FrameRef::new(Some("a".into()), Some(a)));
        assert_eq!(after[0].next, FrameRef::new(Some("b".into()), Some(b)));
    }

    #[test]
    fn test_loads_at_most_once() {
        let (doc, _, _) = scenario_doc();
        let mut h = Harness::attach(doc, RouterOptions::new());

        h.navigate("#b");
        let (_, ticket) = h.fetches()[0].clone();
        h.router.finish_fetch(ticket, Ok("content".into())).unwrap();
        h.pump();
        h.finish_fades();

        h.navigate("#a");
        h.finish_fades();
        h.navigate("#b");
        h.finish_fades();
        assert_eq!(h.fetches().len(), 1);
        assert_eq!(h.router.load_state(&"b".into()), Some(LoadState::Loaded));
    }

    #[test]
    fn test_failed_load_settles_with_placeholder() {
        let (doc, _, b) = scenario_doc();
        let mut h = Harness::attach(doc, RouterOptions::new());
        h.finish_fades();
        h.clear();

        h.navigate("#b");
        let (_, ticket) = h.fetches()[0].clone();
        h.router
            .finish_fetch(ticket, Err(FetchError::Status(404)))
            .unwrap();
        h.pump();
        h.finish_fades();

        assert_eq!(
            h.events(),
            vec![EventKind::Before, EventKind::Fail, EventKind::Show, EventKind::After]
        );
        assert_eq!(h.doc.markup(b), Some(PLACEHOLDER_HTML));
        assert_eq!(h.router.load_state(&"b".into()), Some(LoadState::Failed));

        h.navigate("#a");
        h.navigate("#b");
        assert_eq!(h.fetches().len(), 1);
    }

    #[test]
    fn test_force_load_always_fetches() {
        let (doc, a, _) = scenario_doc();
        let mut h = Harness::attach(doc, RouterOptions::new());
        h.finish_fades();
        h.doc.set_source(a, "/a.html");
        h.clear();

        h.command(Command::load("a"));
        h.command(Command::load("a"));
        assert_eq!(h.fetches().len(), 2);
        assert_eq!(h.router.load_state(&"a".into()), Some(LoadState::Loading));

        // Only the latest fetch's result is applied.
        let fetches = h.fetches();
        h.router.finish_fetch(fetches[0].1, Ok("old".into())).unwrap();
        h.router.finish_fetch(fetches[1].1, Ok("new".into())).unwrap();
        h.pump();
        assert_eq!(h.doc.markup(a), Some("new"));
        assert_eq!(
            h.events().iter().filter(|k| **k == EventKind::Load).count(),
            1
        );
    }

    #[test]
    fn test_force_load_without_source_fails_next_turn() {
        let (doc, a, _) = scenario_doc();
        let mut h = Harness::attach(doc, RouterOptions::new());
        h.finish_fades();
        h.clear();

        h.command(Command::load("a"));
        assert!(h.events().is_empty());
        let defers = h.defers();
        assert_eq!(defers.len(), 1);

        h.router.resume(defers[0]).unwrap();
        h.pump();
        assert_eq!(h.events(), vec![EventKind::Fail]);
        assert_eq!(h.doc.markup(a), Some(PLACEHOLDER_HTML));

        h.command(Command::load("missing"));
        let ticket = *h.defers().last().unwrap();
        h.router.resume(ticket).unwrap();
        h.pump();
        let fail = h.log.iter().rev().find_map(Effect::event).unwrap();
        assert_eq!(fail.frame(), Some(&FrameRef::new(Some("missing".into()), None)));
    }

    #[test]
    fn test_missing_next_element_fires_before_then_after() {
        let (doc, a, _) = scenario_doc();
        let mut h = Harness::attach(doc, RouterOptions::new());
        h.finish_fades();
        h.clear();

        h.navigate("#nowhere");
        assert_eq!(h.events(), vec![EventKind::Before]);
        h.finish_fades();
        assert_eq!(h.events(), vec![EventKind::Before, EventKind::After]);
        assert!(h.doc.is_hidden(a));
        assert_eq!(h.router.current_frame(), Some(&FrameId::from("nowhere")));

        // Nothing visible any more: `after` follows `before` directly.
        h.clear();
        h.navigate("#elsewhere");
        assert_eq!(h.events(), vec![EventKind::Before, EventKind::After]);
    }

    #[test]
    fn test_context_round_trip_is_single_use() {
        let (mut doc, _, _) = scenario_doc();
        doc.add_frame("c");
        let mut h = Harness::attach(doc, RouterOptions::new());
        h.finish_fades();
        h.clear();

        h.command(Command::display_with("c", "ctx"));
        h.finish_fades();
        let before = h.transitions(EventKind::Before);
        let show = h.transitions(EventKind::Show);
        assert_eq!(before[0].context, Some(Context::Value("ctx")));
        assert_eq!(show[0].context, Some(Context::Value("ctx")));

        h.command(Command::display("a"));
        h.finish_fades();
        h.clear();
        h.command(Command::display("c"));
        assert_eq!(h.transitions(EventKind::Before)[0].context, None);

        h.navigate("#a");
        h.clear();
        h.navigate("#c;literal");
        assert_eq!(
            h.transitions(EventKind::Before)[0].context,
            Some(Context::Fragment("literal".into()))
        );
    }

    #[test]
    fn test_superseded_transition_does_not_reveal() {
        let (mut doc, a, b) = scenario_doc();
        let c = doc.add_frame("c");
        let mut h = Harness::attach(doc, RouterOptions::new());
        h.finish_fades();
        h.clear();

        h.navigate("#b");
        h.navigate("#c");
        h.finish_fades();
        assert!(h.doc.is_hidden(a));
        assert!(!h.doc.is_hidden(c));

        let (_, ticket) = h.fetches()[0].clone();
        h.router.finish_fetch(ticket, Ok("late".into())).unwrap();
        h.pump();
        h.finish_fades();

        assert_eq!(h.doc.markup(b), Some("late"));
        assert!(h.doc.is_hidden(b));
        assert_eq!(
            h.events(),
            vec![
                EventKind::Before,
                EventKind::Before,
                EventKind::Show,
                EventKind::After,
                EventKind::Load,
            ]
        );
    }

    #[test]
    fn test_returning_to_loading_frame_waits_for_load() {
        let (doc, _, b) = scenario_doc();
        let mut h = Harness::attach(doc, RouterOptions::new());
        h.finish_fades();

        h.navigate("#b");
        let (_, ticket) = h.fetches()[0].clone();
        h.navigate("#a");
        h.finish_fades();
        h.clear();

        h.navigate("#b");
        h.finish_fades();
        assert!(h.fetches().is_empty());
        assert_eq!(h.events(), vec![EventKind::Before]);

        h.clear();
        h.router.finish_fetch(ticket, Ok("b".into())).unwrap();
        h.pump();
        h.finish_fades();
        assert_eq!(h.events(), vec![EventKind::Load, EventKind::Show, EventKind::After]);
        assert!(!h.doc.is_hidden(b));
    }

    #[test]
    fn test_inert_router_wakes_on_display_command() {
        let mut h = Harness::attach(MemoryDocument::new(), RouterOptions::new());
        assert!(!h.router.is_listening());

        // Frames may appear after attaching.
        let late = h.doc.add_frame("late");

        h.command(Command::display("late"));
        assert!(h.router.is_listening());
        h.finish_fades();
        assert_eq!(h.router.current_frame(), Some(&FrameId::from("late")));
        assert!(!h.doc.is_hidden(late));
    }

    #[test]
    fn test_completion_errors() {
        let (doc, _, _) = scenario_doc();
        let mut h = Harness::attach(doc, RouterOptions::new());

        assert_eq!(
            h.router.finish_fade(Ticket(99)),
            Err(RouterError::UnknownTicket(Ticket(99)))
        );

        h.navigate("#b");
        let (_, fetch) = h.fetches()[0].clone();
        assert_eq!(
            h.router.finish_fade(fetch),
            Err(RouterError::TicketMismatch(fetch))
        );
        // The mismatch left the load pending.
        assert!(h.router.finish_fetch(fetch, Ok(String::new())).is_ok());
        assert_eq!(
            h.router.finish_fetch(fetch, Ok(String::new())),
            Err(RouterError::UnknownTicket(fetch))
        );
    }

    #[test]
    fn test_resume_rejects_fetch_tickets() {
        let (doc, _, b) = scenario_doc();
        let mut h = Harness::attach(doc, RouterOptions::new());
        h.finish_fades();

        h.navigate("#b");
        let (_, fetch) = h.fetches()[0].clone();
        assert_eq!(h.router.resume(fetch), Err(RouterError::TicketMismatch(fetch)));
        assert_eq!(
            h.router.load_state(&FrameId::from("b")),
            Some(LoadState::Loading)
        );

        h.clear();
        h.router.finish_fetch(fetch, Ok("b".into())).unwrap();
        h.pump();
        assert_eq!(h.events().first(), Some(&EventKind::Load));
        assert_eq!(h.doc.markup(b), Some("b"));
    }

    #[test]
    fn test_stopped_router_listens_again_on_display_command() {
        let (doc, _, _) = scenario_doc();
        let mut h = Harness::attach(doc, RouterOptions::new());
        h.finish_fades();

        h.router.stop_listening();
        assert!(!h.router.is_listening());
        h.clear();
        h.navigate("#b");
        assert!(h.log.is_empty());
        assert_eq!(h.router.current_frame(), Some(&FrameId::from("a")));

        h.command(Command::display("b"));
        assert!(matches!(h.log.first(), Some(Effect::Listen)));
        assert!(h.router.is_listening());
        assert_eq!(h.router.current_frame(), Some(&FrameId::from("b")));
    }
}
