//! Web-specific driver binding a router to a DOM container.
//!
//! [`WebRouter`] reads frames from the container's descendants, follows the
//! window's `hashchange` event, fades frames with CSS opacity transitions,
//! fetches lazy content with `fetch`, and dispatches router events as DOM
//! `CustomEvent`s whose `detail` carries the transition payload.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use js_sys::{Object, Reflect};
use tracing::{debug, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{CustomEvent, CustomEventInit, Element, HtmlElement, Response, Window};

use crate::error::{FetchError, RouterError};
use crate::events::RouterEvent;
use crate::host::{Effect, FrameTree, Navigation, PLACEHOLDER_HTML};
use crate::options::{Command, RouterOptions};
use crate::router::FrameRouter;
use crate::transition::{Context, Transition};
use crate::{FrameId, FrameRef, DEFAULT_ATTR, FRAME_ATTR, URL_ATTR};

/// Configuration for the DOM driver.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WebConfig {
    /// Duration of each fade in milliseconds
    pub fade_ms: i32,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self { fade_ms: 200 }
    }
}

/// Frames of a DOM container plus the window location.
#[derive(Clone, Debug)]
pub struct DomFrames {
    container: Element,
    window: Window,
}

impl DomFrames {
    /// Wrap a container element.
    pub fn new(container: Element, window: Window) -> Self {
        Self { container, window }
    }

    /// The container element.
    pub fn container(&self) -> &Element {
        &self.container
    }

    fn descendants(&self) -> impl Iterator<Item = Element> {
        let all = self.container.get_elements_by_tag_name("*");
        (0..all.length()).filter_map(move |i| all.item(i))
    }
}

impl FrameTree for DomFrames {
    type Element = Element;

    fn default_frame(&self) -> Option<FrameId> {
        let selector = format!("[{DEFAULT_ATTR}][{FRAME_ATTR}]");
        self.container
            .query_selector(&selector)
            .ok()
            .flatten()?
            .get_attribute(FRAME_ATTR)
            .map(FrameId::from)
    }

    fn first_frame(&self) -> Option<FrameId> {
        let children = self.container.children();
        (0..children.length())
            .filter_map(|i| children.item(i))
            .find_map(|child| child.get_attribute(FRAME_ATTR))
            .map(FrameId::from)
    }

    fn frame_element(&self, id: &FrameId) -> Option<Element> {
        // Compared by attribute to avoid escaping ids into a selector.
        self.descendants()
            .find(|el| el.get_attribute(FRAME_ATTR).as_deref() == Some(id.as_str()))
    }

    fn source_url(&self, element: &Element) -> Option<String> {
        element.get_attribute(URL_ATTR)
    }

    fn has_content(&self, element: &Element) -> bool {
        element.child_element_count() > 0
    }
}

impl Navigation for DomFrames {
    fn fragment(&self) -> String {
        self.window.location().hash().unwrap_or_default()
    }
}

struct Shared {
    router: FrameRouter<Element, JsValue>,
    frames: DomFrames,
    config: WebConfig,
    listener: Option<Closure<dyn FnMut()>>,
}

/// A router bound to a DOM container.
///
/// Cloning yields another handle to the same router.
///
/// ## Example
///
/// ```rust,ignore
/// use hashnav_core::{Command, RouterOptions, WebConfig, WebRouter};
///
/// let container = document.get_element_by_id("pages").unwrap();
/// let router = WebRouter::attach(container, RouterOptions::new(), WebConfig::default())?;
///
/// // Navigate; the transition runs when the browser reports the hash change
/// router.command(Command::display_with("details", JsValue::from(42)));
/// ```
#[derive(Clone)]
pub struct WebRouter {
    shared: Rc<RefCell<Shared>>,
}

impl WebRouter {
    /// Attach a router to `container` and run its initial transition.
    pub fn attach(
        container: Element,
        options: RouterOptions,
        config: WebConfig,
    ) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or("No window available")?;
        let frames = DomFrames::new(container, window);
        let router = FrameRouter::attach(&frames, options);
        let web = Self {
            shared: Rc::new(RefCell::new(Shared {
                router,
                frames,
                config,
                listener: None,
            })),
        };
        pump(&web.shared);
        Ok(web)
    }

    /// Forward a command to the router.
    pub fn command(&self, command: Command<JsValue>) {
        {
            let mut guard = self.shared.borrow_mut();
            let shared = &mut *guard;
            shared.router.command(&shared.frames, command);
        }
        pump(&self.shared);
    }

    /// Frame passed to the last transition.
    pub fn current_frame(&self) -> Option<FrameId> {
        self.shared.borrow().router.current_frame().cloned()
    }

    /// Stop following `hashchange`. Pending fades and fetches still finish,
    /// and a later display command attaches a fresh listener.
    pub fn detach(&self) {
        let mut shared = self.shared.borrow_mut();
        shared.router.stop_listening();
        if let Some(listener) = shared.listener.take() {
            let _ = shared
                .frames
                .window
                .remove_event_listener_with_callback("hashchange", listener.as_ref().unchecked_ref());
        }
    }
}

/// Carry out queued effects until the router has none left.
fn pump(shared: &Rc<RefCell<Shared>>) {
    loop {
        let effect = shared.borrow_mut().router.poll_effect();
        let Some(effect) = effect else {
            break;
        };
        perform(shared, effect);
    }
}

fn perform(shared: &Rc<RefCell<Shared>>, effect: Effect<Element, JsValue>) {
    let (window, fade_ms) = {
        let s = shared.borrow();
        (s.frames.window.clone(), s.config.fade_ms)
    };

    match effect {
        Effect::HideChildren => {
            let children = shared.borrow().frames.container.children();
            for child in (0..children.length()).filter_map(|i| children.item(i)) {
                set_style(&child, "display", "none");
            }
        }
        Effect::Listen => listen(shared, &window),
        Effect::SetFragment(fragment) => {
            if let Err(err) = window.location().set_hash(&fragment) {
                warn!(?err, "failed to set location hash");
            }
        }
        Effect::FadeOut { element, ticket } => {
            set_style(&element, "transition", &format!("opacity {fade_ms}ms"));
            set_style(&element, "opacity", "0");
            let weak = Rc::downgrade(shared);
            set_timeout(&window, fade_ms, move || {
                set_style(&element, "display", "none");
                complete(&weak, |router| router.finish_fade(ticket));
            });
        }
        Effect::FadeIn { element, ticket } => {
            set_style(&element, "transition", &format!("opacity {fade_ms}ms"));
            set_style(&element, "opacity", "0");
            set_style(&element, "display", "");
            let shown = element.clone();
            // Let the browser apply opacity 0 before transitioning to 1.
            set_timeout(&window, 0, move || set_style(&shown, "opacity", "1"));
            let weak = Rc::downgrade(shared);
            set_timeout(&window, fade_ms, move || {
                complete(&weak, |router| router.finish_fade(ticket));
            });
        }
        Effect::Fetch { url, ticket } => {
            let weak = Rc::downgrade(shared);
            wasm_bindgen_futures::spawn_local(async move {
                let result = fetch_text(&window, &url).await;
                complete(&weak, |router| router.finish_fetch(ticket, result));
            });
        }
        Effect::Defer { ticket } => {
            let weak = Rc::downgrade(shared);
            set_timeout(&window, 0, move || {
                complete(&weak, |router| router.resume(ticket));
            });
        }
        Effect::SetContent { element, content } => element.set_inner_html(&content),
        Effect::SetPlaceholder { element } => element.set_inner_html(PLACEHOLDER_HTML),
        Effect::Emit(event) => {
            let container = shared.borrow().frames.container.clone();
            dispatch(&container, &event);
        }
    }
}

fn listen(shared: &Rc<RefCell<Shared>>, window: &Window) {
    let weak = Rc::downgrade(shared);
    let listener = Closure::<dyn FnMut()>::new(move || {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        {
            let mut guard = shared.borrow_mut();
            let s = &mut *guard;
            s.router.fragment_changed(&s.frames);
        }
        pump(&shared);
    });
    if let Err(err) =
        window.add_event_listener_with_callback("hashchange", listener.as_ref().unchecked_ref())
    {
        warn!(?err, "failed to listen for hashchange");
        shared.borrow_mut().router.stop_listening();
        return;
    }
    shared.borrow_mut().listener = Some(listener);
}

/// Hand a completion to the router, then carry out what it queued.
fn complete<F>(weak: &Weak<RefCell<Shared>>, f: F)
where
    F: FnOnce(&mut FrameRouter<Element, JsValue>) -> Result<(), RouterError>,
{
    let Some(shared) = weak.upgrade() else {
        debug!("router dropped before completion");
        return;
    };
    let result = f(&mut shared.borrow_mut().router);
    if let Err(err) = result {
        warn!(%err, "completion rejected");
    }
    pump(&shared);
}

async fn fetch_text(window: &Window, url: &str) -> Result<String, FetchError> {
    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(request_error)?;
    let response: Response = response.dyn_into().map_err(request_error)?;
    if !response.ok() {
        return Err(FetchError::Status(response.status()));
    }
    let text = JsFuture::from(response.text().map_err(request_error)?)
        .await
        .map_err(request_error)?;
    text.as_string()
        .ok_or_else(|| FetchError::Request("response body is not text".to_string()))
}

fn request_error(err: JsValue) -> FetchError {
    FetchError::Request(format!("{err:?}"))
}

fn set_timeout(window: &Window, ms: i32, f: impl FnOnce() + 'static) {
    let callback = Closure::once_into_js(f);
    if let Err(err) =
        window.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), ms)
    {
        warn!(?err, "failed to schedule timer");
    }
}

fn set_style(element: &Element, property: &str, value: &str) {
    if let Some(html) = element.dyn_ref::<HtmlElement>() {
        let _ = html.style().set_property(property, value);
    }
}

/// Dispatch `event` as a `CustomEvent`: transition events on the container,
/// load events on the frame element.
fn dispatch(container: &Element, event: &RouterEvent<Element, JsValue>) {
    let (target, detail) = match event {
        RouterEvent::Before(t) | RouterEvent::Show(t) | RouterEvent::After(t) => {
            (container.clone(), transition_detail(t))
        }
        RouterEvent::Load(frame) | RouterEvent::Fail(frame) => (
            frame.element.clone().unwrap_or_else(|| container.clone()),
            frame_detail(frame),
        ),
    };

    let init = CustomEventInit::new();
    init.set_detail(&detail);
    init.set_bubbles(true);
    match CustomEvent::new_with_event_init_dict(event.kind().name(), &init) {
        Ok(custom) => {
            let _ = target.dispatch_event(&custom);
        }
        Err(err) => warn!(?err, event = %event.kind(), "failed to create event"),
    }
}

fn frame_detail(frame: &FrameRef<Element>) -> JsValue {
    let detail = Object::new();
    let id = frame
        .id
        .as_ref()
        .map(|id| JsValue::from_str(id.as_str()))
        .unwrap_or(JsValue::UNDEFINED);
    let element = frame
        .element
        .clone()
        .map(JsValue::from)
        .unwrap_or(JsValue::UNDEFINED);
    set_field(&detail, "id", &id);
    set_field(&detail, "element", &element);
    detail.into()
}

fn transition_detail(transition: &Transition<Element, JsValue>) -> JsValue {
    let detail = Object::new();
    let context = match &transition.context {
        Some(Context::Value(value)) => value.clone(),
        Some(Context::Fragment(literal)) => JsValue::from_str(literal),
        None => JsValue::UNDEFINED,
    };
    set_field(&detail, "previous", &frame_detail(&transition.previous));
    set_field(&detail, "next", &frame_detail(&transition.next));
    set_field(&detail, "context", &context);
    detail.into()
}

fn set_field(target: &Object, key: &str, value: &JsValue) {
    let _ = Reflect::set(target, &JsValue::from_str(key), value);
}
