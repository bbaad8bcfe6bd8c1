//! Headless in-memory document.
//!
//! [`MemoryDocument`] implements [`FrameTree`] and [`Navigation`] over a small
//! node arena and can apply the synchronous effects a router queues. It lets a
//! router run without a browser: in tests, in simulations, or on a host that
//! renders frames some other way.

use std::collections::BTreeMap;

use crate::host::{Effect, FrameTree, Navigation, PLACEHOLDER_HTML};
use crate::{FrameId, DEFAULT_ATTR, FRAME_ATTR, URL_ATTR};

/// Handle to a node of a [`MemoryDocument`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Clone, Debug, Default)]
struct Node {
    attrs: BTreeMap<String, String>,
    children: Vec<NodeId>,
    markup: Option<String>,
    hidden: bool,
}

/// In-memory container of frames plus a location fragment.
#[derive(Clone, Debug)]
pub struct MemoryDocument {
    nodes: Vec<Node>,
    fragment: String,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Create a document holding an empty container and an empty fragment.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
            fragment: String::new(),
        }
    }

    /// The container node routers are attached to.
    #[inline]
    pub fn container(&self) -> NodeId {
        NodeId(0)
    }

    /// Append an element without attributes under `parent`.
    pub fn append(&mut self, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::default());
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Append a frame element with the given id directly under the container.
    pub fn add_frame(&mut self, id: &str) -> NodeId {
        let node = self.append(self.container());
        self.set_attr(node, FRAME_ATTR, id);
        node
    }

    /// Set an attribute on a node.
    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        self.nodes[node.0]
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    /// Mark a frame as the start candidate.
    pub fn mark_default(&mut self, node: NodeId) {
        self.set_attr(node, DEFAULT_ATTR, "");
    }

    /// Give a frame a source url.
    pub fn set_source(&mut self, node: NodeId, url: &str) {
        self.set_attr(node, URL_ATTR, url);
    }

    /// Read an attribute.
    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes[node.0].attrs.get(name).map(String::as_str)
    }

    /// Markup set by a load, if any.
    pub fn markup(&self, node: NodeId) -> Option<&str> {
        self.nodes[node.0].markup.as_deref()
    }

    /// Check whether a node is hidden.
    pub fn is_hidden(&self, node: NodeId) -> bool {
        self.nodes[node.0].hidden
    }

    /// Set the location fragment.
    pub fn set_fragment(&mut self, fragment: impl Into<String>) {
        self.fragment = fragment.into();
    }

    /// Apply an effect to the document.
    ///
    /// Fades change visibility immediately; completing their tickets is left
    /// to the caller, as are fetches, deferrals, listening and events.
    /// Returns `true` if the document changed.
    pub fn apply<C>(&mut self, effect: &Effect<NodeId, C>) -> bool {
        match effect {
            Effect::HideChildren => {
                let children = self.nodes[0].children.clone();
                for child in children {
                    self.nodes[child.0].hidden = true;
                }
                true
            }
            Effect::SetFragment(fragment) => {
                self.fragment = fragment.clone();
                true
            }
            Effect::FadeOut { element, .. } => {
                self.nodes[element.0].hidden = true;
                true
            }
            Effect::FadeIn { element, .. } => {
                self.nodes[element.0].hidden = false;
                true
            }
            Effect::SetContent { element, content } => {
                self.replace_content(*element, content);
                true
            }
            Effect::SetPlaceholder { element } => {
                self.replace_content(*element, PLACEHOLDER_HTML);
                true
            }
            Effect::Listen | Effect::Fetch { .. } | Effect::Defer { .. } | Effect::Emit(_) => false,
        }
    }

    fn replace_content(&mut self, node: NodeId, markup: &str) {
        let node = &mut self.nodes[node.0];
        node.children.clear();
        node.markup = Some(markup.to_string());
    }

    /// Descendants of the container in document order.
    fn descendants(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[0].children.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.nodes[node.0].children.iter().rev().copied());
        }
        out
    }
}

impl FrameTree for MemoryDocument {
    type Element = NodeId;

    fn default_frame(&self) -> Option<FrameId> {
        self.descendants()
            .into_iter()
            .find_map(|node| {
                self.attr(node, DEFAULT_ATTR)
                    .and_then(|_| self.attr(node, FRAME_ATTR))
            })
            .map(FrameId::from)
    }

    fn first_frame(&self) -> Option<FrameId> {
        self.nodes[0]
            .children
            .iter()
            .find_map(|node| self.attr(*node, FRAME_ATTR))
            .map(FrameId::from)
    }

    fn frame_element(&self, id: &FrameId) -> Option<NodeId> {
        self.descendants()
            .into_iter()
            .find(|node| self.attr(*node, FRAME_ATTR) == Some(id.as_str()))
    }

    fn source_url(&self, element: &NodeId) -> Option<String> {
        self.attr(*element, URL_ATTR).map(str::to_string)
    }

    fn has_content(&self, element: &NodeId) -> bool {
        let node = &self.nodes[element.0];
        !node.children.is_empty() || node.markup.is_some()
    }
}

impl Navigation for MemoryDocument {
    fn fragment(&self) -> String {
        self.fragment.clone()
    }
}
