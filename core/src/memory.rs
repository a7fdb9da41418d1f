//! An in-memory document implementing [`Host`].
//!
//! `MemoryHost` backs the test suite and headless rendering. Besides the node state it keeps an
//! operation log, so tests can count creations and moves, and a list of contract violations
//! (operations on released or unknown nodes) that should stay empty.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    error::Result,
    event::{Dispatch, Event, ListenerOptions},
    host::{Host, HostId, PropValue},
    runtime::Runtime,
};

/// State of an element node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementState {
    /// Tag name.
    pub tag: String,
    /// Namespace the element was created in.
    pub namespace: Option<String>,
    /// Serialized attributes.
    pub attributes: BTreeMap<String, String>,
    /// Object properties.
    pub properties: BTreeMap<String, PropValue>,
    /// Inline style declarations.
    pub styles: BTreeMap<String, String>,
    /// Class list.
    pub classes: BTreeSet<String>,
    /// `data-*` entries, keyed without the prefix.
    pub dataset: BTreeMap<String, String>,
    /// Listener registrations, keyed by event name and capture flag.
    pub listeners: BTreeMap<(String, bool), ListenerOptions>,
}

#[derive(Debug, Clone)]
enum Content {
    Element(ElementState),
    Text(String),
}

#[derive(Debug, Clone)]
struct MemoryNode {
    parent: Option<HostId>,
    children: Vec<HostId>,
    content: Content,
    released: bool,
}

/// One mutation recorded by [`MemoryHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOp {
    /// An element was created.
    CreateElement {
        /// The new node.
        node: HostId,
        /// Its tag name.
        tag: String,
    },
    /// A text node was created.
    CreateText {
        /// The new node.
        node: HostId,
    },
    /// Text content changed.
    SetText {
        /// The text node.
        node: HostId,
    },
    /// A child was inserted.
    Insert {
        /// The new parent.
        parent: HostId,
        /// The inserted node.
        child: HostId,
        /// The child was attached somewhere before, so this is a move.
        moved: bool,
    },
    /// A child was detached.
    Remove {
        /// The old parent.
        parent: HostId,
        /// The detached node.
        child: HostId,
    },
    /// A node was released.
    Release {
        /// The released node.
        node: HostId,
    },
    /// An attribute, property, style, class or dataset entry changed.
    Markup {
        /// The element.
        node: HostId,
    },
    /// A listener was registered.
    Listen {
        /// The element.
        node: HostId,
        /// The event name.
        event: String,
    },
    /// A listener was dropped.
    Unlisten {
        /// The element.
        node: HostId,
        /// The event name.
        event: String,
    },
    /// Focus moved.
    Focus {
        /// The focused node.
        node: HostId,
    },
}

impl HostOp {
    /// Returns `true` for node creations.
    #[must_use]
    pub const fn is_create(&self) -> bool {
        matches!(self, Self::CreateElement { .. } | Self::CreateText { .. })
    }

    /// Returns `true` for inserts of nodes that were already attached.
    #[must_use]
    pub const fn is_move(&self) -> bool {
        matches!(self, Self::Insert { moved: true, .. })
    }

    /// Returns `true` for releases.
    #[must_use]
    pub const fn is_release(&self) -> bool {
        matches!(self, Self::Release { .. })
    }
}

/// Observable state of a subtree, for comparisons and serialization.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SnapshotNode {
    /// An element.
    Element {
        /// Tag name.
        tag: String,
        /// Namespace, if any.
        #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
        namespace: Option<String>,
        /// Attributes.
        attributes: BTreeMap<String, String>,
        /// Properties.
        properties: BTreeMap<String, PropValue>,
        /// Inline styles.
        styles: BTreeMap<String, String>,
        /// Classes.
        classes: BTreeSet<String>,
        /// Dataset entries.
        dataset: BTreeMap<String, String>,
        /// Registered events; capture registrations carry a `:capture` suffix.
        listeners: BTreeSet<String>,
        /// Children in order.
        children: Vec<SnapshotNode>,
    },
    /// A text node.
    Text(String),
}

/// An in-memory document.
#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: Vec<MemoryNode>,
    focused: Option<HostId>,
    log: Vec<HostOp>,
    violations: Vec<String>,
}

impl MemoryHost {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, content: Content) -> HostId {
        let id = HostId::from_raw(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(MemoryNode {
            parent: None,
            children: Vec::new(),
            content,
            released: false,
        });
        id
    }

    fn node(&self, id: HostId) -> Option<&MemoryNode> {
        self.nodes.get(id.raw() as usize)
    }

    fn live_mut(&mut self, id: HostId, operation: &str) -> Option<&mut MemoryNode> {
        match self.node(id) {
            None => {
                self.violate(format!("{operation} on unknown {id}"));
                return None;
            }
            Some(node) if node.released => {
                self.violate(format!("{operation} on released {id}"));
                return None;
            }
            Some(_) => {}
        }
        self.nodes.get_mut(id.raw() as usize)
    }

    fn element_mut(&mut self, id: HostId, operation: &str) -> Option<&mut ElementState> {
        if self.text(id).is_some() {
            self.violate(format!("{operation} on text {id}"));
            return None;
        }
        match &mut self.live_mut(id, operation)?.content {
            Content::Element(element) => Some(element),
            Content::Text(_) => None,
        }
    }

    fn markup_target(&mut self, id: HostId, operation: &str) -> Option<&mut ElementState> {
        self.log.push(HostOp::Markup { node: id });
        self.element_mut(id, operation)
    }

    fn violate(&mut self, message: String) {
        tracing::warn!(%message, "memory host contract violation");
        self.violations.push(message);
    }

    fn detach(&mut self, child: HostId) -> bool {
        let Some(parent) = self.node(child).and_then(|node| node.parent) else {
            return false;
        };
        if let Some(parent) = self.nodes.get_mut(parent.raw() as usize) {
            parent.children.retain(|&c| c != child);
        }
        if let Some(node) = self.nodes.get_mut(child.raw() as usize) {
            node.parent = None;
        }
        true
    }

    /// Returns the state of an element, released or not.
    #[must_use]
    pub fn element(&self, id: HostId) -> Option<&ElementState> {
        match &self.node(id)?.content {
            Content::Element(element) => Some(element),
            Content::Text(_) => None,
        }
    }

    /// Returns the content of a text node.
    #[must_use]
    pub fn text(&self, id: HostId) -> Option<&str> {
        match &self.node(id)?.content {
            Content::Text(text) => Some(text),
            Content::Element(_) => None,
        }
    }

    /// Returns the children of `id` in order.
    #[must_use]
    pub fn children(&self, id: HostId) -> &[HostId] {
        self.node(id).map_or(&[], |node| node.children.as_slice())
    }

    /// Returns the parent of `id`.
    #[must_use]
    pub fn parent(&self, id: HostId) -> Option<HostId> {
        self.node(id)?.parent
    }

    /// Returns `true` once `id` has been released.
    #[must_use]
    pub fn is_released(&self, id: HostId) -> bool {
        self.node(id).is_some_and(|node| node.released)
    }

    /// Number of nodes that have not been released.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.nodes.iter().filter(|node| !node.released).count()
    }

    /// Returns the focused node.
    #[must_use]
    pub const fn focused(&self) -> Option<HostId> {
        self.focused
    }

    /// Concatenated text of `id` and its descendants.
    #[must_use]
    pub fn text_content(&self, id: HostId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: HostId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.content {
            Content::Text(text) => out.push_str(text),
            Content::Element(_) => {
                for &child in &node.children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// Descendants of `root` (in document order) matching `predicate`.
    pub fn find(&self, root: HostId, predicate: impl Fn(&ElementState) -> bool) -> Vec<HostId> {
        let mut found = Vec::new();
        let mut stack: Vec<HostId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if self.element(id).is_some_and(&predicate) {
                found.push(id);
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        found
    }

    /// Descendants of `root` with the given tag.
    #[must_use]
    pub fn find_by_tag(&self, root: HostId, tag: &str) -> Vec<HostId> {
        self.find(root, |element| element.tag == tag)
    }

    /// Descendants of `root` carrying `class`.
    #[must_use]
    pub fn find_by_class(&self, root: HostId, class: &str) -> Vec<HostId> {
        self.find(root, |element| element.classes.contains(class))
    }

    /// Captures the observable state of `id` and its descendants.
    #[must_use]
    pub fn snapshot(&self, id: HostId) -> Option<SnapshotNode> {
        let node = self.node(id)?;
        Some(match &node.content {
            Content::Text(text) => SnapshotNode::Text(text.clone()),
            Content::Element(element) => SnapshotNode::Element {
                tag: element.tag.clone(),
                namespace: element.namespace.clone(),
                attributes: element.attributes.clone(),
                properties: element.properties.clone(),
                styles: element.styles.clone(),
                classes: element.classes.clone(),
                dataset: element.dataset.clone(),
                listeners: element
                    .listeners
                    .keys()
                    .map(|(event, capture)| {
                        if *capture {
                            format!("{event}:capture")
                        } else {
                            event.clone()
                        }
                    })
                    .collect(),
                children: node
                    .children
                    .iter()
                    .filter_map(|&child| self.snapshot(child))
                    .collect(),
            },
        })
    }

    /// Recorded operations since the last [`MemoryHost::take_log`].
    #[must_use]
    pub fn log(&self) -> &[HostOp] {
        &self.log
    }

    /// Takes the recorded operations.
    pub fn take_log(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.log)
    }

    /// Forgets the recorded operations.
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Operations that used released or unknown handles, or text nodes as elements.
    #[must_use]
    pub fn violations(&self) -> &[String] {
        &self.violations
    }
}

impl Host for MemoryHost {
    fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> HostId {
        let node = self.push(Content::Element(ElementState {
            tag: tag.to_owned(),
            namespace: namespace.map(str::to_owned),
            ..ElementState::default()
        }));
        self.log.push(HostOp::CreateElement {
            node,
            tag: tag.to_owned(),
        });
        node
    }

    fn create_text(&mut self, content: &str) -> HostId {
        let node = self.push(Content::Text(content.to_owned()));
        self.log.push(HostOp::CreateText { node });
        node
    }

    fn set_text(&mut self, node: HostId, content: &str) {
        self.log.push(HostOp::SetText { node });
        if self.element(node).is_some() {
            self.violate(format!("set_text on element {node}"));
            return;
        }
        if let Some(MemoryNode {
            content: Content::Text(text),
            ..
        }) = self.live_mut(node, "set_text")
        {
            content.clone_into(text);
        }
    }

    fn set_attribute(&mut self, node: HostId, name: &str, value: &str) {
        if let Some(element) = self.markup_target(node, "set_attribute") {
            element.attributes.insert(name.to_owned(), value.to_owned());
        }
    }

    fn remove_attribute(&mut self, node: HostId, name: &str) {
        if let Some(element) = self.markup_target(node, "remove_attribute") {
            element.attributes.remove(name);
        }
    }

    fn set_property(&mut self, node: HostId, name: &str, value: &PropValue) {
        if let Some(element) = self.markup_target(node, "set_property") {
            element.properties.insert(name.to_owned(), value.clone());
        }
    }

    fn remove_property(&mut self, node: HostId, name: &str) {
        if let Some(element) = self.markup_target(node, "remove_property") {
            element.properties.remove(name);
        }
    }

    fn set_style(&mut self, node: HostId, name: &str, value: &str) {
        if let Some(element) = self.markup_target(node, "set_style") {
            element.styles.insert(name.to_owned(), value.to_owned());
        }
    }

    fn remove_style(&mut self, node: HostId, name: &str) {
        if let Some(element) = self.markup_target(node, "remove_style") {
            element.styles.remove(name);
        }
    }

    fn add_class(&mut self, node: HostId, name: &str) {
        if let Some(element) = self.markup_target(node, "add_class") {
            element.classes.insert(name.to_owned());
        }
    }

    fn remove_class(&mut self, node: HostId, name: &str) {
        if let Some(element) = self.markup_target(node, "remove_class") {
            element.classes.remove(name);
        }
    }

    fn set_dataset(&mut self, node: HostId, name: &str, value: &str) {
        if let Some(element) = self.markup_target(node, "set_dataset") {
            element.dataset.insert(name.to_owned(), value.to_owned());
        }
    }

    fn remove_dataset(&mut self, node: HostId, name: &str) {
        if let Some(element) = self.markup_target(node, "remove_dataset") {
            element.dataset.remove(name);
        }
    }

    fn add_listener(&mut self, node: HostId, event: &str, options: ListenerOptions) {
        self.log.push(HostOp::Listen {
            node,
            event: event.to_owned(),
        });
        if let Some(element) = self.element_mut(node, "add_listener") {
            element
                .listeners
                .insert((event.to_owned(), options.capture), options);
        }
    }

    fn remove_listener(&mut self, node: HostId, event: &str, options: ListenerOptions) {
        self.log.push(HostOp::Unlisten {
            node,
            event: event.to_owned(),
        });
        if let Some(element) = self.element_mut(node, "remove_listener") {
            element.listeners.remove(&(event.to_owned(), options.capture));
        }
    }

    fn insert_before(&mut self, parent: HostId, child: HostId, reference: Option<HostId>) {
        if self.live_mut(parent, "insert_before").is_none() || self.live_mut(child, "insert_before").is_none() {
            return;
        }
        let moved = self.detach(child);
        let children = self.children(parent);
        let position = match reference {
            Some(reference) => children.iter().position(|&c| c == reference).unwrap_or_else(|| {
                tracing::warn!(%parent, %reference, "reference node is not a child; appending");
                children.len()
            }),
            None => children.len(),
        };
        if let Some(node) = self.nodes.get_mut(parent.raw() as usize) {
            node.children.insert(position, child);
        }
        if let Some(node) = self.nodes.get_mut(child.raw() as usize) {
            node.parent = Some(parent);
        }
        self.log.push(HostOp::Insert {
            parent,
            child,
            moved,
        });
    }

    fn remove_child(&mut self, parent: HostId, child: HostId) {
        self.log.push(HostOp::Remove { parent, child });
        if self.parent(child) == Some(parent) {
            self.detach(child);
        } else {
            self.violate(format!("remove_child: {child} is not a child of {parent}"));
        }
    }

    fn release(&mut self, node: HostId) {
        self.log.push(HostOp::Release { node });
        if let Some(state) = self.live_mut(node, "release") {
            state.released = true;
        }
        if self.focused == Some(node) {
            self.focused = None;
        }
    }

    fn focus(&mut self, node: HostId) {
        self.log.push(HostOp::Focus { node });
        if self.live_mut(node, "focus").is_some() {
            self.focused = Some(node);
        }
    }
}

impl Runtime<MemoryHost> {
    /// Fires `event` at `target` the way a browser would: capture listeners from the root
    /// down, then bubble listeners from the target up, until one stops propagation.
    ///
    /// # Errors
    ///
    /// See [`Runtime::dispatch`].
    pub fn simulate(&mut self, target: HostId, event: &Event) -> Result<Dispatch> {
        let mut path = Vec::new();
        let mut current = Some(target);
        while let Some(node) = current {
            path.push(node);
            current = self.host().parent(node);
        }

        let mut outcome = Dispatch::default();
        let downwards: Vec<HostId> = path.iter().rev().copied().collect();
        for (capture, nodes) in [(true, downwards), (false, path)] {
            for node in nodes {
                let listening = self
                    .listener_options(node, event.name())
                    .is_some_and(|options| options.capture == capture);
                if !listening {
                    continue;
                }
                let dispatch = self.dispatch(node, event)?;
                outcome.handled |= dispatch.handled;
                outcome.prevent_default |= dispatch.prevent_default;
                outcome.failures.append(dispatch.failures);
                if dispatch.stop_propagation {
                    outcome.stop_propagation = true;
                    return Ok(outcome);
                }
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_before_moves_attached_nodes() {
        let mut host = MemoryHost::new();
        let parent = host.create_element("ul", None);
        let a = host.create_text("a");
        let b = host.create_text("b");
        host.insert_before(parent, a, None);
        host.insert_before(parent, b, None);
        host.clear_log();

        host.insert_before(parent, b, Some(a));

        assert_eq!(host.children(parent), &[b, a]);
        assert_eq!(host.take_log(), vec![HostOp::Insert {
            parent,
            child: b,
            moved: true
        }]);
        assert_eq!(host.text_content(parent), "ba");
    }

    #[test]
    fn released_nodes_record_violations() {
        let mut host = MemoryHost::new();
        let node = host.create_element("div", None);
        host.release(node);
        host.add_class(node, "late");
        assert!(host.is_released(node));
        assert_eq!(host.violations().len(), 1);
        assert_eq!(host.live_count(), 0);
    }

    #[test]
    fn snapshot_lists_listeners_with_phase() {
        let mut host = MemoryHost::new();
        let node = host.create_element("button", None);
        host.add_listener(node, "click", ListenerOptions::default());
        host.add_listener(node, "focus", ListenerOptions {
            capture: true,
            ..ListenerOptions::default()
        });

        let Some(SnapshotNode::Element { listeners, .. }) = host.snapshot(node) else {
            panic!("expected an element snapshot");
        };
        assert_eq!(
            listeners.into_iter().collect::<Vec<_>>(),
            vec!["click".to_owned(), "focus:capture".to_owned()]
        );
    }

    #[test]
    fn find_walks_in_document_order() {
        let mut host = MemoryHost::new();
        let root = host.create_element("div", None);
        let first = host.create_element("p", None);
        let nested = host.create_element("p", None);
        let second = host.create_element("p", None);
        host.insert_before(root, first, None);
        host.insert_before(first, nested, None);
        host.insert_before(root, second, None);

        assert_eq!(host.find_by_tag(root, "p"), vec![first, nested, second]);
    }
}
