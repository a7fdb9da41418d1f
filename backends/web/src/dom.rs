//! The browser document as a [`Host`].

use std::{collections::HashMap, rc::Weak};

use trellis_core::{Host, HostId, ListenerOptions, PropValue};
use wasm_bindgen::{JsCast, JsValue, closure::Closure};
use web_sys::{AddEventListenerOptions, CssStyleDeclaration, Document, Element, HtmlElement, Node};

use crate::app::Shared;

type Callback = Closure<dyn FnMut(web_sys::Event)>;

fn report(result: Result<(), JsValue>, operation: &'static str, node: HostId) {
    if let Err(error) = result {
        tracing::error!(operation, %node, ?error, "DOM operation failed");
    }
}

/// Live DOM nodes addressed by [`HostId`].
///
/// Ids are handed out in creation order and never reused. Every registered listener holds a
/// trampoline that forwards the native event to the runtime owning this host.
pub struct DomHost {
    document: Document,
    nodes: Vec<Option<Node>>,
    listeners: HashMap<(HostId, String, bool), Callback>,
    app: Weak<Shared>,
}

impl std::fmt::Debug for DomHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomHost")
            .field("nodes", &self.nodes.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl DomHost {
    pub(crate) fn new(document: Document, app: Weak<Shared>) -> Self {
        Self {
            document,
            nodes: Vec::new(),
            listeners: HashMap::new(),
            app,
        }
    }

    /// Returns the owning document.
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Returns the live node behind `id`, unless it has been released.
    #[must_use]
    pub fn node(&self, id: HostId) -> Option<&Node> {
        self.nodes.get(id.raw() as usize)?.as_ref()
    }

    /// Registers a node created outside the runtime, e.g. the mount point.
    pub fn adopt(&mut self, node: Node) -> HostId {
        self.push(node)
    }

    fn push(&mut self, node: Node) -> HostId {
        let id = HostId::from_raw(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(Some(node));
        id
    }

    fn element(&self, id: HostId, operation: &'static str) -> Option<&Element> {
        let element = self.node(id).and_then(|node| node.dyn_ref::<Element>());
        if element.is_none() {
            tracing::warn!(operation, node = %id, "not a live element");
        }
        element
    }

    fn style(&self, id: HostId, operation: &'static str) -> Option<CssStyleDeclaration> {
        let element = self.element(id, operation)?;
        js_sys::Reflect::get(element, &JsValue::from_str("style"))
            .ok()?
            .dyn_into::<CssStyleDeclaration>()
            .ok()
    }
}

fn to_js(value: &PropValue) -> JsValue {
    match value {
        PropValue::Null => JsValue::NULL,
        PropValue::Bool(value) => JsValue::from_bool(*value),
        PropValue::Number(value) => JsValue::from_f64(*value),
        PropValue::String(value) => JsValue::from_str(value),
    }
}

impl Host for DomHost {
    fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> HostId {
        let created = match namespace {
            Some(namespace) => self.document.create_element_ns(Some(namespace), tag),
            None => self.document.create_element(tag),
        };
        let node: Node = match created {
            Ok(element) => element.into(),
            Err(error) => {
                tracing::error!(tag, ?error, "cannot create element; using an empty text node");
                self.document.create_text_node("").into()
            }
        };
        self.push(node)
    }

    fn create_text(&mut self, content: &str) -> HostId {
        let text = self.document.create_text_node(content);
        self.push(text.into())
    }

    fn set_text(&mut self, node: HostId, content: &str) {
        if let Some(text) = self.node(node) {
            text.set_text_content(Some(content));
        }
    }

    fn set_attribute(&mut self, node: HostId, name: &str, value: &str) {
        if let Some(element) = self.element(node, "set_attribute") {
            report(element.set_attribute(name, value), "set_attribute", node);
        }
    }

    fn remove_attribute(&mut self, node: HostId, name: &str) {
        if let Some(element) = self.element(node, "remove_attribute") {
            report(element.remove_attribute(name), "remove_attribute", node);
        }
    }

    fn set_property(&mut self, node: HostId, name: &str, value: &PropValue) {
        if let Some(element) = self.element(node, "set_property") {
            let result = js_sys::Reflect::set(element, &JsValue::from_str(name), &to_js(value));
            report(result.map(drop), "set_property", node);
        }
    }

    // Deleting an own property does not reset accessors such as `value`; null does.
    fn remove_property(&mut self, node: HostId, name: &str) {
        self.set_property(node, name, &PropValue::Null);
    }

    fn set_style(&mut self, node: HostId, name: &str, value: &str) {
        if let Some(style) = self.style(node, "set_style") {
            report(style.set_property(name, value), "set_style", node);
        }
    }

    fn remove_style(&mut self, node: HostId, name: &str) {
        if let Some(style) = self.style(node, "remove_style") {
            report(style.remove_property(name).map(drop), "remove_style", node);
        }
    }

    fn add_class(&mut self, node: HostId, name: &str) {
        if let Some(element) = self.element(node, "add_class") {
            report(element.class_list().add_1(name), "add_class", node);
        }
    }

    fn remove_class(&mut self, node: HostId, name: &str) {
        if let Some(element) = self.element(node, "remove_class") {
            report(element.class_list().remove_1(name), "remove_class", node);
        }
    }

    fn set_dataset(&mut self, node: HostId, name: &str, value: &str) {
        if let Some(element) = self.element(node, "set_dataset") {
            report(element.set_attribute(&format!("data-{name}"), value), "set_dataset", node);
        }
    }

    fn remove_dataset(&mut self, node: HostId, name: &str) {
        if let Some(element) = self.element(node, "remove_dataset") {
            report(element.remove_attribute(&format!("data-{name}")), "remove_dataset", node);
        }
    }

    fn add_listener(&mut self, node: HostId, event: &str, options: ListenerOptions) {
        let Some(target) = self.node(node).cloned() else {
            return;
        };
        let app = self.app.clone();
        let callback = Callback::new(move |native: web_sys::Event| {
            if let Some(app) = app.upgrade() {
                app.deliver(node, &native);
            }
        });

        let registration = AddEventListenerOptions::new();
        registration.set_capture(options.capture);
        registration.set_passive(options.passive);
        report(
            target.add_event_listener_with_callback_and_add_event_listener_options(
                event,
                callback.as_ref().unchecked_ref(),
                &registration,
            ),
            "add_listener",
            node,
        );
        self.listeners
            .insert((node, event.to_owned(), options.capture), callback);
    }

    fn remove_listener(&mut self, node: HostId, event: &str, options: ListenerOptions) {
        let Some(callback) = self
            .listeners
            .remove(&(node, event.to_owned(), options.capture))
        else {
            return;
        };
        if let Some(target) = self.node(node) {
            report(
                target.remove_event_listener_with_callback_and_bool(
                    event,
                    callback.as_ref().unchecked_ref(),
                    options.capture,
                ),
                "remove_listener",
                node,
            );
        }
    }

    fn insert_before(&mut self, parent: HostId, child: HostId, reference: Option<HostId>) {
        let (Some(parent_node), Some(child_node)) = (self.node(parent), self.node(child)) else {
            tracing::warn!(%parent, %child, "insert_before on a released node");
            return;
        };
        let reference = reference.and_then(|reference| self.node(reference));
        report(
            parent_node.insert_before(child_node, reference).map(drop),
            "insert_before",
            parent,
        );
    }

    fn remove_child(&mut self, parent: HostId, child: HostId) {
        if let (Some(parent_node), Some(child_node)) = (self.node(parent), self.node(child)) {
            report(parent_node.remove_child(child_node).map(drop), "remove_child", parent);
        }
    }

    fn release(&mut self, node: HostId) {
        self.listeners.retain(|(owner, _, _), _| *owner != node);
        if let Some(slot) = self.nodes.get_mut(node.raw() as usize) {
            *slot = None;
        }
    }

    fn focus(&mut self, node: HostId) {
        match self.node(node).and_then(|node| node.dyn_ref::<HtmlElement>()) {
            Some(element) => report(element.focus(), "focus", node),
            None => tracing::debug!(%node, "focus target is not an HTML element"),
        }
    }
}
