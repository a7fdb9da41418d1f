use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
};

use trellis_core::{
    ComponentId, Dispatch, Event, FlushMode, HostId, Mount, Node, Runtime, RuntimeConfig,
};
use wasm_bindgen::{JsCast, closure::Closure, prelude::wasm_bindgen};
use web_sys::{Document, Element, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement, KeyboardEvent};

use crate::{dom::DomHost, error::WebError};

/// Builder for [`WebApp`].
#[derive(Debug, Clone)]
pub struct WebAppBuilder {
    root_id: Option<String>,
    clear_root: bool,
    config: RuntimeConfig,
}

impl Default for WebAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WebAppBuilder {
    /// Creates a new builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root_id: None,
            clear_root: true,
            config: RuntimeConfig::new(),
        }
    }

    /// Sets the DOM element identifier that should host the application.
    ///
    /// Without one, a `<div id="trellis-root">` is appended to the body.
    #[must_use]
    pub fn with_root_id(mut self, id: impl Into<String>) -> Self {
        self.root_id = Some(id.into());
        self
    }

    /// Controls whether existing children of the root are removed before mounting.
    #[must_use]
    pub const fn clear_root(mut self, clear: bool) -> Self {
        self.clear_root = clear;
        self
    }

    /// Batches re-renders requested by event handlers into one flush on a microtask.
    #[must_use]
    pub const fn deferred_flush(mut self, deferred: bool) -> Self {
        self.config = self.config.flush_mode(if deferred {
            FlushMode::Deferred
        } else {
            FlushMode::Immediate
        });
        self
    }

    /// Replaces the runtime configuration.
    #[must_use]
    pub const fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Finalises the builder and creates a [`WebApp`].
    ///
    /// # Errors
    ///
    /// Returns an error if the DOM root element cannot be found or initialized.
    pub fn build(self) -> Result<WebApp, WebError> {
        WebApp::new_with_options(self)
    }
}

/// State shared between the app handle and the listener trampolines.
pub(crate) struct Shared {
    runtime: RefCell<Runtime<DomHost>>,
    root: HostId,
    mount: RefCell<Option<Mount>>,
    /// Events raised by the DOM while the runtime was busy, e.g. `blur` during a patch.
    pending: RefCell<VecDeque<(HostId, Event)>>,
    flush_scheduled: Cell<bool>,
}

impl Shared {
    /// Entry point of every native listener.
    pub(crate) fn deliver(self: &Rc<Self>, node: HostId, native: &web_sys::Event) {
        let event = translate(native);
        let Ok(mut runtime) = self.runtime.try_borrow_mut() else {
            tracing::debug!(%node, event = event.name(), "runtime busy; queueing event");
            self.pending.borrow_mut().push_back((node, event));
            return;
        };
        let outcome = runtime.dispatch(node, &event);
        drop(runtime);

        match outcome {
            Ok(outcome) => {
                if outcome.prevent_default {
                    native.prevent_default();
                }
                if outcome.stop_propagation {
                    native.stop_propagation();
                }
                if !outcome.failures.is_empty() {
                    tracing::error!(
                        failures = %outcome.failures,
                        event = event.name(),
                        "render failed after event"
                    );
                }
            }
            Err(error) => tracing::error!(%error, event = event.name(), "event dispatch failed"),
        }
        self.settle();
    }

    /// Delivers queued events, then schedules a flush if renders are still pending.
    fn settle(self: &Rc<Self>) {
        loop {
            let Some((node, event)) = self.pending.borrow_mut().pop_front() else {
                break;
            };
            let Ok(mut runtime) = self.runtime.try_borrow_mut() else {
                self.pending.borrow_mut().push_front((node, event));
                return;
            };
            if let Err(error) = runtime.dispatch(node, &event).and_then(Dispatch::into_result) {
                tracing::error!(%error, event = event.name(), "queued event dispatch failed");
            }
        }

        let pending = self
            .runtime
            .try_borrow()
            .map_or(0, |runtime| runtime.pending_renders());
        if pending > 0 {
            self.schedule_flush();
        }
    }

    fn schedule_flush(self: &Rc<Self>) {
        if self.flush_scheduled.replace(true) {
            return;
        }
        let Some(window) = web_sys::window() else {
            self.flush_scheduled.set(false);
            tracing::warn!("no window to schedule a flush on");
            return;
        };
        let app = Rc::downgrade(self);
        // Freed by wasm-bindgen once it has run.
        let callback: js_sys::Function = Closure::once_into_js(move || {
            if let Some(app) = app.upgrade() {
                app.flush_scheduled.set(false);
                if let Err(error) = app.flush() {
                    tracing::error!(%error, "scheduled flush failed");
                }
            }
        })
        .unchecked_into();
        window.queue_microtask(&callback);
    }

    fn flush(self: &Rc<Self>) -> Result<(), WebError> {
        let result = self.runtime.try_borrow_mut().map_or_else(
            |_| {
                tracing::debug!("flush requested while the runtime is busy");
                Ok(())
            },
            |mut runtime| runtime.flush(),
        );
        self.settle();
        result.map_err(WebError::from)
    }
}

fn translate(native: &web_sys::Event) -> Event {
    let mut event = Event::new(native.type_());
    if let Some(target) = native.target() {
        if let Some(input) = target.dyn_ref::<HtmlInputElement>() {
            event = event.with_value(input.value()).with_checked(input.checked());
        } else if let Some(area) = target.dyn_ref::<HtmlTextAreaElement>() {
            event = event.with_value(area.value());
        } else if let Some(select) = target.dyn_ref::<HtmlSelectElement>() {
            event = event.with_value(select.value());
        }
    }
    if let Some(keyboard) = native.dyn_ref::<KeyboardEvent>() {
        event = event.with_key(keyboard.key());
    }
    event
}

fn locate_root(document: &Document, root_id: Option<&str>) -> Result<Element, WebError> {
    if let Some(id) = root_id {
        return document
            .get_element_by_id(id)
            .ok_or_else(|| WebError::RootNotFound(id.to_string()));
    }
    let body = document.body().ok_or(WebError::DomUnavailable)?;
    let host = document.create_element("div")?;
    host.set_id("trellis-root");
    body.append_child(&host)?;
    Ok(host)
}

/// Entry point for running `trellis` inside the browser.
#[wasm_bindgen]
pub struct WebApp {
    shared: Rc<Shared>,
}

impl std::fmt::Debug for WebApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebApp")
            .field("root", &self.shared.root)
            .field("mounted", &self.shared.mount.borrow().is_some())
            .finish_non_exhaustive()
    }
}

impl WebApp {
    #[allow(clippy::needless_pass_by_value)]
    fn new_with_options(builder: WebAppBuilder) -> Result<Self, WebError> {
        console_error_panic_hook::set_once();
        let window = web_sys::window().ok_or(WebError::DomUnavailable)?;
        let document = window.document().ok_or(WebError::DomUnavailable)?;
        let root = locate_root(&document, builder.root_id.as_deref())?;
        if builder.clear_root {
            while let Some(child) = root.first_child() {
                root.remove_child(&child)?;
            }
        }

        let shared = Rc::new_cyclic(|app| {
            let mut host = DomHost::new(document, app.clone());
            let root = host.adopt(root.into());
            Shared {
                runtime: RefCell::new(Runtime::with_config(host, builder.config)),
                root,
                mount: RefCell::new(None),
                pending: RefCell::new(VecDeque::new()),
                flush_scheduled: Cell::new(false),
            }
        });
        tracing::debug!(mode = ?builder.config.mode(), "web app ready");
        Ok(Self { shared })
    }

    /// Renders `node` into the root, mounting it on the first call and patching afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`WebError::Engine`] with the render failures of the pass; the rest of the tree
    /// is still updated.
    pub fn render(&self, node: Node) -> Result<(), WebError> {
        let result = {
            let mut runtime = self.shared.runtime.borrow_mut();
            let mut mount = self.shared.mount.borrow_mut();
            match mount.as_ref() {
                Some(existing) => runtime.update(existing, node),
                None => {
                    let attached = runtime.attach(self.shared.root)?;
                    let result = runtime.update(&attached, node);
                    *mount = Some(attached);
                    result
                }
            }
        };
        self.shared.settle();
        result.map_err(WebError::from)
    }

    /// Unmounts the tree, running every `unmount` hook and removing every listener.
    ///
    /// # Errors
    ///
    /// Fails if the runtime is poisoned.
    pub fn unmount(&self) -> Result<(), WebError> {
        let Some(mount) = self.shared.mount.borrow_mut().take() else {
            return Ok(());
        };
        self.shared.runtime.borrow_mut().teardown(mount)?;
        Ok(())
    }

    /// Queues a render of a mounted component; it runs on the next flush.
    pub fn rerender(&self, id: ComponentId) {
        self.shared.runtime.borrow_mut().rerender(id);
        self.shared.settle();
    }

    /// Runs `f` with exclusive access to the runtime, then delivers events raised meanwhile.
    ///
    /// # Panics
    ///
    /// Panics if called from inside an event handler or component hook.
    pub fn with_runtime<R>(&self, f: impl FnOnce(&mut Runtime<DomHost>) -> R) -> R {
        let result = f(&mut self.shared.runtime.borrow_mut());
        self.shared.settle();
        result
    }

    /// Returns the id of the mount point.
    #[must_use]
    pub fn root(&self) -> HostId {
        self.shared.root
    }
}

#[wasm_bindgen]
impl WebApp {
    /// Creates a new [`WebApp`] using the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the DOM root element cannot be found or initialized.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<Self, WebError> {
        Self::new_with_options(WebAppBuilder::new())
    }

    /// Applies every queued render now.
    ///
    /// # Errors
    ///
    /// Returns an error if a component failed to render or the runtime is poisoned.
    pub fn flush(&self) -> Result<(), WebError> {
        self.shared.flush()
    }
}

impl Drop for WebApp {
    fn drop(&mut self) {
        if let Err(error) = self.unmount() {
            tracing::warn!(%error, "unmounting on drop failed");
        }
    }
}
