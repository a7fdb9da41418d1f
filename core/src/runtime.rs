//! The runtime: owns a host, the committed tree and the render queue.
//!
//! ```
//! use trellis_core::{Host, MemoryHost, Runtime, tag, text};
//!
//! let mut host = MemoryHost::new();
//! let container = host.create_element("main", None);
//! let mut runtime = Runtime::new(host);
//! let mount = runtime.render_into(container, tag("p", [text("hello").into()]))?;
//! assert_eq!(runtime.host().text_content(container), "hello");
//! runtime.teardown(mount)?;
//! # Ok::<(), trellis_core::Error>(())
//! ```

use core::mem;
use std::collections::HashMap;

use crate::{
    component::{ComponentId, NodeRef},
    config::{FlushMode, RuntimeConfig},
    error::{Error, InvariantViolation, RenderFailures, Result},
    event::{Dispatch, Effect, Event, EventCx, Handler, ListenerOptions, Listener},
    host::{Host, HostId},
    node::Node,
    reconcile::{Engine, Pass},
    scheduler::RenderQueue,
    tree::{Live, VNodeId},
};

/// Handle to a description tree rendered into a container.
///
/// Pass it to [`Runtime::update`] to render a new description, and to
/// [`Runtime::teardown`] to unmount everything.
#[derive(Debug, PartialEq, Eq)]
pub struct Mount {
    id: u32,
    container: HostId,
}

impl Mount {
    /// Returns the container the tree is rendered into.
    #[must_use]
    pub const fn container(&self) -> HostId {
        self.container
    }
}

/// Keeps a host tree synchronized with component descriptions.
#[derive(Debug)]
pub struct Runtime<H: Host> {
    engine: Engine<H>,
    queue: RenderQueue,
    config: RuntimeConfig,
    roots: HashMap<u32, VNodeId>,
    next_mount: u32,
    requests: Vec<ComponentId>,
    effects: Vec<Effect>,
    poisoned: bool,
}

impl<H: Host> Runtime<H> {
    /// Creates a runtime with the default configuration.
    pub fn new(host: H) -> Self {
        Self::with_config(host, RuntimeConfig::default())
    }

    /// Creates a runtime.
    pub fn with_config(host: H, config: RuntimeConfig) -> Self {
        Self {
            engine: Engine::new(host),
            queue: RenderQueue::new(),
            config,
            roots: HashMap::new(),
            next_mount: 0,
            requests: Vec::new(),
            effects: Vec::new(),
            poisoned: false,
        }
    }

    /// Returns the configuration.
    pub const fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Returns the host.
    pub const fn host(&self) -> &H {
        &self.engine.host
    }

    /// Returns the host mutably.
    ///
    /// Nodes mounted by this runtime must not be changed through it: the committed tree would
    /// stop describing them.
    pub const fn host_mut(&mut self) -> &mut H {
        &mut self.engine.host
    }

    /// Registers `container` as the parent of a tree that is empty for now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Poisoned`] after an invariant violation.
    pub fn attach(&mut self, container: HostId) -> Result<Mount> {
        self.check()?;
        let root = self.engine.create_root(container);
        let id = self.next_mount;
        self.next_mount = self.next_mount.wrapping_add(1);
        self.roots.insert(id, root);
        tracing::debug!(%container, mount = id, "attached container");
        Ok(Mount { id, container })
    }

    /// Renders `node` into `container` and returns the handle to the mounted tree.
    ///
    /// Other nodes already in `container` are left alone; the tree is appended after them.
    ///
    /// # Errors
    ///
    /// If a component fails its first render, the partial tree is unmounted again and the
    /// failures are returned. Use [`Runtime::attach`] followed by [`Runtime::update`] to keep
    /// the partial tree instead.
    pub fn render_into(&mut self, container: HostId, node: Node) -> Result<Mount> {
        let mount = self.attach(container)?;
        match self.update(&mount, node) {
            Ok(()) => Ok(mount),
            Err(Error::Render(failures)) => {
                self.teardown(mount)?;
                Err(Error::Render(failures))
            }
            Err(error) => Err(error),
        }
    }

    /// Reconciles the tree behind `mount` against a new description.
    ///
    /// # Errors
    ///
    /// Render failures are returned after the rest of the tree has been updated; the failing
    /// components keep showing their previous output.
    pub fn update(&mut self, mount: &Mount, node: Node) -> Result<()> {
        self.check()?;
        let root = self.root(mount)?;
        let span = tracing::debug_span!("update", mount = mount.id);
        let _guard = span.enter();
        let mut pass = Pass::default();
        let result = self.engine.reconcile_children(root, vec![node], &mut pass);
        self.guard(result)?;
        self.finish(pass, self.config.mode() == FlushMode::Immediate)
    }

    /// Unmounts the tree behind `mount`, running every `unmount` hook.
    ///
    /// # Errors
    ///
    /// Returns an error if the mount is unknown or the runtime is poisoned.
    pub fn teardown(&mut self, mount: Mount) -> Result<()> {
        self.check()?;
        let root = self.root(&mount)?;
        let mut pass = Pass::default();
        let result = self.engine.destroy_root(root, &mut pass);
        self.guard(result)?;
        self.roots.remove(&mount.id);
        tracing::debug!(container = %mount.container, released = pass.stats.released, "tore down mount");
        self.finish(pass, false)
    }

    /// Returns the component at the top of the tree behind `mount`, if there is one.
    pub fn root_component(&self, mount: &Mount) -> Option<ComponentId> {
        let root = *self.roots.get(&mount.id)?;
        let first = *self.engine.tree.element(root).ok()?.children.first()?;
        match &self.engine.tree.get(first).ok()?.live {
            Live::Component(component) => Some(component.id),
            _ => None,
        }
    }

    /// Queues a render of `id` for the next flush.
    ///
    /// Requests for the same component coalesce until then.
    pub fn rerender(&mut self, id: ComponentId) {
        self.queue.request(id);
    }

    /// Queues a render of `id` and flushes unless flushing is deferred.
    ///
    /// # Errors
    ///
    /// See [`Runtime::flush`].
    pub fn rerender_now(&mut self, id: ComponentId) -> Result<()> {
        self.rerender(id);
        match self.config.mode() {
            FlushMode::Immediate => self.flush(),
            FlushMode::Deferred => Ok(()),
        }
    }

    /// Number of components waiting for a render.
    pub fn pending_renders(&self) -> usize {
        self.queue.len()
    }

    /// Number of mounted component slots.
    pub fn component_count(&self) -> usize {
        self.engine.components.len()
    }

    /// Renders every queued component, ancestors first, then runs mount hooks and effects.
    ///
    /// Every component queued when the flush starts is rendered before it returns, once.
    ///
    /// # Errors
    ///
    /// - [`Error::Render`] lists the components whose render failed; their previous output
    ///   stays in place and the rest of the flush is applied.
    /// - [`Error::Invariant`] with [`InvariantViolation::FlushLimit`] if components keep
    ///   requesting renders of each other; the remaining requests stay queued.
    pub fn flush(&mut self) -> Result<()> {
        self.check()?;
        let span = tracing::debug_span!("flush", pending = self.queue.len());
        let _guard = span.enter();
        self.finish(Pass::default(), true)
    }

    /// Delivers `event` to the listener registered for it on `target`, if any.
    ///
    /// The handler runs to completion before anything is rendered. Unless flushing is
    /// deferred, the runtime flushes before returning. Components that fail to render in
    /// that flush are reported in [`Dispatch::failures`] next to the listener's options.
    ///
    /// # Errors
    ///
    /// Fails on an invariant violation or a poisoned runtime, see [`Runtime::flush`].
    pub fn dispatch(&mut self, target: HostId, event: &Event) -> Result<Dispatch> {
        self.check()?;
        let Some(listener) = self.listener(target, event.name()) else {
            return Ok(Dispatch::default());
        };

        match listener.handler() {
            Handler::Free(handler) => {
                let mut cx = EventCx::new(None, &mut self.requests, &mut self.effects);
                handler(event, &mut cx);
            }
            Handler::Bound { component, call } => {
                let Some(slot) = self.engine.components.get_mut(*component) else {
                    tracing::debug!(%component, event = event.name(), "dropping event for unmounted component");
                    return Ok(Dispatch::default());
                };
                let mut cx = EventCx::new(Some(*component), &mut self.requests, &mut self.effects);
                call(slot.instance.as_any_mut(), event, &mut cx);
            }
        }

        for id in self.requests.drain(..) {
            self.queue.request(id);
        }

        let options = listener.options();
        let mut outcome = Dispatch {
            handled: true,
            prevent_default: options.prevent_default,
            stop_propagation: options.stop_propagation,
            failures: RenderFailures::default(),
        };
        if self.config.mode() == FlushMode::Immediate {
            match self.flush() {
                Ok(()) => {}
                Err(Error::Render(failures)) => outcome.failures = failures,
                Err(error) => return Err(error),
            }
        }
        Ok(outcome)
    }

    /// Returns how the listener for `event` on `target` is registered.
    pub fn listener_options(&self, target: HostId, event: &str) -> Option<ListenerOptions> {
        self.listener(target, event).map(|listener| listener.options())
    }

    /// Resolves a captured live node.
    pub fn resolve(&self, node_ref: NodeRef) -> Option<HostId> {
        self.engine.refs.get(&node_ref).copied()
    }

    fn listener(&self, target: HostId, event: &str) -> Option<Listener> {
        let vnode = self.engine.tree.by_host(target)?;
        self.engine
            .tree
            .element(vnode)
            .ok()?
            .markup
            .listener(event)
            .cloned()
    }

    fn root(&self, mount: &Mount) -> Result<VNodeId> {
        self.roots
            .get(&mount.id)
            .copied()
            .ok_or(Error::Invariant(InvariantViolation::UnknownMount(mount.id)))
    }

    const fn check(&self) -> Result<()> {
        if self.poisoned {
            Err(Error::Poisoned)
        } else {
            Ok(())
        }
    }

    fn guard<T>(&mut self, result: core::result::Result<T, InvariantViolation>) -> Result<T> {
        result.map_err(|violation| {
            if !matches!(violation, InvariantViolation::FlushLimit(_)) {
                tracing::error!(%violation, "reconciliation invariant violated; runtime is poisoned");
                self.poisoned = true;
            }
            Error::Invariant(violation)
        })
    }

    /// Runs mount hooks, drains the queue when `drain` is set, then applies effects.
    fn finish(&mut self, mut pass: Pass, drain: bool) -> Result<()> {
        let settled = self.settle(&mut pass, drain);
        self.guard(settled)?;
        if self.queue.is_empty() {
            self.apply_effects();
        }

        let stats = pass.stats;
        tracing::debug!(
            created = stats.created,
            markup = stats.markup,
            moved = stats.moved,
            released = stats.released,
            rendered = stats.rendered,
            "pass complete"
        );
        if pass.failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Render(RenderFailures::new(pass.failures)))
        }
    }

    fn settle(&mut self, pass: &mut Pass, drain: bool) -> core::result::Result<(), InvariantViolation> {
        let mut rounds = 0;
        loop {
            self.engine
                .run_mount_hooks(pass, &mut self.requests, &mut self.effects);
            for id in self.requests.drain(..) {
                self.queue.request(id);
            }
            if !drain || self.queue.is_empty() {
                return Ok(());
            }
            if rounds == self.config.round_limit() {
                return Err(InvariantViolation::FlushLimit(rounds));
            }
            rounds += 1;

            // Requests queued after a slot rendered in an earlier round still need a render.
            pass.rendered.clear();
            let engine = &self.engine;
            let order = self.queue.drain_ordered(|id| engine.component_depth(id));
            tracing::trace!(round = rounds, components = order.len(), "flush round");
            for id in order {
                if !pass.rendered.contains(&id) {
                    self.engine.rerender(id, pass)?;
                }
            }
        }
    }

    fn apply_effects(&mut self) {
        for effect in mem::take(&mut self.effects) {
            match effect {
                Effect::Focus(node_ref) => match self.engine.refs.get(&node_ref) {
                    Some(&node) => self.engine.host.focus(node),
                    None => tracing::debug!(name = node_ref.name(), "focus target is not mounted"),
                },
            }
        }
    }
}
