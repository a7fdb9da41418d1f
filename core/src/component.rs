//! Components: stateful units that survive re-renders of their ancestors.
//!
//! A component value doubles as its own property bag. A parent renders
//! `component(ItemView { index, item, ..Default::default() })`; when the reconciler finds an
//! instance of the same type (and key) at that position, the new value is handed the old one
//! through [`Component::restore`] so it can carry persistent state forward, and the new value
//! takes over the slot. Slots are addressed by [`ComponentId`], which stays stable for as long
//! as the logical component is mounted.

use alloc::rc::Rc;
use core::{
    any::{Any, type_name},
    fmt,
    marker::PhantomData,
};
use std::collections::HashMap;

use crate::{
    arena::{Arena, Slot},
    error::RenderError,
    event::{Effect, Event, EventCx, Handler},
    host::HostId,
    node::Node,
    tree::VNodeId,
};

/// Stable identifier of a mounted component slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(Slot);

impl ComponentId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self(Slot { index, generation })
    }

    const fn slot(self) -> Slot {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.0.index, self.0.generation)
    }
}

/// A name under which a live element is captured during render.
///
/// References created through [`Scope::node_ref`] are private to one component slot; those
/// created with [`NodeRef::new`] are shared by the whole runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    owner: Option<ComponentId>,
    name: &'static str,
}

impl NodeRef {
    /// Creates a runtime-wide reference.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self { owner: None, name }
    }

    /// Returns the component slot owning the reference.
    #[must_use]
    pub const fn owner(&self) -> Option<ComponentId> {
        self.owner
    }

    /// Returns the local name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

/// Result of [`Component::render`].
pub type RenderResult = Result<Node, RenderError>;

/// A stateful UI unit.
///
/// Only [`Component::render`] is required. The lifecycle of a slot is
/// `Unmounted → Mounted → (Updating ⇄ Mounted) → Unmounted`: `mount` runs once after the first
/// rendered subtree is attached, `unmount` runs once when the slot is destroyed.
pub trait Component: Sized + 'static {
    /// Describes the subtree for the current properties and state.
    ///
    /// Must not touch live nodes. Side effects belong in event handlers.
    ///
    /// # Errors
    ///
    /// A failed render leaves the previously committed subtree of this component in place
    /// and is reported to whoever started the pass.
    fn render(&self, scope: &Scope<Self>) -> RenderResult;

    /// Decides whether this instance, which is replacing `previous`, has to render.
    ///
    /// Called after [`Component::restore`]. Returning `false` keeps the committed subtree.
    /// This is an optimization: never return `false` when the output would differ.
    fn should_rerender(&self, previous: &Self) -> bool {
        let _ = previous;
        true
    }

    /// Copies persistent state from the instance this one replaces.
    fn restore(&mut self, previous: &Self) {
        let _ = previous;
    }

    /// Runs once, after the slot's first subtree is attached to the host tree.
    fn mount(&mut self, cx: &mut LifecycleCx<'_>) {
        let _ = cx;
    }

    /// Runs once, when the slot is destroyed.
    fn unmount(&mut self) {}
}

/// The handle a component renders through.
///
/// It identifies the slot being rendered, which lets render bind event handlers and node
/// references to the slot without capturing the instance itself.
pub struct Scope<C> {
    id: ComponentId,
    marker: PhantomData<fn() -> C>,
}

impl<C> Clone for Scope<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Scope<C> {}

impl<C> fmt::Debug for Scope<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scope<{}>({})", type_name::<C>(), self.id)
    }
}

impl<C: Component> Scope<C> {
    pub(crate) const fn new(id: ComponentId) -> Self {
        Self {
            id,
            marker: PhantomData,
        }
    }

    /// Returns the slot being rendered.
    #[must_use]
    pub const fn id(&self) -> ComponentId {
        self.id
    }

    /// Binds `handler` to this slot.
    ///
    /// When the listener fires, the handler receives whichever instance occupies the slot at
    /// that moment.
    pub fn handler(&self, handler: impl Fn(&mut C, &Event, &mut EventCx<'_>) + 'static) -> Handler {
        Handler::Bound {
            component: self.id,
            call: Rc::new(move |instance: &mut dyn Any, event: &Event, cx: &mut EventCx<'_>| {
                if let Some(this) = instance.downcast_mut::<C>() {
                    handler(this, event, cx);
                }
            }),
        }
    }

    /// Returns a reference private to this slot.
    #[must_use]
    pub const fn node_ref(&self, name: &'static str) -> NodeRef {
        NodeRef {
            owner: Some(self.id),
            name,
        }
    }
}

/// Context handed to [`Component::mount`].
#[derive(Debug)]
pub struct LifecycleCx<'a> {
    id: ComponentId,
    refs: &'a HashMap<NodeRef, HostId>,
    requests: &'a mut Vec<ComponentId>,
    effects: &'a mut Vec<Effect>,
}

impl<'a> LifecycleCx<'a> {
    pub(crate) const fn new(
        id: ComponentId,
        refs: &'a HashMap<NodeRef, HostId>,
        requests: &'a mut Vec<ComponentId>,
        effects: &'a mut Vec<Effect>,
    ) -> Self {
        Self {
            id,
            refs,
            requests,
            effects,
        }
    }

    /// Returns the slot being mounted.
    #[must_use]
    pub const fn id(&self) -> ComponentId {
        self.id
    }

    /// Resolves a captured live node.
    #[must_use]
    pub fn resolve(&self, node_ref: NodeRef) -> Option<HostId> {
        self.refs.get(&node_ref).copied()
    }

    /// Focuses a captured node once the current flush completes.
    pub fn focus(&mut self, node_ref: NodeRef) {
        self.effects.push(Effect::Focus(node_ref));
    }

    /// Requests another render of this slot.
    pub fn rerender(&mut self) {
        self.requests.push(self.id);
    }

    /// Requests a render of another mounted slot, e.g. the parent that owns this one.
    pub fn rerender_component(&mut self, id: ComponentId) {
        self.requests.push(id);
    }
}

/// Object-safe view of a [`Component`].
pub(crate) trait AnyComponent: Any {
    fn type_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn restore_from(&mut self, previous: &dyn AnyComponent);
    fn should_rerender_after(&self, previous: &dyn AnyComponent) -> bool;
    fn render_in(&self, id: ComponentId) -> RenderResult;
    fn mount_in(&mut self, cx: &mut LifecycleCx<'_>);
    fn unmount_in(&mut self);
}

impl<C: Component> AnyComponent for C {
    fn type_name(&self) -> &'static str {
        type_name::<C>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn restore_from(&mut self, previous: &dyn AnyComponent) {
        if let Some(previous) = previous.as_any().downcast_ref::<C>() {
            self.restore(previous);
        }
    }

    fn should_rerender_after(&self, previous: &dyn AnyComponent) -> bool {
        previous
            .as_any()
            .downcast_ref::<C>()
            .is_none_or(|previous| self.should_rerender(previous))
    }

    fn render_in(&self, id: ComponentId) -> RenderResult {
        self.render(&Scope::new(id))
    }

    fn mount_in(&mut self, cx: &mut LifecycleCx<'_>) {
        self.mount(cx);
    }

    fn unmount_in(&mut self) {
        self.unmount();
    }
}

/// A mounted component slot.
pub(crate) struct ComponentSlot {
    pub instance: Box<dyn AnyComponent>,
    /// The placeholder node in the committed tree; unset while the first render runs.
    pub vnode: Option<VNodeId>,
    pub mounted: bool,
}

/// Table of mounted component slots.
#[derive(Default)]
pub(crate) struct Components {
    slots: Arena<ComponentSlot>,
}

impl Components {
    pub fn insert(&mut self, instance: Box<dyn AnyComponent>) -> ComponentId {
        ComponentId(self.slots.insert(ComponentSlot {
            instance,
            vnode: None,
            mounted: false,
        }))
    }

    pub fn get(&self, id: ComponentId) -> Option<&ComponentSlot> {
        self.slots.get(id.slot())
    }

    pub fn get_mut(&mut self, id: ComponentId) -> Option<&mut ComponentSlot> {
        self.slots.get_mut(id.slot())
    }

    pub fn remove(&mut self, id: ComponentId) -> Option<ComponentSlot> {
        self.slots.remove(id.slot())
    }

    pub const fn len(&self) -> usize {
        self.slots.len()
    }
}

impl fmt::Debug for Components {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Components({} mounted)", self.len())
    }
}
