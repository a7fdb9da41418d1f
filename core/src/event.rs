//! Event listeners and the context handlers run in.
//!
//! A listener pairs an event name with a [`Handler`]. Handlers created through
//! [`Scope::handler`](crate::Scope::handler) are bound to a component slot by id rather than
//! by closure capture: at dispatch time the runtime looks up whichever instance currently
//! occupies that slot, so restored instances receive events without rebinding anything.

use alloc::rc::Rc;
use core::{any::Any, fmt};

use crate::{
    component::{ComponentId, NodeRef},
    error::RenderFailures,
    markup::Name,
};

/// An event delivered to a handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    name: String,
    value: Option<String>,
    checked: Option<bool>,
    key: Option<String>,
}

impl Event {
    /// Creates an event of the given type, e.g. `"click"`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Attaches the current `value` of the target element.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Attaches the current `checked` state of the target element.
    #[must_use]
    pub const fn with_checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    /// Attaches the key of a keyboard event.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Returns the event type.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the target's `value`, if the host reported one.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Returns the target's `checked` state, if the host reported one.
    #[must_use]
    pub const fn checked(&self) -> Option<bool> {
        self.checked
    }

    /// Returns the key of a keyboard event.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

/// How a listener is registered with the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[allow(clippy::struct_excessive_bools)]
pub struct ListenerOptions {
    /// Listen during the capture phase instead of the bubble phase.
    pub capture: bool,
    /// Promise the host never to cancel the event.
    pub passive: bool,
    /// Cancel the default action of the event.
    pub prevent_default: bool,
    /// Stop the event from reaching further listeners.
    pub stop_propagation: bool,
}

type FreeFn = dyn Fn(&Event, &mut EventCx<'_>);
type BoundFn = dyn Fn(&mut dyn Any, &Event, &mut EventCx<'_>);

/// Code run when a listener fires.
#[derive(Clone)]
pub enum Handler {
    /// A handler owned by no component.
    Free(Rc<FreeFn>),
    /// A handler that receives the component instance currently occupying a slot.
    Bound {
        /// Slot whose instance is passed to `call`.
        component: ComponentId,
        /// Erased handler; downcasts the instance to its concrete type.
        call: Rc<BoundFn>,
    },
}

impl Handler {
    /// Creates a handler that is not tied to a component.
    pub fn free(handler: impl Fn(&Event, &mut EventCx<'_>) + 'static) -> Self {
        Self::Free(Rc::new(handler))
    }

    /// Returns the slot a bound handler targets.
    #[must_use]
    pub const fn component(&self) -> Option<ComponentId> {
        match self {
            Self::Free(_) => None,
            Self::Bound { component, .. } => Some(*component),
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free(_) => f.write_str("Handler::Free"),
            Self::Bound { component, .. } => write!(f, "Handler::Bound({component})"),
        }
    }
}

/// An event listener markup value.
#[derive(Debug, Clone)]
pub struct Listener {
    event: Name,
    options: ListenerOptions,
    handler: Handler,
}

impl Listener {
    /// Creates a listener for an already validated event name.
    #[must_use]
    pub const fn new(event: Name, options: ListenerOptions, handler: Handler) -> Self {
        Self {
            event,
            options,
            handler,
        }
    }

    /// Returns the event name.
    #[must_use]
    pub const fn event(&self) -> &Name {
        &self.event
    }

    /// Returns the registration options.
    #[must_use]
    pub const fn options(&self) -> ListenerOptions {
        self.options
    }

    /// Returns the handler.
    #[must_use]
    pub const fn handler(&self) -> &Handler {
        &self.handler
    }
}

/// Work deferred until the current flush has completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Effect {
    Focus(NodeRef),
}

/// Context handed to event handlers.
///
/// Handlers record what should happen next here; nothing is rendered while a handler runs.
#[derive(Debug)]
pub struct EventCx<'a> {
    current: Option<ComponentId>,
    requests: &'a mut Vec<ComponentId>,
    effects: &'a mut Vec<Effect>,
}

impl<'a> EventCx<'a> {
    pub(crate) const fn new(
        current: Option<ComponentId>,
        requests: &'a mut Vec<ComponentId>,
        effects: &'a mut Vec<Effect>,
    ) -> Self {
        Self {
            current,
            requests,
            effects,
        }
    }

    /// Returns the component whose handler is running.
    #[must_use]
    pub const fn component(&self) -> Option<ComponentId> {
        self.current
    }

    /// Requests a re-render of the component whose handler is running.
    ///
    /// Does nothing for free handlers.
    pub fn rerender(&mut self) {
        if let Some(id) = self.current {
            self.requests.push(id);
        }
    }

    /// Requests a re-render of any mounted component.
    pub fn rerender_component(&mut self, id: ComponentId) {
        self.requests.push(id);
    }

    /// Focuses the node captured by `node_ref` once pending renders have been applied.
    pub fn focus(&mut self, node_ref: NodeRef) {
        self.effects.push(Effect::Focus(node_ref));
    }
}

/// Outcome of delivering an event to one node.
///
/// The listener's `prevent_default` and `stop_propagation` are reported even when the flush
/// that followed the handler failed to render some components; those failures are carried
/// in [`Dispatch::failures`] and the rest of the flush was applied.
#[derive(Debug, Default)]
pub struct Dispatch {
    /// A listener for the event existed on the node and ran.
    pub handled: bool,
    /// The listener asked for the default action to be cancelled.
    pub prevent_default: bool,
    /// The listener asked for propagation to stop.
    pub stop_propagation: bool,
    /// Components that failed to render in the flush following the handler.
    pub failures: RenderFailures,
}

impl Dispatch {
    /// Turns collected render failures into [`Error::Render`](crate::Error::Render).
    ///
    /// # Errors
    ///
    /// Fails if any component failed to render after the handler ran.
    pub fn into_result(self) -> crate::Result<Self> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(crate::Error::Render(self.failures))
        }
    }
}
