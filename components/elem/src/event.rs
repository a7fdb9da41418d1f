//! Event listener helpers.
//!
//! Each helper names one DOM event and returns an [`EventSpec`]; finish it with a handler to
//! get the listener markup:
//!
//! ```
//! use trellis_core::{Component, RenderResult, Scope, markup, text};
//! use trellis_elem::{elem, event};
//!
//! struct Toggle {
//!     on: bool,
//! }
//!
//! impl Component for Toggle {
//!     fn render(&self, scope: &Scope<Self>) -> RenderResult {
//!         Ok(elem::button(markup![
//!             event::click().prevent_default().bind(scope, |this, _event, cx| {
//!                 this.on = !this.on;
//!                 cx.rerender();
//!             }),
//!             text(if self.on { "on" } else { "off" }),
//!         ]))
//!     }
//! }
//! ```

use trellis_core::{
    Component, ConstructionError, Event, EventCx, Handler, Listener, ListenerOptions, Markup,
    MarkupKind, Name, Scope,
};

/// A listener waiting for its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "an event spec does nothing until it is given a handler"]
pub struct EventSpec {
    event: &'static str,
    options: ListenerOptions,
}

impl EventSpec {
    /// Listens for one of the fixed event names below.
    pub(crate) const fn new(event: &'static str) -> Self {
        Self {
            event,
            options: ListenerOptions {
                capture: false,
                passive: false,
                prevent_default: false,
                stop_propagation: false,
            },
        }
    }

    /// Listens for an event outside the fixed vocabulary, e.g. a custom element's event.
    ///
    /// # Errors
    ///
    /// Fails when `event` is not a valid event type name.
    pub fn custom(event: &'static str) -> Result<Self, ConstructionError> {
        Name::new(MarkupKind::Listener, event)?;
        Ok(Self::new(event))
    }

    /// Returns the event name.
    #[must_use]
    pub const fn event(&self) -> &'static str {
        self.event
    }

    /// Returns the registration options so far.
    #[must_use]
    pub const fn options(&self) -> ListenerOptions {
        self.options
    }

    /// Cancels the default action whenever the listener fires.
    pub const fn prevent_default(mut self) -> Self {
        self.options.prevent_default = true;
        self
    }

    /// Stops propagation whenever the listener fires.
    pub const fn stop_propagation(mut self) -> Self {
        self.options.stop_propagation = true;
        self
    }

    /// Listens during the capture phase.
    pub const fn capture(mut self) -> Self {
        self.options.capture = true;
        self
    }

    /// Registers the listener as passive.
    pub const fn passive(mut self) -> Self {
        self.options.passive = true;
        self
    }

    /// Finishes the listener with `handler`.
    #[must_use]
    pub fn handle(self, handler: Handler) -> Markup {
        Markup::Listener(Listener::new(
            Name::from_static(MarkupKind::Listener, self.event),
            self.options,
            handler,
        ))
    }

    /// Finishes the listener with a handler bound to the component rendering through `scope`.
    #[must_use]
    pub fn bind<C: Component>(
        self,
        scope: &Scope<C>,
        handler: impl Fn(&mut C, &Event, &mut EventCx<'_>) + 'static,
    ) -> Markup {
        self.handle(scope.handler(handler))
    }

    /// Finishes the listener with a handler owned by no component.
    #[must_use]
    pub fn call(self, handler: impl Fn(&Event, &mut EventCx<'_>) + 'static) -> Markup {
        self.handle(Handler::free(handler))
    }
}

macro_rules! events {
    ($($(#[$doc:meta])* $name:ident => $event:literal;)*) => {
        $(
            $(#[$doc])*
            pub const fn $name() -> EventSpec {
                EventSpec::new($event)
            }
        )*
    };
}

events! {
    /// `click`
    click => "click";
    /// `dblclick`
    double_click => "dblclick";
    /// `input`: the value of a control changed while editing.
    input => "input";
    /// `change`: the value of a control was committed.
    change => "change";
    /// `submit`
    submit => "submit";
    /// `keydown`
    key_down => "keydown";
    /// `keyup`
    key_up => "keyup";
    /// `blur`
    blur => "blur";
    /// `focus`
    focus => "focus";
    /// `mouseenter`
    mouse_enter => "mouseenter";
    /// `mouseleave`
    mouse_leave => "mouseleave";
}
