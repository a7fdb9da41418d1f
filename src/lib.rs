#![doc = include_str!("../README.md")]
#![allow(clippy::multiple_crate_versions)]

pub mod debug;

#[doc(inline)]
pub use trellis_core::{
    ClassMap, Component, ComponentId, ConstructionError, Dispatch, Element, Error, Event,
    EventCx, FlushMode, Handler, Host, HostId, Item, Key, LifecycleCx, ListenerOptions, Markup,
    MarkupKind, MarkupList, MemoryHost, Mount, Node, NodeRef, PropValue, RenderError,
    RenderResult, Result, Runtime, RuntimeConfig, Scope, SnapshotNode, component, markup,
    markup_if, tag, text,
};
pub use trellis_elem::{elem, event, prop, style};

/// Browser backend.
#[cfg(feature = "web")]
pub use trellis_web as web;

pub mod prelude {
    //! Everything needed to write components.
    //!
    //! ```
    //! use trellis::prelude::*;
    //!
    //! struct Greeting {
    //!     name: String,
    //! }
    //!
    //! impl Component for Greeting {
    //!     fn render(&self, _scope: &Scope<Self>) -> RenderResult {
    //!         Ok(elem::paragraph(markup![
    //!             prop::class("greeting"),
    //!             text(format!("Hello, {}!", self.name)),
    //!         ]))
    //!     }
    //! }
    //! ```
    pub use crate::{
        ClassMap, Component, Event, EventCx, LifecycleCx, Markup, Node, NodeRef, RenderError,
        RenderResult, Scope, component, elem, event, markup, markup_if, prop, style, tag, text,
    };
    pub use trellis_elem::{EventSpec, InputType, Size};
}
