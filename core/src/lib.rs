//! Component runtime and virtual tree reconciler.
//!
//! Applications describe their interface as a tree of [`Node`]s built with [`tag`], [`text`]
//! and [`component`]. A [`Runtime`] mounts that description into a [`Host`] and keeps the
//! host tree in sync as components re-render: matching nodes are patched in place, keyed
//! children are moved rather than rebuilt, and component state is carried forward through
//! [`Component::restore`].
//!
//! The crate is host-agnostic. [`MemoryHost`] is an in-memory document used for tests and
//! headless rendering; `trellis-web` provides the browser host.

extern crate alloc;

#[macro_use]
mod macros;

mod arena;
pub mod component;
pub mod config;
pub mod error;
pub mod event;
pub mod host;
pub mod markup;
pub mod memory;
pub mod node;
mod reconcile;
pub mod runtime;
pub mod scheduler;
mod tree;

#[cfg(test)]
mod tests;

#[doc(inline)]
pub use component::{Component, ComponentId, LifecycleCx, NodeRef, RenderResult, Scope};
#[doc(inline)]
pub use config::{FlushMode, RuntimeConfig};
#[doc(inline)]
pub use error::{
    ConstructionError, Error, InvariantViolation, RenderError, RenderFailure, RenderFailures,
    Result,
};
#[doc(inline)]
pub use event::{Dispatch, Event, EventCx, Handler, Listener, ListenerOptions};
#[doc(inline)]
pub use host::{Host, HostId, PropValue};
#[doc(inline)]
pub use markup::{ClassMap, Markup, MarkupKind, MarkupList, MarkupSet, Name, markup_if};
#[doc(inline)]
pub use memory::{ElementState, HostOp, MemoryHost, SnapshotNode};
#[doc(inline)]
pub use node::{Element, Item, Key, Node, component, tag, text};
#[doc(inline)]
pub use runtime::{Mount, Runtime};
#[doc(inline)]
pub use tree::VNodeId;
