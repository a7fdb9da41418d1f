//! The boundary between the reconciler and the live platform tree.
//!
//! The reconciler never touches platform nodes directly. Everything it does to the live tree
//! goes through a [`Host`], which hands out [`HostId`] handles for the nodes it owns. A browser
//! backend maps those handles onto DOM nodes; [`MemoryHost`](crate::MemoryHost) keeps an
//! in-memory document for tests and headless use.
//!
//! Host operations are infallible from the engine's point of view. Backends talking to a
//! foreign tree log and swallow platform exceptions instead of failing a patch halfway.

use core::fmt;

use crate::event::ListenerOptions;

/// Handle to a node owned by a [`Host`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HostId(u32);

impl HostId {
    /// Wraps a raw handle value chosen by a host.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw handle value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host#{}", self.0)
    }
}

/// A value assigned to a node property.
///
/// Properties are live object fields rather than serialized attributes, so they keep a type.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum PropValue {
    /// The null value.
    Null,
    /// A boolean, e.g. `checked` or `disabled`.
    Bool(bool),
    /// A number, e.g. `tabIndex` or `valueAsNumber`.
    Number(f64),
    /// A string, e.g. `value`.
    String(String),
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for PropValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A live tree the reconciler can mutate.
///
/// Implementations own their nodes. Handles stay valid until [`Host::release`] is called for
/// them; the engine releases every node it created exactly once, and never releases nodes it
/// adopted from elsewhere.
pub trait Host {
    /// Creates a detached element, in `namespace` when one is given.
    fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> HostId;

    /// Creates a detached text node.
    fn create_text(&mut self, content: &str) -> HostId;

    /// Replaces the content of a text node.
    fn set_text(&mut self, node: HostId, content: &str);

    /// Sets an attribute.
    fn set_attribute(&mut self, node: HostId, name: &str, value: &str);

    /// Removes an attribute.
    fn remove_attribute(&mut self, node: HostId, name: &str);

    /// Assigns a property.
    fn set_property(&mut self, node: HostId, name: &str, value: &PropValue);

    /// Clears a property previously assigned with [`Host::set_property`].
    fn remove_property(&mut self, node: HostId, name: &str);

    /// Sets a single inline style declaration.
    fn set_style(&mut self, node: HostId, name: &str, value: &str);

    /// Removes a single inline style declaration, leaving the others in place.
    fn remove_style(&mut self, node: HostId, name: &str);

    /// Adds one class name.
    fn add_class(&mut self, node: HostId, name: &str);

    /// Removes one class name, leaving the others in place.
    fn remove_class(&mut self, node: HostId, name: &str);

    /// Sets a dataset entry.
    fn set_dataset(&mut self, node: HostId, name: &str, value: &str);

    /// Removes a dataset entry.
    fn remove_dataset(&mut self, node: HostId, name: &str);

    /// Registers interest in `event` on `node`.
    ///
    /// When the event fires, the host forwards it to
    /// [`Runtime::dispatch`](crate::Runtime::dispatch) with `node` as the target. A node has at
    /// most one registration per event name and capture flag.
    fn add_listener(&mut self, node: HostId, event: &str, options: ListenerOptions);

    /// Drops the registration made by [`Host::add_listener`] with the same arguments.
    fn remove_listener(&mut self, node: HostId, event: &str, options: ListenerOptions);

    /// Inserts `child` into `parent` before `reference`, or last when `reference` is `None`.
    ///
    /// A child that is already attached somewhere is moved.
    fn insert_before(&mut self, parent: HostId, child: HostId, reference: Option<HostId>);

    /// Detaches `child` from `parent`.
    fn remove_child(&mut self, parent: HostId, child: HostId);

    /// Frees a node that left the mounted tree. The handle must not be used afterwards.
    ///
    /// Descendants are released individually; they may still hang below `node` when it is
    /// released.
    fn release(&mut self, node: HostId);

    /// Moves input focus to `node`.
    fn focus(&mut self, node: HostId);
}
