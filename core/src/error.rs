//! Error taxonomy of the engine.
//!
//! Three classes of failure exist, and they surface at different points:
//!
//! - [`ConstructionError`] is returned while a description is being built, before any live
//!   node is touched.
//! - [`RenderError`] is returned by a component's render logic. The runtime isolates it to
//!   that component's subtree, keeps the previously committed output, and reports every
//!   failure of a pass as [`RenderFailures`].
//! - [`InvariantViolation`] means the committed tree and the host tree disagree. It is fatal:
//!   the runtime refuses further work once one has been observed.

use core::fmt;

use thiserror::Error;

use crate::{component::ComponentId, host::HostId, markup::MarkupKind, tree::VNodeId};

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// A malformed markup value, detected when the value is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    /// The name is empty.
    #[error("{kind} name must not be empty")]
    EmptyName {
        /// Kind of the rejected value.
        kind: MarkupKind,
    },
    /// The name contains characters the host tree cannot represent.
    #[error("`{name}` is not a valid {kind} name")]
    InvalidName {
        /// Kind of the rejected value.
        kind: MarkupKind,
        /// The rejected name.
        name: String,
    },
    /// The name collides with a slot the engine manages itself.
    #[error("`{name}` is reserved and cannot be used as {kind} name")]
    Reserved {
        /// Kind of the rejected value.
        kind: MarkupKind,
        /// The rejected name.
        name: String,
    },
}

/// Failure reported by [`Component::render`](crate::Component::render).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RenderError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + 'static>>,
}

impl RenderError {
    /// Creates a render error carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a render error that wraps an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the message passed at construction.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A render failure attributed to the component that produced it.
#[derive(Debug, Error)]
#[error("component {component} (`{type_name}`) failed to render: {error}")]
pub struct RenderFailure {
    /// Slot of the failing component.
    pub component: ComponentId,
    /// Rust type name of the failing component.
    pub type_name: &'static str,
    /// The error returned by `render`.
    #[source]
    pub error: RenderError,
}

/// Every render failure collected during one reconciliation pass.
#[derive(Debug, Default)]
pub struct RenderFailures(Vec<RenderFailure>);

impl RenderFailures {
    pub(crate) const fn new(failures: Vec<RenderFailure>) -> Self {
        Self(failures)
    }

    /// Returns the individual failures in the order they happened.
    #[must_use]
    pub fn failures(&self) -> &[RenderFailure] {
        &self.0
    }

    /// Returns the number of failing components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no component failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the collection, yielding the failures.
    #[must_use]
    pub fn into_inner(self) -> Vec<RenderFailure> {
        self.0
    }

    pub(crate) fn append(&mut self, other: Self) {
        self.0.extend(other.0);
    }
}

impl fmt::Display for RenderFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => write!(f, "no component failed to render"),
            [only] => write!(f, "{only}"),
            [first, rest @ ..] => write!(f, "{first} (and {} more)", rest.len()),
        }
    }
}

impl std::error::Error for RenderFailures {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.first().map(|f| f as &(dyn std::error::Error + 'static))
    }
}

/// The committed tree no longer describes the host tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// A committed node id refers to a freed arena slot.
    #[error("committed node {0} no longer exists")]
    StaleNode(VNodeId),
    /// A component placeholder refers to a missing component slot.
    #[error("component {0} is missing from the arena")]
    MissingComponent(ComponentId),
    /// A node expected to be an element is of another kind.
    #[error("committed node {0} is not an element")]
    NotAnElement(VNodeId),
    /// The tracked child order of a host node contains nodes the committed tree dropped.
    #[error("host children of {parent} diverged from the committed tree")]
    HostOrder {
        /// The host parent whose child list diverged.
        parent: HostId,
    },
    /// A mount handle does not belong to this runtime.
    #[error("mount {0} is not active")]
    UnknownMount(u32),
    /// Render requests kept arriving after the configured number of flush rounds.
    #[error("flush did not settle after {0} rounds")]
    FlushLimit(usize),
}

/// Umbrella error returned by the runtime.
#[derive(Debug, Error)]
pub enum Error {
    /// A description could not be built.
    #[error(transparent)]
    Construction(#[from] ConstructionError),
    /// One or more components failed to render; their previous output is still displayed.
    #[error(transparent)]
    Render(#[from] RenderFailures),
    /// Internal bookkeeping disagrees with the host tree.
    #[error("reconciliation invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
    /// An earlier invariant violation left the runtime unusable.
    #[error("runtime is poisoned by an earlier invariant violation")]
    Poisoned,
}

impl Error {
    /// Returns the render failures if this is a render error.
    #[must_use]
    pub const fn render_failures(&self) -> Option<&RenderFailures> {
        match self {
            Self::Render(failures) => Some(failures),
            _ => None,
        }
    }
}
