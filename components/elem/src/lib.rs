//! `trellis` element vocabulary.
//!
//! Thin, fixed-name wrappers around the [`tag`](trellis_core::tag) primitive: one constructor
//! per HTML element in [`elem`], plus helpers producing the markup values applications use
//! most, in [`prop`], [`style`] and [`event`].

pub mod elem;
pub mod event;
pub mod prop;
pub mod style;

pub use event::EventSpec;
pub use prop::InputType;
pub use style::Size;
