#![allow(clippy::module_name_repetitions)]

//! Browser backend for `trellis`.
//!
//! [`DomHost`] implements the [`Host`](trellis_core::Host) boundary over `web-sys`, and
//! [`WebApp`] wires a [`Runtime`](trellis_core::Runtime) to a mount point in the page:
//!
//! ```no_run
//! use trellis_core::{markup, text};
//! use trellis_elem::elem;
//! use trellis_web::WebAppBuilder;
//!
//! # fn main() -> Result<(), trellis_web::WebError> {
//! let app = WebAppBuilder::new().with_root_id("app").deferred_flush(true).build()?;
//! app.render(elem::heading1(markup![text("todos")]))?;
//! # Ok(())
//! # }
//! ```
//!
//! DOM exceptions raised while patching are logged through `tracing` and do not abort the
//! pass; errors of the engine itself are returned as [`WebError`].

mod app;
mod dom;
mod error;

pub use app::{WebApp, WebAppBuilder};
pub use dom::DomHost;
pub use error::WebError;
