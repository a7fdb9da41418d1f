//! Development-time helpers.
//!
//! - [`logging`]: installs a `tracing` subscriber and forwards panics into it.
//! - [`snapshot_json`]: serializes a subtree of a [`MemoryHost`](trellis_core::MemoryHost)
//!   for golden files and bug reports.

pub mod logging;
mod snapshot;

pub use logging::{install_panic_forwarder, install_tracing, set_log_level};
pub use snapshot::{snapshot_json, snapshot_value};
