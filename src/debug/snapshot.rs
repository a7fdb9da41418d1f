use serde_json::Value;
use trellis_core::{HostId, MemoryHost};

/// Returns the observable state of the subtree at `node` as a JSON value.
///
/// Released or unknown nodes serialize as `null`.
///
/// # Errors
///
/// Fails only if a property holds a number JSON cannot represent, such as `NaN`.
pub fn snapshot_value(host: &MemoryHost, node: HostId) -> serde_json::Result<Value> {
    serde_json::to_value(host.snapshot(node))
}

/// Returns the observable state of the subtree at `node` as pretty-printed JSON.
///
/// # Errors
///
/// See [`snapshot_value`].
pub fn snapshot_json(host: &MemoryHost, node: HostId) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&host.snapshot(node))
}
