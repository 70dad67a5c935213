//! Protocol Error Mapping
//!
//! Browser protocols report failures as free-form text. These helpers turn the
//! messages we care about into `DriverError` variants so callers can branch on
//! them instead of matching strings.

use crate::error::DriverError;
use crate::protocol::NodeRef;

pub const CANNOT_FIND_NODE: &str = "Could not find node with given id";
pub const NOT_SELECTABLE: &str = "Element is not a <select> element";
pub const CONTEXT_DESTROYED: &str = "Execution context was destroyed";
pub const CANNOT_FIND_CONTEXT: &str = "Cannot find context";

/// Check if a message indicates the page context is gone (e.g., during navigation).
pub fn is_context_error(message: &str) -> bool {
    message.contains(CONTEXT_DESTROYED) || message.contains(CANNOT_FIND_CONTEXT)
}

pub fn is_node_missing(message: &str) -> bool {
    message.contains(CANNOT_FIND_NODE)
}

/// Maps a raw protocol failure message to a `DriverError`.
///
/// `id` is the node the failing command targeted, when there was one.
pub fn map_protocol_error(message: &str, id: Option<NodeRef>) -> DriverError {
    if is_node_missing(message) {
        if let Some(id) = id {
            return DriverError::NotFound { id };
        }
    }
    if message.contains(NOT_SELECTABLE) {
        return DriverError::TypeMismatch {
            expected: "select".to_string(),
            got: "unknown".to_string(),
        };
    }
    if is_context_error(message) {
        return DriverError::ContextDestroyed(message.to_string());
    }
    DriverError::Protocol(message.to_string())
}

/// Returns a recovery hint for the given error code.
pub fn hint_for_code(code: &str) -> Option<&'static str> {
    match code {
        "NOT_FOUND" => Some("Capture a fresh accessibility tree; the node id is stale"),
        "TYPE_MISMATCH" => Some("Target the <select> element or one of its options"),
        "OPTION_NOT_FOUND" => Some("Check available options in select element"),
        "CONTEXT_DESTROYED" => Some("The page navigated; retry once it has loaded"),
        "NOT_READY" => Some("Launch the driver before issuing commands"),
        _ => None,
    }
}
