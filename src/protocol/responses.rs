//! Response handling
//!
//! Defines response status codes and formats response lines.

use serde_json::{Value, json};

use crate::service::TreeSnapshot;

/// Response status codes
pub const OK: u16 = 200;
pub const CREATED: u16 = 201;
pub const GOODBYE: u16 = 221;
pub const BAD_REQUEST: u16 = 400;
pub const TOO_MANY_CLIENTS: u16 = 421;

/// Format a response object as one line
pub fn format_response(body: Value) -> String {
    format!("{}\n", body)
}

/// Response carrying a tree and its path list
pub fn tree_response(status: u16, snapshot: &TreeSnapshot) -> String {
    format_response(json!({ "status": status, "tree": snapshot.to_json() }))
}

/// Response carrying an error message
pub fn error_response(status: u16, message: &str) -> String {
    format_response(json!({ "status": status, "error": message }))
}

/// Response with only a status and a short message
pub fn message_response(status: u16, message: &str) -> String {
    format_response(json!({ "status": status, "message": message }))
}
