//! Per-service tool handlers
//!
//! Each module owns the argument structs, the typed call enum, the
//! advertised descriptors and the reshaping of raw API payloads for one
//! service.

pub mod calendar;
pub mod chat;
pub mod docs;
pub mod drive;
pub mod forms;
pub mod gmail;
pub mod sheets;

use serde_json::{json, Value};

/// `{"success": true, "message": ...}`
pub(crate) fn done(message: impl Into<String>) -> Value {
    json!({ "success": true, "message": message.into() })
}

/// Copy `key` from a remote object, `""` when absent.
pub(crate) fn field(value: &Value, key: &str) -> Value {
    value.get(key).cloned().unwrap_or_else(|| json!(""))
}

/// String form of `key`, `""` when absent or not a string.
pub(crate) fn text(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
