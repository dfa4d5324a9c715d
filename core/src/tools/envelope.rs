//! Result envelope returned for every invocation.

use serde::Serialize;
use serde_json::Value;

use crate::common::{ErrorKind, ToolError};

/// Success carries the tool's payload as-is; failure is
/// `{"success": false, "error": "...", "kind": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    Success(Value),
    Failure {
        success: bool,
        error: String,
        kind: ErrorKind,
    },
}

impl Envelope {
    pub fn failure(err: &ToolError) -> Self {
        Envelope::Failure {
            success: false,
            error: err.to_string(),
            kind: err.kind(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success(_))
    }

    pub fn to_value(&self) -> Value {
        match self {
            Envelope::Success(value) => value.clone(),
            Envelope::Failure {
                success,
                error,
                kind,
            } => serde_json::json!({
                "success": success,
                "error": error,
                "kind": kind,
            }),
        }
    }

    /// Pretty-printed JSON, the text body of an MCP tool result.
    pub fn to_text(&self) -> String {
        serde_json::to_string_pretty(&self.to_value()).unwrap_or_else(|_| "null".to_string())
    }
}
