//! Error taxonomy for tool invocations.
//!
//! Every failure that crosses the dispatcher boundary is a [`ToolError`], and
//! every `ToolError` reduces to one [`ErrorKind`] so callers can branch on the
//! category instead of parsing message text.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::google::client::GoogleError;

/// Coarse failure category surfaced in failure envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing, invalid or unrefreshable credential, or the remote API refused it.
    Authorization,
    /// Any other failure reported by (or while talking to) a remote API.
    Remote,
    /// Unknown tool, missing required argument, or an argument of the wrong shape.
    InvalidArgument,
    /// The remote resource does not exist.
    NotFound,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Authorization => "authorization",
            ErrorKind::Remote => "remote",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::NotFound => "not_found",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("{context}: {source}")]
    Google {
        context: &'static str,
        #[source]
        source: GoogleError,
    },
}

impl ToolError {
    pub fn invalid(tool: impl Into<String>, message: impl Into<String>) -> Self {
        ToolError::InvalidArguments {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::UnknownTool(_) | ToolError::InvalidArguments { .. } => {
                ErrorKind::InvalidArgument
            }
            ToolError::Google { source, .. } => source.kind(),
        }
    }
}

/// Attach the failing operation's name to a remote error.
pub trait GoogleResultExt<T> {
    fn context(self, context: &'static str) -> Result<T, ToolError>;
}

impl<T> GoogleResultExt<T> for Result<T, GoogleError> {
    fn context(self, context: &'static str) -> Result<T, ToolError> {
        self.map_err(|source| ToolError::Google { context, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tool_message_carries_name() {
        let err = ToolError::UnknownTool("gmail_explode".to_string());
        assert_eq!(err.to_string(), "Unknown tool: gmail_explode");
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn remote_error_is_prefixed_with_context() {
        let res: Result<(), GoogleError> = Err(GoogleError::Api {
            code: 404,
            message: "Requested entity was not found.".to_string(),
        });
        let err = res.context("Failed to get file").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().starts_with("Failed to get file: "));
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn kind_serializes_snake_case() {
        let v = serde_json::to_value(ErrorKind::InvalidArgument).unwrap();
        assert_eq!(v, "invalid_argument");
    }
}
