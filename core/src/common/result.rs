//! Result alias used by the tool handlers.

use super::error::ToolError;

pub type ToolResult<T> = Result<T, ToolError>;
