//! Common Utilities
//!
//! Error taxonomy, HTTP client construction and path helpers shared across the crate.

pub mod error;
pub mod http;
pub mod paths;
pub mod result;

pub use error::{ErrorKind, GoogleResultExt, ToolError};
pub use http::{create_http_client, create_http_client_with_timeout, HttpClient};
pub use result::ToolResult;
