//! Google Workspace tools
//!
//! Credential lifecycle, REST adapters for Gmail, Chat, Sheets, Drive, Forms,
//! Calendar and Docs, and the tool registry/dispatcher that exposes them as
//! `<service>_<action>` tools.

pub mod auth;
pub mod common;
pub mod config;
pub mod context;
pub mod google;
pub mod tools;

pub use auth::{AuthError, CredentialProvider, TokenSource};
pub use common::{ErrorKind, ToolError};
pub use config::WorkspaceConfig;
pub use context::{ApiEndpoints, WorkspaceContext};
pub use tools::{Dispatcher, Envelope, ToolDescriptor, ToolRegistry};
