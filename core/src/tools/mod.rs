//! Tool layer
//!
//! Names of the form `<service>_<action>` resolve to a typed [`ToolCall`];
//! the [`Dispatcher`] executes it against the workspace adapters and wraps the
//! outcome in an [`Envelope`]. The [`ToolRegistry`] only advertises.

pub mod args;
pub mod call;
pub mod dispatcher;
pub mod envelope;
pub mod handlers;
pub mod registry;

pub use call::ToolCall;
pub use dispatcher::Dispatcher;
pub use envelope::Envelope;
pub use registry::{ToolDescriptor, ToolRegistry};
