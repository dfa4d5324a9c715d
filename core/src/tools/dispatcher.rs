//! Dispatcher
//!
//! Resolves a tool name, runs it, and converts every outcome into an
//! [`Envelope`]. Errors never escape as `Err`.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{Envelope, ToolCall, ToolRegistry};
use crate::context::WorkspaceContext;

pub struct Dispatcher {
    ctx: Arc<WorkspaceContext>,
    registry: ToolRegistry,
}

impl Dispatcher {
    pub fn new(ctx: Arc<WorkspaceContext>) -> Self {
        Self {
            ctx,
            registry: ToolRegistry::new(),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub async fn invoke(&self, name: &str, args: Value) -> Envelope {
        info!("Invoking tool: {}", name);

        let outcome = match ToolCall::parse(name, args) {
            Ok(call) => call.execute(&self.ctx).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(payload) => {
                debug!("Tool {} succeeded", name);
                Envelope::Success(payload)
            }
            Err(e) => {
                warn!("Tool {} failed ({}): {}", name, e.kind(), e);
                Envelope::failure(&e)
            }
        }
    }
}
