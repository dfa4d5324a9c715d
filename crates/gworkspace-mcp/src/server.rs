//! MCP stdio server
//!
//! Newline-delimited JSON-RPC 2.0. One request is handled at a time;
//! notifications (no `id`) are processed but never answered.

use serde_json::{json, Value};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use gworkspace::Dispatcher;

use crate::initialize;
use crate::protocol::{codes, InitializeRequest, JsonRpcRequest, JsonRpcResponse, ToolsCallRequest};
use crate::tools;

#[derive(Debug, Error)]
pub enum McpServerError {
    #[error("I/O error on protocol stream: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

pub struct McpServer {
    dispatcher: Dispatcher,
}

impl McpServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub async fn run_stdio(&self) -> Result<(), McpServerError> {
        info!("MCP server listening on stdio");
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        self.run(reader, writer).await
    }

    /// Serve until the reader reaches EOF.
    pub async fn run<R, W>(&self, mut reader: R, mut writer: W) -> Result<(), McpServerError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                info!("Input closed, shutting down");
                return Ok(());
            }

            let Some(response) = self.handle_line(&line).await else {
                continue;
            };

            writer
                .write_all(serde_json::to_string(&response)?.as_bytes())
                .await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }

    /// Handle one raw input line. `None` means nothing is written back.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        match serde_json::from_str::<JsonRpcRequest>(trimmed) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                warn!("Unparsable request: {}", e);
                Some(JsonRpcResponse::parse_error(format!("Parse error: {}", e)))
            }
        }
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!("<- {}", request.method);

        let Some(id) = request.id.clone() else {
            debug!("Notification {} acknowledged", request.method);
            return None;
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                id,
                codes::INVALID_REQUEST,
                format!("Unsupported jsonrpc version: {}", request.jsonrpc),
                None,
            ));
        }

        let response = match request.method.as_str() {
            "initialize" => match serde_json::from_value::<InitializeRequest>(request.params) {
                Ok(init) => to_success(id, &initialize::handle_initialize(init)),
                Err(e) => JsonRpcResponse::invalid_params(id, format!("Invalid initialize params: {}", e)),
            },
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => to_success(id, &tools::list_response(self.dispatcher.registry())),
            "tools/call" => match serde_json::from_value::<ToolsCallRequest>(request.params) {
                Ok(call) => {
                    let envelope = self.dispatcher.invoke(&call.name, call.arguments).await;
                    to_success(id, &tools::call_response(&envelope))
                }
                Err(e) => JsonRpcResponse::invalid_params(id, format!("Invalid tools/call params: {}", e)),
            },
            other => JsonRpcResponse::method_not_found(id, other),
        };
        Some(response)
    }
}

fn to_success<T: serde::Serialize>(id: Value, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, codes::INTERNAL_ERROR, e.to_string(), None),
    }
}
