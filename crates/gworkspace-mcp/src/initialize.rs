use tracing::info;

use crate::protocol::{
    InitializeRequest, InitializeResponse, MCP_PROTOCOL_VERSION, ServerCapabilities, ServerInfo,
    ToolsCapabilities,
};

pub fn handle_initialize(request: InitializeRequest) -> InitializeResponse {
    info!(
        "Client {} {} connected (protocol {})",
        request.client_info.name, request.client_info.version, request.protocol_version
    );

    // The server answers with its own version; the client adapts
    InitializeResponse {
        protocol_version: MCP_PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: ToolsCapabilities { list_changed: false },
        },
        server_info: ServerInfo {
            name: "gworkspace-mcp".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        instructions: "Google Workspace tools for Gmail, Chat, Sheets, Drive, Forms, Calendar and Docs. \
Tool names are <service>_<action>. Every result is JSON; failures carry success=false, an error message and a kind \
(authorization, remote, invalid_argument, not_found). Confirm with the user before sending, sharing or deleting."
            .to_string(),
    }
}
