//! Mapping between the core tool layer and MCP shapes.

use gworkspace::{Envelope, ToolDescriptor, ToolRegistry};

use crate::protocol::{McpTool, ToolAnnotations, ToolContent, ToolsCallResponse, ToolsListResponse};

const READ_ONLY_ACTIONS: &[&str] = &["list_", "get_", "search_"];
const DESTRUCTIVE_ACTIONS: &[&str] = &["delete_", "clear_"];

pub fn list_response(registry: &ToolRegistry) -> ToolsListResponse {
    ToolsListResponse {
        tools: registry.list().iter().map(to_mcp_tool).collect(),
        next_cursor: None,
    }
}

fn to_mcp_tool(descriptor: &ToolDescriptor) -> McpTool {
    let action = descriptor
        .name
        .split_once('_')
        .map(|(_, action)| action)
        .unwrap_or_default();
    let read_only = READ_ONLY_ACTIONS.iter().any(|p| action.starts_with(p));
    let destructive = DESTRUCTIVE_ACTIONS.iter().any(|p| action.starts_with(p));

    McpTool {
        name: descriptor.name.clone(),
        description: descriptor.description.clone(),
        input_schema: descriptor.input_schema.clone(),
        annotations: Some(ToolAnnotations {
            read_only_hint: Some(read_only),
            destructive_hint: (!read_only).then_some(destructive),
            open_world_hint: Some(true),
        }),
    }
}

pub fn call_response(envelope: &Envelope) -> ToolsCallResponse {
    ToolsCallResponse {
        content: vec![ToolContent {
            content_type: "text".to_string(),
            text: envelope.to_text(),
        }],
        is_error: !envelope.is_success(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn annotations_follow_action_verbs() {
        let registry = ToolRegistry::new();
        let list = list_response(&registry);
        let find = |name: &str| list.tools.iter().find(|t| t.name == name).unwrap().clone();

        let get = find("drive_get_file").annotations.unwrap();
        assert_eq!(get.read_only_hint, Some(true));
        assert_eq!(get.destructive_hint, None);

        let delete = find("calendar_delete_event").annotations.unwrap();
        assert_eq!(delete.read_only_hint, Some(false));
        assert_eq!(delete.destructive_hint, Some(true));
    }

    #[test]
    fn failure_envelope_sets_is_error() {
        let resp = call_response(&Envelope::Failure {
            success: false,
            error: "Unknown tool: x_y".to_string(),
            kind: gworkspace::ErrorKind::InvalidArgument,
        });
        assert!(resp.is_error);
        let body: serde_json::Value = serde_json::from_str(&resp.content[0].text).unwrap();
        assert_eq!(body["kind"], "invalid_argument");

        let ok = call_response(&Envelope::Success(json!({"success": true})));
        assert!(!ok.is_error);
    }
}
