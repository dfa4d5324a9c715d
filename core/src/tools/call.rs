//! Name resolution: `<service>_<action>` to a typed call.

use serde_json::Value;

use super::handlers::{
    calendar::CalendarCall, chat::ChatCall, docs::DocsCall, drive::DriveCall, forms::FormsCall,
    gmail::GmailCall, sheets::SheetsCall,
};
use crate::common::{ToolError, ToolResult};
use crate::context::WorkspaceContext;

/// One fully decoded invocation. Building it performs all argument
/// validation, so no remote call is made for a malformed request.
#[derive(Debug)]
pub enum ToolCall {
    Gmail(GmailCall),
    Chat(ChatCall),
    Sheets(SheetsCall),
    Drive(DriveCall),
    Forms(FormsCall),
    Calendar(CalendarCall),
    Docs(DocsCall),
}

impl ToolCall {
    pub fn parse(name: &str, args: Value) -> ToolResult<Self> {
        let unknown = || ToolError::UnknownTool(name.to_string());
        let (service, action) = name.split_once('_').ok_or_else(unknown)?;

        match service {
            "gmail" => GmailCall::parse(name, action, args).map(Self::Gmail),
            "chat" => ChatCall::parse(name, action, args).map(Self::Chat),
            "sheets" => SheetsCall::parse(name, action, args).map(Self::Sheets),
            "drive" => DriveCall::parse(name, action, args).map(Self::Drive),
            "forms" => FormsCall::parse(name, action, args).map(Self::Forms),
            "calendar" => CalendarCall::parse(name, action, args).map(Self::Calendar),
            "docs" => DocsCall::parse(name, action, args).map(Self::Docs),
            _ => Err(unknown()),
        }
    }

    pub async fn execute(self, ctx: &WorkspaceContext) -> ToolResult<Value> {
        match self {
            Self::Gmail(call) => call.execute(&ctx.gmail).await,
            Self::Chat(call) => call.execute(&ctx.chat).await,
            Self::Sheets(call) => call.execute(&ctx.sheets).await,
            Self::Drive(call) => call.execute(&ctx.drive).await,
            Self::Forms(call) => call.execute(&ctx.forms).await,
            Self::Calendar(call) => call.execute(&ctx.calendar).await,
            Self::Docs(call) => call.execute(&ctx.docs).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorKind;
    use serde_json::json;

    #[test]
    fn unknown_names() {
        for name in ["", "gmail", "slack_send", "gmail_teleport", "GMAIL_send_message"] {
            let err = ToolCall::parse(name, json!({})).unwrap_err();
            assert_eq!(err.to_string(), format!("Unknown tool: {}", name));
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn unknown_name_wins_over_bad_arguments() {
        let err = ToolCall::parse("drive_teleport", json!("not an object")).unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(_)));
    }

    #[test]
    fn resolves_service() {
        let call = ToolCall::parse("docs_get_document", json!({"document_id": "d"})).unwrap();
        assert!(matches!(call, ToolCall::Docs(DocsCall::GetDocument(_))));
    }
}
