//! Google Drive tools

use serde::Deserialize;
use serde_json::{json, Value};

use super::{done, field, text};
use crate::common::{GoogleResultExt, ToolError, ToolResult};
use crate::google::drive::{folder_children_query, name_contains_query};
use crate::google::DriveApi;
use crate::tools::args::{decode, default_max_results, lenient_u32};
use crate::tools::registry::{descriptor, ToolDescriptor};

fn default_order_by() -> String {
    "modifiedTime desc".to_string()
}

fn default_folder_page() -> u32 {
    100
}

fn default_role() -> String {
    "reader".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListFilesArgs {
    #[serde(default = "default_max_results", deserialize_with = "lenient_u32")]
    pub max_results: u32,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default = "default_order_by")]
    pub order_by: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileIdArgs {
    pub file_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateFolderArgs {
    pub folder_name: String,
    #[serde(default)]
    pub parent_folder_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CopyFileArgs {
    pub file_id: String,
    #[serde(default)]
    pub new_name: Option<String>,
    #[serde(default)]
    pub parent_folder_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MoveFileArgs {
    pub file_id: String,
    pub new_parent_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShareFileArgs {
    pub file_id: String,
    pub email: String,
    #[serde(default = "default_role")]
    pub role: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchFilesArgs {
    pub query: String,
    #[serde(default = "default_max_results", deserialize_with = "lenient_u32")]
    pub max_results: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FolderContentsArgs {
    pub folder_id: String,
    #[serde(default = "default_folder_page", deserialize_with = "lenient_u32")]
    pub max_results: u32,
}

#[derive(Debug)]
pub enum DriveCall {
    ListFiles(ListFilesArgs),
    GetFile(FileIdArgs),
    CreateFolder(CreateFolderArgs),
    DeleteFile(FileIdArgs),
    CopyFile(CopyFileArgs),
    MoveFile(MoveFileArgs),
    ShareFile(ShareFileArgs),
    SearchFiles(SearchFilesArgs),
    GetFolderContents(FolderContentsArgs),
}

impl DriveCall {
    pub fn parse(tool: &str, action: &str, args: Value) -> ToolResult<Self> {
        Ok(match action {
            "list_files" => Self::ListFiles(decode(tool, args)?),
            "get_file" => Self::GetFile(decode(tool, args)?),
            "create_folder" => Self::CreateFolder(decode(tool, args)?),
            "delete_file" => Self::DeleteFile(decode(tool, args)?),
            "copy_file" => Self::CopyFile(decode(tool, args)?),
            "move_file" => Self::MoveFile(decode(tool, args)?),
            "share_file" => {
                let args: ShareFileArgs = decode(tool, args)?;
                if !matches!(args.role.as_str(), "reader" | "commenter" | "writer") {
                    return Err(ToolError::invalid(
                        tool,
                        format!("role must be reader, commenter or writer, got '{}'", args.role),
                    ));
                }
                Self::ShareFile(args)
            }
            "search_files" => Self::SearchFiles(decode(tool, args)?),
            "get_folder_contents" => Self::GetFolderContents(decode(tool, args)?),
            _ => return Err(ToolError::UnknownTool(tool.to_string())),
        })
    }

    pub async fn execute(self, drive: &DriveApi) -> ToolResult<Value> {
        match self {
            Self::ListFiles(args) => {
                let files = drive
                    .list_files(args.query.as_deref(), Some(&args.order_by), args.max_results)
                    .await
                    .context("Failed to list files")?;
                Ok(file_list(&files))
            }
            Self::GetFile(args) => {
                let file = drive
                    .get_file(&args.file_id)
                    .await
                    .context("Failed to get file")?;
                let mut out = file_summary(&file);
                out["success"] = json!(true);
                out["parents"] = file.get("parents").cloned().unwrap_or_else(|| json!([]));
                Ok(out)
            }
            Self::CreateFolder(args) => {
                let folder = drive
                    .create_folder(&args.folder_name, args.parent_folder_id.as_deref())
                    .await
                    .context("Failed to create folder")?;
                Ok(json!({
                    "success": true,
                    "folder_id": field(&folder, "id"),
                    "folder_name": field(&folder, "name"),
                    "webViewLink": field(&folder, "webViewLink"),
                }))
            }
            Self::DeleteFile(args) => {
                drive
                    .delete_file(&args.file_id)
                    .await
                    .context("Failed to delete file")?;
                Ok(done(format!("File {} deleted", args.file_id)))
            }
            Self::CopyFile(args) => {
                let copy = drive
                    .copy_file(
                        &args.file_id,
                        args.new_name.as_deref(),
                        args.parent_folder_id.as_deref(),
                    )
                    .await
                    .context("Failed to copy file")?;
                Ok(json!({
                    "success": true,
                    "file_id": field(&copy, "id"),
                    "name": field(&copy, "name"),
                    "webViewLink": field(&copy, "webViewLink"),
                }))
            }
            Self::MoveFile(args) => {
                let moved = drive
                    .move_file(&args.file_id, &args.new_parent_id)
                    .await
                    .context("Failed to move file")?;
                Ok(json!({
                    "success": true,
                    "file_id": field(&moved, "id"),
                    "name": field(&moved, "name"),
                    "parents": moved.get("parents").cloned().unwrap_or_else(|| json!([])),
                }))
            }
            Self::ShareFile(args) => {
                drive
                    .share_with_user(&args.file_id, &args.email, &args.role)
                    .await
                    .context("Failed to share file")?;
                Ok(done(format!("File shared with {} as {}", args.email, args.role)))
            }
            Self::SearchFiles(args) => {
                let files = drive
                    .list_files(Some(&name_contains_query(&args.query)), None, args.max_results)
                    .await
                    .context("Failed to search files")?;
                Ok(file_list(&files))
            }
            Self::GetFolderContents(args) => {
                let files = drive
                    .list_files(Some(&folder_children_query(&args.folder_id)), None, args.max_results)
                    .await
                    .context("Failed to get folder contents")?;
                Ok(file_list(&files))
            }
        }
    }
}

fn file_summary(file: &Value) -> Value {
    let size = match file.get("size") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "0".to_string(),
    };
    json!({
        "id": field(file, "id"),
        "name": field(file, "name"),
        "mimeType": text(file, "mimeType"),
        "createdTime": field(file, "createdTime"),
        "modifiedTime": field(file, "modifiedTime"),
        "size": size,
        "webViewLink": field(file, "webViewLink"),
    })
}

fn file_list(files: &[Value]) -> Value {
    files.iter().map(file_summary).collect()
}

pub fn descriptors() -> Vec<ToolDescriptor> {
    let file_id = json!({ "file_id": { "type": "string", "description": "Drive file ID" } });
    vec![
        descriptor(
            "drive_list_files",
            "List Drive files, most recently modified first by default.",
            json!({
                "max_results": { "type": "integer", "default": 10 },
                "query": { "type": "string", "description": "Drive query, e.g. \"mimeType='application/pdf'\"" },
                "order_by": { "type": "string", "default": "modifiedTime desc" }
            }),
            &[],
        ),
        descriptor(
            "drive_get_file",
            "Get a file's metadata including its parent folders.",
            file_id.clone(),
            &["file_id"],
        ),
        descriptor(
            "drive_create_folder",
            "Create a folder, optionally inside another folder.",
            json!({
                "folder_name": { "type": "string" },
                "parent_folder_id": { "type": "string" }
            }),
            &["folder_name"],
        ),
        descriptor(
            "drive_delete_file",
            "Permanently delete a file or folder.",
            file_id.clone(),
            &["file_id"],
        ),
        descriptor(
            "drive_copy_file",
            "Copy a file, optionally renaming it or placing it in a folder.",
            json!({
                "file_id": { "type": "string" },
                "new_name": { "type": "string" },
                "parent_folder_id": { "type": "string" }
            }),
            &["file_id"],
        ),
        descriptor(
            "drive_move_file",
            "Move a file into another folder.",
            json!({
                "file_id": { "type": "string" },
                "new_parent_id": { "type": "string", "description": "Destination folder ID" }
            }),
            &["file_id", "new_parent_id"],
        ),
        descriptor(
            "drive_share_file",
            "Share a file with one user.",
            json!({
                "file_id": { "type": "string" },
                "email": { "type": "string" },
                "role": { "type": "string", "enum": ["reader", "commenter", "writer"], "default": "reader" }
            }),
            &["file_id", "email"],
        ),
        descriptor(
            "drive_search_files",
            "Find files whose name contains the given text.",
            json!({
                "query": { "type": "string", "description": "Text to look for in file names" },
                "max_results": { "type": "integer", "default": 10 }
            }),
            &["query"],
        ),
        descriptor(
            "drive_get_folder_contents",
            "List the non-trashed files directly inside a folder.",
            json!({
                "folder_id": { "type": "string" },
                "max_results": { "type": "integer", "default": 100 }
            }),
            &["folder_id"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::client::tests::StaticToken;
    use httpmock::prelude::*;
    use std::sync::Arc;

    #[test]
    fn file_summary_defaults_size() {
        let out = file_summary(&json!({"id": "f", "name": "notes", "size": "2048"}));
        assert_eq!(out["size"], "2048");
        assert_eq!(file_summary(&json!({"id": "folder"}))["size"], "0");
        assert_eq!(file_summary(&json!({}))["webViewLink"], "");
    }

    #[test]
    fn share_rejects_unknown_role() {
        let err = DriveCall::parse(
            "drive_share_file",
            "share_file",
            json!({"file_id": "f", "email": "a@b.c", "role": "owner"}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("owner"));
    }

    #[tokio::test]
    async fn search_escapes_name_query() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/files")
                    .query_param("q", r"name contains 'Q1\'s plan'")
                    .query_param("pageSize", "10");
                then.status(200).json_body(json!({"files": []}));
            })
            .await;

        let api = DriveApi::with_base_url(
            reqwest::Client::new(),
            Arc::new(StaticToken("t")),
            &server.base_url(),
        );
        let call = DriveCall::parse(
            "drive_search_files",
            "search_files",
            json!({"query": "Q1's plan"}),
        )
        .unwrap();
        assert_eq!(call.execute(&api).await.unwrap(), json!([]));
        mock.assert_async().await;
    }
}
