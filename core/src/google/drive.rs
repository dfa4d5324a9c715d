//! Google Drive API v3 Client
//!
//! Provides methods for interacting with Google Drive:
//! - List/search files and folder contents
//! - Folder creation, copy, move, trash-free delete
//! - Sharing with a single user

use serde_json::{json, Value};
use tracing::{debug, info};

use super::client::{GoogleClient, GoogleError};
use super::common::{extract_array, segment};

const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Field mask for list operations.
const LIST_FIELDS: &str = "files(id, name, mimeType, createdTime, modifiedTime, size, webViewLink)";
/// Field mask for single-file reads.
const FILE_FIELDS: &str = "id, name, mimeType, createdTime, modifiedTime, size, webViewLink, parents";

pub struct DriveApi {
    client: GoogleClient,
}

super::google_api_wrapper!(DriveApi, DRIVE_API_BASE);

impl DriveApi {
    /// List files (first page)
    ///
    /// # Arguments
    /// * `query` - Drive search query (e.g., "mimeType='application/pdf'")
    /// * `order_by` - Sort order (e.g., "modifiedTime desc")
    /// * `page_size` - Maximum number of files to return
    pub async fn list_files(
        &self,
        query: Option<&str>,
        order_by: Option<&str>,
        page_size: u32,
    ) -> Result<Vec<Value>, GoogleError> {
        info!("Listing Drive files");

        let mut params = vec![
            ("pageSize", page_size.to_string()),
            ("fields", LIST_FIELDS.to_string()),
        ];
        if let Some(q) = query {
            params.push(("q", q.to_string()));
        }
        if let Some(order) = order_by {
            params.push(("orderBy", order.to_string()));
        }

        let response = self.client.get("/files", &params).await?;
        let files = extract_array(&response, "files");

        debug!("Retrieved {} files", files.len());
        Ok(files)
    }

    /// Get file metadata including parents
    pub async fn get_file(&self, file_id: &str) -> Result<Value, GoogleError> {
        info!("Fetching Drive file: {}", file_id);

        let path = format!("/files/{}", segment(file_id));
        self.client
            .get(&path, &[("fields", FILE_FIELDS.to_string())])
            .await
    }

    pub async fn create_folder(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<Value, GoogleError> {
        info!("Creating Drive folder: {}", name);

        let mut body = json!({ "name": name, "mimeType": FOLDER_MIME_TYPE });
        if let Some(parent) = parent_id {
            body["parents"] = json!([parent]);
        }

        self.client
            .post("/files", &[("fields", "id, name, webViewLink".to_string())], &body)
            .await
    }

    /// Permanently delete a file (bypasses the trash)
    pub async fn delete_file(&self, file_id: &str) -> Result<Value, GoogleError> {
        info!("Deleting Drive file: {}", file_id);
        self.client.delete(&format!("/files/{}", segment(file_id))).await
    }

    pub async fn copy_file(
        &self,
        file_id: &str,
        new_name: Option<&str>,
        parent_id: Option<&str>,
    ) -> Result<Value, GoogleError> {
        info!("Copying Drive file: {}", file_id);

        let mut body = json!({});
        if let Some(name) = new_name {
            body["name"] = json!(name);
        }
        if let Some(parent) = parent_id {
            body["parents"] = json!([parent]);
        }

        let path = format!("/files/{}/copy", segment(file_id));
        self.client
            .post(&path, &[("fields", "id, name, webViewLink".to_string())], &body)
            .await
    }

    /// Move a file under `new_parent_id`, detaching it from all current parents.
    ///
    /// One read of the current parents followed by one update.
    pub async fn move_file(&self, file_id: &str, new_parent_id: &str) -> Result<Value, GoogleError> {
        info!("Moving Drive file {} to {}", file_id, new_parent_id);

        let path = format!("/files/{}", segment(file_id));
        let current = self
            .client
            .get(&path, &[("fields", "parents".to_string())])
            .await?;
        let previous = extract_array(&current, "parents")
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(",");

        let params = [
            ("addParents", new_parent_id.to_string()),
            ("removeParents", previous),
            ("fields", "id, name, parents".to_string()),
        ];
        self.client.patch(&path, &params, &json!({})).await
    }

    /// Grant `role` ("reader", "writer", "commenter") to a single user
    pub async fn share_with_user(
        &self,
        file_id: &str,
        email: &str,
        role: &str,
    ) -> Result<Value, GoogleError> {
        info!("Sharing Drive file {} with {} as {}", file_id, email, role);

        let body = json!({
            "type": "user",
            "role": role,
            "emailAddress": email,
        });
        let path = format!("/files/{}/permissions", segment(file_id));
        self.client.post(&path, &[], &body).await
    }
}

/// `name contains '<text>'` with quotes and backslashes escaped.
pub fn name_contains_query(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('\'', "\\'");
    format!("name contains '{}'", escaped)
}

/// Non-trashed direct children of a folder.
pub fn folder_children_query(folder_id: &str) -> String {
    let escaped = folder_id.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}' in parents and trashed=false", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::client::tests::StaticToken;
    use httpmock::prelude::*;
    use std::sync::Arc;

    fn api(server: &MockServer) -> DriveApi {
        DriveApi::with_base_url(
            reqwest::Client::new(),
            Arc::new(StaticToken("t")),
            &server.base_url(),
        )
    }

    #[test]
    fn test_name_query_escaping() {
        assert_eq!(name_contains_query("report"), "name contains 'report'");
        assert_eq!(name_contains_query("Bob's"), r"name contains 'Bob\'s'");
        assert_eq!(name_contains_query(r"a\b"), r"name contains 'a\\b'");
    }

    #[test]
    fn test_folder_children_query() {
        assert_eq!(
            folder_children_query("F1"),
            "'F1' in parents and trashed=false"
        );
    }

    #[tokio::test]
    async fn test_move_reads_parents_then_patches_once() {
        let server = MockServer::start_async().await;
        let read = server
            .mock_async(|when, then| {
                when.method(GET).path("/files/f1").query_param("fields", "parents");
                then.status(200).json_body(json!({"parents": ["p1", "p2"]}));
            })
            .await;
        let update = server
            .mock_async(|when, then| {
                when.method(httpmock::Method::PATCH)
                    .path("/files/f1")
                    .query_param("addParents", "dest")
                    .query_param("removeParents", "p1,p2");
                then.status(200)
                    .json_body(json!({"id": "f1", "name": "doc", "parents": ["dest"]}));
            })
            .await;

        let moved = api(&server).move_file("f1", "dest").await.unwrap();
        read.assert_async().await;
        update.assert_async().await;
        assert_eq!(moved["parents"], json!(["dest"]));
    }

    #[tokio::test]
    async fn test_share_posts_user_permission() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/files/f1/permissions").json_body(json!({
                    "type": "user", "role": "writer", "emailAddress": "bob@example.com"
                }));
                then.status(200).json_body(json!({"id": "perm"}));
            })
            .await;

        api(&server)
            .share_with_user("f1", "bob@example.com", "writer")
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_files_sends_field_mask() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/files")
                    .query_param("pageSize", "5")
                    .query_param("fields", LIST_FIELDS)
                    .query_param("orderBy", "modifiedTime desc");
                then.status(200).json_body(json!({"files": [{"id": "a"}]}));
            })
            .await;

        let files = api(&server)
            .list_files(None, Some("modifiedTime desc"), 5)
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(files.len(), 1);
    }
}
