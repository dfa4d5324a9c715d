//! Gmail API v1 Client
//!
//! Provides methods for interacting with Gmail API:
//! - List/search messages
//! - Get message details
//! - Send plain-text emails
//! - Read/unread labels and trash
//!
//! Also hosts the pure MIME helpers used to turn a message payload back into text.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::client::{GoogleClient, GoogleError};
use super::common::{extract_array, segment};

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// URL-safe alphabet, no padding on encode, either form accepted on decode.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

pub struct GmailApi {
    client: GoogleClient,
}

super::google_api_wrapper!(GmailApi, GMAIL_API_BASE);

impl GmailApi {
    /// List message stubs matching a query
    ///
    /// # Arguments
    /// * `query` - Gmail search query (same syntax as web UI)
    /// * `label_ids` - Filter by label IDs (e.g., ["INBOX", "UNREAD"])
    /// * `max_results` - Page size; only the first page is fetched
    ///
    /// # Returns
    /// Array of `{id, threadId}` objects
    pub async fn list_messages(
        &self,
        query: Option<&str>,
        label_ids: &[String],
        max_results: u32,
    ) -> Result<Vec<Value>, GoogleError> {
        info!("Listing Gmail messages");

        let mut params = vec![("maxResults", max_results.to_string())];
        if let Some(q) = query {
            params.push(("q", q.to_string()));
        }
        for label in label_ids {
            params.push(("labelIds", label.clone()));
        }

        let response = self.client.get("/users/me/messages", &params).await?;
        let messages = extract_array(&response, "messages");

        debug!("Retrieved {} message ids", messages.len());
        Ok(messages)
    }

    /// Get a message by ID in `full` format (headers and MIME tree)
    pub async fn get_message(&self, id: &str) -> Result<Value, GoogleError> {
        info!("Fetching Gmail message: {}", id);

        let path = format!("/users/me/messages/{}", segment(id));
        self.client
            .get(&path, &[("format", "full".to_string())])
            .await
    }

    /// Send a plain-text email
    ///
    /// # Returns
    /// Sent message object with id and threadId
    pub async fn send_message(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        cc: Option<&str>,
        bcc: Option<&str>,
    ) -> Result<Value, GoogleError> {
        info!("Sending Gmail message to: {}", to);

        let raw = build_raw_message(to, subject, body, cc, bcc);
        let response = self
            .client
            .post("/users/me/messages/send", &[], &json!({ "raw": raw }))
            .await?;

        info!("Message sent successfully");
        Ok(response)
    }

    /// Modify message labels (add/remove labels from a message)
    pub async fn modify_labels(
        &self,
        message_id: &str,
        add_label_ids: &[&str],
        remove_label_ids: &[&str],
    ) -> Result<Value, GoogleError> {
        info!("Modifying labels for message: {}", message_id);

        let mut body = json!({});
        if !add_label_ids.is_empty() {
            body["addLabelIds"] = json!(add_label_ids);
        }
        if !remove_label_ids.is_empty() {
            body["removeLabelIds"] = json!(remove_label_ids);
        }

        let path = format!("/users/me/messages/{}/modify", segment(message_id));
        self.client.post(&path, &[], &body).await
    }

    /// Move a message to the trash
    pub async fn trash_message(&self, message_id: &str) -> Result<Value, GoogleError> {
        info!("Trashing message: {}", message_id);

        let path = format!("/users/me/messages/{}/trash", segment(message_id));
        self.client.post(&path, &[], &json!({})).await
    }
}

/// Build an RFC 2822 plain-text message and base64url-encode it (no padding),
/// ready for the `raw` field of `messages.send`.
pub fn build_raw_message(
    to: &str,
    subject: &str,
    body: &str,
    cc: Option<&str>,
    bcc: Option<&str>,
) -> String {
    let mut lines = vec![format!("To: {}", to)];
    if let Some(cc) = cc.filter(|c| !c.is_empty()) {
        lines.push(format!("Cc: {}", cc));
    }
    if let Some(bcc) = bcc.filter(|b| !b.is_empty()) {
        lines.push(format!("Bcc: {}", bcc));
    }
    lines.push(format!("Subject: {}", encode_header(subject)));
    lines.push("MIME-Version: 1.0".to_string());
    lines.push("Content-Type: text/plain; charset=\"utf-8\"".to_string());
    lines.push("Content-Transfer-Encoding: 8bit".to_string());
    lines.push(String::new());
    lines.push(body.to_string());

    URL_SAFE_LENIENT.encode(lines.join("\r\n").as_bytes())
}

/// RFC 2047 encoded-word for non-ASCII header values.
fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?utf-8?B?{}?=", STANDARD.encode(value.as_bytes()))
    }
}

/// Plain-text body of a message payload.
///
/// Looks for a `text/plain` part among the direct children first and only
/// descends into nested multiparts when none is found at the current level.
/// A payload without parts yields its own body data.
pub fn extract_plain_text_body(payload: &Value) -> String {
    let Some(parts) = payload.get("parts").and_then(Value::as_array) else {
        return part_text(payload).unwrap_or_default();
    };

    if let Some(text) = parts
        .iter()
        .filter(|p| p.get("mimeType").and_then(Value::as_str) == Some("text/plain"))
        .find_map(part_text)
    {
        return text;
    }

    parts
        .iter()
        .filter(|p| p.get("parts").is_some())
        .map(extract_plain_text_body)
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

fn part_text(part: &Value) -> Option<String> {
    let data = part.get("body")?.get("data")?.as_str()?;
    let bytes = URL_SAFE_LENIENT.decode(data.trim()).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Pick the `From`/`To`/`Subject`/`Date` headers (case-insensitive) into a
/// lowercase-keyed object. Absent headers are omitted.
pub fn summary_headers(payload: &Value) -> Value {
    let mut out = serde_json::Map::new();
    for header in extract_array(payload, "headers") {
        let name = header
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_ascii_lowercase();
        if matches!(name.as_str(), "from" | "to" | "subject" | "date") {
            let value = header.get("value").cloned().unwrap_or(json!(""));
            out.entry(name).or_insert(value);
        }
    }
    Value::Object(out)
}
