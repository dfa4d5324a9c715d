//! Google Docs API v1 Client
//!
//! Every edit goes through `documents.batchUpdate`; the request builders are
//! kept as pure functions next to the text extraction helper.

use serde_json::{json, Value};
use tracing::{debug, info};

use super::client::{GoogleClient, GoogleError};
use super::common::{extract_array, segment};

const DOCS_API_BASE: &str = "https://docs.googleapis.com/v1";

pub const BULLET_PRESET: &str = "BULLET_DISC_CIRCLE_SQUARE";

pub fn document_url(document_id: &str) -> String {
    format!("https://docs.google.com/document/d/{}/edit", document_id)
}

/// Character styling for a range; unset fields are left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextStyle {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub font_size: Option<f64>,
}

pub struct DocsApi {
    client: GoogleClient,
}

super::google_api_wrapper!(DocsApi, DOCS_API_BASE);

impl DocsApi {
    pub async fn create_document(&self, title: &str) -> Result<Value, GoogleError> {
        info!("Creating document: {}", title);
        self.client
            .post("/documents", &[], &json!({ "title": title }))
            .await
    }

    pub async fn get_document(&self, document_id: &str) -> Result<Value, GoogleError> {
        info!("Fetching document: {}", document_id);
        self.client
            .get(&format!("/documents/{}", segment(document_id)), &[])
            .await
    }

    pub async fn batch_update(
        &self,
        document_id: &str,
        requests: Vec<Value>,
    ) -> Result<Value, GoogleError> {
        debug!("batchUpdate with {} request(s) on {}", requests.len(), document_id);

        let path = format!("/documents/{}:batchUpdate", segment(document_id));
        self.client
            .post(&path, &[], &json!({ "requests": requests }))
            .await
    }

    /// Append at the end of the body: one read for the end index, one write.
    pub async fn append_text(&self, document_id: &str, text: &str) -> Result<Value, GoogleError> {
        info!("Appending text to document: {}", document_id);

        let document = self.get_document(document_id).await?;
        let index = append_index(&document);
        self.batch_update(document_id, vec![insert_text_request(text, index)])
            .await
    }
}

pub fn insert_text_request(text: &str, index: i64) -> Value {
    json!({ "insertText": { "location": { "index": index }, "text": text } })
}

pub fn replace_all_text_request(old_text: &str, new_text: &str, match_case: bool) -> Value {
    json!({
        "replaceAllText": {
            "containsText": { "text": old_text, "matchCase": match_case },
            "replaceText": new_text,
        }
    })
}

pub fn delete_range_request(start_index: i64, end_index: i64) -> Value {
    json!({
        "deleteContentRange": {
            "range": { "startIndex": start_index, "endIndex": end_index }
        }
    })
}

/// `updateTextStyle` request, or `None` when no style field is set.
pub fn text_style_request(start_index: i64, end_index: i64, style: TextStyle) -> Option<Value> {
    let mut text_style = json!({});
    let mut fields = Vec::new();

    for (name, value) in [
        ("bold", style.bold),
        ("italic", style.italic),
        ("underline", style.underline),
    ] {
        if let Some(on) = value {
            text_style[name] = json!(on);
            fields.push(name);
        }
    }
    if let Some(size) = style.font_size {
        text_style["fontSize"] = json!({ "magnitude": size, "unit": "PT" });
        fields.push("fontSize");
    }

    if fields.is_empty() {
        return None;
    }

    Some(json!({
        "updateTextStyle": {
            "range": { "startIndex": start_index, "endIndex": end_index },
            "textStyle": text_style,
            "fields": fields.join(","),
        }
    }))
}

pub fn bullets_request(start_index: i64, end_index: i64) -> Value {
    json!({
        "createParagraphBullets": {
            "range": { "startIndex": start_index, "endIndex": end_index },
            "bulletPreset": BULLET_PRESET,
        }
    })
}

/// Index just before the body's trailing newline, never below 1.
pub fn append_index(document: &Value) -> i64 {
    let end = document
        .get("body")
        .map(|b| extract_array(b, "content"))
        .and_then(|content| content.last().and_then(|el| el.get("endIndex")).and_then(Value::as_i64))
        .unwrap_or(1);
    (end - 1).max(1)
}

/// Plain text of a document: every text run in body order, descending into
/// tables (row by row, cell by cell) and tables of contents.
pub fn extract_document_text(document: &Value) -> String {
    let mut out = String::new();
    if let Some(body) = document.get("body") {
        collect_elements(&extract_array(body, "content"), &mut out);
    }
    out
}

fn collect_elements(elements: &[Value], out: &mut String) {
    for element in elements {
        if let Some(paragraph) = element.get("paragraph") {
            for run in extract_array(paragraph, "elements") {
                if let Some(text) = run
                    .get("textRun")
                    .and_then(|r| r.get("content"))
                    .and_then(Value::as_str)
                {
                    out.push_str(text);
                }
            }
        } else if let Some(table) = element.get("table") {
            for row in extract_array(table, "tableRows") {
                for cell in extract_array(&row, "tableCells") {
                    collect_elements(&extract_array(&cell, "content"), out);
                }
            }
        } else if let Some(toc) = element.get("tableOfContents") {
            collect_elements(&extract_array(toc, "content"), out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::client::tests::StaticToken;
    use httpmock::prelude::*;
    use std::sync::Arc;

    fn paragraph(text: &str) -> Value {
        json!({"paragraph": {"elements": [{"textRun": {"content": text}}]}})
    }

    #[test]
    fn test_extract_text_in_order_through_tables() {
        let doc = json!({"body": {"content": [
            {"sectionBreak": {}},
            paragraph("Title\n"),
            {"table": {"tableRows": [
                {"tableCells": [
                    {"content": [paragraph("a1")]},
                    {"content": [paragraph("b1")]}
                ]}
            ]}},
            {"tableOfContents": {"content": [paragraph("toc\n")]}},
            {"paragraph": {"elements": [
                {"textRun": {"content": "end "}},
                {"inlineObjectElement": {}},
                {"textRun": {"content": "line\n"}}
            ]}}
        ]}});
        assert_eq!(extract_document_text(&doc), "Title\na1b1toc\nend line\n");
    }

    #[test]
    fn test_extract_text_of_empty_document() {
        assert_eq!(extract_document_text(&json!({"title": "x"})), "");
    }

    #[test]
    fn test_append_index() {
        let doc = json!({"body": {"content": [{"endIndex": 1}, {"endIndex": 42}]}});
        assert_eq!(append_index(&doc), 41);
        assert_eq!(append_index(&json!({"body": {"content": [{"endIndex": 1}]}})), 1);
        assert_eq!(append_index(&json!({})), 1);
    }

    #[test]
    fn test_text_style_request() {
        assert!(text_style_request(1, 5, TextStyle::default()).is_none());

        let style = TextStyle {
            bold: Some(true),
            font_size: Some(14.0),
            ..Default::default()
        };
        let req = text_style_request(1, 5, style).unwrap();
        assert_eq!(req["updateTextStyle"]["fields"], "bold,fontSize");
        assert_eq!(
            req["updateTextStyle"]["textStyle"]["fontSize"],
            json!({"magnitude": 14.0, "unit": "PT"})
        );
    }

    #[tokio::test]
    async fn test_append_reads_end_index_then_inserts() {
        let server = MockServer::start_async().await;
        let read = server
            .mock_async(|when, then| {
                when.method(GET).path("/documents/d1");
                then.status(200)
                    .json_body(json!({"body": {"content": [{"endIndex": 1}, {"endIndex": 12}]}}));
            })
            .await;
        let write = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/documents/d1:batchUpdate")
                    .json_body(json!({"requests": [
                        {"insertText": {"location": {"index": 11}, "text": "more"}}
                    ]}));
                then.status(200).json_body(json!({"replies": [{}]}));
            })
            .await;

        let api = DocsApi::with_base_url(
            reqwest::Client::new(),
            Arc::new(StaticToken("t")),
            &server.base_url(),
        );
        api.append_text("d1", "more").await.unwrap();
        read.assert_async().await;
        write.assert_async().await;
    }
}
