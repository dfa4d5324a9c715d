//! Google Docs tools

use serde::Deserialize;
use serde_json::{json, Value};

use super::{done, field};
use crate::common::{GoogleResultExt, ToolError, ToolResult};
use crate::google::docs::{
    bullets_request, delete_range_request, document_url, extract_document_text,
    insert_text_request, replace_all_text_request, text_style_request, TextStyle,
};
use crate::google::DocsApi;
use crate::tools::args::{decode, lenient_i64};
use crate::tools::registry::{descriptor, ToolDescriptor};

fn one() -> i64 {
    1
}

fn yes() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateDocumentArgs {
    pub title: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentIdArgs {
    pub document_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InsertTextArgs {
    pub document_id: String,
    pub text: String,
    #[serde(default = "one", deserialize_with = "lenient_i64")]
    pub index: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppendTextArgs {
    pub document_id: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplaceTextArgs {
    pub document_id: String,
    pub old_text: String,
    pub new_text: String,
    #[serde(default = "yes")]
    pub match_case: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeArgs {
    pub document_id: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub start_index: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub end_index: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatTextArgs {
    pub document_id: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub start_index: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub end_index: i64,
    #[serde(default)]
    pub bold: Option<bool>,
    #[serde(default)]
    pub italic: Option<bool>,
    #[serde(default)]
    pub underline: Option<bool>,
    #[serde(default)]
    pub font_size: Option<f64>,
}

#[derive(Debug)]
pub enum DocsCall {
    CreateDocument(CreateDocumentArgs),
    GetDocument(DocumentIdArgs),
    InsertText(InsertTextArgs),
    AppendText(AppendTextArgs),
    ReplaceText(ReplaceTextArgs),
    DeleteContentRange(RangeArgs),
    FormatText { document_id: String, request: Value },
    CreateParagraphBullets(RangeArgs),
}

impl DocsCall {
    pub fn parse(tool: &str, action: &str, args: Value) -> ToolResult<Self> {
        Ok(match action {
            "create_document" => Self::CreateDocument(decode(tool, args)?),
            "get_document" => Self::GetDocument(decode(tool, args)?),
            "insert_text" => Self::InsertText(decode(tool, args)?),
            "append_text" => Self::AppendText(decode(tool, args)?),
            "replace_text" => Self::ReplaceText(decode(tool, args)?),
            "delete_content_range" => Self::DeleteContentRange(checked(tool, decode(tool, args)?)?),
            "format_text" => {
                let args: FormatTextArgs = decode(tool, args)?;
                check_range(tool, args.start_index, args.end_index)?;
                let style = TextStyle {
                    bold: args.bold,
                    italic: args.italic,
                    underline: args.underline,
                    font_size: args.font_size,
                };
                let request = text_style_request(args.start_index, args.end_index, style)
                    .ok_or_else(|| {
                        ToolError::invalid(
                            tool,
                            "at least one of `bold`, `italic`, `underline` or `font_size` is required",
                        )
                    })?;
                Self::FormatText {
                    document_id: args.document_id,
                    request,
                }
            }
            "create_paragraph_bullets" => {
                Self::CreateParagraphBullets(checked(tool, decode(tool, args)?)?)
            }
            _ => return Err(ToolError::UnknownTool(tool.to_string())),
        })
    }

    pub async fn execute(self, docs: &DocsApi) -> ToolResult<Value> {
        match self {
            Self::CreateDocument(args) => {
                let document = docs
                    .create_document(&args.title)
                    .await
                    .context("Failed to create document")?;
                let id = document
                    .get("documentId")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Ok(json!({
                    "success": true,
                    "document_id": id,
                    "title": field(&document, "title"),
                    "document_url": document_url(&id),
                }))
            }
            Self::GetDocument(args) => {
                let document = docs
                    .get_document(&args.document_id)
                    .await
                    .context("Failed to get document")?;
                Ok(json!({
                    "success": true,
                    "document_id": args.document_id,
                    "title": field(&document, "title"),
                    "content": extract_document_text(&document),
                    "document_url": document_url(&args.document_id),
                }))
            }
            Self::InsertText(args) => {
                docs.batch_update(&args.document_id, vec![insert_text_request(&args.text, args.index)])
                    .await
                    .context("Failed to insert text")?;
                Ok(done("Text inserted successfully"))
            }
            Self::AppendText(args) => {
                docs.append_text(&args.document_id, &args.text)
                    .await
                    .context("Failed to append text")?;
                Ok(done("Text appended successfully"))
            }
            Self::ReplaceText(args) => {
                let result = docs
                    .batch_update(
                        &args.document_id,
                        vec![replace_all_text_request(&args.old_text, &args.new_text, args.match_case)],
                    )
                    .await
                    .context("Failed to replace text")?;
                let changed = result
                    .pointer("/replies/0/replaceAllText/occurrencesChanged")
                    .and_then(Value::as_i64)
                    .unwrap_or(0);
                Ok(json!({
                    "success": true,
                    "message": format!("Replaced {} occurrence(s)", changed),
                    "occurrences_changed": changed,
                }))
            }
            Self::DeleteContentRange(args) => {
                docs.batch_update(
                    &args.document_id,
                    vec![delete_range_request(args.start_index, args.end_index)],
                )
                .await
                .context("Failed to delete content")?;
                Ok(done("Content deleted successfully"))
            }
            Self::FormatText {
                document_id,
                request,
            } => {
                docs.batch_update(&document_id, vec![request])
                    .await
                    .context("Failed to format text")?;
                Ok(done("Text formatted successfully"))
            }
            Self::CreateParagraphBullets(args) => {
                docs.batch_update(
                    &args.document_id,
                    vec![bullets_request(args.start_index, args.end_index)],
                )
                .await
                .context("Failed to create bullets")?;
                Ok(done("Bullets created successfully"))
            }
        }
    }
}

fn checked(tool: &str, args: RangeArgs) -> ToolResult<RangeArgs> {
    check_range(tool, args.start_index, args.end_index)?;
    Ok(args)
}

fn check_range(tool: &str, start_index: i64, end_index: i64) -> ToolResult<()> {
    if start_index < 1 || end_index <= start_index {
        return Err(ToolError::invalid(
            tool,
            format!(
                "invalid range {}..{}: start_index must be >= 1 and below end_index",
                start_index, end_index
            ),
        ));
    }
    Ok(())
}

pub fn descriptors() -> Vec<ToolDescriptor> {
    let document_id = json!({ "type": "string", "description": "Document ID (from its URL)" });
    let position = json!({ "type": "integer", "minimum": 1 });
    let range = json!({
        "document_id": document_id.clone(),
        "start_index": position.clone(),
        "end_index": position.clone()
    });
    vec![
        descriptor(
            "docs_create_document",
            "Create an empty Google Doc.",
            json!({ "title": { "type": "string" } }),
            &["title"],
        ),
        descriptor(
            "docs_get_document",
            "Get a document's title and plain-text content.",
            json!({ "document_id": document_id.clone() }),
            &["document_id"],
        ),
        descriptor(
            "docs_insert_text",
            "Insert text at an index (1 is the start of the body).",
            json!({
                "document_id": document_id.clone(),
                "text": { "type": "string" },
                "index": { "type": "integer", "minimum": 1, "default": 1 }
            }),
            &["document_id", "text"],
        ),
        descriptor(
            "docs_append_text",
            "Append text to the end of a document.",
            json!({ "document_id": document_id.clone(), "text": { "type": "string" } }),
            &["document_id", "text"],
        ),
        descriptor(
            "docs_replace_text",
            "Replace every occurrence of a string.",
            json!({
                "document_id": document_id.clone(),
                "old_text": { "type": "string" },
                "new_text": { "type": "string" },
                "match_case": { "type": "boolean", "default": true }
            }),
            &["document_id", "old_text", "new_text"],
        ),
        descriptor(
            "docs_delete_content_range",
            "Delete the content between two indexes.",
            range.clone(),
            &["document_id", "start_index", "end_index"],
        ),
        descriptor(
            "docs_format_text",
            "Apply bold, italic, underline and/or a font size to a range.",
            json!({
                "document_id": document_id,
                "start_index": position.clone(),
                "end_index": position,
                "bold": { "type": "boolean" },
                "italic": { "type": "boolean" },
                "underline": { "type": "boolean" },
                "font_size": { "type": "number", "description": "Points" }
            }),
            &["document_id", "start_index", "end_index"],
        ),
        descriptor(
            "docs_create_paragraph_bullets",
            "Turn the paragraphs in a range into a bulleted list.",
            range,
            &["document_id", "start_index", "end_index"],
        ),
    ]
}
