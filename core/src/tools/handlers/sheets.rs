//! Google Sheets tools

use serde::Deserialize;
use serde_json::{json, Value};

use super::{done, field};
use crate::common::{GoogleResultExt, ToolError, ToolResult};
use crate::google::common::extract_array;
use crate::google::sheets::{add_sheet_request, format_cells_request, GridRange, RgbColor};
use crate::google::SheetsApi;
use crate::tools::args::{decode, lenient_i64};
use crate::tools::registry::{descriptor, ToolDescriptor};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateSpreadsheetArgs {
    pub title: String,
    #[serde(default)]
    pub sheet_names: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeArgs {
    pub spreadsheet_id: String,
    pub range_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriteValuesArgs {
    pub spreadsheet_id: String,
    pub range_name: String,
    pub values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddSheetArgs {
    pub spreadsheet_id: String,
    pub sheet_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatCellsArgs {
    pub spreadsheet_id: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub sheet_id: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub start_row: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub start_col: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub end_row: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub end_col: i64,
    #[serde(default)]
    pub bold: Option<bool>,
    #[serde(default)]
    pub background_color: Option<RgbColor>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpreadsheetArgs {
    pub spreadsheet_id: String,
}

#[derive(Debug)]
pub enum SheetsCall {
    CreateSpreadsheet(CreateSpreadsheetArgs),
    GetValues(RangeArgs),
    UpdateValues(WriteValuesArgs),
    AppendValues(WriteValuesArgs),
    ClearValues(RangeArgs),
    AddSheet(AddSheetArgs),
    FormatCells(FormatCellsArgs),
    GetSpreadsheetInfo(SpreadsheetArgs),
}

impl SheetsCall {
    pub fn parse(tool: &str, action: &str, args: Value) -> ToolResult<Self> {
        Ok(match action {
            "create_spreadsheet" => Self::CreateSpreadsheet(decode(tool, args)?),
            "get_values" => Self::GetValues(decode(tool, args)?),
            "update_values" => Self::UpdateValues(decode(tool, args)?),
            "append_values" => Self::AppendValues(decode(tool, args)?),
            "clear_values" => Self::ClearValues(decode(tool, args)?),
            "add_sheet" => Self::AddSheet(decode(tool, args)?),
            "format_cells" => {
                let args: FormatCellsArgs = decode(tool, args)?;
                if args.bold.is_none() && args.background_color.is_none() {
                    return Err(ToolError::invalid(
                        tool,
                        "at least one of `bold` or `background_color` is required",
                    ));
                }
                Self::FormatCells(args)
            }
            "get_spreadsheet_info" => Self::GetSpreadsheetInfo(decode(tool, args)?),
            _ => return Err(ToolError::UnknownTool(tool.to_string())),
        })
    }

    pub async fn execute(self, sheets: &SheetsApi) -> ToolResult<Value> {
        match self {
            Self::CreateSpreadsheet(args) => {
                let created = sheets
                    .create_spreadsheet(&args.title, &args.sheet_names)
                    .await
                    .context("Failed to create spreadsheet")?;
                Ok(json!({
                    "success": true,
                    "spreadsheet_id": field(&created, "spreadsheetId"),
                    "spreadsheet_url": field(&created, "spreadsheetUrl"),
                    "title": created
                        .get("properties")
                        .map(|p| field(p, "title"))
                        .unwrap_or_else(|| json!(args.title)),
                }))
            }
            Self::GetValues(args) => {
                let range = sheets
                    .get_values(&args.spreadsheet_id, &args.range_name)
                    .await
                    .context("Failed to get values")?;
                Ok(json!({
                    "success": true,
                    "range": field(&range, "range"),
                    "values": extract_array(&range, "values"),
                }))
            }
            Self::UpdateValues(args) => {
                let result = sheets
                    .update_values(&args.spreadsheet_id, &args.range_name, &args.values)
                    .await
                    .context("Failed to update values")?;
                Ok(write_summary(&result))
            }
            Self::AppendValues(args) => {
                let result = sheets
                    .append_values(&args.spreadsheet_id, &args.range_name, &args.values)
                    .await
                    .context("Failed to append values")?;
                let updates = result.get("updates").cloned().unwrap_or_else(|| json!({}));
                Ok(write_summary(&updates))
            }
            Self::ClearValues(args) => {
                let result = sheets
                    .clear_values(&args.spreadsheet_id, &args.range_name)
                    .await
                    .context("Failed to clear values")?;
                Ok(json!({
                    "success": true,
                    "cleared_range": field(&result, "clearedRange"),
                }))
            }
            Self::AddSheet(args) => {
                let result = sheets
                    .batch_update(&args.spreadsheet_id, vec![add_sheet_request(&args.sheet_name)])
                    .await
                    .context("Failed to add sheet")?;
                let sheet_id = result
                    .pointer("/replies/0/addSheet/properties/sheetId")
                    .cloned()
                    .unwrap_or_else(|| json!(0));
                Ok(json!({
                    "success": true,
                    "sheet_id": sheet_id,
                    "sheet_name": args.sheet_name,
                }))
            }
            Self::FormatCells(args) => {
                let range = GridRange {
                    sheet_id: args.sheet_id,
                    start_row: args.start_row,
                    start_col: args.start_col,
                    end_row: args.end_row,
                    end_col: args.end_col,
                };
                // parse() already rejected a call with no style
                let Some(request) = format_cells_request(range, args.bold, args.background_color)
                else {
                    return Err(ToolError::invalid("sheets_format_cells", "no style given"));
                };
                sheets
                    .batch_update(&args.spreadsheet_id, vec![request])
                    .await
                    .context("Failed to format cells")?;
                Ok(done("Cells formatted successfully"))
            }
            Self::GetSpreadsheetInfo(args) => {
                let info = sheets
                    .get_spreadsheet(&args.spreadsheet_id)
                    .await
                    .context("Failed to get spreadsheet info")?;
                let tabs: Vec<Value> = extract_array(&info, "sheets")
                    .iter()
                    .map(|sheet| {
                        let props = sheet.get("properties").cloned().unwrap_or_else(|| json!({}));
                        json!({
                            "title": field(&props, "title"),
                            "sheetId": props.get("sheetId").cloned().unwrap_or_else(|| json!(0)),
                            "index": props.get("index").cloned().unwrap_or_else(|| json!(0)),
                        })
                    })
                    .collect();
                Ok(json!({
                    "success": true,
                    "title": info.get("properties").map(|p| field(p, "title")).unwrap_or_else(|| json!("")),
                    "spreadsheet_id": field(&info, "spreadsheetId"),
                    "spreadsheet_url": field(&info, "spreadsheetUrl"),
                    "sheets": tabs,
                }))
            }
        }
    }
}

fn write_summary(result: &Value) -> Value {
    json!({
        "success": true,
        "updated_cells": result.get("updatedCells").cloned().unwrap_or_else(|| json!(0)),
        "updated_range": field(result, "updatedRange"),
    })
}

pub fn descriptors() -> Vec<ToolDescriptor> {
    let spreadsheet_id = json!({ "type": "string", "description": "Spreadsheet ID (from its URL)" });
    let range_name = json!({ "type": "string", "description": "A1 range, e.g. 'Sheet1!A1:C10'" });
    let values = json!({
        "type": "array",
        "description": "Rows of cell values",
        "items": { "type": "array", "items": {} }
    });
    let index = json!({ "type": "integer", "minimum": 0 });
    vec![
        descriptor(
            "sheets_create_spreadsheet",
            "Create a new spreadsheet, optionally with named tabs.",
            json!({
                "title": { "type": "string" },
                "sheet_names": { "type": "array", "items": { "type": "string" } }
            }),
            &["title"],
        ),
        descriptor(
            "sheets_get_values",
            "Read the values of a range.",
            json!({ "spreadsheet_id": spreadsheet_id.clone(), "range_name": range_name.clone() }),
            &["spreadsheet_id", "range_name"],
        ),
        descriptor(
            "sheets_update_values",
            "Overwrite a range; values are interpreted as if typed by a user.",
            json!({
                "spreadsheet_id": spreadsheet_id.clone(),
                "range_name": range_name.clone(),
                "values": values.clone()
            }),
            &["spreadsheet_id", "range_name", "values"],
        ),
        descriptor(
            "sheets_append_values",
            "Append rows after the table found at a range.",
            json!({
                "spreadsheet_id": spreadsheet_id.clone(),
                "range_name": range_name.clone(),
                "values": values
            }),
            &["spreadsheet_id", "range_name", "values"],
        ),
        descriptor(
            "sheets_clear_values",
            "Clear the values of a range, keeping formatting.",
            json!({ "spreadsheet_id": spreadsheet_id.clone(), "range_name": range_name }),
            &["spreadsheet_id", "range_name"],
        ),
        descriptor(
            "sheets_add_sheet",
            "Add a tab to a spreadsheet.",
            json!({ "spreadsheet_id": spreadsheet_id.clone(), "sheet_name": { "type": "string" } }),
            &["spreadsheet_id", "sheet_name"],
        ),
        descriptor(
            "sheets_format_cells",
            "Apply bold text and/or a background color to a cell rectangle (zero-based, end-exclusive).",
            json!({
                "spreadsheet_id": spreadsheet_id.clone(),
                "sheet_id": { "type": "integer", "description": "Numeric tab ID (see sheets_get_spreadsheet_info)" },
                "start_row": index.clone(),
                "start_col": index.clone(),
                "end_row": index.clone(),
                "end_col": index,
                "bold": { "type": "boolean" },
                "background_color": {
                    "type": "object",
                    "properties": {
                        "red": { "type": "number", "minimum": 0, "maximum": 1 },
                        "green": { "type": "number", "minimum": 0, "maximum": 1 },
                        "blue": { "type": "number", "minimum": 0, "maximum": 1 }
                    }
                }
            }),
            &["spreadsheet_id", "sheet_id", "start_row", "start_col", "end_row", "end_col"],
        ),
        descriptor(
            "sheets_get_spreadsheet_info",
            "Get a spreadsheet's title, URL and tabs.",
            json!({ "spreadsheet_id": spreadsheet_id }),
            &["spreadsheet_id"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorKind;
    use crate::google::client::tests::StaticToken;
    use httpmock::prelude::*;
    use std::sync::Arc;

    #[test]
    fn format_without_style_is_invalid() {
        let err = SheetsCall::parse(
            "sheets_format_cells",
            "format_cells",
            json!({
                "spreadsheet_id": "s", "sheet_id": 0,
                "start_row": 0, "start_col": 0, "end_row": 1, "end_col": 1
            }),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn add_sheet_reads_new_sheet_id() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/spreadsheets/S:batchUpdate");
                then.status(200).json_body(json!({
                    "replies": [{"addSheet": {"properties": {"sheetId": 99, "title": "Q3"}}}]
                }));
            })
            .await;

        let api = SheetsApi::with_base_url(
            reqwest::Client::new(),
            Arc::new(StaticToken("t")),
            &server.base_url(),
        );
        let call = SheetsCall::parse(
            "sheets_add_sheet",
            "add_sheet",
            json!({"spreadsheet_id": "S", "sheet_name": "Q3"}),
        )
        .unwrap();
        let out = call.execute(&api).await.unwrap();
        assert_eq!(out, json!({"success": true, "sheet_id": 99, "sheet_name": "Q3"}));
    }

    #[test]
    fn append_summary_reads_nested_updates() {
        let updates = json!({"updatedCells": 6, "updatedRange": "Sheet1!A5:C6"});
        assert_eq!(
            write_summary(&updates),
            json!({"success": true, "updated_cells": 6, "updated_range": "Sheet1!A5:C6"})
        );
        assert_eq!(write_summary(&json!({}))["updated_cells"], 0);
    }
}
