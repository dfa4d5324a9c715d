//! Google Sheets API v4 Client
//!
//! Provides methods for interacting with Google Sheets:
//! - Create spreadsheets and tabs
//! - Read/write/append/clear value ranges (A1 notation)
//! - Cell formatting via batchUpdate

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::client::{GoogleClient, GoogleError};
use super::common::segment;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";

/// Values written through the API are parsed as if typed into the UI.
const VALUE_INPUT_OPTION: &str = "USER_ENTERED";

/// RGB color with 0.0 - 1.0 channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RgbColor {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

/// Zero-based, end-exclusive cell rectangle on one sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridRange {
    pub sheet_id: i64,
    pub start_row: i64,
    pub start_col: i64,
    pub end_row: i64,
    pub end_col: i64,
}

pub struct SheetsApi {
    client: GoogleClient,
}

super::google_api_wrapper!(SheetsApi, SHEETS_API_BASE);

impl SheetsApi {
    /// Create a spreadsheet, optionally with named tabs
    pub async fn create_spreadsheet(
        &self,
        title: &str,
        sheet_names: &[String],
    ) -> Result<Value, GoogleError> {
        info!("Creating spreadsheet: {}", title);

        let mut body = json!({ "properties": { "title": title } });
        if !sheet_names.is_empty() {
            body["sheets"] = sheet_names
                .iter()
                .map(|name| json!({ "properties": { "title": name } }))
                .collect();
        }

        self.client.post("/spreadsheets", &[], &body).await
    }

    /// Get spreadsheet metadata (title, sheets)
    pub async fn get_spreadsheet(&self, spreadsheet_id: &str) -> Result<Value, GoogleError> {
        info!("Fetching spreadsheet: {}", spreadsheet_id);

        let path = format!("/spreadsheets/{}", segment(spreadsheet_id));
        self.client.get(&path, &[]).await
    }

    /// Get values from a range (e.g., "Sheet1!A1:D10")
    pub async fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<Value, GoogleError> {
        info!("Reading range {} from spreadsheet {}", range, spreadsheet_id);

        self.client.get(&values_path(spreadsheet_id, range, ""), &[]).await
    }

    /// Overwrite a range
    ///
    /// # Returns
    /// UpdateValuesResponse (`updatedRange`, `updatedCells`, ...)
    pub async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<Value>],
    ) -> Result<Value, GoogleError> {
        info!("Updating range {} in spreadsheet {}", range, spreadsheet_id);

        let body = json!({ "range": range, "values": values });
        self.client
            .put(
                &values_path(spreadsheet_id, range, ""),
                &[("valueInputOption", VALUE_INPUT_OPTION.to_string())],
                &body,
            )
            .await
    }

    /// Append rows after the last row of the table found at `range`
    ///
    /// # Returns
    /// AppendValuesResponse with the counts under `updates`
    pub async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<Value>],
    ) -> Result<Value, GoogleError> {
        info!("Appending to range {} in spreadsheet {}", range, spreadsheet_id);

        let body = json!({ "values": values });
        self.client
            .post(
                &values_path(spreadsheet_id, range, ":append"),
                &[("valueInputOption", VALUE_INPUT_OPTION.to_string())],
                &body,
            )
            .await
    }

    pub async fn clear_values(&self, spreadsheet_id: &str, range: &str) -> Result<Value, GoogleError> {
        info!("Clearing range {} in spreadsheet {}", range, spreadsheet_id);

        self.client
            .post(&values_path(spreadsheet_id, range, ":clear"), &[], &json!({}))
            .await
    }

    /// Apply structural/format requests in one batchUpdate call
    pub async fn batch_update(
        &self,
        spreadsheet_id: &str,
        requests: Vec<Value>,
    ) -> Result<Value, GoogleError> {
        debug!("batchUpdate with {} request(s) on {}", requests.len(), spreadsheet_id);

        let path = format!("/spreadsheets/{}:batchUpdate", segment(spreadsheet_id));
        self.client
            .post(&path, &[], &json!({ "requests": requests }))
            .await
    }
}

fn values_path(spreadsheet_id: &str, range: &str, suffix: &str) -> String {
    format!(
        "/spreadsheets/{}/values/{}{}",
        segment(spreadsheet_id),
        segment(range),
        suffix
    )
}

/// `addSheet` request for a new tab.
pub fn add_sheet_request(title: &str) -> Value {
    json!({ "addSheet": { "properties": { "title": title } } })
}

/// `repeatCell` request applying bold and/or a background color to `range`.
///
/// Returns `None` when neither style is requested.
pub fn format_cells_request(
    range: GridRange,
    bold: Option<bool>,
    background: Option<RgbColor>,
) -> Option<Value> {
    if bold.is_none() && background.is_none() {
        return None;
    }

    let mut format = json!({});
    let mut fields = Vec::new();
    if let Some(bold) = bold {
        format["textFormat"] = json!({ "bold": bold });
        fields.push("textFormat");
    }
    if let Some(color) = background {
        format["backgroundColor"] = json!(color);
        fields.push("backgroundColor");
    }

    Some(json!({
        "repeatCell": {
            "range": {
                "sheetId": range.sheet_id,
                "startRowIndex": range.start_row,
                "endRowIndex": range.end_row,
                "startColumnIndex": range.start_col,
                "endColumnIndex": range.end_col,
            },
            "cell": { "userEnteredFormat": format },
            "fields": format!("userEnteredFormat({})", fields.join(",")),
        }
    }))
}
