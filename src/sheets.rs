use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::google::GoogleAuth;
use crate::table::Row;

const API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
/// The whole grid of the first sheet; rows are unbounded.
const FULL_RANGE: &str = "A1:ZZ";

#[derive(Serialize)]
struct ValueRange {
    range: String,
    #[serde(rename = "majorDimension")]
    major_dimension: String,
    values: Vec<Row>,
}

#[derive(Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    auth: Arc<GoogleAuth>,
}

fn cell_to_string(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl SheetsClient {
    pub fn new(http: reqwest::Client, auth: Arc<GoogleAuth>) -> Self {
        Self { http, auth }
    }

    /// All rows of the spreadsheet's grid, in order. Trailing unset cells are
    /// simply absent, so rows may be ragged.
    pub async fn fetch_rows(&self, spreadsheet_id: &str) -> Result<Vec<Row>> {
        let token = self.auth.bearer_token().await?;
        let url = format!("{}/{}/values/{}", API_BASE, spreadsheet_id, FULL_RANGE);
        let body: Value = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .context("spreadsheet service unreachable")?
            .error_for_status()
            .context("spreadsheet read rejected")?
            .json()
            .await
            .context("malformed spreadsheet response")?;

        let rows = body
            .get("values")
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .map(|row| {
                        row.as_array()
                            .map(|cells| cells.iter().map(cell_to_string).collect())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(rows)
    }

    /// The grid minus its header row. Row 0 is a header by contract and is
    /// discarded; an empty sheet yields an empty table.
    pub async fn fetch_table(&self, spreadsheet_id: &str) -> Result<Vec<Row>> {
        let mut rows = self.fetch_rows(spreadsheet_id).await?;
        if !rows.is_empty() {
            rows.remove(0);
        }
        Ok(rows)
    }

    /// Replace the sheet's contents with the given rows: clear the grid, then
    /// write from A1. This is an overwrite, not a merge; anything edited
    /// remotely since the last fetch is lost.
    pub async fn overwrite(&self, spreadsheet_id: &str, rows: &[Row]) -> Result<()> {
        let token = self.auth.bearer_token().await?;

        let clear_url = format!(
            "{}/{}/values/{}:clear",
            API_BASE, spreadsheet_id, FULL_RANGE
        );
        self.http
            .post(&clear_url)
            .bearer_auth(&token)
            .json(&serde_json::json!({}))
            .send()
            .await
            .context("spreadsheet service unreachable")?
            .error_for_status()
            .context("spreadsheet clear rejected")?;

        let update_url = format!(
            "{}/{}/values/A1?valueInputOption=RAW",
            API_BASE, spreadsheet_id
        );
        let body = ValueRange {
            range: "A1".to_string(),
            major_dimension: "ROWS".to_string(),
            values: rows.to_vec(),
        };
        self.http
            .put(&update_url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .context("spreadsheet service unreachable")?
            .error_for_status()
            .context("spreadsheet write rejected")?;

        info!(
            "overwrote spreadsheet {} with {} rows",
            spreadsheet_id,
            rows.len()
        );
        Ok(())
    }
}
