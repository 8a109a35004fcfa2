//! Implements the `Sheet` trait against the Google Sheets API.
//!
//! Reads and clears go through the `sheets::Client`. Writes, notes and structural changes need
//! typed JSON cell values and `batchUpdate` requests, so those are sent with `reqwest` directly.

use crate::address::GridCell;
use crate::api::{Sheet, TokenProvider};
use crate::cell::Row;
use crate::error::Res;
use anyhow::{bail, Context};
use reqwest::{Method, RequestBuilder};
use serde_json::{json, Value};
use sheets::types::{BatchClearValuesRequest, DateTimeRenderOption, Dimension, ValueRenderOption};
use sheets::ClientError;
use tracing::trace;
use url::Url;

const SPREADSHEETS_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Implements the `Sheet` trait for Google Sheets. It takes a `TokenProvider`, on which it calls
/// refresh before each request to keep the token up-to-date.
pub(super) struct GoogleSheet {
    token_provider: TokenProvider,
    client: sheets::Client,
    http: reqwest::Client,
}

impl GoogleSheet {
    pub(super) async fn new(mut token_provider: TokenProvider) -> Res<Self> {
        let client = create_sheets_client(&mut token_provider).await?;
        Ok(Self {
            token_provider,
            client,
            http: reqwest::Client::new(),
        })
    }

    /// Refreshes the sheets client with a new access token if needed
    async fn refresh_client(&mut self) -> Res<()> {
        self.client = create_sheets_client(&mut self.token_provider).await?;
        Ok(())
    }

    /// Starts a request carrying the access token, refreshed first if it is about to expire.
    async fn authorized(&mut self, method: Method, url: Url) -> Res<RequestBuilder> {
        let token = self.token_provider.token_with_refresh().await?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    /// Sends a JSON request to the Sheets REST API and returns the JSON response.
    async fn call(&mut self, method: Method, url: Url, body: Option<Value>) -> Res<Value> {
        trace!("{method} {url}");
        let mut request = self.authorized(method, url).await?;
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request
            .send()
            .await
            .context("Failed to send request to the Google Sheets API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            bail!("Google Sheets API request failed with status {status}: {body}");
        }

        response
            .json()
            .await
            .context("Failed to parse Google Sheets API response")
    }

    async fn batch_update(&mut self, spreadsheet_id: &str, request: Value) -> Res<Value> {
        let url = endpoint(&[format!("{spreadsheet_id}:batchUpdate").as_str()], &[])?;
        self.call(Method::POST, url, Some(json!({ "requests": [request] })))
            .await
    }
}

#[async_trait::async_trait]
impl Sheet for GoogleSheet {
    async fn create_spreadsheet(&mut self, title: &str) -> Res<String> {
        let url = endpoint(&[], &[])?;
        let body = json!({ "properties": { "title": title } });
        let response = self
            .call(Method::POST, url, Some(body))
            .await
            .with_context(|| format!("Failed to create spreadsheet '{title}'"))?;
        let id = response
            .get("spreadsheetId")
            .and_then(Value::as_str)
            .context("Google Sheets API response missing 'spreadsheetId' field")?;
        Ok(id.to_string())
    }

    async fn add_sheet(&mut self, spreadsheet_id: &str, title: &str) -> Res<()> {
        let request = json!({ "addSheet": { "properties": { "title": title } } });
        self.batch_update(spreadsheet_id, request)
            .await
            .with_context(|| format!("Failed to add sheet '{title}'"))?;
        Ok(())
    }

    async fn delete_sheet(&mut self, spreadsheet_id: &str, sheet_id: i64) -> Res<()> {
        let request = json!({ "deleteSheet": { "sheetId": sheet_id } });
        self.batch_update(spreadsheet_id, request)
            .await
            .with_context(|| format!("Failed to delete sheet {sheet_id}"))?;
        Ok(())
    }

    async fn sheet_id(&mut self, spreadsheet_id: &str, title: Option<&str>) -> Res<i64> {
        let url = endpoint(
            &[spreadsheet_id],
            &[("fields", "sheets.properties(sheetId,title,index)")],
        )?;
        let response = self
            .call(Method::GET, url, None)
            .await
            .context("Failed to fetch spreadsheet metadata")?;
        find_sheet_id(&response, title)
    }

    async fn append(&mut self, spreadsheet_id: &str, range: &str, rows: &[Row]) -> Res<()> {
        let url = endpoint(
            &[spreadsheet_id, "values", format!("{range}:append").as_str()],
            &[("valueInputOption", "RAW")],
        )?;
        let body = json!({ "range": range, "majorDimension": "ROWS", "values": rows });
        self.call(Method::POST, url, Some(body))
            .await
            .with_context(|| format!("Failed to append {} rows to {range}", rows.len()))?;
        Ok(())
    }

    async fn update(&mut self, spreadsheet_id: &str, range: &str, rows: &[Row]) -> Res<()> {
        let url = endpoint(
            &[spreadsheet_id, "values", range],
            &[("valueInputOption", "RAW")],
        )?;
        let body = json!({ "range": range, "majorDimension": "ROWS", "values": rows });
        self.call(Method::PUT, url, Some(body))
            .await
            .with_context(|| format!("Failed to update {range}"))?;
        Ok(())
    }

    async fn clear(&mut self, spreadsheet_id: &str, range: &str) -> Res<()> {
        self.refresh_client().await?;
        let request = BatchClearValuesRequest {
            ranges: vec![range.to_string()],
        };
        self.client
            .spreadsheets()
            .values_batch_clear(spreadsheet_id, &request)
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to clear {range}"))?;
        Ok(())
    }

    async fn insert_note(
        &mut self,
        spreadsheet_id: &str,
        sheet_id: i64,
        cell: GridCell,
        note: &str,
    ) -> Res<()> {
        let request = json!({
            "updateCells": {
                "range": {
                    "sheetId": sheet_id,
                    "startRowIndex": cell.row,
                    "endRowIndex": cell.row + 1,
                    "startColumnIndex": cell.column,
                    "endColumnIndex": cell.column + 1,
                },
                "rows": [{ "values": [{ "note": note }] }],
                "fields": "note",
            }
        });
        self.batch_update(spreadsheet_id, request)
            .await
            .context("Failed to insert note")?;
        Ok(())
    }

    async fn get(&mut self, spreadsheet_id: &str, range: &str) -> Res<Vec<Vec<String>>> {
        trace!("get for {range}");
        self.refresh_client().await?;
        let response = self
            .client
            .spreadsheets()
            .values_get(
                spreadsheet_id,
                range,
                DateTimeRenderOption::FormattedString,
                Dimension::Rows,
                ValueRenderOption::FormattedValue,
            )
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to fetch {range}"))?;
        Ok(response.body.values)
    }
}

/// Builds a URL under `SPREADSHEETS_URL`. Each segment is percent-encoded, so ranges such as
/// `My Sheet!A1:B2` are safe to pass.
fn endpoint(segments: &[&str], query: &[(&str, &str)]) -> Res<Url> {
    let mut url = Url::parse(SPREADSHEETS_URL).context("Invalid Sheets API URL")?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("The Sheets API URL cannot have path segments"))?
        .extend(segments);
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}

/// Finds the numeric sheet ID in a `spreadsheets.get` response. Without a title, the sheet with
/// the lowest index wins.
fn find_sheet_id(response: &Value, title: Option<&str>) -> Res<i64> {
    let sheets = response
        .get("sheets")
        .and_then(Value::as_array)
        .context("Spreadsheet metadata has no sheets")?;
    let properties = sheets.iter().filter_map(|s| s.get("properties"));
    let found = match title {
        Some(title) => properties
            .into_iter()
            .find(|p| p.get("title").and_then(Value::as_str) == Some(title)),
        None => properties.min_by_key(|p| p.get("index").and_then(Value::as_i64).unwrap_or(0)),
    };
    let Some(found) = found else {
        bail!("Sheet '{}' not found", title.unwrap_or_default());
    };
    // The API omits zero-valued fields, so a missing sheetId is sheet 0.
    Ok(found.get("sheetId").and_then(Value::as_i64).unwrap_or(0))
}

/// Creates a new sheets client with a refreshed access token.
async fn create_sheets_client(token_provider: &mut TokenProvider) -> Res<sheets::Client> {
    let access_token = token_provider.token_with_refresh().await?;

    // The sheets crate requires client_id, client_secret, redirect_uri and refresh_token, but we
    // only need the access token for API calls because we handle refresh ourselves.
    Ok(sheets::Client::new(
        String::new(),
        String::new(),
        String::new(),
        access_token.to_string(),
        String::new(),
    ))
}

fn map_client_error(e: ClientError) -> anyhow::Error {
    let error_name = match &e {
        ClientError::EmptyRefreshToken => "EmptyRefreshToken".to_string(),
        ClientError::FromUtf8Error(inner) => format!("FromUtf8Error {inner}"),
        ClientError::UrlParserError(inner) => format!("UrlParserError {inner}"),
        ClientError::SerdeJsonError(inner) => format!("SerdeJsonError {inner}"),
        ClientError::ReqwestError(inner) => format!("ReqwestError {inner}"),
        ClientError::InvalidHeaderValue(inner) => format!("InvalidHeaderValue {inner}"),
        ClientError::ReqwestMiddleWareError(inner) => format!("ReqwestMiddleWareError {inner}"),
        ClientError::HttpError { .. } => "HttpError".to_string(),
        ClientError::Other(_) => "Other".to_string(),
    };
    anyhow::Error::new(e).context(error_name)
}
