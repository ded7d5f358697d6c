use std::sync::Arc;

use async_trait::async_trait;
use auth_oauth::{OAuthError, TokenSource};
use error_common::{truncate_chars, DataSanitizer};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::backend::TabularBackend;
use crate::error::{DatabaseError, DatabaseResult, TabularError, TabularResult};

pub const DEFAULT_SHEETS_API_URL: &str = "https://sheets.googleapis.com";

/// Values are written as given; no locale parsing of dates or numbers
const VALUE_INPUT_OPTION: &str = "RAW";

const MAX_ERROR_BODY_CHARS: usize = 300;

/// Google Sheets connection settings
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub api_url: String,
}

impl SheetsConfig {
    pub fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            api_url: DEFAULT_SHEETS_API_URL.to_string(),
        }
    }

    /// Reads `SPREADSHEET_ID` (required) and `SHEETS_API_URL`
    pub fn from_env() -> DatabaseResult<Self> {
        let spreadsheet_id = std::env::var("SPREADSHEET_ID")
            .ok()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| DatabaseError::Configuration("SPREADSHEET_ID is not set".to_string()))?;

        Ok(Self {
            spreadsheet_id,
            api_url: std::env::var("SHEETS_API_URL")
                .unwrap_or_else(|_| DEFAULT_SHEETS_API_URL.to_string()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Tabular backend over the Sheets v4 `spreadsheets.values` REST resource
pub struct GoogleSheetsBackend {
    config: SheetsConfig,
    tokens: Arc<dyn TokenSource>,
    http: Client,
}

impl GoogleSheetsBackend {
    pub fn new(config: SheetsConfig, tokens: Arc<dyn TokenSource>) -> Self {
        Self::with_client(config, tokens, Client::new())
    }

    pub fn with_client(config: SheetsConfig, tokens: Arc<dyn TokenSource>, http: Client) -> Self {
        Self {
            config,
            tokens,
            http,
        }
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.config.spreadsheet_id
    }

    fn values_url(&self, range: &str, action: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.spreadsheet_id,
            urlencoding::encode(range),
            action
        )
    }

    async fn bearer(&self) -> TabularResult<String> {
        self.tokens.access_token().await.map_err(token_error)
    }
}

fn token_error(error: OAuthError) -> TabularError {
    let message = DataSanitizer::new().sanitize_for_logging(&error.to_string());
    if error.is_credential_problem() {
        TabularError::Authentication(message)
    } else {
        TabularError::Unreachable(message)
    }
}

fn transport_error(error: &reqwest::Error) -> TabularError {
    TabularError::Unreachable(DataSanitizer::new().sanitize_for_logging(&error.to_string()))
}

async fn check_status(response: Response) -> TabularResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = truncate_chars(&body, MAX_ERROR_BODY_CHARS).to_string();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(TabularError::Authentication(message)),
        _ => Err(TabularError::Api {
            status: status.as_u16(),
            message,
        }),
    }
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl TabularBackend for GoogleSheetsBackend {
    async fn append_row(&self, range: &str, row: Vec<String>) -> TabularResult<()> {
        let token = self.bearer().await?;
        let response = self
            .http
            .post(self.values_url(range, ":append"))
            .bearer_auth(token)
            .query(&[
                ("valueInputOption", VALUE_INPUT_OPTION),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "values": [row] }))
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        check_status(response).await?;
        debug!(range = %range, "Appended row to spreadsheet");
        Ok(())
    }

    async fn read_range(&self, range: &str) -> TabularResult<Vec<Vec<String>>> {
        let token = self.bearer().await?;
        let response = self
            .http
            .get(self.values_url(range, ""))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        let body: ValueRange = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| TabularError::Decode(e.to_string()))?;

        debug!(range = %range, rows = body.values.len(), "Read spreadsheet range");
        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    async fn update_row(&self, range: &str, row: Vec<String>) -> TabularResult<()> {
        let token = self.bearer().await?;
        let response = self
            .http
            .put(self.values_url(range, ""))
            .bearer_auth(token)
            .query(&[("valueInputOption", VALUE_INPUT_OPTION)])
            .json(&json!({ "range": range, "values": [row] }))
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        check_status(response).await?;
        debug!(range = %range, "Updated spreadsheet row");
        Ok(())
    }

    async fn clear_range(&self, range: &str) -> TabularResult<()> {
        let token = self.bearer().await?;
        let response = self
            .http
            .post(self.values_url(range, ":clear"))
            .bearer_auth(token)
            .json(&json!({}))
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        check_status(response).await?;
        debug!(range = %range, "Cleared spreadsheet range");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sheets"
    }
}
