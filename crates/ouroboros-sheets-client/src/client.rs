//! Sheets v4 values API over a pooled reqwest client

use crate::config::SheetsClientConfig;
use crate::error::{SheetsClientError, SheetsResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use url::Url;

/// `ValueRange` resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<String>,
    /// Absent in responses when the range holds no values.
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateValuesResponse {
    #[serde(default)]
    pub updated_range: Option<String>,
    #[serde(default)]
    pub updated_rows: Option<u32>,
    #[serde(default)]
    pub updated_columns: Option<u32>,
    #[serde(default)]
    pub updated_cells: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendValuesResponse {
    #[serde(default)]
    pub table_range: Option<String>,
    #[serde(default)]
    pub updates: Option<UpdateValuesResponse>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateValuesResponse {
    #[serde(default)]
    pub total_updated_rows: Option<u32>,
    #[serde(default)]
    pub total_updated_columns: Option<u32>,
    #[serde(default)]
    pub total_updated_cells: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearValuesResponse {
    #[serde(default)]
    pub cleared_range: Option<String>,
}

/// Async client for one spreadsheet's values API
///
/// # Example
///
/// ```ignore
/// use ouroboros_sheets_client::{SheetsClient, SheetsClientConfig};
///
/// let client = SheetsClient::new(SheetsClientConfig::new("book-1", token))?;
/// let values = client.get_values("Clientes!A1:ZZZ").await?;
/// println!("{} rows", values.values.len());
/// ```
#[derive(Clone)]
pub struct SheetsClient {
    inner: Arc<SheetsClientInner>,
}

struct SheetsClientInner {
    client: reqwest::Client,
    config: SheetsClientConfig,
}

impl SheetsClient {
    /// Create a new client with the given configuration
    pub fn new(config: SheetsClientConfig) -> SheetsResult<Self> {
        // Fail early on a malformed base URL rather than on the first call.
        Url::parse(&config.base_url)?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .user_agent(&config.user_agent)
            .gzip(config.gzip)
            .brotli(config.brotli)
            .build()?;

        Ok(Self {
            inner: Arc::new(SheetsClientInner { client, config }),
        })
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.inner.config.spreadsheet_id
    }

    pub fn config(&self) -> &SheetsClientConfig {
        &self.inner.config
    }

    /// `{base}/spreadsheets/{id}/values/{range}{suffix}`, with the range
    /// percent-encoded as a single path segment.
    fn values_url(&self, range: &str, suffix: &str) -> SheetsResult<Url> {
        let config = &self.inner.config;
        let raw = format!(
            "{}/spreadsheets/{}/values/{}{}",
            config.base_url,
            urlencoding::encode(&config.spreadsheet_id),
            urlencoding::encode(range),
            suffix
        );
        Url::parse(&raw).map_err(|e| SheetsClientError::InvalidUrl(format!("{}: {}", e, range)))
    }

    fn batch_update_url(&self) -> SheetsResult<Url> {
        let config = &self.inner.config;
        let raw = format!(
            "{}/spreadsheets/{}/values:batchUpdate",
            config.base_url,
            urlencoding::encode(&config.spreadsheet_id)
        );
        Ok(Url::parse(&raw)?)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        call: &'static str,
    ) -> SheetsResult<T> {
        let start = Instant::now();
        let response = request
            .bearer_auth(&self.inner.config.access_token)
            .send()
            .await
            .map_err(classify_transport)?;
        let status = response.status();
        let body = response.text().await.map_err(classify_transport)?;
        debug!(
            call,
            status = status.as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Sheets API response"
        );

        if !status.is_success() {
            return Err(SheetsClientError::from_response(status.as_u16(), &body));
        }
        if body.trim().is_empty() {
            return serde_json::from_str("{}")
                .map_err(|e| SheetsClientError::Response(format!("{}: {}", call, e)));
        }
        serde_json::from_str(&body)
            .map_err(|e| SheetsClientError::Response(format!("{}: {}", call, e)))
    }

    /// Reads raw (unformatted) values; dates come back as formatted strings.
    pub async fn get_values(&self, range: &str) -> SheetsResult<ValueRange> {
        let url = self.values_url(range, "")?;
        let request = self.inner.client.get(url).query(&[
            ("valueRenderOption", "UNFORMATTED_VALUE"),
            ("dateTimeRenderOption", "FORMATTED_STRING"),
            ("majorDimension", "ROWS"),
        ]);
        self.send(request, "values.get").await
    }

    /// Appends rows after the table found in `range`, parsed as user input.
    pub async fn append_values(
        &self,
        range: &str,
        rows: Vec<Vec<Value>>,
    ) -> SheetsResult<AppendValuesResponse> {
        let url = self.values_url(range, ":append")?;
        let request = self
            .inner
            .client
            .post(url)
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "majorDimension": "ROWS", "values": rows }));
        self.send(request, "values.append").await
    }

    /// Writes several ranges in one call, parsed as user input.
    pub async fn batch_update_values(
        &self,
        data: Vec<ValueRange>,
    ) -> SheetsResult<BatchUpdateValuesResponse> {
        let url = self.batch_update_url()?;
        let request = self
            .inner
            .client
            .post(url)
            .json(&json!({ "valueInputOption": "USER_ENTERED", "data": data }));
        self.send(request, "values.batchUpdate").await
    }

    /// Clears values (not formatting) in `range`.
    pub async fn clear_values(&self, range: &str) -> SheetsResult<ClearValuesResponse> {
        let url = self.values_url(range, ":clear")?;
        let request = self.inner.client.post(url).json(&json!({}));
        self.send(request, "values.clear").await
    }
}

fn classify_transport(err: reqwest::Error) -> SheetsClientError {
    if err.is_timeout() {
        SheetsClientError::Timeout(err.to_string())
    } else if err.is_connect() {
        SheetsClientError::Connection(err.to_string())
    } else {
        SheetsClientError::Reqwest(err)
    }
}

impl std::fmt::Debug for SheetsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsClient")
            .field("base_url", &self.inner.config.base_url)
            .field("spreadsheet_id", &self.inner.config.spreadsheet_id)
            .field("timeout", &self.inner.config.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SheetsClient {
        SheetsClient::new(SheetsClientConfig::new("book-1", "tok")).unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = client();
        assert_eq!(client.spreadsheet_id(), "book-1");
        assert!(!format!("{:?}", client).contains("tok\""));
    }

    #[test]
    fn test_invalid_base_url() {
        let config = SheetsClientConfig::new("book-1", "tok").base_url("not a url");
        assert!(matches!(
            SheetsClient::new(config),
            Err(SheetsClientError::UrlParse(_))
        ));
    }

    #[test]
    fn test_values_url_encodes_range() {
        let url = client().values_url("'Hoja 1'!A1:ZZZ", ":append").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/book-1/values/%27Hoja%201%27%21A1%3AZZZ:append"
        );
    }

    #[test]
    fn test_value_range_without_values() {
        let parsed: ValueRange = serde_json::from_str(r#"{"range":"S!A1:ZZZ1000","majorDimension":"ROWS"}"#).unwrap();
        assert!(parsed.values.is_empty());
    }
}
