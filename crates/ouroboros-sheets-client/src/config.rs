//! Sheets client configuration

use std::time::Duration;
use tracing::warn;

/// Public endpoint of the Sheets v4 API.
pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4";

/// Configuration for the Sheets REST client
#[derive(Clone)]
pub struct SheetsClientConfig {
    /// API root, without trailing slash (e.g. "https://sheets.googleapis.com/v4")
    pub base_url: String,

    /// Spreadsheet (document) id
    pub spreadsheet_id: String,

    /// OAuth2 bearer token
    pub access_token: String,

    /// Upper bound for one API call, body included
    pub timeout: Duration,

    /// Upper bound for establishing the connection
    pub connect_timeout: Duration,

    /// Idle connections kept open to the API host
    pub pool_max_idle_per_host: usize,

    /// How long an idle pooled connection survives
    pub pool_idle_timeout: Duration,

    /// Sent as `User-Agent`
    pub user_agent: String,

    /// Accept gzip-encoded responses
    pub gzip: bool,

    /// Accept brotli-encoded responses
    pub brotli: bool,
}

impl SheetsClientConfig {
    /// Create a config for one spreadsheet with default settings
    pub fn new(spreadsheet_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            access_token: access_token.into(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_max_idle_per_host: 10,
            pool_idle_timeout: Duration::from_secs(90),
            user_agent: format!("ouroboros-sheets-client/{}", env!("CARGO_PKG_VERSION")),
            gzip: true,
            brotli: true,
        }
    }

    /// Points the client at another API root, e.g. a local mock server.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Per-call timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Per-call timeout in (fractional) seconds.
    ///
    /// Negative, NaN or out-of-range values leave the current timeout as is.
    pub fn timeout_secs(mut self, secs: f64) -> Self {
        match Duration::try_from_secs_f64(secs) {
            Ok(timeout) => self.timeout = timeout,
            Err(err) => warn!(secs, error = %err, "Ignoring invalid timeout"),
        }
        self
    }

    /// Connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn gzip(mut self, enabled: bool) -> Self {
        self.gzip = enabled;
        self
    }

    pub fn brotli(mut self, enabled: bool) -> Self {
        self.brotli = enabled;
        self
    }
}

// The token never reaches logs.
impl std::fmt::Debug for SheetsClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsClientConfig")
            .field("base_url", &self.base_url)
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("access_token", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
