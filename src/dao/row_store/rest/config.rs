use std::time::Duration;

use super::error::{RestDaoError, RestResult};

/// Per-request timeout used when `ROW_STORE_TIMEOUT_SECS` is not set.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Runtime configuration describing how to reach the hosted row store.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Root of the store's API, e.g. `https://rows.example.org`.
    pub base_url: String,
    /// Database token sent as `Authorization: Token <token>`.
    pub token: Option<String>,
    /// Per-request timeout of the HTTP client.
    pub request_timeout: Duration,
}

impl RestConfig {
    /// Construct a configuration from an explicit base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Attach the database token sent with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Build a configuration by reading the expected environment variables.
    pub fn from_env() -> RestResult<Self> {
        let base_url = std::env::var("ROW_STORE_BASE_URL").map_err(|_| {
            RestDaoError::MissingEnvVar {
                var: "ROW_STORE_BASE_URL",
            }
        })?;

        let mut config = Self::new(base_url);

        if let Some(token) = std::env::var("ROW_STORE_TOKEN")
            .ok()
            .filter(|token| !token.is_empty())
        {
            config = config.with_token(token);
        }

        if let Some(secs) = std::env::var("ROW_STORE_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
        {
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
