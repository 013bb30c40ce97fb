//! Client configuration.

use std::time::Duration;

use url::Url;

use crate::error::ClientError;

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the API lives and how long to wait for it.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl ClientConfig {
    /// Configuration for a base URL with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Url` if the URL does not parse.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: normalize(base_url)?,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Read `ENVANTER_API_URL` and `ENVANTER_API_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Url` if `ENVANTER_API_URL` does not parse.
    pub fn from_env() -> Result<Self, ClientError> {
        let base_url = std::env::var("ENVANTER_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let timeout = std::env::var("ENVANTER_API_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|s| *s > 0)
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);

        Ok(Self {
            base_url: normalize(&base_url)?,
            timeout,
        })
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Absolute URL of an API path such as `materials/MLZ001`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Url` if the joined URL is invalid.
    pub fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }
}

/// Parse a base URL and make sure it ends in `/` so relative joins append.
fn normalize(base_url: &str) -> Result<Url, ClientError> {
    let trimmed = base_url.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Ok(Url::parse(&with_slash)?)
}
