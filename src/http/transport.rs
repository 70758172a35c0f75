//! Transport layer
//!
//! One API call is one HTTP POST of a JSON body to `{webhook}{method}`. The
//! transport reports failures as typed errors and never retries on its own;
//! retrying is the job of [`RetryPolicy`](super::RetryPolicy).

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::error::{Error, Result};
use crate::response::ErrorResponse;
use crate::types::JsonValue;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Sends one API call and returns the parsed JSON body
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `parameters` to `method`
    async fn send(&self, method: &str, parameters: &JsonValue) -> Result<JsonValue>;
}

/// Make sure method names are joined below the webhook path, not beside it
pub fn normalize_webhook(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Configuration for the HTTP transport
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Inbound webhook, e.g. `https://example.bitrix24.com/rest/1/secret/`
    pub webhook_url: Url,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
}

impl HttpTransportConfig {
    /// Create a config with default timeout and rate limit
    pub fn new(webhook_url: Url) -> Self {
        Self {
            webhook_url: normalize_webhook(webhook_url),
            timeout: Duration::from_secs(30),
            rate_limit: Some(RateLimiterConfig::default()),
            user_agent: format!("b24api/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Parse the webhook and create a config
    pub fn parse(webhook_url: &str) -> Result<Self> {
        Ok(Self::new(Url::parse(webhook_url)?))
    }

    /// Set the request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set user agent
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Set rate limiter
    #[must_use]
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.rate_limit = Some(config);
        self
    }

    /// Disable rate limiting
    #[must_use]
    pub fn no_rate_limit(mut self) -> Self {
        self.rate_limit = None;
        self
    }
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
    config: HttpTransportConfig,
    rate_limiter: Option<RateLimiter>,
}

impl HttpTransport {
    /// Create a transport from its config
    pub fn new(config: HttpTransportConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// Endpoint of `method`
    pub fn method_url(&self, method: &str) -> Result<Url> {
        Ok(self.config.webhook_url.join(method)?)
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    fn send_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            return Error::Timeout {
                timeout_ms: self.config.timeout.as_millis() as u64,
            };
        }
        Error::Http(error)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, method: &str, parameters: &JsonValue) -> Result<JsonValue> {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let url = self.method_url(method)?;
        let response = self
            .client
            .post(url)
            .json(parameters)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        if status.is_success() {
            debug!("{} -> {}", method, status.as_u16());
            let body = response.bytes().await.map_err(|e| self.send_error(e))?;
            return serde_json::from_slice(&body)
                .map_err(|e| Error::malformed(format!("'{method}' returned invalid JSON: {e}")));
        }

        let retry_after = extract_retry_after(&response);
        let body = response.text().await.unwrap_or_default();
        debug!("{} -> {}: {}", method, status.as_u16(), body);

        // Error bodies are meaningful even on non-2xx statuses
        if let Some(error) = serde_json::from_str::<JsonValue>(&body)
            .ok()
            .as_ref()
            .and_then(ErrorResponse::detect)
        {
            return Err(error.into_error(Some(status.as_u16())));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            if let Some(retry_after_seconds) = retry_after {
                return Err(Error::RateLimited {
                    retry_after_seconds,
                });
            }
        }

        Err(Error::http_status(status.as_u16(), body))
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("webhook_host", &self.config.webhook_url.host_str())
            .field("timeout", &self.config.timeout)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Extract retry-after header value
fn extract_retry_after(response: &Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
}
