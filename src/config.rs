//! Settings
//!
//! Everything the client needs to talk to one portal, loaded from YAML or
//! from `BITRIX24_API_*` environment variables (also read from `.env`). Only
//! `webhook_url` is required.

use crate::client::ClientConfig;
use crate::error::{Error, Result, ResultExt};
use crate::http::{
    HttpTransportConfig, RateLimiterConfig, RetryPolicy, DEFAULT_RETRY_ERRORS,
    DEFAULT_RETRY_STATUSES,
};
use crate::types::{JsonObject, JsonValue, DEFAULT_LIST_SIZE, MAX_BATCH_SIZE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Prefix of settings read from the environment (case-insensitive)
pub const ENV_PREFIX: &str = "bitrix24_api_";

/// Dotenv file read by [`Settings::from_env`]
pub const DOTENV_FILE: &str = ".env";

/// Client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Inbound webhook, e.g. `https://example.bitrix24.com/rest/1/secret/`
    pub webhook_url: Url,

    /// HTTP statuses worth another attempt
    #[serde(default = "default_retry_statuses")]
    pub retry_statuses: Vec<u16>,

    /// API error codes worth another attempt
    #[serde(default = "default_retry_errors")]
    pub retry_errors: Vec<String>,

    /// Total attempts per exchange
    #[serde(default = "default_retry_tries")]
    pub retry_tries: u32,

    /// Seconds before the first retry
    #[serde(default = "default_retry_delay")]
    pub retry_delay: f64,

    /// Delay multiplier per retry
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff: f64,

    /// Upper bound for one delay, in seconds
    #[serde(default = "default_retry_max_delay")]
    pub retry_max_delay: f64,

    /// Page size assumed when a response does not report `next`
    #[serde(default = "default_list_size")]
    pub list_size: usize,

    /// Calls per batch envelope
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// References probed per batch
    #[serde(default)]
    pub reference_group_size: Option<usize>,

    /// Stop a batch at its first failing call
    #[serde(default)]
    pub halt: bool,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: f64,

    /// Client-side rate limit; `null` disables it
    #[serde(default = "default_rate_limit")]
    pub rate_limit: Option<RateLimiterConfig>,
}

fn default_retry_statuses() -> Vec<u16> {
    DEFAULT_RETRY_STATUSES.to_vec()
}

fn default_retry_errors() -> Vec<String> {
    DEFAULT_RETRY_ERRORS.iter().map(ToString::to_string).collect()
}

fn default_retry_tries() -> u32 {
    5
}

fn default_retry_delay() -> f64 {
    5.0
}

fn default_retry_backoff() -> f64 {
    2.0
}

fn default_retry_max_delay() -> f64 {
    300.0
}

fn default_list_size() -> usize {
    DEFAULT_LIST_SIZE
}

fn default_batch_size() -> usize {
    MAX_BATCH_SIZE
}

fn default_timeout() -> f64 {
    30.0
}

fn default_rate_limit() -> Option<RateLimiterConfig> {
    Some(RateLimiterConfig::default())
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

impl Settings {
    /// Settings with every default and the given webhook
    pub fn new(webhook_url: Url) -> Self {
        Self {
            webhook_url,
            retry_statuses: default_retry_statuses(),
            retry_errors: default_retry_errors(),
            retry_tries: default_retry_tries(),
            retry_delay: default_retry_delay(),
            retry_backoff: default_retry_backoff(),
            retry_max_delay: default_retry_max_delay(),
            list_size: default_list_size(),
            batch_size: default_batch_size(),
            reference_group_size: None,
            halt: false,
            timeout: default_timeout(),
            rate_limit: default_rate_limit(),
        }
    }

    /// Parse settings from YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let settings: Self = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml_str(&yaml)
    }

    /// Load settings from `.env` in the working directory, if present, and
    /// the process environment. Process variables win.
    pub fn from_env() -> Result<Self> {
        let dotenv = Path::new(DOTENV_FILE);
        if dotenv.exists() {
            Self::from_env_file(dotenv)
        } else {
            Self::from_vars(std::env::vars())
        }
    }

    /// Load settings from a dotenv file merged under the process environment
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut vars = read_dotenv(path.as_ref())?;
        vars.extend(std::env::vars());
        Self::from_vars(vars)
    }

    /// Load settings from `BITRIX24_API_*` variables
    ///
    /// Values are read as JSON where they parse (`50`, `true`, `[423, 429]`)
    /// and as plain strings otherwise.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut fields = JsonObject::new();
        for (name, value) in vars {
            let name = name.as_ref().to_lowercase();
            let Some(field) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref();
            let value = serde_json::from_str(value)
                .unwrap_or_else(|_| JsonValue::String(value.to_string()));
            fields.insert(field.to_string(), value);
        }

        if !fields.contains_key("webhook_url") {
            return Err(Error::missing_field("webhook_url"));
        }

        let settings: Self = serde_json::from_value(JsonValue::Object(fields))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check values against the API limits
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.webhook_url.scheme(), "http" | "https") {
            return Err(Error::invalid_value(
                "webhook_url",
                format!("unsupported scheme '{}'", self.webhook_url.scheme()),
            ));
        }
        if !(self.timeout.is_finite() && self.timeout > 0.0) {
            return Err(Error::invalid_value("timeout", "must be a positive number of seconds"));
        }
        if !(self.retry_delay.is_finite() && self.retry_delay >= 0.0) {
            return Err(Error::invalid_value("retry_delay", "must not be negative"));
        }
        if !(self.retry_backoff.is_finite() && self.retry_backoff >= 1.0) {
            return Err(Error::invalid_value("retry_backoff", "must be at least 1"));
        }
        self.client_config().validate()
    }

    /// Retry policy described by the `retry_*` fields
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_tries,
            initial_delay: seconds(self.retry_delay),
            backoff_factor: self.retry_backoff,
            max_delay: seconds(self.retry_max_delay),
            retry_statuses: self.retry_statuses.clone(),
            retry_errors: self.retry_errors.iter().map(|c| c.to_lowercase()).collect(),
        }
    }

    /// Executor and strategy knobs
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            list_size: self.list_size,
            batch_size: self.batch_size,
            reference_group_size: self.reference_group_size,
            halt: self.halt,
            retry: self.retry_policy(),
        }
    }

    /// HTTP transport config
    pub fn transport_config(&self) -> HttpTransportConfig {
        let config = HttpTransportConfig::new(self.webhook_url.clone()).timeout(seconds(self.timeout));
        match &self.rate_limit {
            Some(rate_limit) => config.rate_limit(rate_limit.clone()),
            None => config.no_rate_limit(),
        }
    }
}

/// Variables of a dotenv file, in file order
fn read_dotenv(path: &Path) -> Result<Vec<(String, String)>> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let invalid =
        |e: dotenvy::Error| Error::config(format!("Failed to read {}: {e}", path.display()));
    dotenvy::from_path_iter(path)
        .map_err(invalid)?
        .map(|item| item.map_err(invalid))
        .collect()
}
