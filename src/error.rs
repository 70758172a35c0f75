//! Error types for the b24api client
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! Whether an error is worth retrying is decided by
//! [`RetryPolicy::classify`](crate::http::RetryPolicy::classify), which maps
//! an error onto an [`ErrorClass`].

use thiserror::Error;

/// The main error type for b24api
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // HTTP / Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Transport error: {message}")]
    Transport { message: String },

    // ============================================================================
    // API Errors
    // ============================================================================
    #[error("API error [{code}]{}", describe(.description))]
    Api {
        code: String,
        description: Option<String>,
        status: Option<u16>,
    },

    #[error("Batch call '{key}' failed with API error [{code}]{}", describe(.description))]
    BatchItem {
        key: String,
        code: String,
        description: Option<String>,
    },

    #[error("Batch call '{key}' was skipped after an earlier call failed in a halted batch")]
    BatchSkipped { key: String },

    #[error("Malformed API response: {message}")]
    MalformedResponse { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    // ============================================================================
    // Pagination Errors
    // ============================================================================
    #[error("Pagination error for '{method}': {message}")]
    Pagination { method: String, message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

fn describe(description: &Option<String>) -> String {
    match description.as_deref() {
        Some(text) if !text.is_empty() => format!(": {text}"),
        _ => String::new(),
    }
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create an API error. Codes are compared case-insensitively, so they
    /// are stored lowercase.
    pub fn api(code: impl Into<String>, description: Option<String>) -> Self {
        Self::Api {
            code: code.into().to_lowercase(),
            description,
            status: None,
        }
    }

    /// Create a malformed response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a pagination error
    pub fn pagination(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pagination {
            method: method.into(),
            message: message.into(),
        }
    }

    /// API error code carried by this error, if any
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Error::Api { code, .. } | Error::BatchItem { code, .. } => Some(code),
            _ => None,
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } => Some(*status),
            Error::Api { status, .. } => *status,
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// How a failure is treated by the retry policy and the list strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Connection failure, timeout or server-side HTTP error
    TransientNetwork,
    /// API-level "too many requests" signal
    RateLimited,
    /// Validation, authentication, unknown method, malformed payload
    PermanentRequest,
    /// One call inside a successfully transported batch failed
    PartialBatchItem,
}

impl ErrorClass {
    /// Whether the failed operation may be attempted again
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientNetwork | Self::RateLimited)
    }
}

/// Result type alias for b24api
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
