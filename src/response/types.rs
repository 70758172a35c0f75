//! Response types
//!
//! The API is served by PHP, which encodes an empty associative array as `[]`,
//! so every keyed map in a batch response is read through [`php_map`].

use super::normalize::normalize_list;
use crate::error::{Error, Result};
use crate::request::command_key;
use crate::types::{JsonValue, OptionStringExt};
use chrono::{DateTime, FixedOffset};
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Timing block attached to every response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseTime {
    pub start: f64,
    pub finish: f64,
    pub duration: f64,
    pub processing: f64,
    pub date_start: DateTime<FixedOffset>,
    pub date_finish: DateTime<FixedOffset>,
    #[serde(default)]
    pub operating_reset_at: Option<f64>,
    #[serde(default)]
    pub operating: Option<f64>,
}

/// API error body: `{"error": "...", "error_description": "..."}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Lowercased error code
    #[serde(deserialize_with = "error_code")]
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl ErrorResponse {
    /// Read an error body, if `value` is one
    pub fn detect(value: &JsonValue) -> Option<Self> {
        let object = value.as_object()?;
        if !object.contains_key("error") || object.contains_key("result") {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    /// Convert into a crate error, remembering the HTTP status it came with
    pub fn into_error(self, status: Option<u16>) -> Error {
        Error::Api {
            code: self.error,
            description: self.error_description.none_if_empty(),
            status,
        }
    }
}

fn error_code<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::String(code) => code.to_lowercase(),
        other => other.to_string(),
    })
}

/// One call's response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub result: JsonValue,
    #[serde(default)]
    pub time: Option<ResponseTime>,
    /// Total item count, reported by counting list calls
    #[serde(default)]
    pub total: Option<u64>,
    /// Offset of the following page
    #[serde(default)]
    pub next: Option<u64>,
    /// Offset of the returned page
    #[serde(default)]
    pub start: Option<u64>,
}

impl ApiResponse {
    /// Wrap a bare result
    pub fn new(result: JsonValue) -> Self {
        Self {
            result,
            time: None,
            total: None,
            next: None,
            start: None,
        }
    }

    /// Parse a response body. An error body is returned as `Error::Api`
    /// even when the HTTP exchange itself succeeded.
    pub fn from_value(value: JsonValue) -> Result<Self> {
        if let Some(error) = ErrorResponse::detect(&value) {
            return Err(error.into_error(None));
        }
        serde_json::from_value(value)
            .map_err(|e| Error::malformed(format!("unexpected response shape: {e}")))
    }

    /// Items of a list-method result
    pub fn into_items(self) -> Result<Vec<JsonValue>> {
        normalize_list(self.result)
    }
}

/// `result` object of a `batch` call
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchResult {
    #[serde(default, deserialize_with = "php_map")]
    pub result: HashMap<String, JsonValue>,
    #[serde(default, deserialize_with = "php_map")]
    pub result_error: HashMap<String, ErrorResponse>,
    #[serde(default, deserialize_with = "php_map")]
    pub result_total: HashMap<String, u64>,
    #[serde(default, deserialize_with = "php_map")]
    pub result_next: HashMap<String, u64>,
    #[serde(default, deserialize_with = "php_map")]
    pub result_time: HashMap<String, ResponseTime>,
    #[serde(default, deserialize_with = "php_map")]
    pub result_start: HashMap<String, u64>,
}

impl BatchResult {
    /// Parse the `result` of a `batch` call
    pub fn from_value(value: JsonValue) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| Error::malformed(format!("unexpected batch result shape: {e}")))
    }

    /// Re-associate per-command outcomes with their submission order
    ///
    /// A halted batch has no entry for the calls after its first failure;
    /// those come back as [`CallResult::Skipped`]. A missing entry with no
    /// earlier failure is a malformed response.
    pub fn into_call_results(
        mut self,
        keys: impl IntoIterator<Item = String>,
    ) -> Result<Vec<CallResult>> {
        let mut halted = false;
        keys.into_iter()
            .map(|key| {
                if let Some(error) = self.result_error.remove(&key) {
                    halted = true;
                    return Ok(CallResult::Failure { key, error });
                }

                let Some(result) = self.result.remove(&key) else {
                    if halted {
                        return Ok(CallResult::Skipped { key });
                    }
                    return Err(Error::malformed(format!(
                        "batch response has no result for command '{key}'"
                    )));
                };

                Ok(CallResult::Success(ApiResponse {
                    result,
                    time: self.result_time.remove(&key),
                    total: self.result_total.get(&key).copied(),
                    next: self.result_next.get(&key).copied(),
                    start: self.result_start.get(&key).copied(),
                }))
            })
            .collect()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PhpMap<T> {
    Map(HashMap<String, T>),
    List(Vec<T>),
}

fn php_map<'de, D, T>(deserializer: D) -> std::result::Result<HashMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Option::<PhpMap<T>>::deserialize(deserializer)? {
        None => HashMap::new(),
        Some(PhpMap::Map(map)) => map,
        Some(PhpMap::List(items)) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| (command_key(index), item))
            .collect(),
    })
}

/// Outcome of one call inside a batch
#[derive(Debug, Clone, PartialEq)]
pub enum CallResult {
    /// The call succeeded
    Success(ApiResponse),
    /// The call failed at the API level; its siblings are unaffected
    Failure { key: String, error: ErrorResponse },
    /// The call never ran because a halted batch stopped at an earlier failure
    Skipped { key: String },
}

impl CallResult {
    /// Result value, for a successful call
    pub fn value(&self) -> Option<&JsonValue> {
        match self {
            Self::Success(response) => Some(&response.result),
            Self::Failure { .. } | Self::Skipped { .. } => None,
        }
    }

    /// API error, for a failed call
    pub fn error(&self) -> Option<&ErrorResponse> {
        match self {
            Self::Failure { error, .. } => Some(error),
            Self::Success(_) | Self::Skipped { .. } => None,
        }
    }

    /// Whether the call succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Full response, turning a failure into `Error::BatchItem` and a
    /// skipped call into `Error::BatchSkipped`
    pub fn into_response(self) -> Result<ApiResponse> {
        match self {
            Self::Success(response) => Ok(response),
            Self::Failure { key, error } => Err(Error::BatchItem {
                key,
                code: error.error,
                description: error.error_description.none_if_empty(),
            }),
            Self::Skipped { key } => Err(Error::BatchSkipped { key }),
        }
    }

    /// Result value, turning a failure into `Error::BatchItem`
    pub fn into_value(self) -> Result<JsonValue> {
        self.into_response().map(|response| response.result)
    }
}
