//! Request types
//!
//! A `Request` never changes after it is built: the `with_*` helpers return
//! modified copies so a list strategy can derive one request per page from a
//! single template.

use super::query::build_query;
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue, MAX_BATCH_SIZE, START_PARAM};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// One API method call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    method: String,
    #[serde(default)]
    parameters: JsonObject,
}

impl Request {
    /// Create a request without parameters
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            parameters: JsonObject::new(),
        }
    }

    /// Create a request with a full parameter map
    pub fn with_parameters(method: impl Into<String>, parameters: JsonObject) -> Self {
        Self {
            method: method.into(),
            parameters,
        }
    }

    /// Add or replace a parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Method name
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Parameters as sent in the request body
    pub fn parameters(&self) -> &JsonObject {
        &self.parameters
    }

    /// Current `start` parameter, if set
    pub fn start(&self) -> Option<i64> {
        self.parameters.get(START_PARAM).and_then(JsonValue::as_i64)
    }

    /// Copy of this request asking for the page at `start`
    #[must_use]
    pub fn with_start(&self, start: i64) -> Self {
        self.clone().param(START_PARAM, start)
    }

    /// Copy of this request with `update` merged into its `filter` object
    pub fn with_filter(&self, update: &JsonObject) -> Result<Self> {
        let mut request = self.clone();
        match request
            .parameters
            .entry("filter")
            .or_insert_with(|| JsonValue::Object(JsonObject::new()))
        {
            JsonValue::Object(filter) => {
                for (key, value) in update {
                    filter.insert(key.clone(), value.clone());
                }
            }
            other => {
                return Err(Error::invalid_request(format!(
                    "'{}' has a non-object filter: {other}",
                    self.method
                )));
            }
        }
        Ok(request)
    }

    /// Command string used inside a batch envelope
    pub fn query(&self) -> String {
        if self.parameters.is_empty() {
            return self.method.clone();
        }
        format!("{}?{}", self.method, build_query(&self.parameters))
    }
}

impl From<&str> for Request {
    fn from(method: &str) -> Self {
        Self::new(method)
    }
}

/// Key of the command at `index` inside a batch envelope
pub fn command_key(index: usize) -> String {
    format!("_{index}")
}

/// Ordered group of calls sent as one `batch` envelope
///
/// Never holds more than [`MAX_BATCH_SIZE`] requests. Results come back keyed
/// by position, so order is significant.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchRequest {
    requests: Vec<Request>,
}

impl BatchRequest {
    /// Create a batch, rejecting more requests than one envelope may carry
    pub fn new(requests: Vec<Request>) -> Result<Self> {
        if requests.len() > MAX_BATCH_SIZE {
            return Err(Error::invalid_request(format!(
                "batch holds {} calls, the limit is {MAX_BATCH_SIZE}",
                requests.len()
            )));
        }
        Ok(Self { requests })
    }

    /// Wrap a chunk already known to fit the limit
    pub(crate) fn from_chunk(requests: Vec<Request>) -> Self {
        debug_assert!(requests.len() <= MAX_BATCH_SIZE);
        Self { requests }
    }

    /// Number of calls in the batch
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether the batch has no calls
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Calls in submission order
    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    /// Envelope keys in submission order
    pub fn keys(&self) -> impl Iterator<Item = String> {
        (0..self.requests.len()).map(command_key)
    }

    /// Parameters of the `batch` call
    pub fn envelope(&self, halt: bool) -> JsonValue {
        let cmd: JsonObject = self
            .requests
            .iter()
            .enumerate()
            .map(|(index, request)| (command_key(index), JsonValue::String(request.query())))
            .collect();

        json!({ "halt": halt, "cmd": cmd })
    }
}

impl IntoIterator for BatchRequest {
    type Item = Request;
    type IntoIter = std::vec::IntoIter<Request>;

    fn into_iter(self) -> Self::IntoIter {
        self.requests.into_iter()
    }
}
