//! Common types used throughout b24api
//!
//! This module contains shared type aliases and the API constants that the
//! batch and pagination machinery is built around.

use crate::error::Result;
use crate::response::{ApiResponse, CallResult};
use futures::stream::BoxStream;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Lazy sequence of list items
pub type ItemStream = BoxStream<'static, Result<JsonValue>>;

/// Lazy sequence of list items tagged with the reference they belong to
pub type KeyedItemStream<K> = BoxStream<'static, Result<(K, JsonValue)>>;

/// Lazy sequence of batch call outcomes, in submission order
pub type CallResultStream = BoxStream<'static, Result<CallResult>>;

/// Lazy sequence of successful batch responses
pub type ResponseStream = BoxStream<'static, Result<ApiResponse>>;

// ============================================================================
// API Limits
// ============================================================================

/// Hard limit on calls per `batch` envelope
pub const MAX_BATCH_SIZE: usize = 50;

/// Items returned per page by `*.list` methods
pub const DEFAULT_LIST_SIZE: usize = 50;

/// Name of the bulk endpoint
pub const BATCH_METHOD: &str = "batch";

/// Name of the pagination parameter
pub const START_PARAM: &str = "start";

/// `start` value asking a list method for its final page directly
pub const LAST_PAGE_START: i64 = -1;

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}
