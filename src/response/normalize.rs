//! List result normalization
//!
//! List methods return their items either directly (`department.get`) or
//! wrapped in a single-key object (`{"tasks": [...]}` from `tasks.task.list`).

use crate::error::{Error, Result};
use crate::types::JsonValue;

/// Extract the item list from a list-method `result`
pub fn normalize_list(result: JsonValue) -> Result<Vec<JsonValue>> {
    match result {
        JsonValue::Array(items) => Ok(items),
        JsonValue::Object(map) if map.is_empty() => Ok(Vec::new()),
        JsonValue::Object(map) => {
            if map.len() != 1 {
                return Err(Error::malformed(format!(
                    "list result object must have a single key, got {}",
                    JsonValue::Object(map)
                )));
            }
            match map.into_iter().next() {
                Some((_, JsonValue::Array(items))) => Ok(items),
                Some((key, other)) => Err(Error::malformed(format!(
                    "list result '{key}' must be an array, got {other}"
                ))),
                None => Ok(Vec::new()),
            }
        }
        other => Err(Error::malformed(format!(
            "list result must be an array or an object, got {other}"
        ))),
    }
}
