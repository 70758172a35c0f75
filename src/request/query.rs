//! Query string flattening
//!
//! Batch commands are sent as `method?query` strings, so nested parameters
//! have to be flattened the way PHP parses them back:
//! `{"filter": {">ID": 5}, "select": ["ID"]}` becomes
//! `filter%5B%3EID%5D=5&select%5B0%5D=ID`.

use crate::types::{JsonObject, JsonValue};
use url::form_urlencoded;

/// Flatten parameters into a form-encoded PHP-style query string
///
/// Nulls are skipped, arrays are indexed by position, booleans are written
/// as `1`/`0`.
pub fn build_query(parameters: &JsonObject) -> String {
    let mut pairs = Vec::new();
    for (key, value) in parameters {
        flatten(key.clone(), value, &mut pairs);
    }

    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn flatten(name: String, value: &JsonValue, pairs: &mut Vec<(String, String)>) {
    match value {
        JsonValue::Null => {}
        JsonValue::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten(format!("{name}[{index}]"), item, pairs);
            }
        }
        JsonValue::Object(map) => {
            for (key, item) in map {
                flatten(format!("{name}[{key}]"), item, pairs);
            }
        }
        JsonValue::Bool(flag) => pairs.push((name, if *flag { "1" } else { "0" }.to_string())),
        JsonValue::Number(number) => pairs.push((name, number.to_string())),
        JsonValue::String(text) => pairs.push((name, text.clone())),
    }
}

fn encode(text: &str) -> String {
    form_urlencoded::byte_serialize(text.as_bytes()).collect()
}
