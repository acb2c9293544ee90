//! Defensive tag parsing.
//!
//! Tags arrive either as a JSON array (JSON bodies) or as a string holding a
//! JSON array (multipart form fields). Anything malformed degrades to an
//! empty list instead of rejecting the request.

use serde_json::Value;

/// Parse tags from an optional JSON value.
///
/// Non-string array elements and blank strings are dropped.
pub fn parse_tags(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => collect_strings(items),
        Some(Value::String(raw)) => parse_tags_str(raw),
        _ => Vec::new(),
    }
}

/// Parse tags from a raw string that should contain a JSON array.
pub fn parse_tags_str(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => collect_strings(&items),
        _ => Vec::new(),
    }
}

fn collect_strings(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
