// ABOUTME: Inbound text and context sanitization applied before routing
// ABOUTME: HTML-escapes, strips markup characters, caps length, and recurses through JSON context
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

use html_escape::encode_quoted_attribute;
use serde_json::{Map, Value};

/// Maximum characters kept from any sanitized string
pub const MAX_INPUT_CHARS: usize = 1000;

/// Escape, strip `<>"'`, truncate, and trim one string
#[must_use]
pub fn sanitize_text(text: &str) -> String {
    let escaped = encode_quoted_attribute(text);
    let stripped: String = escaped
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '"' | '\''))
        .take(MAX_INPUT_CHARS)
        .collect();
    stripped.trim().to_owned()
}

/// Sanitize every string in a JSON value, keys included
#[must_use]
pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::String(text) => Value::String(sanitize_text(&text)),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(sanitize_context(map)),
        other => other,
    }
}

/// Sanitize a request context
#[must_use]
pub fn sanitize_context(context: Map<String, Value>) -> Map<String, Value> {
    context
        .into_iter()
        .map(|(key, value)| (sanitize_text(&key), sanitize_value(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_markup_is_neutralized() {
        let clean = sanitize_text("  <script>alert('x')</script> eggs  ");
        assert!(!clean.contains('<'));
        assert!(!clean.contains('\''));
        assert!(clean.ends_with("eggs"));
        assert!(!clean.starts_with(' '));
    }

    #[test]
    fn test_length_is_capped() {
        let clean = sanitize_text(&"a".repeat(5000));
        assert_eq!(clean.chars().count(), MAX_INPUT_CHARS);
    }

    #[test]
    fn test_context_is_sanitized_recursively() {
        let Value::Object(map) = json!({
            "note": "<b>hi</b>",
            "nested": {"list": ["<i>", 3, {"deep": "\"q\""}]},
            "count": 2
        }) else {
            unreachable!()
        };
        let clean = Value::Object(sanitize_context(map));
        assert!(!clean.to_string().contains("<b>"));
        assert_eq!(clean["count"], 2);
        assert_eq!(clean["nested"]["list"][1], 3);
        assert!(!clean["nested"]["list"][2]["deep"]
            .as_str()
            .unwrap()
            .contains('"'));
    }
}
