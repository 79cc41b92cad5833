//! Marker payload encoding for virtual node attributes
//!
//! An open marker carries `qv ` followed by space separated tokens, each
//! either `key` (empty value) or `key=value`. Spaces inside values are
//! written as `+`.

use indexmap::IndexMap;

/// Replace every space with `+`.
pub fn escape(s: &str) -> String {
    s.replace(' ', "+")
}

/// Replace every `+` with a space.
pub fn unescape(s: &str) -> String {
    s.replace('+', " ")
}

/// Parse the attribute part of an open marker payload (the text after `qv `).
pub fn parse_virtual_attributes(s: &str) -> IndexMap<String, String> {
    s.split(' ')
        .filter(|token| !token.is_empty())
        .map(|token| match token.split_once('=') {
            Some((key, value)) => (key.to_string(), unescape(value)),
            None => (token.to_string(), String::new()),
        })
        .collect()
}

/// Encode attributes into the text that follows `qv ` in an open marker.
pub fn serialize_virtual_attributes(attributes: &IndexMap<String, String>) -> String {
    attributes
        .iter()
        .map(|(key, value)| {
            if value.is_empty() {
                key.clone()
            } else {
                format!("{}={}", key, escape(value))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
