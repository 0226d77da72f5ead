//! The generic, untyped schema node and the value coercions mapping parsers share.

use serde_json::Value;

use crate::errors::{MapperError, MapperResult};

/// An insertion-ordered mapping of string keys to arbitrary values.
///
/// This is the shape a field's configuration takes when read from or written to
/// persisted mapping storage.
pub type SchemaNode = serde_json::Map<String, Value>;

/// The reserved key naming a field's type.
pub const TYPE_KEY: &str = "type";

/// Renders a node value the way a mapping author would have written it: strings
/// verbatim, everything else in its JSON form.
pub fn node_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Lenient boolean: `true` or a case-insensitive `"true"` string, anything else is `false`.
pub fn node_boolean(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        other => node_to_string(other).eq_ignore_ascii_case("true"),
    }
}

/// Parses a 32-bit integer from a number or a string node.
pub fn node_integer(field: &str, key: &str, value: &Value) -> MapperResult<i32> {
    let raw = node_to_string(value);
    raw.trim().parse::<i32>().map_err(|_| {
        MapperError::invalid_argument(field, format!("failed to parse [{key}]: [{raw}] is not a valid integer"))
    })
}

/// Reads a string node or a list of string nodes into a vector.
pub fn node_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(node_to_string).collect(),
        Value::Null => Vec::new(),
        other => vec![node_to_string(other)],
    }
}
