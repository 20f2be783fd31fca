//! Flattening of nested JSON documents into property maps
//!
//! Nested objects become dotted keys (`database.url`), array entries become
//! indexed keys (`hosts[0]`). Strings are kept verbatim, other scalars are
//! stringified and `null` values produce no entry: a key whose value is `null`
//! is absent from the result, so it neither shows up when iterating nor
//! answers `contains_key`.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Flatten a JSON object into a single-level map of string properties
pub fn flatten(source: &Map<String, Value>) -> BTreeMap<String, String> {
    let mut result = BTreeMap::new();
    flatten_map("", source, &mut result);
    result
}

fn flatten_map(prefix: &str, source: &Map<String, Value>, result: &mut BTreeMap<String, String>) {
    for (key, value) in source {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        flatten_element(path, value, result);
    }
}

fn flatten_element(path: String, value: &Value, result: &mut BTreeMap<String, String>) {
    match value {
        Value::Object(map) => flatten_map(&path, map, result),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_element(format!("{}[{}]", path, index), item, result);
            }
        }
        Value::String(s) => {
            result.insert(path, s.clone());
        }
        Value::Number(n) => {
            result.insert(path, n.to_string());
        }
        Value::Bool(b) => {
            result.insert(path, b.to_string());
        }
        Value::Null => {}
    }
}
