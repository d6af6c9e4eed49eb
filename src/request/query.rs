//! Query string decoding.
//!
//! Values are always strings. A `key[]` parameter collects its values into an
//! array of strings; a repeated plain key keeps the last value.

use serde_json::Value;

use crate::schema::DataTree;

/// Decode a raw query string into a data tree.
pub fn parse_query(raw: Option<&str>) -> DataTree {
    let mut tree = DataTree::new();
    let Some(raw) = raw else {
        return tree;
    };

    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        match key.strip_suffix("[]") {
            Some(name) if !name.is_empty() => {
                let entry = tree
                    .entry(name.to_string())
                    .or_insert_with(|| Value::Array(Vec::new()));
                match entry {
                    Value::Array(items) => items.push(Value::String(value.into_owned())),
                    other => *other = Value::Array(vec![Value::String(value.into_owned())]),
                }
            }
            _ => {
                tree.insert(key.into_owned(), Value::String(value.into_owned()));
            }
        }
    }
    tree
}
