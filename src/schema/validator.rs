//! Recursive schema verification.

use serde_json::Value;
use thiserror::Error;

use crate::schema::flags::TypeFlags;
use crate::schema::{DataTree, Schema, SchemaNode};

/// A data tree that does not conform to its schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("API request parameter '{0}' missing.")]
    MissingField(String),

    #[error("Invalid type '{found}' for '{field}'.")]
    TypeMismatch { field: String, found: &'static str },

    #[error("Invalid type '{found}' for '{field}'. Expected an object.")]
    InvalidType { field: String, found: &'static str },

    #[error("Invalid empty data for '{0}'.")]
    EmptyValueRejected(String),

    #[error("Extra keys in API request: {}.", .0.join(", "))]
    ExtraKeys(Vec<String>),
}

/// Verify `data` against `schema`.
///
/// In strict mode keys of `data` missing from `schema` are rejected at every
/// nesting level.
pub fn verify(data: &DataTree, schema: &Schema, strict: bool) -> Result<(), SchemaViolation> {
    verify_at(data, schema, strict, "")
}

fn verify_at(
    data: &DataTree,
    schema: &Schema,
    strict: bool,
    prefix: &str,
) -> Result<(), SchemaViolation> {
    for (key, node) in schema.iter() {
        let path = join(prefix, key);
        let value = match data.get(key) {
            Some(v) => v,
            None => match node {
                SchemaNode::Leaf(flags) if flags.is_optional() => continue,
                _ => return Err(SchemaViolation::MissingField(path)),
            },
        };

        match node {
            SchemaNode::Nested(inner) => match value {
                Value::Object(map) => verify_at(map, inner, strict, &path)?,
                other => {
                    return Err(SchemaViolation::InvalidType {
                        field: path,
                        found: type_name(other),
                    })
                }
            },
            SchemaNode::Leaf(flags) => {
                check_type(value, flags, &path)?;
                check_data(value, flags, &path)?;
            }
        }
    }

    if strict {
        let extra: Vec<String> = data
            .keys()
            .filter(|k| !schema.contains(k))
            .map(|k| join(prefix, k))
            .collect();
        if !extra.is_empty() {
            return Err(SchemaViolation::ExtraKeys(extra));
        }
    }

    Ok(())
}

fn check_type(value: &Value, flags: &TypeFlags, path: &str) -> Result<(), SchemaViolation> {
    if flags.accepts(value) {
        Ok(())
    } else {
        Err(SchemaViolation::TypeMismatch {
            field: path.to_string(),
            found: type_name(value),
        })
    }
}

fn check_data(value: &Value, flags: &TypeFlags, path: &str) -> Result<(), SchemaViolation> {
    match value {
        Value::String(s) if s.is_empty() && !flags.allows_empty_str() => {
            Err(SchemaViolation::EmptyValueRejected(path.to_string()))
        }
        _ => Ok(()),
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

/// Runtime type name used in error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
