//! Schema declarations as they appear in configuration files.
//!
//! A leaf is a flag name or a list of flag names, a table is a nested schema:
//!
//! ```toml
//! [endpoints.options.format_body]
//! name = "str"
//! age = ["int", "opt"]
//!
//! [endpoints.options.format_body.address]
//! city = ["str", "empty_str_ok"]
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::flags::TypeFlags;
use crate::schema::Schema;

/// Uncompiled schema declaration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SchemaSpec(pub BTreeMap<String, NodeSpec>);

/// Uncompiled schema entry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum NodeSpec {
    Flag(String),
    Flags(Vec<String>),
    Nested(SchemaSpec),
}

impl SchemaSpec {
    /// Compile into a `Schema`, resolving flag names.
    ///
    /// Errors name the offending field as a dotted path.
    pub fn compile(&self) -> Result<Schema, String> {
        self.compile_at("")
    }

    fn compile_at(&self, prefix: &str) -> Result<Schema, String> {
        let mut schema = Schema::new();
        for (name, node) in &self.0 {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", prefix, name)
            };
            schema = match node {
                NodeSpec::Flag(flag) => schema.field(name, leaf(&path, std::slice::from_ref(flag))?),
                NodeSpec::Flags(flags) => schema.field(name, leaf(&path, flags)?),
                NodeSpec::Nested(spec) => schema.nested(name, spec.compile_at(&path)?),
            };
        }
        Ok(schema)
    }
}

fn leaf(path: &str, names: &[String]) -> Result<TypeFlags, String> {
    let mut flags = TypeFlags::default();
    for name in names {
        let flag = parse_flag(name)
            .ok_or_else(|| format!("unknown type flag '{}' for '{}'", name, path))?;
        flags = flags | flag;
    }
    if flags.kinds().is_empty() {
        return Err(format!("field '{}' accepts no types", path));
    }
    Ok(flags)
}

/// Resolve one flag name.
pub fn parse_flag(name: &str) -> Option<TypeFlags> {
    let flags = match name {
        "str" => TypeFlags::STR,
        "int" => TypeFlags::INT,
        "float" => TypeFlags::FLOAT,
        "bool" => TypeFlags::BOOL,
        "null" => TypeFlags::NULL,
        "arr_str" => TypeFlags::ARR_STR,
        "arr_int" => TypeFlags::ARR_INT,
        "arr_float" => TypeFlags::ARR_FLOAT,
        "arr_bool" => TypeFlags::ARR_BOOL,
        "arr_mixed" => TypeFlags::ARR_MIXED,
        "arr_any" => TypeFlags::ARR_ANY,
        "scalar" => TypeFlags::SCALAR,
        "any" => TypeFlags::ANY,
        "opt" => TypeFlags::default().optional(),
        "empty_str_ok" => TypeFlags::default().empty_str_ok(),
        _ => return None,
    };
    Some(flags)
}
