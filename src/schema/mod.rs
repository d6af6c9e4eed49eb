//! Declarative request schemas.
//!
//! # Data Flow
//! ```text
//! endpoint config (TOML/JSON)
//!     → spec.rs (flag names → TypeFlags, tables → nested Schema)
//!     → Schema (immutable, owned by EndpointDescriptor)
//!
//! per request:
//!     DataTree + Schema + strict flag
//!     → validator.rs (single recursive visitor)
//!     → Ok(()) | SchemaViolation
//! ```
//!
//! # Design Decisions
//! - Accepted kinds are an explicit enum set, modifiers are plain booleans
//! - Validation is a pure function over borrowed inputs
//! - Nested field names are reported as dotted paths

pub mod flags;
pub mod spec;
pub mod validator;

use std::collections::BTreeMap;

use serde_json::{Map, Value};

pub use flags::{Kind, KindSet, TypeFlags};
pub use spec::SchemaSpec;
pub use validator::{verify, SchemaViolation};

/// Parsed request payload: field name to dynamically typed value.
pub type DataTree = Map<String, Value>;

/// One entry of a schema: either a typed leaf or a nested subtree.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Leaf(TypeFlags),
    Nested(Schema),
}

/// Expected shape of a data tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: BTreeMap<String, SchemaNode>,
}

impl Schema {
    /// An empty schema. Under strict mode it only accepts empty trees.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a leaf field.
    pub fn field(mut self, name: impl Into<String>, flags: TypeFlags) -> Self {
        self.fields.insert(name.into(), SchemaNode::Leaf(flags));
        self
    }

    /// Add a nested subtree.
    pub fn nested(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.fields.insert(name.into(), SchemaNode::Nested(schema));
        self
    }

    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SchemaNode)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
