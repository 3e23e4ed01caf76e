//! Schema descriptor.
//!
//! A read-only description of what a document configuration allows: block
//! styles, decorator names, annotation types, object types and list variants.
//! Supplied once per document and never written to by the core. Compilation
//! from a user-facing schema definition happens outside this crate.

use serde::{Deserialize, Serialize};

/// Kinds a schema field can take. The core never interprets field values, it
/// only carries the descriptor for guards that want to introspect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        FieldDef {
            name: name.into(),
            kind,
        }
    }
}

/// A named object-ish schema member: an annotation, block object or inline
/// object type, with its declared fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDef>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        ObjectType {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_fields(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        ObjectType {
            name: name.into(),
            fields,
        }
    }
}

/// The schema descriptor consumed by guards and default behaviors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub styles: Vec<String>,
    pub decorators: Vec<String>,
    pub annotations: Vec<ObjectType>,
    pub block_objects: Vec<ObjectType>,
    pub inline_objects: Vec<ObjectType>,
    pub lists: Vec<String>,
}

impl Schema {
    pub fn has_style(&self, style: &str) -> bool {
        self.styles.iter().any(|s| s == style)
    }

    pub fn has_decorator(&self, decorator: &str) -> bool {
        self.decorators.iter().any(|d| d == decorator)
    }

    pub fn has_list(&self, list: &str) -> bool {
        self.lists.iter().any(|l| l == list)
    }

    pub fn annotation(&self, name: &str) -> Option<&ObjectType> {
        self.annotations.iter().find(|a| a.name == name)
    }

    pub fn block_object(&self, name: &str) -> Option<&ObjectType> {
        self.block_objects.iter().find(|o| o.name == name)
    }

    pub fn inline_object(&self, name: &str) -> Option<&ObjectType> {
        self.inline_objects.iter().find(|o| o.name == name)
    }
}

impl Default for Schema {
    /// The standard configuration: paragraph and heading styles, the common
    /// decorator set, a `link` annotation, bullet and numbered lists.
    fn default() -> Self {
        Schema {
            styles: ["normal", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote"]
                .into_iter()
                .map(String::from)
                .collect(),
            decorators: ["strong", "em", "code", "underline", "strike-through"]
                .into_iter()
                .map(String::from)
                .collect(),
            annotations: vec![ObjectType::with_fields(
                "link",
                vec![FieldDef::new("href", FieldKind::String)],
            )],
            block_objects: Vec::new(),
            inline_objects: Vec::new(),
            lists: vec!["bullet".to_string(), "number".to_string()],
        }
    }
}
