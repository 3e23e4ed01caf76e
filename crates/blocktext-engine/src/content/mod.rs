//! Document content model.
//!
//! A document is an ordered sequence of [`Block`]s. A [`TextBlock`] carries a
//! style, optional list metadata, annotation payloads ([`MarkDef`]s) and an
//! ordered array of inline children. An [`ObjectBlock`] is an opaque typed
//! payload the core never looks inside.
//!
//! Every block and every text-block child carries a [`Key`], unique within its
//! parent array and stable across structural edits. Keys are the only identity
//! that survives an edit; numeric positions are invalidated by any structural
//! change.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identity for a block or an inline child.
///
/// Keys are opaque strings, unique within their parent array. They survive
/// structural edits unless explicitly reassigned (unsetting a block's
/// `list_item` is the one operation that reassigns).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(String);

impl Key {
    pub fn new(key: impl Into<String>) -> Self {
        Key(key.into())
    }

    /// Generate a fresh random key.
    pub fn random() -> Self {
        Key(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key(s.to_string())
    }
}

/// Top-level document node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Block {
    Text(TextBlock),
    Object(ObjectBlock),
}

impl Block {
    pub fn key(&self) -> &Key {
        match self {
            Block::Text(b) => &b.key,
            Block::Object(b) => &b.key,
        }
    }

    pub fn as_text(&self) -> Option<&TextBlock> {
        match self {
            Block::Text(b) => Some(b),
            Block::Object(_) => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextBlock> {
        match self {
            Block::Text(b) => Some(b),
            Block::Object(_) => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectBlock> {
        match self {
            Block::Text(_) => None,
            Block::Object(b) => Some(b),
        }
    }

    /// Clone this block with fresh keys on the block and all children.
    ///
    /// Used when content is duplicated into the same document (paste over,
    /// drop of a copy) so key uniqueness within the parent array holds.
    pub fn with_fresh_keys(&self) -> Block {
        match self {
            Block::Text(b) => {
                let mut clone = b.clone();
                clone.key = Key::random();
                for child in &mut clone.children {
                    match child {
                        Child::Span(s) => s.key = Key::random(),
                        Child::InlineObject(o) => o.key = Key::random(),
                    }
                }
                Block::Text(clone)
            }
            Block::Object(b) => {
                let mut clone = b.clone();
                clone.key = Key::random();
                Block::Object(clone)
            }
        }
    }
}

/// Styled block with inline children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(rename = "_key")]
    pub key: Key,
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(rename = "listItem", default, skip_serializing_if = "Option::is_none")]
    pub list_item: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    /// Annotation payloads scoped to this block, referenced from span marks.
    #[serde(rename = "markDefs", default, skip_serializing_if = "Vec::is_empty")]
    pub mark_defs: Vec<MarkDef>,
    pub children: Vec<Child>,
}

fn default_style() -> String {
    "normal".to_string()
}

impl TextBlock {
    /// A plain block with one unmarked span.
    pub fn new(text: impl Into<String>) -> Self {
        TextBlock {
            key: Key::random(),
            style: default_style(),
            list_item: None,
            level: None,
            mark_defs: Vec::new(),
            children: vec![Child::Span(Span::new(text))],
        }
    }

    pub fn with_children(children: Vec<Child>) -> Self {
        TextBlock {
            key: Key::random(),
            style: default_style(),
            list_item: None,
            level: None,
            mark_defs: Vec::new(),
            children,
        }
    }

    /// Concatenated text of all spans.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(Child::as_span)
            .map(|s| s.text.as_str())
            .collect()
    }

    pub fn child_index(&self, key: &Key) -> Option<usize> {
        self.children.iter().position(|c| c.key() == key)
    }

    pub fn child(&self, key: &Key) -> Option<&Child> {
        self.children.iter().find(|c| c.key() == key)
    }

    pub fn mark_def(&self, key: &str) -> Option<&MarkDef> {
        self.mark_defs.iter().find(|d| d.key.as_str() == key)
    }
}

/// Inline child of a text block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Child {
    Span(Span),
    InlineObject(InlineObject),
}

impl Child {
    pub fn key(&self) -> &Key {
        match self {
            Child::Span(s) => &s.key,
            Child::InlineObject(o) => &o.key,
        }
    }

    pub fn as_span(&self) -> Option<&Span> {
        match self {
            Child::Span(s) => Some(s),
            Child::InlineObject(_) => None,
        }
    }

    pub fn as_span_mut(&mut self) -> Option<&mut Span> {
        match self {
            Child::Span(s) => Some(s),
            Child::InlineObject(_) => None,
        }
    }

    /// Caret length of this child: spans measure in chars, inline objects
    /// occupy a single caret position.
    pub fn len(&self) -> usize {
        match self {
            Child::Span(s) => s.len(),
            Child::InlineObject(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Child::Span(s) if s.text.is_empty())
    }
}

/// Text run carrying literal text and a set of marks.
///
/// A mark is either a decorator name (declared in the schema) or the key of a
/// [`MarkDef`] on the owning block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    #[serde(rename = "_key")]
    pub key: Key,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<String>,
}

impl Span {
    pub fn new(text: impl Into<String>) -> Self {
        Span {
            key: Key::random(),
            text: text.into(),
            marks: Vec::new(),
        }
    }

    pub fn with_marks(text: impl Into<String>, marks: Vec<String>) -> Self {
        Span {
            key: Key::random(),
            text: text.into(),
            marks,
        }
    }

    /// Length in chars. Offsets throughout the crate count chars, not bytes.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn has_mark(&self, mark: &str) -> bool {
        self.marks.iter().any(|m| m == mark)
    }
}

/// Opaque non-text inline child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineObject {
    #[serde(rename = "_key")]
    pub key: Key,
    #[serde(rename = "_type")]
    pub object_type: String,
    #[serde(flatten)]
    pub value: serde_json::Map<String, serde_json::Value>,
}

impl InlineObject {
    pub fn new(object_type: impl Into<String>, value: serde_json::Map<String, serde_json::Value>) -> Self {
        InlineObject {
            key: Key::random(),
            object_type: object_type.into(),
            value,
        }
    }
}

/// Opaque typed block payload with no children meaningful to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectBlock {
    #[serde(rename = "_key")]
    pub key: Key,
    #[serde(rename = "_type")]
    pub object_type: String,
    #[serde(flatten)]
    pub value: serde_json::Map<String, serde_json::Value>,
}

impl ObjectBlock {
    pub fn new(object_type: impl Into<String>, value: serde_json::Map<String, serde_json::Value>) -> Self {
        ObjectBlock {
            key: Key::random(),
            object_type: object_type.into(),
            value,
        }
    }
}

/// Annotation payload scoped to its owning text block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkDef {
    #[serde(rename = "_key")]
    pub key: Key,
    #[serde(rename = "_type")]
    pub kind: String,
    #[serde(flatten)]
    pub value: serde_json::Map<String, serde_json::Value>,
}

impl MarkDef {
    pub fn new(kind: impl Into<String>, value: serde_json::Map<String, serde_json::Value>) -> Self {
        MarkDef {
            key: Key::random(),
            kind: kind.into(),
            value,
        }
    }
}

/// Byte offset of the `chars`-th char of `s`, clamped to the string length.
pub(crate) fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map(|(i, _)| i).unwrap_or(s.len())
}

/// Split a string at a char offset.
pub(crate) fn split_text(s: &str, chars: usize) -> (String, String) {
    let at = byte_offset(s, chars);
    (s[..at].to_string(), s[at..].to_string())
}
