//! Editing events.
//!
//! Two tiers share one dispatchable [`Event`] type:
//!
//! - **Synthetic events** express editing intent (insert text, toggle a
//!   decorator, paste). Default behaviors always rewrite them into the
//!   terminal tier; an unhandled synthetic event is a no-op by design.
//! - **Terminal events** ([`Mutation`], wrapped in [`Event::Primitive`]) are
//!   the fixed vocabulary the cascade bottoms out at. They are handed to the
//!   external mutation executor and never re-raised.
//!
//! Dispatch matches on [`EventKind`] / [`EventFamily`] discriminants rather
//! than string prefixes, so wildcard registrations become explicit family
//! matches at registration time.

use crate::content::{Block, Child, Key, MarkDef};
use crate::converters::TransferItem;
use crate::selection::{Point, Selection};

/// Where inserted blocks land relative to the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPlacement {
    /// Split the focus text block at the caret so the content lands between
    /// the two halves.
    Auto,
    Before,
    After,
}

/// Caret placement after an insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectPosition {
    Start,
    End,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteDirection {
    Backward,
    Forward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextUnit {
    Character,
    Word,
    Block,
}

/// What a terminal delete removes: an explicit range, or a unit relative to
/// the current selection.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteTarget {
    Selection(Selection),
    Unit {
        direction: DeleteDirection,
        unit: TextUnit,
    },
}

/// Position for a terminal single-block insertion. `ref_key: None` means the
/// document edge on the given side.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertBlockAt {
    pub ref_key: Option<Key>,
    pub placement: BlockPlacement,
}

impl InsertBlockAt {
    pub fn before(key: Key) -> Self {
        InsertBlockAt {
            ref_key: Some(key),
            placement: BlockPlacement::Before,
        }
    }

    pub fn after(key: Key) -> Self {
        InsertBlockAt {
            ref_key: Some(key),
            placement: BlockPlacement::After,
        }
    }

    pub fn document_end() -> Self {
        InsertBlockAt {
            ref_key: None,
            placement: BlockPlacement::After,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockPlacement {
    Before,
    After,
}

/// Partial update of a text or object block. `None` fields are untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockPatch {
    pub style: Option<String>,
    pub list_item: Option<String>,
    pub level: Option<u32>,
    pub children: Option<Vec<Child>>,
    pub mark_defs: Option<Vec<MarkDef>>,
    pub value: Option<serde_json::Map<String, serde_json::Value>>,
}

impl BlockPatch {
    pub fn children(children: Vec<Child>) -> Self {
        BlockPatch {
            children: Some(children),
            ..Default::default()
        }
    }

    pub fn style(style: impl Into<String>) -> Self {
        BlockPatch {
            style: Some(style.into()),
            ..Default::default()
        }
    }
}

/// Block properties a [`Mutation::BlockUnset`] can clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockProp {
    Style,
    ListItem,
    Level,
}

/// Partial update of an inline child.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChildPatch {
    pub text: Option<String>,
    pub marks: Option<Vec<String>>,
    pub value: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Child properties a [`Mutation::ChildUnset`] can clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildProp {
    Marks,
}

/// Terminal mutation vocabulary, applied by the external executor.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    BlockSet { key: Key, patch: BlockPatch },
    BlockUnset { key: Key, props: Vec<BlockProp> },
    ChildSet { block: Key, key: Key, patch: ChildPatch },
    ChildUnset { block: Key, key: Key, props: Vec<ChildProp> },
    InsertBlock { block: Block, at: InsertBlockAt },
    Delete { target: DeleteTarget },
    DeleteBlock { key: Key },
    Select { selection: Option<Selection> },
    SelectBlock { key: Key },
    MoveBlockUp { key: Key },
    MoveBlockDown { key: Key },
    Undo,
    Redo,
}

impl Mutation {
    pub fn kind(&self) -> EventKind {
        match self {
            Mutation::BlockSet { .. } => EventKind::BlockSet,
            Mutation::BlockUnset { .. } => EventKind::BlockUnset,
            Mutation::ChildSet { .. } => EventKind::ChildSet,
            Mutation::ChildUnset { .. } => EventKind::ChildUnset,
            Mutation::InsertBlock { .. } => EventKind::InsertBlock,
            Mutation::Delete { .. } => EventKind::Delete,
            Mutation::DeleteBlock { .. } => EventKind::DeleteBlock,
            Mutation::Select { .. } => EventKind::Select,
            Mutation::SelectBlock { .. } => EventKind::SelectBlock,
            Mutation::MoveBlockUp { .. } => EventKind::MoveBlockUp,
            Mutation::MoveBlockDown { .. } => EventKind::MoveBlockDown,
            Mutation::Undo => EventKind::Undo,
            Mutation::Redo => EventKind::Redo,
        }
    }

    /// Whether applying this mutation can change document content (as
    /// opposed to only the selection or history).
    pub fn changes_content(&self) -> bool {
        !matches!(
            self,
            Mutation::Select { .. } | Mutation::SelectBlock { .. } | Mutation::Undo | Mutation::Redo
        )
    }
}

/// A dispatchable editing event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    InsertText {
        text: String,
    },
    InsertSoftBreak,
    InsertBreak,
    Split,
    InsertBlocks {
        blocks: Vec<Block>,
        placement: InsertPlacement,
        select: SelectPosition,
    },
    InsertChild {
        child: Child,
    },
    InsertSpan {
        text: String,
        marks: Vec<String>,
    },
    InsertInlineObject {
        object_type: String,
        value: serde_json::Map<String, serde_json::Value>,
    },
    AnnotationAdd {
        annotation: String,
        value: serde_json::Map<String, serde_json::Value>,
    },
    AnnotationRemove {
        annotation: String,
    },
    DecoratorAdd {
        decorator: String,
    },
    DecoratorRemove {
        decorator: String,
    },
    DecoratorToggle {
        decorator: String,
    },
    ListItemAdd {
        list_item: String,
    },
    ListItemRemove {
        list_item: String,
    },
    ListItemToggle {
        list_item: String,
    },
    StyleAdd {
        style: String,
    },
    StyleRemove {
        style: String,
    },
    StyleToggle {
        style: String,
    },
    Copy,
    Cut,
    Paste {
        items: Vec<TransferItem>,
    },
    DragStart {
        origin: Selection,
    },
    DragOver {
        target: Point,
    },
    Drop {
        origin: Selection,
        target: Point,
    },
    Serialize,
    Deserialize {
        items: Vec<TransferItem>,
    },
    DeserializeFailure {
        reason: String,
    },
    Primitive(Mutation),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::InsertText { .. } => EventKind::InsertText,
            Event::InsertSoftBreak => EventKind::InsertSoftBreak,
            Event::InsertBreak => EventKind::InsertBreak,
            Event::Split => EventKind::Split,
            Event::InsertBlocks { .. } => EventKind::InsertBlocks,
            Event::InsertChild { .. } => EventKind::InsertChild,
            Event::InsertSpan { .. } => EventKind::InsertSpan,
            Event::InsertInlineObject { .. } => EventKind::InsertInlineObject,
            Event::AnnotationAdd { .. } => EventKind::AnnotationAdd,
            Event::AnnotationRemove { .. } => EventKind::AnnotationRemove,
            Event::DecoratorAdd { .. } => EventKind::DecoratorAdd,
            Event::DecoratorRemove { .. } => EventKind::DecoratorRemove,
            Event::DecoratorToggle { .. } => EventKind::DecoratorToggle,
            Event::ListItemAdd { .. } => EventKind::ListItemAdd,
            Event::ListItemRemove { .. } => EventKind::ListItemRemove,
            Event::ListItemToggle { .. } => EventKind::ListItemToggle,
            Event::StyleAdd { .. } => EventKind::StyleAdd,
            Event::StyleRemove { .. } => EventKind::StyleRemove,
            Event::StyleToggle { .. } => EventKind::StyleToggle,
            Event::Copy => EventKind::Copy,
            Event::Cut => EventKind::Cut,
            Event::Paste { .. } => EventKind::Paste,
            Event::DragStart { .. } => EventKind::DragStart,
            Event::DragOver { .. } => EventKind::DragOver,
            Event::Drop { .. } => EventKind::Drop,
            Event::Serialize => EventKind::Serialize,
            Event::Deserialize { .. } => EventKind::Deserialize,
            Event::DeserializeFailure { .. } => EventKind::DeserializeFailure,
            Event::Primitive(m) => m.kind(),
        }
    }

    /// The terminal mutation this event carries, if it is primitive.
    pub fn as_mutation(&self) -> Option<&Mutation> {
        match self {
            Event::Primitive(m) => Some(m),
            _ => None,
        }
    }
}

impl From<Mutation> for Event {
    fn from(m: Mutation) -> Self {
        Event::Primitive(m)
    }
}

/// Fieldless discriminant for exact pattern matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    InsertText,
    InsertSoftBreak,
    InsertBreak,
    Split,
    InsertBlocks,
    InsertChild,
    InsertSpan,
    InsertInlineObject,
    AnnotationAdd,
    AnnotationRemove,
    DecoratorAdd,
    DecoratorRemove,
    DecoratorToggle,
    ListItemAdd,
    ListItemRemove,
    ListItemToggle,
    StyleAdd,
    StyleRemove,
    StyleToggle,
    Copy,
    Cut,
    Paste,
    DragStart,
    DragOver,
    Drop,
    Serialize,
    Deserialize,
    DeserializeFailure,
    // Terminal kinds
    BlockSet,
    BlockUnset,
    ChildSet,
    ChildUnset,
    InsertBlock,
    Delete,
    DeleteBlock,
    Select,
    SelectBlock,
    MoveBlockUp,
    MoveBlockDown,
    Undo,
    Redo,
}

impl EventKind {
    pub fn family(self) -> EventFamily {
        use EventKind::*;
        match self {
            InsertText | InsertSoftBreak | InsertBreak | Split | InsertBlocks | InsertChild
            | InsertSpan | InsertInlineObject | InsertBlock => EventFamily::Insert,
            Delete | DeleteBlock => EventFamily::Delete,
            AnnotationAdd | AnnotationRemove => EventFamily::Annotation,
            DecoratorAdd | DecoratorRemove | DecoratorToggle => EventFamily::Decorator,
            ListItemAdd | ListItemRemove | ListItemToggle => EventFamily::ListItem,
            StyleAdd | StyleRemove | StyleToggle => EventFamily::Style,
            Copy | Cut | Paste => EventFamily::Clipboard,
            DragStart | DragOver | Drop => EventFamily::Drag,
            Serialize | Deserialize | DeserializeFailure => EventFamily::Serialization,
            Select | SelectBlock => EventFamily::Selection,
            BlockSet | BlockUnset | MoveBlockUp | MoveBlockDown => EventFamily::Block,
            ChildSet | ChildUnset => EventFamily::Child,
            Undo | Redo => EventFamily::History,
        }
    }

    /// Terminal kinds bottom out at the mutation executor instead of being
    /// dropped when no behavior claims them.
    pub fn is_primitive(self) -> bool {
        use EventKind::*;
        matches!(
            self,
            BlockSet
                | BlockUnset
                | ChildSet
                | ChildUnset
                | InsertBlock
                | Delete
                | DeleteBlock
                | Select
                | SelectBlock
                | MoveBlockUp
                | MoveBlockDown
                | Undo
                | Redo
        )
    }
}

/// Wildcard grouping of event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventFamily {
    Insert,
    Delete,
    Annotation,
    Decorator,
    ListItem,
    Style,
    Clipboard,
    Drag,
    Serialization,
    Selection,
    Block,
    Child,
    History,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_kinds_are_exactly_the_mutation_kinds() {
        assert!(EventKind::Delete.is_primitive());
        assert!(EventKind::Undo.is_primitive());
        assert!(!EventKind::InsertText.is_primitive());
        assert!(!EventKind::Paste.is_primitive());
    }

    #[test]
    fn wrapped_mutation_reports_its_own_kind() {
        let event = Event::from(Mutation::DeleteBlock { key: "b1".into() });
        assert_eq!(event.kind(), EventKind::DeleteBlock);
        assert_eq!(event.kind().family(), EventFamily::Delete);
        assert!(event.as_mutation().is_some());
    }

    #[test]
    fn families_group_related_intents() {
        assert_eq!(EventKind::InsertText.family(), EventFamily::Insert);
        assert_eq!(EventKind::InsertBlock.family(), EventFamily::Insert);
        assert_eq!(EventKind::Cut.family(), EventFamily::Clipboard);
        assert_eq!(EventKind::DeserializeFailure.family(), EventFamily::Serialization);
    }
}
