//! Immutable per-dispatch view of editor state.
//!
//! A [`Snapshot`] bundles the schema descriptor, the document value, the
//! selection, pending decorator overrides, the converter registry and the
//! derived block index. The host captures one per external state change and
//! every guard and action in a dispatch cascade observes that same snapshot;
//! the document itself is only mutated after the cascade resolves.
//!
//! The one sanctioned exception is [`Snapshot::with_selection`]: a behavior
//! may deliberately construct an *adjusted* snapshot (same document,
//! substituted selection) to reuse selectors against a hypothetical range.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::content::Block;
use crate::converters::ConverterRegistry;
use crate::schema::Schema;
use crate::selection::{BlockIndexMap, Selection, convert, slice};

#[derive(Clone)]
pub struct Snapshot {
    pub schema: Arc<Schema>,
    pub value: Arc<Vec<Block>>,
    pub selection: Option<Selection>,
    /// Pending decorator toggles at a collapsed caret, keyed by decorator
    /// name; `true` forces the decorator on for the next insertion, `false`
    /// forces it off.
    pub decorator_overrides: BTreeMap<String, bool>,
    pub converters: Arc<ConverterRegistry>,
    /// Derived key index, rebuilt with the snapshot. Never a source of
    /// truth; consumers fall back to scanning `value` on a miss.
    pub index: Arc<BlockIndexMap>,
}

impl Snapshot {
    pub fn new(
        schema: Arc<Schema>,
        value: Arc<Vec<Block>>,
        selection: Option<Selection>,
        decorator_overrides: BTreeMap<String, bool>,
        converters: Arc<ConverterRegistry>,
    ) -> Self {
        let index = Arc::new(BlockIndexMap::build(&value));
        Snapshot {
            schema,
            value,
            selection,
            decorator_overrides,
            converters,
            index,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.value
    }

    /// The adjusted-snapshot technique: same document, substituted
    /// selection, shared index.
    pub fn with_selection(&self, selection: Option<Selection>) -> Snapshot {
        Snapshot {
            selection,
            ..self.clone()
        }
    }

    /// Current selection resolved to the indexed flavor, if it still
    /// applies to the value.
    pub fn indexed_selection(&self) -> Option<Selection> {
        let selection = self.selection.as_ref()?;
        convert::selection_to_indexed(&self.value, &self.index, selection)
    }

    /// Current selection resolved to the keyed flavor.
    pub fn keyed_selection(&self) -> Option<Selection> {
        let selection = self.selection.as_ref()?;
        convert::selection_to_keyed(&self.value, selection)
    }

    /// The blocks covered by the current selection, boundary spans
    /// truncated.
    pub fn slice_selection(&self) -> Vec<Block> {
        match &self.selection {
            Some(selection) => slice::slice(&self.value, &self.index, selection),
            None => Vec::new(),
        }
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("blocks", &self.value.len())
            .field("selection", &self.selection)
            .field("decorator_overrides", &self.decorator_overrides)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::TextBlock;
    use crate::selection::Point;

    fn snapshot_of(texts: &[&str], selection: Option<Selection>) -> Snapshot {
        let value: Vec<Block> = texts
            .iter()
            .map(|t| Block::Text(TextBlock::new(*t)))
            .collect();
        Snapshot::new(
            Arc::new(Schema::default()),
            Arc::new(value),
            selection,
            BTreeMap::new(),
            Arc::new(ConverterRegistry::standard()),
        )
    }

    #[test]
    fn with_selection_substitutes_only_the_selection() {
        let snap = snapshot_of(&["one", "two"], None);
        let adjusted =
            snap.with_selection(Some(Selection::collapsed(Point::indexed(1, Some(0), 0))));
        assert!(snap.selection.is_none());
        assert!(adjusted.selection.is_some());
        assert!(Arc::ptr_eq(&snap.value, &adjusted.value));
        assert!(Arc::ptr_eq(&snap.index, &adjusted.index));
    }

    #[test]
    fn stale_selection_resolves_to_none() {
        let snap = snapshot_of(
            &["one"],
            Some(Selection::collapsed(Point::keyed("gone", None, 0))),
        );
        assert!(snap.indexed_selection().is_none());
        assert!(snap.slice_selection().is_empty());
    }
}
