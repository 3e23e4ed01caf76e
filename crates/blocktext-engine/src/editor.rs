//! Stateful editor facade.
//!
//! [`Editor`] owns the document value, the selection, the behavior engine
//! and the converter registry, and runs the full pipeline for each incoming
//! event: capture a snapshot, resolve the cascade, then apply the resulting
//! mutations in order. Host side effects (clipboard, drag origin, pending
//! decorator overrides) accumulate on an internal [`HostState`].

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::apply::{ApplyError, apply};
use crate::behavior::{Behavior, Engine, EngineError, Host};
use crate::content::{Block, Key};
use crate::converters::{ConverterRegistry, TransferItem};
use crate::event::{Event, Mutation};
use crate::schema::Schema;
use crate::selection::Selection;
use crate::selectors::insertion_marks;
use crate::snapshot::Snapshot;

const MAX_HISTORY: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Apply(#[from] ApplyError),
}

/// What one dispatch did to the editor.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    /// Keys of the blocks whose content changed, in application order.
    pub changed: Vec<Key>,
    /// Selection after the dispatch.
    pub selection: Option<Selection>,
    /// Monotonic state version; bumps once per dispatch that produced
    /// mutations.
    pub version: u64,
}

/// Accumulated host-side state: everything behaviors affect through
/// [`Host`] effects rather than through the document value.
#[derive(Debug, Default)]
pub struct HostState {
    /// Decorators toggled at a collapsed caret since the last content
    /// change. The override direction is derived against the caret's
    /// inherited marks when the next snapshot is built.
    toggled: BTreeSet<String>,
    clipboard: Vec<TransferItem>,
    drag_origin: Option<Selection>,
    last_failure: Option<String>,
}

impl Host for HostState {
    fn toggle_decorator_override(&mut self, decorator: &str) {
        if !self.toggled.remove(decorator) {
            self.toggled.insert(decorator.to_string());
        }
    }

    fn set_clipboard(&mut self, items: Vec<TransferItem>) {
        self.clipboard = items;
    }

    fn set_drag_origin(&mut self, origin: Option<Selection>) {
        self.drag_origin = origin;
    }

    fn deserialize_failed(&mut self, reason: &str) {
        self.last_failure = Some(reason.to_string());
    }
}

pub struct Editor {
    schema: Arc<Schema>,
    value: Arc<Vec<Block>>,
    selection: Option<Selection>,
    engine: Engine,
    converters: Arc<ConverterRegistry>,
    version: u64,
    undo_stack: Vec<(Arc<Vec<Block>>, Option<Selection>)>,
    redo_stack: Vec<(Arc<Vec<Block>>, Option<Selection>)>,
    host: HostState,
}

impl Editor {
    /// An editor with the standard behaviors and converters.
    pub fn new(schema: Schema, value: Vec<Block>) -> Self {
        Editor {
            schema: Arc::new(schema),
            value: Arc::new(value),
            selection: None,
            engine: Engine::standard(),
            converters: Arc::new(ConverterRegistry::standard()),
            version: 0,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            host: HostState::default(),
        }
    }

    pub fn value(&self) -> &[Block] {
        &self.value
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn clipboard(&self) -> &[TransferItem] {
        &self.host.clipboard
    }

    pub fn drag_origin(&self) -> Option<&Selection> {
        self.host.drag_origin.as_ref()
    }

    /// Reason the most recent paste or drop could not be read, if any.
    pub fn last_failure(&self) -> Option<&str> {
        self.host.last_failure.as_deref()
    }

    /// Register an additional behavior. Higher priority than the standard
    /// set shadows it; equal priority runs after it.
    pub fn register_behavior(&mut self, behavior: Behavior) {
        self.engine.register(behavior);
    }

    pub fn set_converters(&mut self, converters: ConverterRegistry) {
        self.converters = Arc::new(converters);
    }

    /// Move the selection directly, outside the event pipeline. Pending
    /// decorator overrides do not survive a selection move.
    pub fn select(&mut self, selection: Option<Selection>) {
        self.selection = selection;
        self.host.toggled.clear();
    }

    /// The snapshot the next dispatch would observe.
    pub fn snapshot(&self) -> Snapshot {
        let base = Snapshot::new(
            self.schema.clone(),
            self.value.clone(),
            self.selection.clone(),
            Default::default(),
            self.converters.clone(),
        );
        if self.host.toggled.is_empty() {
            return base;
        }
        // Each pending toggle overrides against what the caret would
        // otherwise inherit.
        let baseline = insertion_marks(&base);
        let overrides = self
            .host
            .toggled
            .iter()
            .map(|name| (name.clone(), !baseline.contains(name)))
            .collect();
        Snapshot {
            decorator_overrides: overrides,
            ..base
        }
    }

    /// Run one event through the pipeline: snapshot, cascade, apply.
    pub fn dispatch(&mut self, event: Event) -> Result<Patch, EditorError> {
        let snap = self.snapshot();
        let mutations = self.engine.dispatch(&snap, event, &mut self.host)?;
        if mutations.is_empty() {
            return Ok(Patch {
                changed: Vec::new(),
                selection: self.selection.clone(),
                version: self.version,
            });
        }

        if mutations.iter().any(Mutation::changes_content) {
            self.undo_stack
                .push((self.value.clone(), self.selection.clone()));
            if self.undo_stack.len() > MAX_HISTORY {
                self.undo_stack.remove(0);
            }
            self.redo_stack.clear();
        }

        let mut changed = Vec::new();
        for mutation in &mutations {
            match mutation {
                Mutation::Undo => self.restore(true, &mut changed),
                Mutation::Redo => self.restore(false, &mut changed),
                _ => changed.extend(apply(
                    Arc::make_mut(&mut self.value),
                    &mut self.selection,
                    mutation,
                )?),
            }
        }

        if !changed.is_empty() {
            self.host.toggled.clear();
        }
        self.version += 1;
        Ok(Patch {
            changed,
            selection: self.selection.clone(),
            version: self.version,
        })
    }

    pub fn undo(&mut self) -> Result<Patch, EditorError> {
        self.dispatch(Event::from(Mutation::Undo))
    }

    pub fn redo(&mut self) -> Result<Patch, EditorError> {
        self.dispatch(Event::from(Mutation::Redo))
    }

    fn restore(&mut self, undo: bool, changed: &mut Vec<Key>) {
        let (from, to) = if undo {
            (&mut self.undo_stack, &mut self.redo_stack)
        } else {
            (&mut self.redo_stack, &mut self.undo_stack)
        };
        let Some((value, selection)) = from.pop() else {
            return;
        };
        to.push((self.value.clone(), self.selection.clone()));
        changed.extend(value.iter().map(|b| b.key().clone()));
        self.value = value;
        self.selection = selection;
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("blocks", &self.value.len())
            .field("selection", &self.selection)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Child, Span, TextBlock};
    use crate::selection::Point;
    use pretty_assertions::assert_eq;

    fn editor_with(text: &str) -> Editor {
        let block = Block::Text(TextBlock {
            key: Key::new("b1"),
            style: "normal".to_string(),
            list_item: None,
            level: None,
            mark_defs: Vec::new(),
            children: vec![Child::Span(Span {
                key: Key::new("s1"),
                text: text.to_string(),
                marks: Vec::new(),
            })],
        });
        Editor::new(Schema::default(), vec![block])
    }

    fn caret(offset: usize) -> Selection {
        Selection::collapsed(Point::keyed("b1", Some(Key::new("s1")), offset))
    }

    fn document_text(editor: &Editor) -> String {
        editor
            .value()
            .iter()
            .filter_map(Block::as_text)
            .map(TextBlock::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn typing_runs_the_full_pipeline() {
        let mut editor = editor_with("helo");
        editor.select(Some(caret(3)));
        let patch = editor
            .dispatch(Event::InsertText {
                text: "l".to_string(),
            })
            .unwrap();
        assert_eq!(document_text(&editor), "hello");
        assert_eq!(patch.changed, vec![Key::new("b1")]);
        assert_eq!(patch.version, 1);
        assert_eq!(editor.selection().unwrap().focus.offset, 4);
    }

    #[test]
    fn undo_and_redo_walk_the_history() {
        let mut editor = editor_with("ab");
        editor.select(Some(caret(2)));
        editor
            .dispatch(Event::InsertText {
                text: "c".to_string(),
            })
            .unwrap();
        editor
            .dispatch(Event::InsertText {
                text: "d".to_string(),
            })
            .unwrap();
        assert_eq!(document_text(&editor), "abcd");

        editor.undo().unwrap();
        assert_eq!(document_text(&editor), "abc");
        editor.undo().unwrap();
        assert_eq!(document_text(&editor), "ab");
        assert_eq!(editor.selection().unwrap().focus.offset, 2);

        editor.redo().unwrap();
        assert_eq!(document_text(&editor), "abc");
    }

    #[test]
    fn new_edits_clear_the_redo_stack() {
        let mut editor = editor_with("ab");
        editor.select(Some(caret(2)));
        editor
            .dispatch(Event::InsertText {
                text: "c".to_string(),
            })
            .unwrap();
        editor.undo().unwrap();
        editor
            .dispatch(Event::InsertText {
                text: "x".to_string(),
            })
            .unwrap();
        let patch = editor.redo().unwrap();
        assert!(patch.changed.is_empty());
        assert_eq!(document_text(&editor), "abx");
    }

    #[test]
    fn pending_decorator_override_shapes_the_next_insertion() {
        let mut editor = editor_with("hello");
        editor.select(Some(caret(5)));
        editor
            .dispatch(Event::DecoratorToggle {
                decorator: "strong".to_string(),
            })
            .unwrap();
        editor
            .dispatch(Event::InsertText {
                text: "!".to_string(),
            })
            .unwrap();
        let text = editor.value()[0].as_text().unwrap();
        assert_eq!(text.children.len(), 2);
        let strong = text.children[1].as_span().unwrap();
        assert_eq!(strong.text, "!");
        assert_eq!(strong.marks, vec!["strong".to_string()]);
    }

    #[test]
    fn a_double_toggle_cancels_the_override() {
        let mut editor = editor_with("hello");
        editor.select(Some(caret(5)));
        for _ in 0..2 {
            editor
                .dispatch(Event::DecoratorToggle {
                    decorator: "strong".to_string(),
                })
                .unwrap();
        }
        editor
            .dispatch(Event::InsertText {
                text: "!".to_string(),
            })
            .unwrap();
        let text = editor.value()[0].as_text().unwrap();
        assert_eq!(text.children.len(), 1);
        assert_eq!(text.children[0].as_span().unwrap().text, "hello!");
    }

    #[test]
    fn cut_fills_the_clipboard_and_deletes_the_range() {
        let mut editor = editor_with("hello");
        editor.select(Some(Selection::new(
            Point::keyed("b1", Some(Key::new("s1")), 0),
            Point::keyed("b1", Some(Key::new("s1")), 4),
        )));
        editor.dispatch(Event::Cut).unwrap();
        assert_eq!(document_text(&editor), "o");
        let plain = editor
            .clipboard()
            .iter()
            .find(|i| i.media_type == "text/plain")
            .unwrap();
        assert_eq!(plain.data, "hell");
    }

    #[test]
    fn stale_indexed_selection_dispatches_as_a_no_op() {
        let mut editor = editor_with("hello");
        editor.select(Some(Selection::new(
            Point::indexed(0, Some(0), 0),
            Point::indexed(5, Some(0), 1),
        )));
        let patch = editor
            .dispatch(Event::InsertText {
                text: "x".to_string(),
            })
            .unwrap();
        assert!(patch.changed.is_empty());
        assert_eq!(document_text(&editor), "hello");
    }

    #[test]
    fn selection_only_dispatch_keeps_the_history_clean() {
        let mut editor = editor_with("ab");
        editor.select(Some(caret(0)));
        editor
            .dispatch(Event::from(Mutation::Select {
                selection: Some(caret(1)),
            }))
            .unwrap();
        let patch = editor.undo().unwrap();
        assert!(patch.changed.is_empty());
        assert_eq!(document_text(&editor), "ab");
    }
}
