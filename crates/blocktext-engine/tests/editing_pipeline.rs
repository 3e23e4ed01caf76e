//! End-to-end pipeline tests: events in, document and selection out.

use blocktext_engine::content::{Block, Child, Key, Span, TextBlock};
use blocktext_engine::converters::TransferItem;
use blocktext_engine::event::{DeleteTarget, Event, EventKind, Mutation};
use blocktext_engine::selection::{Point, Selection};
use blocktext_engine::{Action, Behavior, Editor, EventPattern, Schema};
use pretty_assertions::assert_eq;

fn block(key: &str, span_key: &str, text: &str) -> Block {
    Block::Text(TextBlock {
        key: Key::new(key),
        style: "normal".to_string(),
        list_item: None,
        level: None,
        mark_defs: Vec::new(),
        children: vec![Child::Span(Span {
            key: Key::new(span_key),
            text: text.to_string(),
            marks: Vec::new(),
        })],
    })
}

fn caret(block: &str, span: &str, offset: usize) -> Selection {
    Selection::collapsed(Point::keyed(block, Some(Key::new(span)), offset))
}

fn document_text(editor: &Editor) -> Vec<String> {
    editor
        .value()
        .iter()
        .filter_map(Block::as_text)
        .map(TextBlock::text)
        .collect()
}

#[test]
fn pasting_plain_text_weaves_into_the_paragraph() {
    let mut editor = Editor::new(Schema::default(), vec![block("b1", "s1", "foobar")]);
    editor.select(Some(caret("b1", "s1", 3)));

    editor
        .dispatch(Event::Paste {
            items: vec![TransferItem::new("text/plain", "one\ntwo")],
        })
        .unwrap();

    assert_eq!(
        document_text(&editor),
        vec!["fooone".to_string(), "twobar".to_string()]
    );
    assert!(editor.selection().is_some());
}

#[test]
fn break_then_typing_lands_in_the_new_block() {
    let mut editor = Editor::new(Schema::default(), vec![block("b1", "s1", "hello")]);
    editor.select(Some(caret("b1", "s1", 2)));

    editor.dispatch(Event::InsertBreak).unwrap();
    assert_eq!(
        document_text(&editor),
        vec!["he".to_string(), "llo".to_string()]
    );

    editor
        .dispatch(Event::InsertText {
            text: "y".to_string(),
        })
        .unwrap();
    assert_eq!(
        document_text(&editor),
        vec!["he".to_string(), "yllo".to_string()]
    );
}

#[test]
fn deleting_an_annotation_leaves_no_dead_defs_behind() {
    let mut editor = Editor::new(Schema::default(), vec![block("b1", "s1", "see this now")]);
    editor.select(Some(Selection::new(
        Point::keyed("b1", Some(Key::new("s1")), 4),
        Point::keyed("b1", Some(Key::new("s1")), 8),
    )));

    let mut value = serde_json::Map::new();
    value.insert(
        "href".to_string(),
        serde_json::Value::String("https://example.com".to_string()),
    );
    editor
        .dispatch(Event::AnnotationAdd {
            annotation: "link".to_string(),
            value,
        })
        .unwrap();

    let text = editor.value()[0].as_text().unwrap();
    assert_eq!(text.mark_defs.len(), 1);
    let annotated = text
        .children
        .iter()
        .filter_map(Child::as_span)
        .find(|s| !s.marks.is_empty())
        .unwrap();
    assert_eq!(annotated.text, "this");

    // The rewrite left the selection on the annotated text; deleting that
    // exact range must take the def with it.
    let selection = editor.selection().unwrap().clone();
    editor
        .dispatch(Event::from(Mutation::Delete {
            target: DeleteTarget::Selection(selection),
        }))
        .unwrap();

    let text = editor.value()[0].as_text().unwrap();
    assert_eq!(text.text(), "see  now");
    assert!(text.mark_defs.is_empty());
    assert!(
        text.children
            .iter()
            .filter_map(Child::as_span)
            .all(|s| s.marks.is_empty())
    );
}

#[test]
fn a_registered_behavior_can_rewrite_an_event_and_fall_through() {
    let mut editor = Editor::new(Schema::default(), vec![block("b1", "s1", "")]);
    editor.select(Some(caret("b1", "s1", 0)));

    editor.register_behavior(Behavior::new(
        "autocorrect",
        EventPattern::Exact(EventKind::InsertText),
        10,
        |_, event| {
            let Event::InsertText { text } = event else {
                return None;
            };
            if text.contains("teh") {
                Some(text.replace("teh", "the"))
            } else {
                None
            }
        },
        |_, _, corrected| vec![Action::Forward(Event::InsertText { text: corrected })],
    ));

    editor
        .dispatch(Event::InsertText {
            text: "teh".to_string(),
        })
        .unwrap();
    assert_eq!(document_text(&editor), vec!["the".to_string()]);
}

#[test]
fn undo_restores_the_document_before_a_paste() {
    let mut editor = Editor::new(Schema::default(), vec![block("b1", "s1", "foobar")]);
    editor.select(Some(caret("b1", "s1", 3)));

    editor
        .dispatch(Event::Paste {
            items: vec![TransferItem::new("text/plain", "X")],
        })
        .unwrap();
    assert_eq!(document_text(&editor), vec!["fooXbar".to_string()]);

    editor.undo().unwrap();
    assert_eq!(document_text(&editor), vec!["foobar".to_string()]);
    assert_eq!(editor.selection().unwrap().focus.offset, 3);
}

#[test]
fn copy_leaves_the_document_alone_but_fills_the_clipboard() {
    let mut editor = Editor::new(
        Schema::default(),
        vec![block("b1", "s1", "alpha"), block("b2", "s2", "beta")],
    );
    editor.select(Some(Selection::new(
        Point::keyed("b1", Some(Key::new("s1")), 2),
        Point::keyed("b2", Some(Key::new("s2")), 2),
    )));

    let version = editor.version();
    editor.dispatch(Event::Copy).unwrap();

    assert_eq!(editor.version(), version);
    assert_eq!(
        document_text(&editor),
        vec!["alpha".to_string(), "beta".to_string()]
    );
    let plain = editor
        .clipboard()
        .iter()
        .find(|i| i.media_type == "text/plain")
        .unwrap();
    assert_eq!(plain.data, "pha\nbe");
    // The JSON flavor round-trips as blocks.
    let json = editor
        .clipboard()
        .iter()
        .find(|i| i.media_type == "application/json")
        .unwrap();
    let blocks: Vec<Block> = serde_json::from_str(&json.data).unwrap();
    assert_eq!(blocks.len(), 2);
}
