//! Read-only selectors.
//!
//! Pure functions deriving facts from a [`Snapshot`]. Ordinary document
//! mismatches (no selection, focus block gone, caret where a range was
//! expected) yield `None` or an empty collection, never an error; guards
//! lean on that to mean "not applicable". The only shared state is the
//! snapshot's own block index, which re-validates against the live value.

pub mod marks;

pub use marks::{MarkState, active_annotations, active_decorators, insertion_marks, mark_state};

use crate::content::{Block, Child, Span, TextBlock};
use crate::selection::{Selection, convert};
use crate::snapshot::Snapshot;

/// Position of one span within the document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpanRef<'a> {
    pub block_index: usize,
    pub child_index: usize,
    pub span: &'a Span,
}

/// Position of one child (span or inline object) within the document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildRef<'a> {
    pub block_index: usize,
    pub child_index: usize,
    pub child: &'a Child,
}

fn resolved(snap: &Snapshot, point_of: impl Fn(&Selection) -> &crate::selection::Point) -> Option<(usize, Option<usize>, usize)> {
    let selection = snap.selection.as_ref()?;
    convert::resolve_point(snap.blocks(), &snap.index, point_of(selection))
}

/// Block under the focus point.
pub fn focus_block(snap: &Snapshot) -> Option<(usize, &Block)> {
    let (block, _, _) = resolved(snap, |s| &s.focus)?;
    snap.blocks().get(block).map(|b| (block, b))
}

/// Block under the anchor point.
pub fn anchor_block(snap: &Snapshot) -> Option<(usize, &Block)> {
    let (block, _, _) = resolved(snap, |s| &s.anchor)?;
    snap.blocks().get(block).map(|b| (block, b))
}

pub fn focus_text_block(snap: &Snapshot) -> Option<(usize, &TextBlock)> {
    let (i, block) = focus_block(snap)?;
    block.as_text().map(|t| (i, t))
}

pub fn focus_object_block(snap: &Snapshot) -> Option<(usize, &Block)> {
    let (i, block) = focus_block(snap)?;
    block.as_object().map(|_| (i, block))
}

/// Child under the focus point, with its block and child indices.
pub fn focus_child(snap: &Snapshot) -> Option<(usize, usize, &Child)> {
    let (block, child, _) = resolved(snap, |s| &s.focus)?;
    let child = child?;
    let text = snap.blocks().get(block)?.as_text()?;
    text.children.get(child).map(|c| (block, child, c))
}

/// Span under the focus point.
pub fn focus_span(snap: &Snapshot) -> Option<SpanRef<'_>> {
    let (block_index, child_index, child) = focus_child(snap)?;
    child.as_span().map(|span| SpanRef {
        block_index,
        child_index,
        span,
    })
}

pub fn first_block(snap: &Snapshot) -> Option<(usize, &Block)> {
    snap.blocks().first().map(|b| (0, b))
}

pub fn last_block(snap: &Snapshot) -> Option<(usize, &Block)> {
    let blocks = snap.blocks();
    blocks.last().map(|b| (blocks.len() - 1, b))
}

/// Document-order predecessor of the focus block, found through the index's
/// neighbor links.
pub fn previous_block(snap: &Snapshot) -> Option<(usize, &Block)> {
    let (i, block) = focus_block(snap)?;
    let prev = snap
        .index
        .entry(block.key())
        .and_then(|e| e.prev.clone())
        .and_then(|key| snap.index.resolve(snap.blocks(), &key));
    prev.or_else(|| {
        // Stale index: fall back to plain position arithmetic.
        i.checked_sub(1).map(|p| (p, &snap.blocks()[p]))
    })
}

/// Document-order successor of the focus block.
pub fn next_block(snap: &Snapshot) -> Option<(usize, &Block)> {
    let (i, block) = focus_block(snap)?;
    let next = snap
        .index
        .entry(block.key())
        .and_then(|e| e.next.clone())
        .and_then(|key| snap.index.resolve(snap.blocks(), &key));
    next.or_else(|| snap.blocks().get(i + 1).map(|b| (i + 1, b)))
}

/// Blocks touched by the selection, in document order regardless of the
/// selection's direction.
pub fn selected_blocks(snap: &Snapshot) -> Vec<(usize, &Block)> {
    let Some(sel) = snap.indexed_selection() else {
        return Vec::new();
    };
    let sel = sel.normalized();
    let (Some(start), Some(end)) = (sel.anchor.path.block_index(), sel.focus.path.block_index())
    else {
        return Vec::new();
    };
    snap.blocks()
        .iter()
        .enumerate()
        .skip(start)
        .take(end - start + 1)
        .collect()
}

/// Children (spans and inline objects) the selection actually covers. A
/// boundary child the selection merely touches at its edge (caret at the
/// child's very end or very start) is not included. An inline object counts
/// as one caret position, so a range straddling it covers it.
pub fn selected_children(snap: &Snapshot) -> Vec<ChildRef<'_>> {
    let Some(sel) = snap.indexed_selection() else {
        return Vec::new();
    };
    if sel.is_collapsed() {
        return Vec::new();
    }
    let sel = sel.normalized();
    let (Some(start_block), Some(end_block)) =
        (sel.anchor.path.block_index(), sel.focus.path.block_index())
    else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for (i, block) in snap
        .blocks()
        .iter()
        .enumerate()
        .skip(start_block)
        .take(end_block - start_block + 1)
    {
        let Some(text) = block.as_text() else { continue };
        for (c, child) in text.children.iter().enumerate() {
            if i == start_block
                && let Some(sc) = sel.anchor.path.child_index()
                && (c < sc || (c == sc && sel.anchor.offset >= child.len() && !child.is_empty()))
            {
                continue;
            }
            if i == end_block
                && let Some(ec) = sel.focus.path.child_index()
                && (c > ec || (c == ec && sel.focus.offset == 0 && !child.is_empty()))
            {
                continue;
            }
            out.push(ChildRef {
                block_index: i,
                child_index: c,
                child,
            });
        }
    }
    out
}

/// Spans the selection actually covers text of; the span-only projection of
/// [`selected_children`].
pub fn selected_spans(snap: &Snapshot) -> Vec<SpanRef<'_>> {
    selected_children(snap)
        .into_iter()
        .filter_map(|r| {
            r.child.as_span().map(|span| SpanRef {
                block_index: r.block_index,
                child_index: r.child_index,
                span,
            })
        })
        .collect()
}

/// Concatenated text covered by the selection; blocks joined by newlines.
pub fn selection_text(snap: &Snapshot) -> String {
    let sliced = snap.slice_selection();
    sliced
        .iter()
        .filter_map(|b| b.as_text().map(TextBlock::text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 1-based ordinal of a list-item block within its run of consecutive
/// same-list, same-level items. Deeper nested items do not break the run;
/// a shallower item or a non-list block does.
pub fn list_index(snap: &Snapshot, block_index: usize) -> Option<usize> {
    let block = snap.blocks().get(block_index)?.as_text()?;
    let list = block.list_item.as_deref()?;
    let level = block.level.unwrap_or(1);

    let mut ordinal = 1;
    for candidate in snap.blocks()[..block_index].iter().rev() {
        let Some(text) = candidate.as_text() else { break };
        let Some(candidate_list) = text.list_item.as_deref() else {
            break;
        };
        let candidate_level = text.level.unwrap_or(1);
        if candidate_level > level {
            continue;
        }
        if candidate_level < level || candidate_list != list {
            break;
        }
        ordinal += 1;
    }
    Some(ordinal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ObjectBlock, Span, TextBlock};
    use crate::converters::ConverterRegistry;
    use crate::schema::Schema;
    use crate::selection::Point;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn snap(value: Vec<Block>, selection: Option<Selection>) -> Snapshot {
        Snapshot::new(
            Arc::new(Schema::default()),
            Arc::new(value),
            selection,
            BTreeMap::new(),
            Arc::new(ConverterRegistry::standard()),
        )
    }

    fn list_block(text: &str, list: &str, level: u32) -> Block {
        let mut b = TextBlock::new(text);
        b.list_item = Some(list.to_string());
        b.level = Some(level);
        Block::Text(b)
    }

    #[test]
    fn focus_selectors_resolve_the_focus_point() {
        let value = vec![
            Block::Text(TextBlock::new("alpha")),
            Block::Object(ObjectBlock::new("image", serde_json::Map::new())),
        ];
        let s = snap(
            value,
            Some(Selection::collapsed(Point::indexed(0, Some(0), 2))),
        );
        assert_eq!(focus_text_block(&s).unwrap().0, 0);
        assert!(focus_object_block(&s).is_none());
        assert_eq!(focus_span(&s).unwrap().span.text, "alpha");

        let s = s.with_selection(Some(Selection::collapsed(Point::indexed(1, None, 0))));
        assert!(focus_text_block(&s).is_none());
        assert!(focus_object_block(&s).is_some());
    }

    #[test]
    fn missing_focus_is_not_an_error() {
        let s = snap(vec![Block::Text(TextBlock::new("x"))], None);
        assert!(focus_block(&s).is_none());
        assert!(selected_blocks(&s).is_empty());
        assert_eq!(selection_text(&s), "");
    }

    #[test]
    fn neighbors_walk_in_document_order() {
        let value = vec![
            Block::Text(TextBlock::new("one")),
            Block::Text(TextBlock::new("two")),
            Block::Text(TextBlock::new("three")),
        ];
        let s = snap(
            value,
            Some(Selection::collapsed(Point::indexed(1, Some(0), 0))),
        );
        assert_eq!(previous_block(&s).unwrap().0, 0);
        assert_eq!(next_block(&s).unwrap().0, 2);

        let s = s.with_selection(Some(Selection::collapsed(Point::indexed(0, Some(0), 0))));
        assert!(previous_block(&s).is_none());
    }

    #[test]
    fn selected_spans_skip_merely_touched_boundaries() {
        let value = vec![Block::Text(TextBlock::with_children(vec![
            Child::Span(Span::new("foo")),
            Child::Span(Span::new("bar")),
            Child::Span(Span::new("baz")),
        ]))];
        // From the very end of "foo" to the very start of "baz": only "bar"
        // has any of its text covered.
        let s = snap(
            value,
            Some(Selection::new(
                Point::indexed(0, Some(0), 3),
                Point::indexed(0, Some(2), 0),
            )),
        );
        let spans = selected_spans(&s);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].span.text, "bar");
    }

    #[test]
    fn selected_children_include_covered_inline_objects() {
        use crate::content::InlineObject;
        let value = vec![Block::Text(TextBlock::with_children(vec![
            Child::Span(Span::new("ab")),
            Child::InlineObject(InlineObject::new(
                "stock-ticker".to_string(),
                serde_json::Map::new(),
            )),
            Child::Span(Span::new("cd")),
        ]))];
        // From inside "ab" to inside "cd": the object in between is covered.
        let s = snap(
            value,
            Some(Selection::new(
                Point::indexed(0, Some(0), 1),
                Point::indexed(0, Some(2), 1),
            )),
        );
        let children = selected_children(&s);
        assert_eq!(children.len(), 3);
        assert!(children[1].child.as_span().is_none());
        // The span projection sees only the two spans.
        assert_eq!(selected_spans(&s).len(), 2);

        // Touching the object's edge does not cover it.
        let s = s.with_selection(Some(Selection::new(
            Point::indexed(0, Some(1), 1),
            Point::indexed(0, Some(2), 1),
        )));
        let children = selected_children(&s);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].child_index, 2);
    }

    #[test]
    fn selection_text_crosses_blocks() {
        let value = vec![
            Block::Text(TextBlock::new("hello")),
            Block::Text(TextBlock::new("world")),
        ];
        let s = snap(
            value,
            Some(Selection::new(
                Point::indexed(0, Some(0), 3),
                Point::indexed(1, Some(0), 2),
            )),
        );
        assert_eq!(selection_text(&s), "lo\nwo");
    }

    #[test]
    fn list_index_counts_same_level_runs() {
        let value = vec![
            list_block("a", "bullet", 1),
            list_block("a.1", "bullet", 2),
            list_block("a.2", "bullet", 2),
            list_block("b", "bullet", 1),
            Block::Text(TextBlock::new("paragraph")),
            list_block("fresh", "number", 1),
        ];
        let s = snap(value, None);
        assert_eq!(list_index(&s, 0), Some(1));
        assert_eq!(list_index(&s, 1), Some(1));
        assert_eq!(list_index(&s, 2), Some(2));
        // Nested items do not break the outer run.
        assert_eq!(list_index(&s, 3), Some(2));
        assert_eq!(list_index(&s, 4), None);
        assert_eq!(list_index(&s, 5), Some(1));
    }
}
