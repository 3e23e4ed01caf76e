//! Range slicing.
//!
//! [`slice`] produces the minimal sub-sequence of blocks exactly covering a
//! selection. Boundary spans are truncated to the covered substring with
//! their marks and the block's mark defs kept verbatim; fully covered blocks
//! and children are cloned as-is. Object blocks are opaque and always cloned
//! whole when touched. Slicing the whole-document range returns content
//! equal to the whole document.

use crate::content::{Block, Child, Span, byte_offset};
use crate::selection::{BlockIndexMap, Selection, convert};

/// Slice `value` down to the sub-sequence covered by `selection`.
///
/// Accepts either path flavor; a selection that no longer resolves (or a
/// collapsed one) yields an empty slice.
pub fn slice(value: &[Block], index: &BlockIndexMap, selection: &Selection) -> Vec<Block> {
    let Some(sel) = convert::selection_to_indexed(value, index, selection) else {
        return Vec::new();
    };
    if sel.is_collapsed() {
        return Vec::new();
    }
    let sel = sel.normalized();
    let (start_block, start_child, start_offset) = match sel.anchor.path.block_index() {
        Some(b) => (b, sel.anchor.path.child_index(), sel.anchor.offset),
        None => return Vec::new(),
    };
    let (end_block, end_child, end_offset) = match sel.focus.path.block_index() {
        Some(b) => (b, sel.focus.path.child_index(), sel.focus.offset),
        None => return Vec::new(),
    };

    let mut out = Vec::with_capacity(end_block - start_block + 1);
    for (i, block) in value
        .iter()
        .enumerate()
        .skip(start_block)
        .take(end_block - start_block + 1)
    {
        let start = (i == start_block)
            .then_some(start_child.map(|c| (c, start_offset)))
            .flatten();
        let end = (i == end_block)
            .then_some(end_child.map(|c| (c, end_offset)))
            .flatten();
        match block {
            Block::Object(_) => out.push(block.clone()),
            Block::Text(tb) => {
                let mut clone = tb.clone();
                clone.children = truncate_children(&tb.children, start, end);
                out.push(Block::Text(clone));
            }
        }
    }
    out
}

/// Keep the part of `children` between the `start` and `end` boundaries,
/// each given as `(child index, char offset)`. `None` means the block edge.
fn truncate_children(
    children: &[Child],
    start: Option<(usize, usize)>,
    end: Option<(usize, usize)>,
) -> Vec<Child> {
    let mut out = Vec::new();
    for (c, child) in children.iter().enumerate() {
        if let Some((sc, so)) = start {
            if c < sc {
                continue;
            }
            // An inline object at the start boundary is covered only when
            // the start offset sits before it.
            if c == sc && so >= 1 && matches!(child, Child::InlineObject(_)) {
                continue;
            }
        }
        if let Some((ec, eo)) = end {
            if c > ec {
                break;
            }
            // An inline object at the end boundary is covered only when the
            // end offset reaches past it.
            if c == ec && eo == 0 && matches!(child, Child::InlineObject(_)) {
                break;
            }
        }
        match child {
            Child::InlineObject(_) => out.push(child.clone()),
            Child::Span(span) => {
                let from = match start {
                    Some((sc, so)) if c == sc => so,
                    _ => 0,
                };
                let to = match end {
                    Some((ec, eo)) if c == ec => eo.min(span.len()),
                    _ => span.len(),
                };
                if from == 0 && to == span.len() {
                    out.push(child.clone());
                } else if from <= to {
                    let from_b = byte_offset(&span.text, from);
                    let to_b = byte_offset(&span.text, to);
                    out.push(Child::Span(Span {
                        key: span.key.clone(),
                        text: span.text[from_b..to_b].to_string(),
                        marks: span.marks.clone(),
                    }));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{InlineObject, MarkDef, ObjectBlock, TextBlock};
    use crate::selection::Point;
    use pretty_assertions::assert_eq;

    fn annotated_doc() -> Vec<Block> {
        vec![
            Block::Text(TextBlock {
                key: "b1".into(),
                style: "normal".to_string(),
                list_item: None,
                level: None,
                mark_defs: vec![MarkDef {
                    key: "m1".into(),
                    kind: "link".to_string(),
                    value: serde_json::Map::new(),
                }],
                children: vec![
                    Child::Span(Span {
                        key: "s1".into(),
                        text: "hello ".to_string(),
                        marks: vec![],
                    }),
                    Child::Span(Span {
                        key: "s2".into(),
                        text: "world".to_string(),
                        marks: vec!["m1".to_string()],
                    }),
                ],
            }),
            Block::Object(ObjectBlock::new("image", serde_json::Map::new())),
            Block::Text(TextBlock::with_children(vec![
                Child::Span(Span::new("tail")),
                Child::InlineObject(InlineObject::new("stock-ticker", serde_json::Map::new())),
            ])),
        ]
    }

    fn whole_selection(value: &[Block]) -> Selection {
        let last = value.len() - 1;
        let end_child = value[last].as_text().map(|t| t.children.len() - 1);
        let end_offset = end_child
            .map(|c| value[last].as_text().unwrap().children[c].len())
            .unwrap_or(0);
        Selection::new(
            Point::indexed(0, value[0].as_text().map(|_| 0), 0),
            Point::indexed(last, end_child, end_offset),
        )
    }

    #[test]
    fn whole_document_slice_equals_document() {
        let value = annotated_doc();
        let index = BlockIndexMap::build(&value);
        let sel = whole_selection(&value);
        assert_eq!(slice(&value, &index, &sel), value);
    }

    #[test]
    fn boundary_spans_are_truncated_with_marks_kept() {
        let value = annotated_doc();
        let index = BlockIndexMap::build(&value);
        // "llo wor": starts mid "hello ", ends mid "world".
        let sel = Selection::new(
            Point::indexed(0, Some(0), 2),
            Point::indexed(0, Some(1), 3),
        );
        let sliced = slice(&value, &index, &sel);
        assert_eq!(sliced.len(), 1);
        let tb = sliced[0].as_text().unwrap();
        assert_eq!(tb.text(), "llo wor");
        assert_eq!(tb.children[1].as_span().unwrap().marks, vec!["m1"]);
        // Annotation payloads travel with the block, untouched.
        assert_eq!(tb.mark_defs, value[0].as_text().unwrap().mark_defs);
    }

    #[test]
    fn interior_blocks_are_cloned_verbatim() {
        let value = annotated_doc();
        let index = BlockIndexMap::build(&value);
        let sel = Selection::new(
            Point::indexed(0, Some(1), 1),
            Point::indexed(2, Some(0), 2),
        );
        let sliced = slice(&value, &index, &sel);
        assert_eq!(sliced.len(), 3);
        assert_eq!(sliced[0].as_text().unwrap().text(), "orld");
        assert_eq!(sliced[1], value[1]);
        assert_eq!(sliced[2].as_text().unwrap().text(), "ta");
    }

    #[test]
    fn end_boundary_excludes_uncovered_inline_object() {
        let value = annotated_doc();
        let index = BlockIndexMap::build(&value);
        let covered = Selection::new(
            Point::indexed(2, Some(0), 0),
            Point::indexed(2, Some(1), 1),
        );
        let sliced = slice(&value, &index, &covered);
        assert_eq!(sliced[0].as_text().unwrap().children.len(), 2);

        let uncovered = Selection::new(
            Point::indexed(2, Some(0), 0),
            Point::indexed(2, Some(1), 0),
        );
        let sliced = slice(&value, &index, &uncovered);
        assert_eq!(sliced[0].as_text().unwrap().children.len(), 1);
    }

    #[test]
    fn collapsed_and_dead_selections_slice_to_nothing() {
        let value = annotated_doc();
        let index = BlockIndexMap::build(&value);
        let caret = Selection::collapsed(Point::indexed(0, Some(0), 3));
        assert!(slice(&value, &index, &caret).is_empty());
        let dead = Selection::collapsed(Point::keyed("gone", None, 0));
        assert!(slice(&value, &index, &dead).is_empty());
    }

    #[test]
    fn backward_selection_slices_like_forward() {
        let value = annotated_doc();
        let index = BlockIndexMap::build(&value);
        let forward = Selection::new(
            Point::indexed(0, Some(0), 2),
            Point::indexed(0, Some(1), 3),
        );
        let backward = Selection::new(
            Point::indexed(0, Some(1), 3),
            Point::indexed(0, Some(0), 2),
        );
        assert_eq!(
            slice(&value, &index, &forward),
            slice(&value, &index, &backward)
        );
    }
}
