//! Reference mutation executor.
//!
//! [`apply`] interprets one [`Mutation`] against a live document value and
//! selection. It is deliberately host-shaped: a host with its own document
//! store implements the same vocabulary against that store and skips this
//! module entirely. Unknown keys are errors, not silent no-ops, because a
//! mutation addressing a key that is gone means the caller applied a
//! cascade against the wrong document state.

use crate::content::{Block, Child, Key, Span, TextBlock, split_text};
use crate::event::{
    BlockPlacement, BlockProp, ChildProp, DeleteDirection, DeleteTarget, Mutation, TextUnit,
};
use crate::selection::{BlockIndexMap, Point, Selection, selection_to_indexed};

#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("no block with key {key}")]
    UnknownBlock { key: Key },
    #[error("no child {key} in block {block}")]
    UnknownChild { block: Key, key: Key },
    #[error("block {key} is not a text block")]
    NotTextBlock { key: Key },
}

/// Apply one mutation. Returns the keys of the blocks whose content
/// changed; selection-only mutations return an empty list.
pub fn apply(
    value: &mut Vec<Block>,
    selection: &mut Option<Selection>,
    mutation: &Mutation,
) -> Result<Vec<Key>, ApplyError> {
    match mutation {
        Mutation::BlockSet { key, patch } => block_set(value, key, patch),
        Mutation::BlockUnset { key, props } => block_unset(value, selection, key, props),
        Mutation::ChildSet { block, key, patch } => child_set(value, block, key, patch),
        Mutation::ChildUnset { block, key, props } => child_unset(value, block, key, props),
        Mutation::InsertBlock { block, at } => insert_block(value, block, at),
        Mutation::Delete { target } => delete(value, selection, target),
        Mutation::DeleteBlock { key } => delete_block(value, selection, key),
        Mutation::Select {
            selection: new_selection,
        } => {
            *selection = new_selection.clone();
            Ok(Vec::new())
        }
        Mutation::SelectBlock { key } => {
            let block = find_block(value, key)?;
            *selection = Some(Selection::collapsed(Point::keyed(
                block.key().clone(),
                None,
                0,
            )));
            Ok(Vec::new())
        }
        Mutation::MoveBlockUp { key } => move_block(value, key, true),
        Mutation::MoveBlockDown { key } => move_block(value, key, false),
        // History is the editor's concern; at this level they carry nothing.
        Mutation::Undo | Mutation::Redo => Ok(Vec::new()),
    }
}

fn position(value: &[Block], key: &Key) -> Result<usize, ApplyError> {
    value
        .iter()
        .position(|b| b.key() == key)
        .ok_or_else(|| ApplyError::UnknownBlock { key: key.clone() })
}

fn find_block<'a>(value: &'a [Block], key: &Key) -> Result<&'a Block, ApplyError> {
    value
        .iter()
        .find(|b| b.key() == key)
        .ok_or_else(|| ApplyError::UnknownBlock { key: key.clone() })
}

fn block_set(
    value: &mut [Block],
    key: &Key,
    patch: &crate::event::BlockPatch,
) -> Result<Vec<Key>, ApplyError> {
    let i = position(value, key)?;
    match &mut value[i] {
        Block::Text(text) => {
            if let Some(style) = &patch.style {
                text.style = style.clone();
            }
            if let Some(list_item) = &patch.list_item {
                text.list_item = Some(list_item.clone());
            }
            if let Some(level) = patch.level {
                text.level = Some(level);
            }
            if let Some(children) = &patch.children {
                text.children = children.clone();
            }
            if let Some(defs) = &patch.mark_defs {
                text.mark_defs = defs.clone();
            }
        }
        Block::Object(object) => {
            if patch.children.is_some() || patch.mark_defs.is_some() {
                return Err(ApplyError::NotTextBlock { key: key.clone() });
            }
            if let Some(v) = &patch.value {
                object.value = v.clone();
            }
        }
    }
    Ok(vec![key.clone()])
}

fn block_unset(
    value: &mut [Block],
    selection: &mut Option<Selection>,
    key: &Key,
    props: &[BlockProp],
) -> Result<Vec<Key>, ApplyError> {
    let i = position(value, key)?;
    let Block::Text(text) = &mut value[i] else {
        return Err(ApplyError::NotTextBlock { key: key.clone() });
    };
    let mut new_key = key.clone();
    for prop in props {
        match prop {
            BlockProp::Style => text.style = "normal".to_string(),
            BlockProp::Level => text.level = None,
            BlockProp::ListItem => {
                // The one sanctioned key reassignment: leaving a list gives
                // the block a new identity.
                text.list_item = None;
                new_key = Key::random();
                text.key = new_key.clone();
            }
        }
    }
    if new_key != *key
        && let Some(sel) = selection
    {
        rekey_selection(sel, key, &new_key);
    }
    Ok(vec![new_key])
}

fn rekey_selection(sel: &mut Selection, old: &Key, new: &Key) {
    for point in [&mut sel.anchor, &mut sel.focus] {
        if let crate::selection::Path::Keyed { block, .. } = &mut point.path
            && block == old
        {
            *block = new.clone();
        }
    }
}

fn child_set(
    value: &mut [Block],
    block_key: &Key,
    key: &Key,
    patch: &crate::event::ChildPatch,
) -> Result<Vec<Key>, ApplyError> {
    let i = position(value, block_key)?;
    let Block::Text(text) = &mut value[i] else {
        return Err(ApplyError::NotTextBlock {
            key: block_key.clone(),
        });
    };
    let child = text
        .children
        .iter_mut()
        .find(|c| c.key() == key)
        .ok_or_else(|| ApplyError::UnknownChild {
            block: block_key.clone(),
            key: key.clone(),
        })?;
    match child {
        Child::Span(span) => {
            if let Some(t) = &patch.text {
                span.text = t.clone();
            }
            if let Some(marks) = &patch.marks {
                span.marks = marks.clone();
            }
        }
        Child::InlineObject(object) => {
            if let Some(v) = &patch.value {
                object.value = v.clone();
            }
        }
    }
    Ok(vec![block_key.clone()])
}

fn child_unset(
    value: &mut [Block],
    block_key: &Key,
    key: &Key,
    props: &[ChildProp],
) -> Result<Vec<Key>, ApplyError> {
    let i = position(value, block_key)?;
    let Block::Text(text) = &mut value[i] else {
        return Err(ApplyError::NotTextBlock {
            key: block_key.clone(),
        });
    };
    let child = text
        .children
        .iter_mut()
        .find(|c| c.key() == key)
        .ok_or_else(|| ApplyError::UnknownChild {
            block: block_key.clone(),
            key: key.clone(),
        })?;
    if let Child::Span(span) = child {
        for prop in props {
            match prop {
                ChildProp::Marks => span.marks.clear(),
            }
        }
    }
    Ok(vec![block_key.clone()])
}

fn insert_block(
    value: &mut Vec<Block>,
    block: &Block,
    at: &crate::event::InsertBlockAt,
) -> Result<Vec<Key>, ApplyError> {
    let index = match (&at.ref_key, at.placement) {
        (Some(key), BlockPlacement::Before) => position(value, key)?,
        (Some(key), BlockPlacement::After) => position(value, key)? + 1,
        (None, BlockPlacement::Before) => 0,
        (None, BlockPlacement::After) => value.len(),
    };
    value.insert(index, block.clone());
    Ok(vec![block.key().clone()])
}

fn delete_block(
    value: &mut Vec<Block>,
    selection: &mut Option<Selection>,
    key: &Key,
) -> Result<Vec<Key>, ApplyError> {
    let i = position(value, key)?;
    value.remove(i);
    // A selection in the removed block collapses onto a neighbor.
    let selected_it = selection.as_ref().is_some_and(|s| {
        [&s.anchor, &s.focus]
            .iter()
            .any(|p| p.path.block_key() == Some(key))
    });
    if selected_it {
        let neighbor = value.get(i.saturating_sub(1)).or_else(|| value.first());
        *selection = neighbor.map(|b| match b.as_text() {
            Some(t) => {
                let child = t.children.last();
                Selection::collapsed(Point::keyed(
                    t.key.clone(),
                    child.map(|c| c.key().clone()),
                    child.map(|c| c.len()).unwrap_or_default(),
                ))
            }
            None => Selection::collapsed(Point::keyed(b.key().clone(), None, 0)),
        });
    }
    Ok(vec![key.clone()])
}

fn move_block(value: &mut [Block], key: &Key, up: bool) -> Result<Vec<Key>, ApplyError> {
    let i = position(value, key)?;
    let j = if up { i.checked_sub(1) } else { i.checked_add(1) };
    match j {
        Some(j) if j < value.len() => {
            value.swap(i, j);
            Ok(vec![key.clone(), value[i].key().clone()])
        }
        // Already at the edge.
        _ => Ok(Vec::new()),
    }
}

fn delete(
    value: &mut Vec<Block>,
    selection: &mut Option<Selection>,
    target: &DeleteTarget,
) -> Result<Vec<Key>, ApplyError> {
    match target {
        DeleteTarget::Selection(sel) => delete_selection(value, selection, sel),
        DeleteTarget::Unit { direction, unit } => {
            let Some(current) = selection.clone() else {
                return Ok(Vec::new());
            };
            let index = BlockIndexMap::build(value);
            let Some(current) = selection_to_indexed(value, &index, &current) else {
                return Ok(Vec::new());
            };
            if !current.is_collapsed() {
                // A unit delete over a range removes the range.
                return delete_selection(value, selection, &current);
            }
            match unit_range(value, &current.focus, *direction, *unit) {
                Some(UnitTarget::Range(range)) => delete_selection(value, selection, &range),
                Some(UnitTarget::Block(key)) => delete_block(value, selection, &key),
                None => Ok(Vec::new()),
            }
        }
    }
}

fn delete_selection(
    value: &mut Vec<Block>,
    selection: &mut Option<Selection>,
    sel: &Selection,
) -> Result<Vec<Key>, ApplyError> {
    let index = BlockIndexMap::build(value);
    // A range that no longer resolves deletes nothing.
    let Some(sel) = selection_to_indexed(value, &index, sel) else {
        return Ok(Vec::new());
    };
    let sel = sel.normalized();
    if sel.is_collapsed() {
        return Ok(Vec::new());
    }
    let (Some(sb), Some(eb)) = (sel.anchor.path.block_index(), sel.focus.path.block_index())
    else {
        return Ok(Vec::new());
    };

    // A range starting on an object block consumes whole blocks.
    if value[sb].as_text().is_none() {
        let removed: Vec<Key> = value[sb..=eb].iter().map(|b| b.key().clone()).collect();
        value.drain(sb..=eb);
        *selection = value
            .get(sb.min(value.len().wrapping_sub(1)))
            .filter(|_| !value.is_empty())
            .map(|b| Selection::collapsed(Point::keyed(b.key().clone(), None, 0)));
        return Ok(removed);
    }

    let sc = sel.anchor.path.child_index().unwrap_or(0);
    let so = sel.anchor.offset;
    let ec = sel.focus.path.child_index();
    let eo = sel.focus.offset;

    let start = value[sb].as_text().cloned().unwrap_or_else(|| TextBlock::with_children(vec![]));
    let mut merged: Vec<Child> = start.children[..sc.min(start.children.len())].to_vec();
    let mut caret: Option<(Key, usize)> = None;

    if sb == eb && ec == Some(sc) {
        match start.children.get(sc) {
            Some(Child::Span(s)) => {
                let (head, _) = split_text(&s.text, so);
                let (_, tail) = split_text(&s.text, eo);
                merged.push(Child::Span(Span {
                    key: s.key.clone(),
                    text: format!("{head}{tail}"),
                    marks: s.marks.clone(),
                }));
                caret = Some((s.key.clone(), so));
            }
            Some(Child::InlineObject(_)) | None => {}
        }
        merged.extend(start.children.get(sc + 1..).unwrap_or_default().iter().cloned());
    } else {
        match start.children.get(sc) {
            Some(Child::Span(s)) => {
                let (head, _) = split_text(&s.text, so);
                merged.push(Child::Span(Span {
                    key: s.key.clone(),
                    text: head,
                    marks: s.marks.clone(),
                }));
                caret = Some((s.key.clone(), so));
            }
            Some(obj @ Child::InlineObject(_)) if so >= 1 => merged.push(obj.clone()),
            _ => {}
        }
        let tail_source: Option<&TextBlock> = if sb == eb {
            Some(&start)
        } else {
            value[eb].as_text()
        };
        if let Some(source) = tail_source
            && let Some(ec) = ec
        {
            match source.children.get(ec) {
                Some(Child::Span(s)) => {
                    let (_, tail) = split_text(&s.text, eo);
                    merged.push(Child::Span(Span {
                        key: s.key.clone(),
                        text: tail,
                        marks: s.marks.clone(),
                    }));
                }
                Some(obj @ Child::InlineObject(_)) if eo == 0 => merged.push(obj.clone()),
                _ => {}
            }
            merged.extend(source.children.get(ec + 1..).unwrap_or_default().iter().cloned());
        }
    }

    // Emptied boundary spans shed their annotation marks so typing into
    // them cannot resurrect a deleted annotation. Decorators stay.
    let mut def_pool = start.mark_defs.clone();
    if sb != eb
        && let Some(end) = value[eb].as_text()
    {
        def_pool.extend(end.mark_defs.iter().cloned());
    }
    for child in &mut merged {
        if let Child::Span(span) = child
            && span.text.is_empty()
        {
            span.marks
                .retain(|m| !def_pool.iter().any(|d| d.key.as_str() == m));
        }
    }
    let defs: Vec<_> = def_pool
        .into_iter()
        .filter(|d| {
            merged
                .iter()
                .filter_map(Child::as_span)
                .any(|s| s.has_mark(d.key.as_str()))
        })
        .collect();

    if merged.is_empty() {
        merged.push(Child::Span(Span::new("")));
    }

    let mut changed = vec![start.key.clone()];
    changed.extend(value[sb + 1..=eb].iter().map(|b| b.key().clone()));

    {
        let Some(text) = value[sb].as_text_mut() else {
            unreachable!()
        };
        text.children = merged;
        text.mark_defs = defs;
    }
    value.drain(sb + 1..=eb);

    let start_key = changed[0].clone();
    *selection = Some(match caret {
        Some((child, offset)) => {
            Selection::collapsed(Point::keyed(start_key, Some(child), offset))
        }
        None => Selection::collapsed(Point::keyed(start_key, None, 0)),
    });
    Ok(changed)
}

pub(crate) enum UnitTarget {
    Range(Selection),
    Block(Key),
}

/// Resolve a unit delete at a collapsed caret into a concrete range (or a
/// whole-block removal). Returns `None` at a document edge. Shared with the
/// `delete.unit` lowering behavior so behaviors and the executor agree on
/// what a unit covers.
pub(crate) fn unit_range(
    value: &[Block],
    focus: &Point,
    direction: DeleteDirection,
    unit: TextUnit,
) -> Option<UnitTarget> {
    let b = focus.path.block_index()?;
    let block = value.get(b)?;
    if unit == TextUnit::Block {
        return Some(UnitTarget::Block(block.key().clone()));
    }
    let text = block.as_text()?;

    let global = global_offset(text, focus.path.child_index().unwrap_or(0), focus.offset);
    // Word scans run in the same caret-offset space as `global_offset` and
    // `point_at`, where an inline object occupies one position.
    let units = caret_units(text);

    let target = match (direction, unit) {
        (DeleteDirection::Backward, TextUnit::Character) => global.checked_sub(1),
        (DeleteDirection::Forward, TextUnit::Character) => {
            (global < units.len()).then_some(global + 1)
        }
        (DeleteDirection::Backward, TextUnit::Word) => Some(word_boundary_back(&units, global)),
        (DeleteDirection::Forward, TextUnit::Word) => {
            (global < units.len()).then(|| word_boundary_fwd(&units, global))
        }
        (_, TextUnit::Block) => unreachable!(),
    };

    match target {
        Some(target) if target != global => {
            let (from, to) = if target < global {
                (target, global)
            } else {
                (global, target)
            };
            let start = point_at(b, text, from)?;
            let end = point_at(b, text, to)?;
            Some(UnitTarget::Range(Selection::new(start, end)))
        }
        // At a block edge: merge with the neighboring block.
        _ => match direction {
            DeleteDirection::Backward if global == 0 => {
                let prev = value.get(b.checked_sub(1)?)?;
                match prev.as_text() {
                    Some(prev_text) => {
                        let last = prev_text.children.len().saturating_sub(1);
                        let start = Point::indexed(
                            b - 1,
                            Some(last),
                            prev_text.children.last().map(|c| c.len()).unwrap_or_default(),
                        );
                        let end = Point::indexed(b, focus.path.child_index(), 0);
                        Some(UnitTarget::Range(Selection::new(start, end)))
                    }
                    None => Some(UnitTarget::Block(prev.key().clone())),
                }
            }
            DeleteDirection::Forward => {
                let next = value.get(b + 1)?;
                match next.as_text() {
                    Some(_) => {
                        let start = Point::indexed(
                            b,
                            focus.path.child_index(),
                            focus.offset,
                        );
                        let end = Point::indexed(b + 1, Some(0), 0);
                        Some(UnitTarget::Range(Selection::new(start, end)))
                    }
                    None => Some(UnitTarget::Block(next.key().clone())),
                }
            }
            _ => None,
        },
    }
}

/// One caret position within a text block: a character of a span, or an
/// inline object as a whole.
#[derive(Clone, Copy, PartialEq)]
enum CaretUnit {
    Char(char),
    Object,
}

impl CaretUnit {
    fn is_whitespace(self) -> bool {
        matches!(self, CaretUnit::Char(c) if c.is_whitespace())
    }

    fn is_word(self) -> bool {
        matches!(self, CaretUnit::Char(c) if !c.is_whitespace())
    }
}

fn caret_units(block: &TextBlock) -> Vec<CaretUnit> {
    let mut units = Vec::new();
    for child in &block.children {
        match child {
            Child::Span(s) => units.extend(s.text.chars().map(CaretUnit::Char)),
            Child::InlineObject(_) => units.push(CaretUnit::Object),
        }
    }
    units
}

/// Global caret offset of a (child, offset) position within a block.
fn global_offset(block: &TextBlock, child: usize, offset: usize) -> usize {
    block.children[..child.min(block.children.len())]
        .iter()
        .map(Child::len)
        .sum::<usize>()
        + offset
}

/// The (child, offset) position at a global caret offset.
fn point_at(block_index: usize, block: &TextBlock, mut global: usize) -> Option<Point> {
    for (i, child) in block.children.iter().enumerate() {
        if global <= child.len() {
            return Some(Point::indexed(block_index, Some(i), global));
        }
        global -= child.len();
    }
    block
        .children
        .len()
        .checked_sub(1)
        .map(|last| Point::indexed(block_index, Some(last), block.children[last].len()))
}

fn word_boundary_back(units: &[CaretUnit], from: usize) -> usize {
    let mut i = from.min(units.len());
    while i > 0 && units[i - 1].is_whitespace() {
        i -= 1;
    }
    // An inline object deletes as its own unit, never as part of a word.
    if i > 0 && units[i - 1] == CaretUnit::Object {
        return i - 1;
    }
    while i > 0 && units[i - 1].is_word() {
        i -= 1;
    }
    i
}

fn word_boundary_fwd(units: &[CaretUnit], from: usize) -> usize {
    let mut i = from.min(units.len());
    while i < units.len() && units[i].is_whitespace() {
        i += 1;
    }
    if i < units.len() && units[i] == CaretUnit::Object {
        return i + 1;
    }
    while i < units.len() && units[i].is_word() {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MarkDef;
    use pretty_assertions::assert_eq;

    fn span(key: &str, text: &str, marks: &[&str]) -> Child {
        Child::Span(Span {
            key: Key::new(key),
            text: text.to_string(),
            marks: marks.iter().map(|m| m.to_string()).collect(),
        })
    }

    fn text_block(key: &str, children: Vec<Child>) -> Block {
        Block::Text(TextBlock {
            key: Key::new(key),
            style: "normal".to_string(),
            list_item: None,
            level: None,
            mark_defs: Vec::new(),
            children,
        })
    }

    fn doc() -> Vec<Block> {
        vec![
            text_block("b1", vec![span("s1", "hello", &[])]),
            text_block("b2", vec![span("s2", "world", &[])]),
        ]
    }

    #[test]
    fn delete_range_within_a_span_keeps_one_span() {
        let mut value = doc();
        let mut selection = None;
        let sel = Selection::new(Point::indexed(0, Some(0), 1), Point::indexed(0, Some(0), 4));
        let changed = delete_selection(&mut value, &mut selection, &sel).unwrap();
        assert_eq!(changed, vec![Key::new("b1")]);
        assert_eq!(value[0].as_text().unwrap().text(), "ho");
        assert_eq!(value[0].as_text().unwrap().children.len(), 1);
        let sel = selection.unwrap();
        assert!(sel.is_collapsed());
        assert_eq!(sel.focus.offset, 1);
    }

    #[test]
    fn delete_across_blocks_merges_into_the_start_block() {
        let mut value = doc();
        let mut selection = None;
        let sel = Selection::new(Point::indexed(0, Some(0), 3), Point::indexed(1, Some(0), 2));
        let changed = delete_selection(&mut value, &mut selection, &sel).unwrap();
        assert_eq!(changed, vec![Key::new("b1"), Key::new("b2")]);
        assert_eq!(value.len(), 1);
        assert_eq!(value[0].as_text().unwrap().text(), "helrld");
        let sel = selection.unwrap();
        assert_eq!(sel.focus.path.block_key(), Some(&Key::new("b1")));
        assert_eq!(sel.focus.offset, 3);
    }

    #[test]
    fn backward_delete_direction_does_not_matter() {
        let mut forward = doc();
        let mut backward = doc();
        let mut sel_a = None;
        let mut sel_b = None;
        let range = Selection::new(Point::indexed(0, Some(0), 3), Point::indexed(1, Some(0), 2));
        let reversed = Selection::new(Point::indexed(1, Some(0), 2), Point::indexed(0, Some(0), 3));
        delete_selection(&mut forward, &mut sel_a, &range).unwrap();
        delete_selection(&mut backward, &mut sel_b, &reversed).unwrap();
        assert_eq!(forward, backward);
        assert_eq!(sel_a, sel_b);
    }

    #[test]
    fn deleting_exactly_an_annotation_strips_the_dead_mark() {
        let mut value = vec![Block::Text(TextBlock {
            key: Key::new("b1"),
            style: "normal".to_string(),
            list_item: None,
            level: None,
            mark_defs: vec![MarkDef {
                key: Key::new("l1"),
                kind: "link".to_string(),
                value: serde_json::Map::new(),
            }],
            children: vec![
                span("s1", "see ", &[]),
                span("s2", "this", &["l1", "strong"]),
                span("s3", " now", &[]),
            ],
        })];
        let mut selection = None;
        let sel = Selection::new(Point::indexed(0, Some(1), 0), Point::indexed(0, Some(1), 4));
        delete_selection(&mut value, &mut selection, &sel).unwrap();
        let text = value[0].as_text().unwrap();
        let emptied = text.children[1].as_span().unwrap();
        assert!(emptied.text.is_empty());
        // The annotation mark is gone, the decorator survives.
        assert_eq!(emptied.marks, vec!["strong".to_string()]);
        assert!(text.mark_defs.is_empty());
    }

    #[test]
    fn character_delete_at_block_start_merges_blocks() {
        let mut value = doc();
        let mut selection = Some(Selection::collapsed(Point::keyed(
            "b2",
            Some(Key::new("s2")),
            0,
        )));
        let changed = delete(
            &mut value,
            &mut selection,
            &DeleteTarget::Unit {
                direction: DeleteDirection::Backward,
                unit: TextUnit::Character,
            },
        )
        .unwrap();
        assert_eq!(changed, vec![Key::new("b1"), Key::new("b2")]);
        assert_eq!(value.len(), 1);
        assert_eq!(value[0].as_text().unwrap().text(), "helloworld");
    }

    #[test]
    fn word_delete_takes_the_preceding_word() {
        let mut value = vec![text_block("b1", vec![span("s1", "one two three", &[])])];
        let mut selection = Some(Selection::collapsed(Point::keyed(
            "b1",
            Some(Key::new("s1")),
            7,
        )));
        delete(
            &mut value,
            &mut selection,
            &DeleteTarget::Unit {
                direction: DeleteDirection::Backward,
                unit: TextUnit::Word,
            },
        )
        .unwrap();
        assert_eq!(value[0].as_text().unwrap().text(), "one  three");
    }

    #[test]
    fn word_delete_stops_at_an_inline_object() {
        let ticker = || {
            Child::InlineObject(crate::content::InlineObject {
                key: Key::new("i1"),
                object_type: "stock-ticker".to_string(),
                value: serde_json::Map::new(),
            })
        };
        let mut value = vec![text_block(
            "b1",
            vec![span("s1", "ab", &[]), ticker(), span("s3", "cd", &[])],
        )];
        let mut selection = Some(Selection::collapsed(Point::keyed(
            "b1",
            Some(Key::new("s3")),
            2,
        )));
        delete(
            &mut value,
            &mut selection,
            &DeleteTarget::Unit {
                direction: DeleteDirection::Backward,
                unit: TextUnit::Word,
            },
        )
        .unwrap();
        let text = value[0].as_text().unwrap();
        assert_eq!(text.text(), "ab");
        // Only "cd" went; the object and the leading span survive.
        assert!(text.children.iter().any(|c| c.as_span().is_none()));

        // Forward from after "ab": the object deletes as one unit.
        let mut value = vec![text_block(
            "b1",
            vec![span("s1", "ab", &[]), ticker(), span("s3", "cd", &[])],
        )];
        let mut selection = Some(Selection::collapsed(Point::keyed(
            "b1",
            Some(Key::new("s1")),
            2,
        )));
        delete(
            &mut value,
            &mut selection,
            &DeleteTarget::Unit {
                direction: DeleteDirection::Forward,
                unit: TextUnit::Word,
            },
        )
        .unwrap();
        let text = value[0].as_text().unwrap();
        assert_eq!(text.text(), "abcd");
        assert!(text.children.iter().all(|c| c.as_span().is_some()));
    }

    #[test]
    fn forward_character_delete_removes_an_inline_object() {
        let mut value = vec![text_block(
            "b1",
            vec![
                span("s1", "ab", &[]),
                Child::InlineObject(crate::content::InlineObject {
                    key: Key::new("i1"),
                    object_type: "stock-ticker".to_string(),
                    value: serde_json::Map::new(),
                }),
                span("s3", "cd", &[]),
            ],
        )];
        let mut selection = Some(Selection::collapsed(Point::keyed(
            "b1",
            Some(Key::new("s1")),
            2,
        )));
        delete(
            &mut value,
            &mut selection,
            &DeleteTarget::Unit {
                direction: DeleteDirection::Forward,
                unit: TextUnit::Character,
            },
        )
        .unwrap();
        let text = value[0].as_text().unwrap();
        assert_eq!(text.text(), "abcd");
        assert!(text.children.iter().all(|c| c.as_span().is_some()));
    }

    #[test]
    fn insert_block_positions() {
        let mut value = doc();
        let mut selection = None;
        let b3 = text_block("b3", vec![span("s3", "mid", &[])]);
        apply(
            &mut value,
            &mut selection,
            &Mutation::InsertBlock {
                block: b3,
                at: crate::event::InsertBlockAt::after(Key::new("b1")),
            },
        )
        .unwrap();
        let keys: Vec<&str> = value.iter().map(|b| b.key().as_str()).collect();
        assert_eq!(keys, vec!["b1", "b3", "b2"]);

        let b0 = text_block("b0", vec![span("s0", "top", &[])]);
        apply(
            &mut value,
            &mut selection,
            &Mutation::InsertBlock {
                block: b0,
                at: crate::event::InsertBlockAt {
                    ref_key: None,
                    placement: BlockPlacement::Before,
                },
            },
        )
        .unwrap();
        assert_eq!(value[0].key().as_str(), "b0");
    }

    #[test]
    fn inserting_after_a_missing_block_is_an_error() {
        let mut value = doc();
        let mut selection = None;
        let err = apply(
            &mut value,
            &mut selection,
            &Mutation::InsertBlock {
                block: text_block("bx", vec![span("sx", "x", &[])]),
                at: crate::event::InsertBlockAt::after(Key::new("gone")),
            },
        )
        .unwrap_err();
        assert!(matches!(err, ApplyError::UnknownBlock { .. }));
    }

    #[test]
    fn unsetting_list_item_reassigns_the_key_and_follows_the_selection() {
        let mut value = doc();
        value[0].as_text_mut().unwrap().list_item = Some("bullet".to_string());
        value[0].as_text_mut().unwrap().level = Some(1);
        let mut selection = Some(Selection::collapsed(Point::keyed(
            "b1",
            Some(Key::new("s1")),
            3,
        )));
        let changed = apply(
            &mut value,
            &mut selection,
            &Mutation::BlockUnset {
                key: Key::new("b1"),
                props: vec![BlockProp::ListItem, BlockProp::Level],
            },
        )
        .unwrap();
        let text = value[0].as_text().unwrap();
        assert!(text.list_item.is_none());
        assert!(text.level.is_none());
        assert_ne!(text.key.as_str(), "b1");
        assert_eq!(changed, vec![text.key.clone()]);
        // The keyed selection moved with the block.
        let sel = selection.unwrap();
        assert_eq!(sel.focus.path.block_key(), Some(&text.key));
    }

    #[test]
    fn move_block_swaps_neighbors_and_stops_at_edges() {
        let mut value = doc();
        let mut selection = None;
        apply(
            &mut value,
            &mut selection,
            &Mutation::MoveBlockDown {
                key: Key::new("b1"),
            },
        )
        .unwrap();
        let keys: Vec<&str> = value.iter().map(|b| b.key().as_str()).collect();
        assert_eq!(keys, vec!["b2", "b1"]);

        let changed = apply(
            &mut value,
            &mut selection,
            &Mutation::MoveBlockDown {
                key: Key::new("b1"),
            },
        )
        .unwrap();
        assert!(changed.is_empty());
    }

    #[test]
    fn deleting_a_selected_block_moves_the_selection_to_a_neighbor() {
        let mut value = doc();
        let mut selection = Some(Selection::collapsed(Point::keyed(
            "b2",
            Some(Key::new("s2")),
            2,
        )));
        apply(
            &mut value,
            &mut selection,
            &Mutation::DeleteBlock {
                key: Key::new("b2"),
            },
        )
        .unwrap();
        let sel = selection.unwrap();
        assert_eq!(sel.focus.path.block_key(), Some(&Key::new("b1")));
        assert_eq!(sel.focus.offset, 5);
    }

    #[test]
    fn stale_delete_range_is_a_no_op() {
        let mut value = doc();
        let mut selection = None;
        let sel = Selection::new(
            Point::keyed("gone", None, 0),
            Point::keyed("b2", Some(Key::new("s2")), 2),
        );
        let changed = delete_selection(&mut value, &mut selection, &sel).unwrap();
        assert!(changed.is_empty());
        assert_eq!(value.len(), 2);
    }

    #[test]
    fn out_of_range_indexed_delete_range_is_a_no_op() {
        let mut value = doc();
        let mut selection = None;
        let sel = Selection::new(Point::indexed(4, Some(0), 0), Point::indexed(5, Some(0), 1));
        let changed = delete_selection(&mut value, &mut selection, &sel).unwrap();
        assert!(changed.is_empty());
        assert_eq!(value.len(), 2);

        // One valid end is not enough; both points must still resolve.
        let half_stale =
            Selection::new(Point::indexed(0, Some(0), 2), Point::indexed(5, Some(0), 1));
        let changed = delete_selection(&mut value, &mut selection, &half_stale).unwrap();
        assert!(changed.is_empty());
        assert_eq!(value[0].as_text().unwrap().text(), "hello");
    }
}
