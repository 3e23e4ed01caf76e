//! Default insertion behaviors.
//!
//! `InsertText` picks up the marks the caret inherits and re-raises as
//! `InsertSpan`; `InsertSpan` grows the caret span in place when the mark
//! sets agree and splices a new span otherwise. `Split` divides the focus
//! block in two, and `InsertBlocks` is the workhorse behind paste and drop:
//! in `Auto` placement it splits the focus block at the caret and weaves
//! the incoming blocks in, merging text blocks at the seams.

use crate::behavior::defaults::util::{
    TextCaret, block_edge_selection, caret_after, caret_before, is_blank, pruned_defs,
    resolve_text_caret, splice_children, split_children,
};
use crate::behavior::{Action, Behavior, EventPattern};
use crate::content::{Block, Child, InlineObject, Key, MarkDef, Span, TextBlock, split_text};
use crate::event::{
    BlockPatch, BlockPlacement, ChildPatch, Event, EventKind, InsertBlockAt, InsertPlacement,
    Mutation, SelectPosition,
};
use crate::selection::{Point, Selection};
use crate::selectors::insertion_marks;

pub fn behaviors() -> Vec<Behavior> {
    vec![
        insert_text(),
        insert_soft_break(),
        insert_break(),
        split(),
        insert_span(),
        insert_inline_object(),
        insert_child(),
        insert_blocks(),
    ]
}

fn raise(m: Mutation) -> Action {
    Action::Raise(Event::from(m))
}

fn select(selection: Selection) -> Mutation {
    Mutation::Select {
        selection: Some(selection),
    }
}

fn insert_text() -> Behavior {
    Behavior::new(
        "insert.text",
        EventPattern::Exact(EventKind::InsertText),
        0,
        |snap, event| {
            let Event::InsertText { text } = event else {
                return None;
            };
            if text.is_empty() {
                return None;
            }
            resolve_text_caret(snap)?;
            Some(insertion_marks(snap))
        },
        |_, event, marks| {
            let Event::InsertText { text } = event else {
                return vec![];
            };
            vec![Action::Raise(Event::InsertSpan {
                text: text.clone(),
                marks,
            })]
        },
    )
}

fn insert_soft_break() -> Behavior {
    Behavior::unguarded(
        "insert.soft-break",
        EventPattern::Exact(EventKind::InsertSoftBreak),
        0,
        |_, _| {
            vec![Action::Raise(Event::InsertText {
                text: "\n".to_string(),
            })]
        },
    )
}

fn insert_break() -> Behavior {
    Behavior::unguarded(
        "insert.break",
        EventPattern::Exact(EventKind::InsertBreak),
        0,
        |_, _| vec![Action::Raise(Event::Split)],
    )
}

fn insert_span() -> Behavior {
    Behavior::new(
        "insert.span",
        EventPattern::Exact(EventKind::InsertSpan),
        0,
        |snap, _| resolve_text_caret(snap),
        |_, event, caret| {
            let Event::InsertSpan { text, marks } = event else {
                return vec![];
            };
            let TextCaret {
                block,
                doomed,
                child,
                offset,
                collapsed,
            } = caret;

            // Same mark set at a plain collapsed caret: grow the span.
            if collapsed
                && let Some(Child::Span(s)) = block.children.get(child)
                && s.marks.len() == marks.len()
                && marks.iter().all(|m| s.has_mark(m))
            {
                let (head, tail) = split_text(&s.text, offset);
                return vec![
                    raise(Mutation::ChildSet {
                        block: block.key.clone(),
                        key: s.key.clone(),
                        patch: ChildPatch {
                            text: Some(format!("{head}{text}{tail}")),
                            ..Default::default()
                        },
                    }),
                    raise(select(Selection::collapsed(Point::keyed(
                        block.key.clone(),
                        Some(s.key.clone()),
                        offset + text.chars().count(),
                    )))),
                ];
            }

            let span = Child::Span(Span::with_marks(text.clone(), marks.clone()));
            let caret_sel = caret_after(&block.key, &span);
            let children = splice_children(&block.children, child, offset, vec![span]);
            let mut actions = vec![raise(Mutation::BlockSet {
                key: block.key.clone(),
                patch: BlockPatch {
                    children: Some(children),
                    mark_defs: Some(block.mark_defs.clone()),
                    ..Default::default()
                },
            })];
            for key in doomed {
                actions.push(raise(Mutation::DeleteBlock { key }));
            }
            actions.push(raise(select(caret_sel)));
            actions
        },
    )
}

fn insert_inline_object() -> Behavior {
    Behavior::new(
        "insert.inline-object",
        EventPattern::Exact(EventKind::InsertInlineObject),
        0,
        |snap, event| {
            let Event::InsertInlineObject { object_type, .. } = event else {
                return None;
            };
            snap.schema.inline_object(object_type)?;
            resolve_text_caret(snap)?;
            Some(())
        },
        |_, event, ()| {
            let Event::InsertInlineObject { object_type, value } = event else {
                return vec![];
            };
            vec![Action::Raise(Event::InsertChild {
                child: Child::InlineObject(InlineObject::new(object_type.clone(), value.clone())),
            })]
        },
    )
}

fn insert_child() -> Behavior {
    Behavior::new(
        "insert.child",
        EventPattern::Exact(EventKind::InsertChild),
        0,
        |snap, _| resolve_text_caret(snap),
        |_, event, caret| {
            let Event::InsertChild { child } = event else {
                return vec![];
            };
            let TextCaret {
                block,
                doomed,
                child: at,
                offset,
                ..
            } = caret;

            // Fresh key: the incoming child may be a copy of existing content.
            let mut child = child.clone();
            match &mut child {
                Child::Span(s) => s.key = Key::random(),
                Child::InlineObject(o) => o.key = Key::random(),
            }
            let caret_sel = caret_after(&block.key, &child);
            let children = splice_children(&block.children, at, offset, vec![child]);
            let mut actions = vec![raise(Mutation::BlockSet {
                key: block.key.clone(),
                patch: BlockPatch {
                    children: Some(children),
                    mark_defs: Some(block.mark_defs.clone()),
                    ..Default::default()
                },
            })];
            for key in doomed {
                actions.push(raise(Mutation::DeleteBlock { key }));
            }
            actions.push(raise(select(caret_sel)));
            actions
        },
    )
}

fn split() -> Behavior {
    Behavior::new(
        "insert.split",
        EventPattern::Exact(EventKind::Split),
        0,
        |snap, _| resolve_text_caret(snap),
        |_, _, caret| {
            let TextCaret {
                block,
                doomed,
                child,
                offset,
                ..
            } = caret;
            let caret_marks = block
                .children
                .get(child)
                .and_then(Child::as_span)
                .map(|s| s.marks.clone())
                .unwrap_or_default();

            let (mut head, mut tail) = split_children(&block.children, child, offset);
            if head.is_empty() {
                head.push(Child::Span(Span::with_marks("", caret_marks.clone())));
            }
            if tail.is_empty() {
                tail.push(Child::Span(Span::with_marks("", caret_marks)));
            }

            let head_defs = pruned_defs(&[&block.mark_defs], &head);
            let tail_defs = pruned_defs(&[&block.mark_defs], &tail);
            let new_block = TextBlock {
                key: Key::random(),
                style: block.style.clone(),
                list_item: block.list_item.clone(),
                level: block.level,
                mark_defs: tail_defs,
                children: tail,
            };
            let caret_sel = Selection::collapsed(Point::keyed(
                new_block.key.clone(),
                new_block.children.first().map(|c| c.key().clone()),
                0,
            ));

            let mut actions = vec![raise(Mutation::BlockSet {
                key: block.key.clone(),
                patch: BlockPatch {
                    children: Some(head),
                    mark_defs: Some(head_defs),
                    ..Default::default()
                },
            })];
            for key in doomed {
                actions.push(raise(Mutation::DeleteBlock { key }));
            }
            actions.push(raise(Mutation::InsertBlock {
                block: Block::Text(new_block),
                at: InsertBlockAt::after(block.key.clone()),
            }));
            actions.push(raise(select(caret_sel)));
            actions
        },
    )
}

enum Plan {
    /// Plain insertion at a block edge; the focus block is untouched.
    Edge(InsertBlockAt),
    /// Split the focus text block at the caret and weave the content in.
    Weave(TextCaret),
}

fn insert_blocks() -> Behavior {
    Behavior::new(
        "insert.blocks",
        EventPattern::Exact(EventKind::InsertBlocks),
        0,
        |snap, event| {
            let Event::InsertBlocks {
                blocks, placement, ..
            } = event
            else {
                return None;
            };
            if blocks.is_empty() {
                return None;
            }
            let focus_key = crate::selectors::focus_block(snap).map(|(_, b)| b.key().clone());
            let after_focus = |key: Option<Key>| match key {
                Some(key) => InsertBlockAt::after(key),
                None => InsertBlockAt::document_end(),
            };
            match placement {
                InsertPlacement::Before => Some(Plan::Edge(match focus_key {
                    Some(key) => InsertBlockAt::before(key),
                    None => InsertBlockAt {
                        ref_key: None,
                        placement: BlockPlacement::Before,
                    },
                })),
                InsertPlacement::After => Some(Plan::Edge(after_focus(focus_key))),
                InsertPlacement::Auto => match resolve_text_caret(snap) {
                    Some(caret) => Some(Plan::Weave(caret)),
                    // Object block or no selection: fall back to edge insertion.
                    None => Some(Plan::Edge(after_focus(focus_key))),
                },
            }
        },
        |_, event, plan| {
            let Event::InsertBlocks {
                blocks,
                select: pos,
                ..
            } = event
            else {
                return vec![];
            };
            let fresh: Vec<Block> = blocks.iter().map(Block::with_fresh_keys).collect();
            match plan {
                Plan::Edge(at) => edge_insert(fresh, at, *pos),
                Plan::Weave(caret) => weave_insert(fresh, caret, *pos),
            }
        },
    )
}

fn edge_insert(blocks: Vec<Block>, at: InsertBlockAt, pos: SelectPosition) -> Vec<Action> {
    let mut actions = Vec::new();
    let edge = match pos {
        SelectPosition::Start => blocks.first().map(|b| block_edge_selection(b, false)),
        SelectPosition::End => blocks.last().map(|b| block_edge_selection(b, true)),
        SelectPosition::None => None,
    };
    let mut at = at;
    for block in blocks {
        let key = block.key().clone();
        actions.push(raise(Mutation::InsertBlock { block, at }));
        at = InsertBlockAt::after(key);
    }
    if let Some(edge) = edge {
        actions.push(raise(edge));
    }
    actions
}

fn weave_insert(mut incoming: Vec<Block>, caret: TextCaret, pos: SelectPosition) -> Vec<Action> {
    let TextCaret {
        block,
        doomed,
        child,
        offset,
        collapsed,
    } = caret;
    let (head, tail) = split_children(&block.children, child, offset);

    // Caret at the very start with non-text leading content: insert in
    // front of the block and leave it whole.
    if collapsed && is_blank(&head) && !is_blank(&tail) && incoming[0].as_text().is_none() {
        return edge_insert(incoming, InsertBlockAt::before(block.key.clone()), pos);
    }

    let mut focus_children = head;
    let mut def_pool: Vec<MarkDef> = block.mark_defs.clone();
    let mut start_sel: Option<Mutation> = None;
    let mut end_sel: Option<Mutation> = None;

    if incoming[0].as_text().is_some() {
        let Block::Text(first) = incoming.remove(0) else {
            unreachable!()
        };
        if let Some(c) = first.children.first() {
            start_sel = Some(select(caret_before(&block.key, c)));
        }
        let merged_last = first.children.last().map(|c| c.key().clone());
        focus_children.extend(first.children);
        def_pool.extend(first.mark_defs);
        if incoming.is_empty() {
            // Single text block: its content merges inline, no new blocks.
            if let Some(key) = merged_last {
                let len = focus_children
                    .last()
                    .map(|c| c.len())
                    .unwrap_or_default();
                end_sel = Some(select(Selection::collapsed(Point::keyed(
                    block.key.clone(),
                    Some(key),
                    len,
                ))));
            }
            focus_children.extend(tail.clone());
        }
    } else if let Some(first) = incoming.first() {
        start_sel = Some(block_edge_selection(first, false));
    }

    let mut inserts = incoming;
    if !inserts.is_empty() && !tail.is_empty() {
        match inserts.last_mut().and_then(Block::as_text_mut) {
            Some(last) => {
                if let Some(c) = last.children.last() {
                    end_sel = Some(select(caret_after(&last.key, c)));
                }
                last.children.extend(tail.clone());
                let pool: Vec<MarkDef> = last
                    .mark_defs
                    .iter()
                    .chain(block.mark_defs.iter())
                    .cloned()
                    .collect();
                last.mark_defs = pruned_defs(&[&pool], &last.children);
            }
            None => {
                // Trailing object block: the tail becomes its own block.
                let tail_block = TextBlock {
                    key: Key::random(),
                    style: block.style.clone(),
                    list_item: block.list_item.clone(),
                    level: block.level,
                    mark_defs: pruned_defs(&[&block.mark_defs], &tail),
                    children: tail.clone(),
                };
                if let Some(c) = tail_block.children.first() {
                    end_sel = Some(select(caret_before(&tail_block.key, c)));
                }
                inserts.push(Block::Text(tail_block));
            }
        }
    }

    if end_sel.is_none()
        && let Some(last) = inserts.last()
    {
        end_sel = Some(block_edge_selection(last, true));
    }
    if focus_children.is_empty() {
        focus_children.push(Child::Span(Span::new("")));
    }
    if end_sel.is_none()
        && let Some(c) = focus_children.last()
    {
        end_sel = Some(select(caret_after(&block.key, c)));
    }

    let focus_children = pruned_children(focus_children);
    let mut actions = vec![raise(Mutation::BlockSet {
        key: block.key.clone(),
        patch: BlockPatch {
            mark_defs: Some(pruned_defs(&[&def_pool], &focus_children)),
            children: Some(focus_children),
            ..Default::default()
        },
    })];
    for key in doomed {
        actions.push(raise(Mutation::DeleteBlock { key }));
    }
    let mut prev = block.key.clone();
    for insert in inserts {
        let key = insert.key().clone();
        actions.push(raise(Mutation::InsertBlock {
            block: insert,
            at: InsertBlockAt::after(prev),
        }));
        prev = key;
    }
    let selection = match pos {
        SelectPosition::Start => start_sel,
        SelectPosition::End => end_sel,
        SelectPosition::None => None,
    };
    if let Some(selection) = selection {
        actions.push(raise(selection));
    }
    actions
}

/// Drop empty spans butted against real content by a weave, keeping at
/// least one child.
fn pruned_children(children: Vec<Child>) -> Vec<Child> {
    if children.len() <= 1 {
        return children;
    }
    let pruned: Vec<Child> = children.iter().filter(|c| !c.is_empty()).cloned().collect();
    if pruned.is_empty() { children } else { pruned }
}
