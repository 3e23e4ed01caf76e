//! Caret and span arithmetic shared by the default behaviors.
//!
//! The document only mutates after a cascade resolves, so a behavior acting
//! over an expanded selection cannot emit a delete and then address the
//! collapsed result: no snapshot of that intermediate state exists. Instead
//! [`resolve_text_caret`] computes, from the one snapshot, the state the
//! start block will be in once the covered range is gone, and behaviors
//! build their mutations against that.

use crate::content::{Child, Key, MarkDef, Span, TextBlock, split_text};
use crate::event::Mutation;
use crate::selection::{Point, Selection, point_to_keyed};
use crate::selectors::selected_spans;
use crate::snapshot::Snapshot;

/// A caret resolved against the post-collapse state of the document.
pub(super) struct TextCaret {
    /// The start block with the selection's covered range merged out. For a
    /// collapsed selection this is the focus block verbatim.
    pub block: TextBlock,
    /// Blocks the selection consumes entirely (middle and end blocks of a
    /// cross-block range).
    pub doomed: Vec<Key>,
    /// Caret child index within `block.children`.
    pub child: usize,
    /// Char offset within the caret child. Over an inline object child,
    /// `0` means before it and `1` after it.
    pub offset: usize,
    pub collapsed: bool,
}

pub(super) fn resolve_text_caret(snap: &Snapshot) -> Option<TextCaret> {
    let sel = snap.indexed_selection()?.normalized();
    let sb = sel.anchor.path.block_index()?;
    let mut block = snap.blocks().get(sb)?.as_text()?.clone();

    if sel.is_collapsed() {
        let child = sel.anchor.path.child_index().unwrap_or(0);
        return Some(TextCaret {
            child: child.min(block.children.len()),
            offset: sel.anchor.offset,
            block,
            doomed: Vec::new(),
            collapsed: true,
        });
    }

    let eb = sel.focus.path.block_index()?;
    let sc = sel.anchor.path.child_index().unwrap_or(0);
    let so = sel.anchor.offset;
    let ec = sel.focus.path.child_index();
    let eo = sel.focus.offset;

    let doomed: Vec<Key> = snap.blocks()[sb + 1..=eb]
        .iter()
        .map(|b| b.key().clone())
        .collect();

    let mut merged: Vec<Child> = block.children[..sc.min(block.children.len())].to_vec();
    let caret_child = merged.len();
    let mut caret_offset = 0;

    if sb == eb && ec == Some(sc) {
        // Range within a single child.
        match block.children.get(sc) {
            Some(Child::Span(s)) => {
                let (head, _) = split_text(&s.text, so);
                let (_, tail) = split_text(&s.text, eo);
                merged.push(Child::Span(Span {
                    key: s.key.clone(),
                    text: format!("{head}{tail}"),
                    marks: s.marks.clone(),
                }));
                caret_offset = so;
            }
            // A covered inline object is simply gone.
            Some(Child::InlineObject(_)) | None => {}
        }
        merged.extend(block.children.get(sc + 1..).unwrap_or_default().iter().cloned());
        let defs = pruned_defs(&[&block.mark_defs], &merged);
        block.children = merged;
        block.mark_defs = defs;
        return Some(TextCaret {
            block,
            doomed,
            child: caret_child,
            offset: caret_offset,
            collapsed: false,
        });
    }

    // Surviving piece of the start boundary child. Truncated boundary spans
    // are retained even when emptied so the caret has a landing site.
    match block.children.get(sc) {
        Some(Child::Span(s)) => {
            let (head, _) = split_text(&s.text, so);
            merged.push(Child::Span(Span {
                key: s.key.clone(),
                text: head,
                marks: s.marks.clone(),
            }));
            caret_offset = so;
        }
        Some(obj @ Child::InlineObject(_)) if so >= 1 => {
            merged.push(obj.clone());
            caret_offset = 1;
        }
        _ => {}
    }

    // Surviving tail, from this block or the end block of the range.
    let (tail_children, tail_defs): (Vec<Child>, &[MarkDef]) = if sb == eb {
        (tail_of(&block.children, ec, eo), &[])
    } else {
        match snap.blocks().get(eb).and_then(|b| b.as_text()) {
            Some(end) => (tail_of(&end.children, ec, eo), end.mark_defs.as_slice()),
            // Object end block: already in `doomed`, nothing survives.
            None => (Vec::new(), &[]),
        }
    };
    merged.extend(tail_children);

    let defs = pruned_defs(&[&block.mark_defs, tail_defs], &merged);
    block.children = merged;
    block.mark_defs = defs;
    Some(TextCaret {
        block,
        doomed,
        child: caret_child,
        offset: caret_offset,
        collapsed: false,
    })
}

/// Children of an end block surviving after its boundary point. An end
/// point without a child path consumes the whole block.
fn tail_of(children: &[Child], ec: Option<usize>, eo: usize) -> Vec<Child> {
    let Some(ec) = ec else {
        return Vec::new();
    };
    let mut out = Vec::new();
    match children.get(ec) {
        Some(Child::Span(s)) => {
            let (_, tail) = split_text(&s.text, eo);
            out.push(Child::Span(Span {
                key: s.key.clone(),
                text: tail,
                marks: s.marks.clone(),
            }));
        }
        Some(obj @ Child::InlineObject(_)) if eo == 0 => out.push(obj.clone()),
        _ => {}
    }
    out.extend(children.get(ec + 1..).unwrap_or_default().iter().cloned());
    out
}

/// Whether `children` carry no content at all.
pub(super) fn is_blank(children: &[Child]) -> bool {
    children.iter().all(Child::is_empty)
}

/// Mark defs from `pools` (in order, first occurrence of a key wins) that
/// are still referenced by a span in `children`.
pub(super) fn pruned_defs(pools: &[&[MarkDef]], children: &[Child]) -> Vec<MarkDef> {
    let mut out: Vec<&MarkDef> = Vec::new();
    for def in pools.iter().copied().flatten() {
        let referenced = children
            .iter()
            .filter_map(Child::as_span)
            .any(|s| s.has_mark(def.key.as_str()));
        if referenced && !out.iter().any(|d| d.key == def.key) {
            out.push(def);
        }
    }
    out.into_iter().cloned().collect()
}

/// Split `children` at a caret. A span under the caret is divided; the
/// piece after the caret gets a fresh key, since the piece keeping the
/// original key is the one the selection may still reference.
pub(super) fn split_children(children: &[Child], child: usize, offset: usize) -> (Vec<Child>, Vec<Child>) {
    let mut head: Vec<Child> = children[..child.min(children.len())].to_vec();
    let mut tail: Vec<Child> = Vec::new();
    if let Some(c) = children.get(child) {
        match c {
            Child::Span(s) => {
                if offset == 0 {
                    tail.push(c.clone());
                } else if offset >= s.len() {
                    head.push(c.clone());
                } else {
                    let (before, after) = split_text(&s.text, offset);
                    head.push(Child::Span(Span {
                        key: s.key.clone(),
                        text: before,
                        marks: s.marks.clone(),
                    }));
                    tail.push(Child::Span(Span {
                        key: Key::random(),
                        text: after,
                        marks: s.marks.clone(),
                    }));
                }
            }
            Child::InlineObject(_) => {
                if offset == 0 {
                    tail.push(c.clone());
                } else {
                    head.push(c.clone());
                }
            }
        }
        tail.extend(children.get(child + 1..).unwrap_or_default().iter().cloned());
    }
    (head, tail)
}

/// Insert `insert` at the caret, splitting the caret child if needed.
pub(super) fn splice_children(
    children: &[Child],
    child: usize,
    offset: usize,
    insert: Vec<Child>,
) -> Vec<Child> {
    let (mut head, tail) = split_children(children, child, offset);
    head.extend(insert);
    head.extend(tail);
    head
}

/// Collapsed keyed caret at the end of `child` in the given block.
pub(super) fn caret_after(block_key: &Key, child: &Child) -> Selection {
    Selection::collapsed(Point::keyed(
        block_key.clone(),
        Some(child.key().clone()),
        child.len(),
    ))
}

/// Collapsed keyed caret at the start of `child` in the given block.
pub(super) fn caret_before(block_key: &Key, child: &Child) -> Selection {
    Selection::collapsed(Point::keyed(block_key.clone(), Some(child.key().clone()), 0))
}

/// Keyed selection landing at the start or end edge of a whole block.
pub(super) fn block_edge_selection(block: &crate::content::Block, end: bool) -> Mutation {
    match block.as_text() {
        Some(text) => {
            let child = if end {
                text.children.last()
            } else {
                text.children.first()
            };
            let selection = match child {
                Some(c) if end => caret_after(&text.key, c),
                Some(c) => caret_before(&text.key, c),
                None => Selection::collapsed(Point::keyed(text.key.clone(), None, 0)),
            };
            Mutation::Select {
                selection: Some(selection),
            }
        }
        None => Mutation::SelectBlock {
            key: block.key().clone(),
        },
    }
}

/// Per-block mark rewrite requested by an annotation or decorator behavior.
pub(super) struct MarkEdit {
    pub add: Vec<String>,
    pub remove: Vec<String>,
    pub new_defs: Vec<MarkDef>,
}

impl MarkEdit {
    pub fn add(mark: impl Into<String>) -> Self {
        MarkEdit {
            add: vec![mark.into()],
            remove: Vec::new(),
            new_defs: Vec::new(),
        }
    }

    pub fn remove(marks: Vec<String>) -> Self {
        MarkEdit {
            add: Vec::new(),
            remove: marks,
            new_defs: Vec::new(),
        }
    }
}

/// Rewrite the spans covered by the current expanded selection, splitting
/// boundary spans so the edit applies only to the covered text. Returns the
/// block mutations plus the keyed selection covering the same text after
/// the rewrite.
pub(super) fn rewrite_selection_marks(
    snap: &Snapshot,
    per_block: impl Fn(&TextBlock) -> Option<MarkEdit>,
) -> Option<(Vec<Mutation>, Selection)> {
    let sel = snap.indexed_selection()?.normalized();
    if sel.is_collapsed() {
        return None;
    }
    let spans = selected_spans(snap);
    let (first_ref, last_ref) = (*spans.first()?, *spans.last()?);
    let sb = sel.anchor.path.block_index()?;
    let eb = sel.focus.path.block_index()?;
    let sc = sel.anchor.path.child_index();
    let ec = sel.focus.path.child_index();

    let mut muts = Vec::new();
    let mut sel_start: Option<Point> = None;
    let mut sel_end: Option<Point> = None;

    let mut i = 0;
    while i < spans.len() {
        let bi = spans[i].block_index;
        let group_start = i;
        while i < spans.len() && spans[i].block_index == bi {
            i += 1;
        }
        let Some(block) = snap.blocks().get(bi).and_then(|b| b.as_text()) else {
            continue;
        };
        let Some(edit) = per_block(block) else {
            continue;
        };

        let mut children = block.children.clone();
        // Rewrite back to front so earlier child indices stay valid.
        for r in spans[group_start..i].iter().rev() {
            let span = r.span;
            let start_off = if bi == sb && Some(r.child_index) == sc {
                sel.anchor.offset.min(span.len())
            } else {
                0
            };
            let end_off = if bi == eb && Some(r.child_index) == ec {
                sel.focus.offset.min(span.len())
            } else {
                span.len()
            };

            let whole = start_off == 0 && end_off >= span.len();
            let mid_key = if whole { span.key.clone() } else { Key::random() };
            let mut marks = span.marks.clone();
            for m in &edit.add {
                if !marks.contains(m) {
                    marks.push(m.clone());
                }
            }
            marks.retain(|m| !edit.remove.contains(m));

            let (before, rest) = split_text(&span.text, start_off);
            let (covered, after) = split_text(&rest, end_off - start_off);
            let covered_len = covered.chars().count();

            let mut pieces: Vec<Child> = Vec::new();
            if start_off > 0 {
                pieces.push(Child::Span(Span {
                    key: span.key.clone(),
                    text: before,
                    marks: span.marks.clone(),
                }));
            }
            pieces.push(Child::Span(Span {
                key: mid_key.clone(),
                text: covered,
                marks,
            }));
            if end_off < span.len() {
                pieces.push(Child::Span(Span {
                    key: Key::random(),
                    text: after,
                    marks: span.marks.clone(),
                }));
            }
            children.splice(r.child_index..=r.child_index, pieces);

            if r.block_index == first_ref.block_index && r.child_index == first_ref.child_index {
                sel_start = Some(Point::keyed(block.key.clone(), Some(mid_key.clone()), 0));
            }
            if r.block_index == last_ref.block_index && r.child_index == last_ref.child_index {
                sel_end = Some(Point::keyed(block.key.clone(), Some(mid_key), covered_len));
            }
        }

        let mut pool: Vec<MarkDef> = block.mark_defs.clone();
        pool.extend(edit.new_defs);
        let defs = pruned_defs(&[&pool], &children);
        muts.push(Mutation::BlockSet {
            key: block.key.clone(),
            patch: crate::event::BlockPatch {
                children: Some(children),
                mark_defs: Some(defs),
                ..Default::default()
            },
        });
    }

    if muts.is_empty() {
        return None;
    }
    let start = match sel_start {
        Some(p) => p,
        None => point_to_keyed(snap.blocks(), &sel.anchor)?,
    };
    let end = match sel_end {
        Some(p) => p,
        None => point_to_keyed(snap.blocks(), &sel.focus)?,
    };
    Some((muts, Selection::new(start, end)))
}
