//! Active-mark computation and mark inheritance.
//!
//! [`mark_state`] decides which marks newly inserted text carries. The
//! subtle part is annotation boundaries: an annotation must never silently
//! extend past where the author put it, unless the neighboring span is
//! genuinely the same annotation. Decorators have no such scoping, so plain
//! spans simply pass their marks on.

use std::collections::BTreeSet;

use crate::content::{Child, MarkDef, Span, TextBlock};
use crate::selectors::{focus_span, selected_blocks, selected_spans};
use crate::snapshot::Snapshot;

/// Result of the mark-inheritance computation.
///
/// `Unchanged` means typing continues the enclosing span's formatting;
/// `Changed` means insertion starts a new span carrying exactly `marks`.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkState {
    Unchanged { marks: Vec<String> },
    Changed { marks: Vec<String> },
}

impl MarkState {
    pub fn marks(&self) -> &[String] {
        match self {
            MarkState::Unchanged { marks } | MarkState::Changed { marks } => marks,
        }
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, MarkState::Changed { .. })
    }
}

fn mark_set(span: &Span) -> BTreeSet<&str> {
    span.marks.iter().map(String::as_str).collect()
}

fn same_marks(a: &Span, b: &Span) -> bool {
    mark_set(a) == mark_set(b)
}

/// Marks of `span` that reference a mark def on `block`, i.e. annotations
/// as opposed to decorators.
fn annotation_marks<'a>(block: &TextBlock, span: &'a Span) -> Vec<&'a str> {
    span.marks
        .iter()
        .map(String::as_str)
        .filter(|m| block.mark_def(m).is_some())
        .collect()
}

/// The neighboring span on the given side of child `c`, if the adjacent
/// child is a span at all.
fn neighbor_span(block: &TextBlock, c: usize, towards_start: bool) -> Option<&Span> {
    let n = if towards_start {
        c.checked_sub(1)?
    } else {
        c + 1
    };
    block.children.get(n).and_then(Child::as_span)
}

/// Which marks text inserted at the current selection should carry.
///
/// Expanded selections take the intersection across all covered spans; any
/// covered span with no marks forces an empty result. A collapsed caret
/// inside a non-empty annotated span looks at the caret's position within
/// the span and at the adjacent span to decide whether the annotation
/// continues or stops at its authored boundary.
pub fn mark_state(snap: &Snapshot) -> Option<MarkState> {
    let sel = snap.indexed_selection()?;
    if !sel.is_collapsed() {
        return expanded_mark_state(snap);
    }

    let focus = focus_span(snap)?;
    let block = snap.blocks()[focus.block_index].as_text()?;
    let span = focus.span;
    let offset = sel.focus.offset.min(span.len());
    let annotations = annotation_marks(block, span);

    if span.is_empty() || annotations.is_empty() {
        // Plain span: marks carry over, except that a caret sitting exactly
        // between two spans with identical mark sets starts a fresh span of
        // that shared set.
        let boundary_twin = (offset == 0
            && neighbor_span(block, focus.child_index, true)
                .is_some_and(|p| same_marks(p, span)))
            || (offset == span.len()
                && neighbor_span(block, focus.child_index, false)
                    .is_some_and(|n| same_marks(n, span)));
        if boundary_twin {
            return Some(MarkState::Changed {
                marks: span.marks.clone(),
            });
        }
        return Some(MarkState::Unchanged {
            marks: span.marks.clone(),
        });
    }

    if offset > 0 && offset < span.len() {
        // Strictly inside the annotated span: typing stays annotated.
        return Some(MarkState::Unchanged {
            marks: span.marks.clone(),
        });
    }

    let neighbor = neighbor_span(block, focus.child_index, offset == 0);
    let state = match neighbor {
        Some(n) if same_marks(n, span) => MarkState::Changed {
            marks: span.marks.clone(),
        },
        Some(n) if annotations.iter().all(|a| n.has_mark(a)) => {
            // Same annotation continues across the boundary; keep only what
            // both sides agree on.
            let shared: Vec<String> = span
                .marks
                .iter()
                .filter(|m| n.has_mark(m))
                .cloned()
                .collect();
            MarkState::Changed { marks: shared }
        }
        // Unrelated neighbor, or none: the annotation ends here.
        _ => MarkState::Changed { marks: Vec::new() },
    };
    Some(state)
}

fn expanded_mark_state(snap: &Snapshot) -> Option<MarkState> {
    let spans = selected_spans(snap);
    let first = spans.first()?;

    let mut intersection: BTreeSet<&str> = mark_set(first.span);
    let mut uniform = true;
    for touched in &spans[1..] {
        let set = mark_set(touched.span);
        if set != intersection {
            uniform = false;
        }
        intersection = intersection.intersection(&set).copied().collect();
    }

    let marks: Vec<String> = intersection.into_iter().map(String::from).collect();
    if uniform {
        Some(MarkState::Unchanged { marks })
    } else {
        Some(MarkState::Changed { marks })
    }
}

/// Marks a text insertion at the current selection should carry once the
/// snapshot's pending decorator overrides are applied on top of the
/// inherited state.
pub fn insertion_marks(snap: &Snapshot) -> Vec<String> {
    let mut marks: Vec<String> = mark_state(snap)
        .map(|s| s.marks().to_vec())
        .unwrap_or_default();
    for (decorator, on) in &snap.decorator_overrides {
        let present = marks.iter().any(|m| m == decorator);
        if *on && !present {
            marks.push(decorator.clone());
        } else if !*on && present {
            marks.retain(|m| m != decorator);
        }
    }
    marks
}

/// Decorators active at the current selection, in schema declaration order,
/// with pending overrides applied.
pub fn active_decorators(snap: &Snapshot) -> Vec<String> {
    let marks = insertion_marks(snap);
    snap.schema
        .decorators
        .iter()
        .filter(|d| marks.iter().any(|m| &m == d))
        .cloned()
        .collect()
}

/// Annotation payloads active across the whole selection: mark defs whose
/// key is carried by every covered span (or by the caret's span state).
pub fn active_annotations(snap: &Snapshot) -> Vec<&MarkDef> {
    let marks = mark_state(snap).map(|s| s.marks().to_vec()).unwrap_or_default();
    if marks.is_empty() {
        return Vec::new();
    }
    let mut out: Vec<&MarkDef> = Vec::new();
    for (_, block) in selected_blocks(snap) {
        let Some(text) = block.as_text() else { continue };
        for def in &text.mark_defs {
            if marks.iter().any(|m| m == def.key.as_str())
                && !out.iter().any(|d| d.key == def.key)
            {
                out.push(def);
            }
        }
    }
    out
}
