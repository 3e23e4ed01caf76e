//! Conversion between the indexed and keyed path flavors.
//!
//! Conversion resolves against the *current* document value through the
//! block index map. A key that no longer exists yields `None`, not an error:
//! callers must treat that as "this selection no longer applies" and no-op.

use crate::content::{Block, Key};
use crate::selection::{BlockIndexMap, Path, Point, Selection};

/// Resolve a point of either flavor to `(block index, child index, offset)`.
///
/// Out-of-range indices and dead keys both yield `None`. A block-level point
/// resolves with `child = None`.
pub fn resolve_point(
    value: &[Block],
    index: &BlockIndexMap,
    point: &Point,
) -> Option<(usize, Option<usize>, usize)> {
    match &point.path {
        Path::Indexed { block, child } => {
            let b = value.get(*block)?;
            if let Some(c) = child {
                let text = b.as_text()?;
                if *c >= text.children.len() {
                    return None;
                }
            }
            Some((*block, *child, point.offset))
        }
        Path::Keyed { block, child } => {
            let (i, b) = index.resolve(value, block)?;
            let c = match child {
                Some(child_key) => Some(b.as_text()?.child_index(child_key)?),
                None => None,
            };
            Some((i, c, point.offset))
        }
    }
}

/// Convert a point to the keyed flavor. Identity for keyed input.
pub fn point_to_keyed(value: &[Block], point: &Point) -> Option<Point> {
    match &point.path {
        Path::Keyed { .. } => Some(point.clone()),
        Path::Indexed { block, child } => {
            let b = value.get(*block)?;
            let child_key: Option<Key> = match child {
                Some(c) => Some(b.as_text()?.children.get(*c)?.key().clone()),
                None => None,
            };
            Some(Point::keyed(b.key().clone(), child_key, point.offset))
        }
    }
}

/// Convert a point to the indexed flavor. Indexed input is validated
/// against the value rather than passed through, so a stale out-of-range
/// index degrades to `None` the same way a dead key does.
pub fn point_to_indexed(value: &[Block], index: &BlockIndexMap, point: &Point) -> Option<Point> {
    let (block, child, offset) = resolve_point(value, index, point)?;
    Some(Point::indexed(block, child, offset))
}

/// Convert both ends of a selection to the keyed flavor.
pub fn selection_to_keyed(value: &[Block], selection: &Selection) -> Option<Selection> {
    Some(Selection {
        anchor: point_to_keyed(value, &selection.anchor)?,
        focus: point_to_keyed(value, &selection.focus)?,
    })
}

/// Convert both ends of a selection to the indexed flavor.
pub fn selection_to_indexed(
    value: &[Block],
    index: &BlockIndexMap,
    selection: &Selection,
) -> Option<Selection> {
    Some(Selection {
        anchor: point_to_indexed(value, index, &selection.anchor)?,
        focus: point_to_indexed(value, index, &selection.focus)?,
    })
}
