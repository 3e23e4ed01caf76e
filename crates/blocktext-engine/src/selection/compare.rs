//! Point ordering and selection containment.
//!
//! Points are totally ordered by lexicographic path comparison, then offset.
//! Only indexed points order without a document; keyed points must be
//! resolved first (see [`crate::selection::convert`]).

use std::cmp::Ordering;

use crate::selection::{Path, Point, Selection};

/// Total order over indexed points: block index, then child index (a
/// block-level point sorts before any of its children), then offset.
///
/// # Panics
///
/// Panics when either point is keyed, or when the flavors differ. Keyed
/// points carry no inherent order; resolve them against the document first.
pub fn compare_points(a: &Point, b: &Point) -> Ordering {
    let (a_block, a_child) = match &a.path {
        Path::Indexed { block, child } => (*block, *child),
        Path::Keyed { .. } => panic!(
            "cannot compare keyed points without resolving them against the document"
        ),
    };
    let (b_block, b_child) = match &b.path {
        Path::Indexed { block, child } => (*block, *child),
        Path::Keyed { .. } => panic!(
            "cannot compare an indexed point against a keyed point"
        ),
    };

    a_block
        .cmp(&b_block)
        .then_with(|| match (a_child, b_child) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => x.cmp(&y),
        })
        .then_with(|| a.offset.cmp(&b.offset))
}

/// Whether `point` lies within the bounds of `sel`, inclusive at both ends.
/// Indexed only.
pub fn selection_contains_point(sel: &Selection, point: &Point) -> bool {
    let sel = sel.normalized();
    compare_points(&sel.anchor, point) != Ordering::Greater
        && compare_points(point, &sel.focus) != Ordering::Greater
}

/// Whether `inner`'s bounds fall entirely within `outer`'s bounds,
/// regardless of either selection's direction. Indexed only.
pub fn selection_contains(outer: &Selection, inner: &Selection) -> bool {
    let inner = inner.normalized();
    selection_contains_point(outer, &inner.anchor) && selection_contains_point(outer, &inner.focus)
}

/// Whether the two selections cover any common ground. Indexed only.
/// Collapsed selections overlap a range they sit inside of.
pub fn selections_overlap(a: &Selection, b: &Selection) -> bool {
    let a = a.normalized();
    let b = b.normalized();
    if a.is_collapsed() || b.is_collapsed() {
        return selection_contains_point(&b, &a.anchor) || selection_contains_point(&a, &b.anchor);
    }
    compare_points(&a.anchor, &b.focus) == Ordering::Less
        && compare_points(&b.anchor, &a.focus) == Ordering::Less
}
