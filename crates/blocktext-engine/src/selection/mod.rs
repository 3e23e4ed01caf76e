//! Selection and addressing model.
//!
//! Two mutually exclusive path flavors address positions in a document:
//!
//! - **Indexed** paths use integer positions. They are cheap to follow but
//!   invalidated by any structural edit.
//! - **Keyed** paths reference blocks and children by [`Key`]. They survive
//!   reordering but need a lookup against the live value to resolve.
//!
//! A call site commits to one flavor. Comparing a point of one flavor against
//! a point of the other is a programmer error and panics; no document state
//! can make such a comparison meaningful.

pub mod compare;
pub mod convert;
pub mod index;
pub mod slice;

pub use compare::{
    compare_points, selection_contains, selection_contains_point, selections_overlap,
};
pub use convert::{
    point_to_indexed, point_to_keyed, resolve_point, selection_to_indexed, selection_to_keyed,
};
pub use index::{BlockIndexMap, IndexEntry};
pub use slice::slice;

use serde::{Deserialize, Serialize};

use crate::content::Key;

/// Which representation a path uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathFlavor {
    Indexed,
    Keyed,
}

/// A path to a block, optionally descending to one of its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Path {
    Indexed { block: usize, child: Option<usize> },
    Keyed { block: Key, child: Option<Key> },
}

impl Path {
    pub fn flavor(&self) -> PathFlavor {
        match self {
            Path::Indexed { .. } => PathFlavor::Indexed,
            Path::Keyed { .. } => PathFlavor::Keyed,
        }
    }

    pub fn block_index(&self) -> Option<usize> {
        match self {
            Path::Indexed { block, .. } => Some(*block),
            Path::Keyed { .. } => None,
        }
    }

    pub fn block_key(&self) -> Option<&Key> {
        match self {
            Path::Indexed { .. } => None,
            Path::Keyed { block, .. } => Some(block),
        }
    }

    pub fn child_index(&self) -> Option<usize> {
        match self {
            Path::Indexed { child, .. } => *child,
            Path::Keyed { .. } => None,
        }
    }

    pub fn child_key(&self) -> Option<&Key> {
        match self {
            Path::Indexed { .. } => None,
            Path::Keyed { child, .. } => child.as_ref(),
        }
    }
}

/// A caret position: a path plus a char offset within the addressed child
/// (or `0` for block-level points).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn indexed(block: usize, child: Option<usize>, offset: usize) -> Self {
        Point {
            path: Path::Indexed { block, child },
            offset,
        }
    }

    pub fn keyed(block: impl Into<Key>, child: Option<Key>, offset: usize) -> Self {
        Point {
            path: Path::Keyed {
                block: block.into(),
                child,
            },
            offset,
        }
    }

    pub fn flavor(&self) -> PathFlavor {
        self.path.flavor()
    }
}

/// An anchor point and a focus point. Direction is not stored; it is derived
/// from comparison (see [`Selection::is_backward`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    /// Pair two points into a selection.
    ///
    /// # Panics
    ///
    /// Panics if the points use different path flavors.
    pub fn new(anchor: Point, focus: Point) -> Self {
        assert!(
            anchor.flavor() == focus.flavor(),
            "selection mixes an indexed point with a keyed point"
        );
        Selection { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Selection {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn flavor(&self) -> PathFlavor {
        self.anchor.flavor()
    }

    /// Whether the focus precedes the anchor. Indexed selections only.
    pub fn is_backward(&self) -> bool {
        compare::compare_points(&self.focus, &self.anchor) == std::cmp::Ordering::Less
    }

    /// The document-order first point. Indexed selections only.
    pub fn start(&self) -> &Point {
        if self.is_backward() {
            &self.focus
        } else {
            &self.anchor
        }
    }

    /// The document-order last point. Indexed selections only.
    pub fn end(&self) -> &Point {
        if self.is_backward() {
            &self.anchor
        } else {
            &self.focus
        }
    }

    /// Forward-ordered copy of this selection. Indexed selections only.
    pub fn normalized(&self) -> Selection {
        Selection {
            anchor: self.start().clone(),
            focus: self.end().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapsed_selection_detects_itself() {
        let sel = Selection::collapsed(Point::indexed(0, Some(0), 3));
        assert!(sel.is_collapsed());
        let sel = Selection::new(Point::indexed(0, Some(0), 3), Point::indexed(0, Some(0), 4));
        assert!(!sel.is_collapsed());
    }

    #[test]
    fn direction_is_derived_not_stored() {
        let forward = Selection::new(Point::indexed(0, Some(0), 1), Point::indexed(2, Some(0), 0));
        assert!(!forward.is_backward());
        let backward = Selection::new(Point::indexed(2, Some(0), 0), Point::indexed(0, Some(0), 1));
        assert!(backward.is_backward());
        assert_eq!(backward.start(), &Point::indexed(0, Some(0), 1));
        assert_eq!(backward.normalized(), forward);
    }

    #[test]
    #[should_panic(expected = "mixes an indexed point with a keyed point")]
    fn pairing_mixed_flavors_panics() {
        let _ = Selection::new(
            Point::indexed(0, None, 0),
            Point::keyed("b1", None, 0),
        );
    }
}
