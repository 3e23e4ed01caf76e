//! Unit-delete lowering.
//!
//! Backspace and forward-delete arrive as `Delete` with a unit target. This
//! behavior resolves the unit against the snapshot into a concrete range
//! (or a whole-block removal at a block edge next to an object block) and
//! re-raises, so hosts with their own executors only ever see range
//! deletes. Range targets pass through untouched.

use crate::apply::{UnitTarget, unit_range};
use crate::behavior::{Action, Behavior, EventPattern};
use crate::content::Key;
use crate::event::{DeleteTarget, Event, EventKind, Mutation};
use crate::selection::{Selection, selection_to_keyed};

pub fn behaviors() -> Vec<Behavior> {
    vec![delete_unit()]
}

enum Lowered {
    Range(Selection),
    Block(Key),
}

fn delete_unit() -> Behavior {
    Behavior::new(
        "delete.unit",
        EventPattern::Exact(EventKind::Delete),
        0,
        |snap, event| {
            let Event::Primitive(Mutation::Delete {
                target: DeleteTarget::Unit { direction, unit },
            }) = event
            else {
                return None;
            };
            let sel = snap.indexed_selection()?;
            // A unit delete over an expanded selection removes the selection.
            if !sel.is_collapsed() {
                return snap.keyed_selection().map(Lowered::Range);
            }
            match unit_range(snap.blocks(), &sel.focus, *direction, *unit)? {
                UnitTarget::Range(range) => {
                    selection_to_keyed(snap.blocks(), &range).map(Lowered::Range)
                }
                UnitTarget::Block(key) => Some(Lowered::Block(key)),
            }
        },
        |_, _, lowered| match lowered {
            Lowered::Range(selection) => vec![Action::Raise(Event::from(Mutation::Delete {
                target: DeleteTarget::Selection(selection),
            }))],
            Lowered::Block(key) => vec![Action::Raise(Event::from(Mutation::DeleteBlock { key }))],
        },
    )
}
