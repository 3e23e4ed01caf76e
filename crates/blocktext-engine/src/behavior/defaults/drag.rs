//! Drag and drop behaviors.
//!
//! A drop inside the dragged range is consumed as a no-op (higher priority
//! than the real drop handler). A real drop inserts fresh-keyed copies of
//! the dragged blocks after the target block, then deletes the origin range
//! by key, so the order of the two steps cannot corrupt positions.

use crate::behavior::defaults::util::block_edge_selection;
use crate::behavior::{Action, Behavior, EventPattern};
use crate::content::Block;
use crate::event::{DeleteTarget, Event, EventKind, InsertBlockAt, Mutation};
use crate::selection::{
    Selection, point_to_indexed, selection_contains_point, selection_to_indexed,
    selection_to_keyed,
};

pub fn behaviors() -> Vec<Behavior> {
    vec![drag_start(), drop_inside_origin(), drop()]
}

fn drag_start() -> Behavior {
    Behavior::new(
        "drag.start",
        EventPattern::Exact(EventKind::DragStart),
        0,
        |snap, event| {
            let Event::DragStart { origin } = event else {
                return None;
            };
            // Keyed form survives edits made while the drag is in flight.
            Some(selection_to_keyed(snap.blocks(), origin).unwrap_or_else(|| origin.clone()))
        },
        |_, _, origin| {
            vec![Action::effect(move |host| {
                host.set_drag_origin(Some(origin));
            })]
        },
    )
}

fn drop_inside_origin() -> Behavior {
    Behavior::new(
        "drag.drop-inside-origin",
        EventPattern::Exact(EventKind::Drop),
        10,
        |snap, event| {
            let Event::Drop { origin, target } = event else {
                return None;
            };
            let origin = selection_to_indexed(snap.blocks(), &snap.index, origin)?;
            let target = point_to_indexed(snap.blocks(), &snap.index, target)?;
            if selection_contains_point(&origin, &target) {
                Some(())
            } else {
                None
            }
        },
        |_, _, ()| {
            // Dropping onto the dragged text moves nothing; just end the drag.
            vec![Action::effect(|host| host.set_drag_origin(None))]
        },
    )
}

struct DropPlan {
    copies: Vec<Block>,
    target_key: crate::content::Key,
    origin_keyed: Selection,
}

fn drop() -> Behavior {
    Behavior::new(
        "drag.drop",
        EventPattern::Exact(EventKind::Drop),
        0,
        |snap, event| {
            let Event::Drop { origin, target } = event else {
                return None;
            };
            let sliced = snap.with_selection(Some(origin.clone())).slice_selection();
            if sliced.is_empty() {
                return None;
            }
            let target = point_to_indexed(snap.blocks(), &snap.index, target)?;
            let target_block = snap.blocks().get(target.path.block_index()?)?;
            Some(DropPlan {
                copies: sliced.iter().map(Block::with_fresh_keys).collect(),
                target_key: target_block.key().clone(),
                origin_keyed: selection_to_keyed(snap.blocks(), origin)?,
            })
        },
        |_, _, plan| {
            let DropPlan {
                copies,
                target_key,
                origin_keyed,
            } = plan;
            let mut actions = Vec::new();
            let end = copies.last().map(|b| block_edge_selection(b, true));
            let mut at = InsertBlockAt::after(target_key);
            for block in copies {
                let key = block.key().clone();
                actions.push(Action::Raise(Event::from(Mutation::InsertBlock {
                    block,
                    at,
                })));
                at = InsertBlockAt::after(key);
            }
            actions.push(Action::Raise(Event::from(Mutation::Delete {
                target: DeleteTarget::Selection(origin_keyed),
            })));
            if let Some(end) = end {
                actions.push(Action::Raise(Event::from(end)));
            }
            actions.push(Action::effect(|host| host.set_drag_origin(None)));
            actions
        },
    )
}
