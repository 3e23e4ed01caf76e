//! Clipboard and serialization behaviors.
//!
//! Copy and cut re-raise `Serialize`, which slices the selection, runs it
//! through every converter and hands the results to the host. Paste
//! re-raises `Deserialize`; converter negotiation happens in the guard, so
//! a total failure turns into an explicit `DeserializeFailure` event rather
//! than a silent drop.

use crate::behavior::{Action, Behavior, EventPattern};
use crate::content::Block;
use crate::converters::TransferItem;
use crate::event::{
    DeleteTarget, Event, EventKind, InsertPlacement, Mutation, SelectPosition,
};
use crate::selection::Selection;

pub fn behaviors() -> Vec<Behavior> {
    vec![
        copy(),
        cut(),
        serialize(),
        paste(),
        deserialize(),
        deserialize_failure(),
    ]
}

fn expanded_selection(snap: &crate::snapshot::Snapshot) -> Option<Selection> {
    let sel = snap.indexed_selection()?;
    if sel.is_collapsed() { None } else { Some(sel) }
}

fn copy() -> Behavior {
    Behavior::new(
        "clipboard.copy",
        EventPattern::Exact(EventKind::Copy),
        0,
        |snap, _| expanded_selection(snap).map(|_| ()),
        |_, _, ()| vec![Action::Raise(Event::Serialize)],
    )
}

fn cut() -> Behavior {
    Behavior::new(
        "clipboard.cut",
        EventPattern::Exact(EventKind::Cut),
        0,
        |snap, _| {
            expanded_selection(snap)?;
            snap.keyed_selection()
        },
        |_, _, keyed| {
            vec![
                Action::Raise(Event::Serialize),
                Action::Raise(Event::from(Mutation::Delete {
                    target: DeleteTarget::Selection(keyed),
                })),
            ]
        },
    )
}

fn serialize() -> Behavior {
    Behavior::new(
        "clipboard.serialize",
        EventPattern::Exact(EventKind::Serialize),
        0,
        |snap, _| {
            let sliced: Vec<Block> = snap.slice_selection();
            if sliced.is_empty() {
                return None;
            }
            let items: Vec<TransferItem> = snap.converters.serialize_all(snap, &sliced);
            if items.is_empty() { None } else { Some(items) }
        },
        |_, _, items| {
            vec![Action::effect(move |host| {
                host.set_clipboard(items);
            })]
        },
    )
}

fn paste() -> Behavior {
    Behavior::new(
        "clipboard.paste",
        EventPattern::Exact(EventKind::Paste),
        0,
        |_, event| {
            let Event::Paste { items } = event else {
                return None;
            };
            if items.is_empty() { None } else { Some(()) }
        },
        |_, event, ()| {
            let Event::Paste { items } = event else {
                return vec![];
            };
            vec![Action::Raise(Event::Deserialize {
                items: items.clone(),
            })]
        },
    )
}

fn deserialize() -> Behavior {
    Behavior::new(
        "clipboard.deserialize",
        EventPattern::Exact(EventKind::Deserialize),
        0,
        |snap, event| {
            let Event::Deserialize { items } = event else {
                return None;
            };
            if items.is_empty() {
                return None;
            }
            Some(snap.converters.deserialize(items).map_err(|e| e.to_string()))
        },
        |_, _, negotiated| match negotiated {
            Ok(blocks) => vec![Action::Raise(Event::InsertBlocks {
                blocks,
                placement: InsertPlacement::Auto,
                select: SelectPosition::End,
            })],
            Err(reason) => vec![Action::Raise(Event::DeserializeFailure { reason })],
        },
    )
}

fn deserialize_failure() -> Behavior {
    Behavior::unguarded(
        "clipboard.deserialize-failure",
        EventPattern::Exact(EventKind::DeserializeFailure),
        0,
        |_, event| {
            let Event::DeserializeFailure { reason } = event else {
                return vec![];
            };
            log::warn!("deserialize failed: {reason}");
            let reason = reason.clone();
            vec![Action::effect(move |host| {
                host.deserialize_failed(&reason);
            })]
        },
    )
}
