//! Style and list-item behaviors.
//!
//! These act on every text block the selection touches. Toggles resolve to
//! add or remove based on whether all touched blocks already carry the
//! property; removal of a style falls back to `normal` rather than leaving
//! the block styleless.

use crate::behavior::{Action, Behavior, EventPattern};
use crate::content::Key;
use crate::event::{BlockPatch, BlockProp, Event, EventKind, Mutation};
use crate::selectors::selected_blocks;
use crate::snapshot::Snapshot;

pub fn behaviors() -> Vec<Behavior> {
    vec![
        style_add(),
        style_remove(),
        style_toggle(),
        list_item_add(),
        list_item_remove(),
        list_item_toggle(),
    ]
}

fn raise(m: Mutation) -> Action {
    Action::Raise(Event::from(m))
}

/// Keys of the text blocks the selection touches.
fn touched_text_blocks(snap: &Snapshot) -> Vec<Key> {
    selected_blocks(snap)
        .into_iter()
        .filter_map(|(_, b)| b.as_text().map(|t| t.key.clone()))
        .collect()
}

fn style_add() -> Behavior {
    Behavior::new(
        "style.add",
        EventPattern::Exact(EventKind::StyleAdd),
        0,
        |snap, event| {
            let Event::StyleAdd { style } = event else {
                return None;
            };
            if !snap.schema.has_style(style) {
                return None;
            }
            let keys = touched_text_blocks(snap);
            if keys.is_empty() { None } else { Some(keys) }
        },
        |_, event, keys| {
            let Event::StyleAdd { style } = event else {
                return vec![];
            };
            keys.into_iter()
                .map(|key| {
                    raise(Mutation::BlockSet {
                        key,
                        patch: BlockPatch::style(style.clone()),
                    })
                })
                .collect()
        },
    )
}

fn style_remove() -> Behavior {
    Behavior::new(
        "style.remove",
        EventPattern::Exact(EventKind::StyleRemove),
        0,
        |snap, event| {
            let Event::StyleRemove { style } = event else {
                return None;
            };
            let keys: Vec<Key> = selected_blocks(snap)
                .into_iter()
                .filter_map(|(_, b)| b.as_text())
                .filter(|t| t.style == *style)
                .map(|t| t.key.clone())
                .collect();
            if keys.is_empty() { None } else { Some(keys) }
        },
        |_, _, keys| {
            keys.into_iter()
                .map(|key| {
                    raise(Mutation::BlockSet {
                        key,
                        patch: BlockPatch::style("normal"),
                    })
                })
                .collect()
        },
    )
}

fn style_toggle() -> Behavior {
    Behavior::new(
        "style.toggle",
        EventPattern::Exact(EventKind::StyleToggle),
        0,
        |snap, event| {
            let Event::StyleToggle { style } = event else {
                return None;
            };
            if !snap.schema.has_style(style) {
                return None;
            }
            let blocks: Vec<_> = selected_blocks(snap)
                .into_iter()
                .filter_map(|(_, b)| b.as_text())
                .collect();
            if blocks.is_empty() {
                return None;
            }
            Some(blocks.iter().all(|t| t.style == *style))
        },
        |_, event, all_have| {
            let Event::StyleToggle { style } = event else {
                return vec![];
            };
            let style = style.clone();
            if all_have {
                vec![Action::Raise(Event::StyleRemove { style })]
            } else {
                vec![Action::Raise(Event::StyleAdd { style })]
            }
        },
    )
}

fn list_item_add() -> Behavior {
    Behavior::new(
        "list-item.add",
        EventPattern::Exact(EventKind::ListItemAdd),
        0,
        |snap, event| {
            let Event::ListItemAdd { list_item } = event else {
                return None;
            };
            if !snap.schema.has_list(list_item) {
                return None;
            }
            // Keep an existing nesting level when switching list kinds.
            let targets: Vec<(Key, u32)> = selected_blocks(snap)
                .into_iter()
                .filter_map(|(_, b)| b.as_text())
                .map(|t| (t.key.clone(), t.level.unwrap_or(1)))
                .collect();
            if targets.is_empty() { None } else { Some(targets) }
        },
        |_, event, targets| {
            let Event::ListItemAdd { list_item } = event else {
                return vec![];
            };
            targets
                .into_iter()
                .map(|(key, level)| {
                    raise(Mutation::BlockSet {
                        key,
                        patch: BlockPatch {
                            list_item: Some(list_item.clone()),
                            level: Some(level),
                            ..Default::default()
                        },
                    })
                })
                .collect()
        },
    )
}

fn list_item_remove() -> Behavior {
    Behavior::new(
        "list-item.remove",
        EventPattern::Exact(EventKind::ListItemRemove),
        0,
        |snap, event| {
            let Event::ListItemRemove { list_item } = event else {
                return None;
            };
            let keys: Vec<Key> = selected_blocks(snap)
                .into_iter()
                .filter_map(|(_, b)| b.as_text())
                .filter(|t| t.list_item.as_deref() == Some(list_item.as_str()))
                .map(|t| t.key.clone())
                .collect();
            if keys.is_empty() { None } else { Some(keys) }
        },
        |_, _, keys| {
            keys.into_iter()
                .map(|key| {
                    raise(Mutation::BlockUnset {
                        key,
                        props: vec![BlockProp::ListItem, BlockProp::Level],
                    })
                })
                .collect()
        },
    )
}

fn list_item_toggle() -> Behavior {
    Behavior::new(
        "list-item.toggle",
        EventPattern::Exact(EventKind::ListItemToggle),
        0,
        |snap, event| {
            let Event::ListItemToggle { list_item } = event else {
                return None;
            };
            if !snap.schema.has_list(list_item) {
                return None;
            }
            let blocks: Vec<_> = selected_blocks(snap)
                .into_iter()
                .filter_map(|(_, b)| b.as_text())
                .collect();
            if blocks.is_empty() {
                return None;
            }
            Some(
                blocks
                    .iter()
                    .all(|t| t.list_item.as_deref() == Some(list_item.as_str())),
            )
        },
        |_, event, all_have| {
            let Event::ListItemToggle { list_item } = event else {
                return vec![];
            };
            let list_item = list_item.clone();
            if all_have {
                vec![Action::Raise(Event::ListItemRemove { list_item })]
            } else {
                vec![Action::Raise(Event::ListItemAdd { list_item })]
            }
        },
    )
}
