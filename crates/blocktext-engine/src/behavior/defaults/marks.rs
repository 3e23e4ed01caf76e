//! Annotation and decorator behaviors.
//!
//! Annotations rewrite the covered spans and install a mark def per touched
//! block, all defs sharing one generated key so the pieces read as a single
//! annotation. Decorators at an expanded selection rewrite spans the same
//! way; at a collapsed caret they flip a pending override on the host
//! instead, which the next insertion picks up.

use crate::behavior::defaults::util::{MarkEdit, rewrite_selection_marks};
use crate::behavior::{Action, Behavior, EventPattern};
use crate::content::{Key, MarkDef};
use crate::event::{Event, EventKind, Mutation};
use crate::selection::Selection;
use crate::selectors::{active_decorators, selected_spans};
use crate::snapshot::Snapshot;

pub fn behaviors() -> Vec<Behavior> {
    vec![
        annotation_add(),
        annotation_remove(),
        decorator_toggle(),
        decorator_add(),
        decorator_remove(),
    ]
}

fn rewrite_actions((muts, selection): (Vec<Mutation>, Selection)) -> Vec<Action> {
    let mut actions: Vec<Action> = muts
        .into_iter()
        .map(|m| Action::Raise(Event::from(m)))
        .collect();
    actions.push(Action::Raise(Event::from(Mutation::Select {
        selection: Some(selection),
    })));
    actions
}

/// Guards must stay pure, so key generation and the span rewrite (which
/// mints keys for split pieces) happen in the actions; the guard only
/// checks that a rewrite would have something to touch.
fn covers_spans(snap: &Snapshot) -> bool {
    snap.indexed_selection().is_some_and(|s| !s.is_collapsed()) && !selected_spans(snap).is_empty()
}

fn annotation_add() -> Behavior {
    Behavior::new(
        "annotation.add",
        EventPattern::Exact(EventKind::AnnotationAdd),
        0,
        |snap, event| {
            let Event::AnnotationAdd { annotation, .. } = event else {
                return None;
            };
            snap.schema.annotation(annotation)?;
            covers_spans(snap).then_some(())
        },
        |snap, event, ()| {
            let Event::AnnotationAdd { annotation, value } = event else {
                return vec![];
            };
            // One key shared by the def in every touched block, so the
            // rewritten pieces read as a single annotation.
            let key = Key::random();
            let def = MarkDef {
                key: key.clone(),
                kind: annotation.clone(),
                value: value.clone(),
            };
            let rewrite = rewrite_selection_marks(snap, |_| {
                let mut edit = MarkEdit::add(key.to_string());
                edit.new_defs.push(def.clone());
                Some(edit)
            });
            match rewrite {
                Some(rewrite) => rewrite_actions(rewrite),
                None => vec![],
            }
        },
    )
}

fn annotation_remove() -> Behavior {
    Behavior::new(
        "annotation.remove",
        EventPattern::Exact(EventKind::AnnotationRemove),
        0,
        |snap, event| {
            let Event::AnnotationRemove { annotation } = event else {
                return None;
            };
            snap.schema.annotation(annotation)?;
            covers_spans(snap).then_some(())
        },
        |snap, event, ()| {
            let Event::AnnotationRemove { annotation } = event else {
                return vec![];
            };
            let rewrite = rewrite_selection_marks(snap, |block| {
                let keys: Vec<String> = block
                    .mark_defs
                    .iter()
                    .filter(|d| d.kind == *annotation)
                    .map(|d| d.key.to_string())
                    .collect();
                if keys.is_empty() {
                    None
                } else {
                    Some(MarkEdit::remove(keys))
                }
            });
            match rewrite {
                Some(rewrite) => rewrite_actions(rewrite),
                None => vec![],
            }
        },
    )
}

enum DecoratorPlan {
    /// Flip the pending override at a collapsed caret.
    Override,
    /// Already in the requested state; consume the event.
    Settled,
    /// Rewrite the covered spans (built in the actions, not the guard).
    Rewrite { add: bool },
}

fn decorator_plan(snap: &Snapshot, decorator: &str, add: bool) -> Option<DecoratorPlan> {
    if !snap.schema.has_decorator(decorator) {
        return None;
    }
    let collapsed = snap
        .indexed_selection()
        .is_some_and(|s| s.is_collapsed());
    if collapsed {
        let active = active_decorators(snap).iter().any(|d| d == decorator);
        return Some(if active == add {
            DecoratorPlan::Settled
        } else {
            DecoratorPlan::Override
        });
    }
    // No covered spans still consumes the event; there is nothing to decorate.
    Some(if covers_spans(snap) {
        DecoratorPlan::Rewrite { add }
    } else {
        DecoratorPlan::Settled
    })
}

fn decorator_actions(snap: &Snapshot, plan: DecoratorPlan, decorator: String) -> Vec<Action> {
    match plan {
        DecoratorPlan::Override => vec![Action::effect(move |host| {
            host.toggle_decorator_override(&decorator);
        })],
        DecoratorPlan::Settled => vec![],
        DecoratorPlan::Rewrite { add } => {
            let rewrite = rewrite_selection_marks(snap, |_| {
                Some(if add {
                    MarkEdit::add(decorator.clone())
                } else {
                    MarkEdit::remove(vec![decorator.clone()])
                })
            });
            match rewrite {
                Some(rewrite) => rewrite_actions(rewrite),
                None => vec![],
            }
        }
    }
}

fn decorator_add() -> Behavior {
    Behavior::new(
        "decorator.add",
        EventPattern::Exact(EventKind::DecoratorAdd),
        0,
        |snap, event| {
            let Event::DecoratorAdd { decorator } = event else {
                return None;
            };
            decorator_plan(snap, decorator, true)
        },
        |snap, event, plan| {
            let Event::DecoratorAdd { decorator } = event else {
                return vec![];
            };
            decorator_actions(snap, plan, decorator.clone())
        },
    )
}

fn decorator_remove() -> Behavior {
    Behavior::new(
        "decorator.remove",
        EventPattern::Exact(EventKind::DecoratorRemove),
        0,
        |snap, event| {
            let Event::DecoratorRemove { decorator } = event else {
                return None;
            };
            decorator_plan(snap, decorator, false)
        },
        |snap, event, plan| {
            let Event::DecoratorRemove { decorator } = event else {
                return vec![];
            };
            decorator_actions(snap, plan, decorator.clone())
        },
    )
}

fn decorator_toggle() -> Behavior {
    Behavior::new(
        "decorator.toggle",
        EventPattern::Exact(EventKind::DecoratorToggle),
        0,
        |snap, event| {
            let Event::DecoratorToggle { decorator } = event else {
                return None;
            };
            if !snap.schema.has_decorator(decorator) {
                return None;
            }
            let collapsed = snap
                .indexed_selection()
                .is_some_and(|s| s.is_collapsed());
            if collapsed {
                return Some(Toggle::Override);
            }
            let spans = selected_spans(snap);
            if spans.is_empty() {
                return None;
            }
            let all_have = spans.iter().all(|r| r.span.has_mark(decorator));
            Some(if all_have { Toggle::Remove } else { Toggle::Add })
        },
        |_, event, toggle| {
            let Event::DecoratorToggle { decorator } = event else {
                return vec![];
            };
            let decorator = decorator.clone();
            match toggle {
                Toggle::Override => vec![Action::effect(move |host| {
                    host.toggle_decorator_override(&decorator);
                })],
                Toggle::Add => vec![Action::Raise(Event::DecoratorAdd { decorator })],
                Toggle::Remove => vec![Action::Raise(Event::DecoratorRemove { decorator })],
            }
        },
    )
}

enum Toggle {
    Override,
    Add,
    Remove,
}
