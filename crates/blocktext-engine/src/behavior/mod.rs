//! Behavior definitions.
//!
//! A [`Behavior`] pairs an event pattern with a guard and an action
//! producer. The guard inspects the snapshot and decides whether the
//! behavior applies, returning a payload of whatever it computed; the
//! action producer turns that payload into the steps the engine executes.
//! Keeping the two as separate closures means a behavior that declines is
//! pure and cheap, and everything the actions need was already derived from
//! the one snapshot the guard saw.

pub mod defaults;
pub mod engine;

pub use engine::{Engine, EngineConfig, EngineError};

use crate::converters::TransferItem;
use crate::event::{Event, EventFamily, EventKind};
use crate::selection::Selection;
use crate::snapshot::Snapshot;

/// Which events a behavior is consulted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPattern {
    Exact(EventKind),
    Family(EventFamily),
    Any,
}

impl EventPattern {
    pub fn matches(self, kind: EventKind) -> bool {
        match self {
            EventPattern::Exact(k) => k == kind,
            EventPattern::Family(f) => kind.family() == f,
            EventPattern::Any => true,
        }
    }
}

/// Side effect executed against the host, outside the document value.
pub type Effect = Box<dyn FnOnce(&mut dyn Host)>;

/// One step produced by a behavior's actions.
pub enum Action {
    /// Dispatch a nested event depth-first; its mutations land before
    /// anything the current behavior produces afterwards.
    Raise(Event),
    /// Decline after the fact: hand `event` to the remaining behaviors in
    /// the chain. Anything after a `Forward` in the action list is ignored.
    Forward(Event),
    /// Run a host side effect immediately.
    Effect(Effect),
}

impl Action {
    pub fn effect(f: impl FnOnce(&mut dyn Host) + 'static) -> Action {
        Action::Effect(Box::new(f))
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Raise(e) => f.debug_tuple("Raise").field(&e.kind()).finish(),
            Action::Forward(e) => f.debug_tuple("Forward").field(&e.kind()).finish(),
            Action::Effect(_) => f.write_str("Effect"),
        }
    }
}

/// Host integration surface for behavior side effects. Every method is a
/// no-op by default so hosts only wire up what they support.
pub trait Host {
    /// Flip a pending decorator override at a collapsed caret.
    fn toggle_decorator_override(&mut self, _decorator: &str) {}

    /// Publish serialized selection data (the clipboard, for most hosts).
    fn set_clipboard(&mut self, _items: Vec<TransferItem>) {}

    /// Remember (or clear) the selection a drag started from.
    fn set_drag_origin(&mut self, _origin: Option<Selection>) {}

    /// Pasted or dropped data that no converter could read.
    fn deserialize_failed(&mut self, _reason: &str) {}
}

/// Host that ignores every effect; useful for dispatching headlessly.
#[derive(Debug, Default)]
pub struct NoopHost;

impl Host for NoopHost {}

/// A named, prioritized event handler.
pub struct Behavior {
    name: &'static str,
    pattern: EventPattern,
    priority: i32,
    handler: Box<dyn Fn(&Snapshot, &Event) -> Option<Vec<Action>>>,
}

impl Behavior {
    /// Build a behavior from a guard and an action producer. The guard's
    /// payload carries whatever it derived from the snapshot into the
    /// actions, so the work is never done twice.
    pub fn new<G: 'static>(
        name: &'static str,
        pattern: EventPattern,
        priority: i32,
        guard: impl Fn(&Snapshot, &Event) -> Option<G> + 'static,
        actions: impl Fn(&Snapshot, &Event, G) -> Vec<Action> + 'static,
    ) -> Self {
        Behavior {
            name,
            pattern,
            priority,
            handler: Box::new(move |snap, event| {
                let payload = guard(snap, event)?;
                Some(actions(snap, event, payload))
            }),
        }
    }

    /// A behavior that always applies when its pattern matches.
    pub fn unguarded(
        name: &'static str,
        pattern: EventPattern,
        priority: i32,
        actions: impl Fn(&Snapshot, &Event) -> Vec<Action> + 'static,
    ) -> Self {
        Behavior::new(name, pattern, priority, |_, _| Some(()), move |snap, event, ()| {
            actions(snap, event)
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn pattern(&self) -> EventPattern {
        self.pattern
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub(crate) fn matches(&self, kind: EventKind) -> bool {
        self.pattern.matches(kind)
    }

    pub(crate) fn run(&self, snap: &Snapshot, event: &Event) -> Option<Vec<Action>> {
        (self.handler)(snap, event)
    }
}

impl std::fmt::Debug for Behavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Behavior")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}
