//! Event dispatch.
//!
//! The engine walks its behaviors from highest to lowest priority and lets
//! the first matching, non-declining one decide the event's fate. Raised
//! events resolve depth-first against the same snapshot before the raising
//! behavior continues, so a cascade is fully synchronous: when `dispatch`
//! returns, the mutation list is the complete outcome of the event.

use crate::behavior::{Action, Behavior, Host};
use crate::event::{Event, Mutation};
use crate::snapshot::Snapshot;

/// Recursion limit for raised events. A cascade that deep is a behavior
/// cycle, not a legitimate editing operation.
const DEFAULT_MAX_CASCADE_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub max_cascade_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_cascade_depth: DEFAULT_MAX_CASCADE_DEPTH,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("behavior cascade exceeded depth {depth}; a behavior is raising in a cycle")]
    CascadeOverflow { depth: usize },
}

/// Priority-ordered behavior registry and dispatcher.
pub struct Engine {
    behaviors: Vec<Behavior>,
    /// Indices into `behaviors`, highest priority first. Ties keep
    /// registration order, so an equal-priority behavior registered earlier
    /// shadows a later one.
    order: Vec<usize>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine {
            behaviors: Vec::new(),
            order: Vec::new(),
            config,
        }
    }

    /// Engine preloaded with the default behavior set.
    pub fn standard() -> Self {
        let mut engine = Engine::new(EngineConfig::default());
        for behavior in crate::behavior::defaults::default_behaviors() {
            engine.register(behavior);
        }
        engine
    }

    pub fn register(&mut self, behavior: Behavior) {
        self.behaviors.push(behavior);
        self.order = (0..self.behaviors.len()).collect();
        self.order
            .sort_by_key(|&i| std::cmp::Reverse(self.behaviors[i].priority()));
    }

    pub fn behaviors(&self) -> &[Behavior] {
        &self.behaviors
    }

    /// Resolve `event` into the terminal mutations it amounts to. Host
    /// effects run as they are reached.
    pub fn dispatch(
        &self,
        snap: &Snapshot,
        event: Event,
        host: &mut dyn Host,
    ) -> Result<Vec<Mutation>, EngineError> {
        let mut mutations = Vec::new();
        self.resolve(snap, event, host, 0, &mut mutations)?;
        Ok(mutations)
    }

    fn resolve(
        &self,
        snap: &Snapshot,
        event: Event,
        host: &mut dyn Host,
        depth: usize,
        out: &mut Vec<Mutation>,
    ) -> Result<(), EngineError> {
        if depth > self.config.max_cascade_depth {
            return Err(EngineError::CascadeOverflow { depth });
        }

        let mut current = event;
        let mut next = 0;
        while next < self.order.len() {
            let behavior = &self.behaviors[self.order[next]];
            next += 1;
            if !behavior.matches(current.kind()) {
                continue;
            }
            let Some(actions) = behavior.run(snap, &current) else {
                continue;
            };
            log::trace!(
                "behavior {} claimed {:?} at depth {depth}",
                behavior.name(),
                current.kind()
            );

            let mut actions = actions.into_iter();
            let mut forwarded = None;
            for action in actions.by_ref() {
                match action {
                    Action::Raise(raised) => {
                        self.resolve(snap, raised, host, depth + 1, out)?;
                    }
                    Action::Effect(effect) => effect(host),
                    Action::Forward(event) => {
                        forwarded = Some(event);
                        break;
                    }
                }
            }
            match forwarded {
                Some(event) => {
                    let dropped = actions.count();
                    if dropped > 0 {
                        log::debug!(
                            "behavior {} forwarded with {dropped} trailing action(s) ignored",
                            behavior.name()
                        );
                    }
                    // The forwarded event resumes with the remaining chain.
                    current = event;
                }
                None => return Ok(()),
            }
        }

        // Chain exhausted: primitives bottom out at the executor, synthetic
        // events without a claimant are deliberate no-ops.
        match current {
            Event::Primitive(mutation) => out.push(mutation),
            other => log::trace!("unclaimed synthetic event {:?} dropped", other.kind()),
        }
        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("behaviors", &self.behaviors.len())
            .field("max_cascade_depth", &self.config.max_cascade_depth)
            .finish()
    }
}
