//! The default behavior set.
//!
//! Every synthetic event ships with a default that rewrites it down to
//! terminal mutations. Hosts override by registering their own behaviors at
//! a higher priority (or at equal priority, registered earlier).

mod blocks;
mod clipboard;
mod delete;
mod drag;
mod insert;
mod marks;
mod util;

use crate::behavior::Behavior;

pub fn default_behaviors() -> Vec<Behavior> {
    let mut all = Vec::new();
    all.extend(insert::behaviors());
    all.extend(delete::behaviors());
    all.extend(marks::behaviors());
    all.extend(blocks::behaviors());
    all.extend(clipboard::behaviors());
    all.extend(drag::behaviors());
    all
}
