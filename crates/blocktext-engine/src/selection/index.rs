//! Derived key-to-position index.
//!
//! Rebuilt whenever the document value changes and owned by the snapshot it
//! was built for; never ambient state and never a source of truth. Consumers
//! resolve through [`BlockIndexMap::resolve`], which re-validates against the
//! live value and falls back to a linear scan on a miss or a stale hit.

use std::collections::HashMap;

use crate::content::{Block, Key};

/// Position and document-order neighbors of one block.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub index: usize,
    pub prev: Option<Key>,
    pub next: Option<Key>,
}

/// Per-snapshot map from block key to position and neighbor keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockIndexMap {
    order: Vec<Key>,
    entries: HashMap<Key, IndexEntry>,
}

impl BlockIndexMap {
    pub fn build(value: &[Block]) -> Self {
        let order: Vec<Key> = value.iter().map(|b| b.key().clone()).collect();
        let mut entries = HashMap::with_capacity(order.len());
        for (i, key) in order.iter().enumerate() {
            entries.insert(
                key.clone(),
                IndexEntry {
                    index: i,
                    prev: i.checked_sub(1).map(|p| order[p].clone()),
                    next: order.get(i + 1).cloned(),
                },
            );
        }
        BlockIndexMap { order, entries }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn entry(&self, key: &Key) -> Option<&IndexEntry> {
        self.entries.get(key)
    }

    pub fn index_of(&self, key: &Key) -> Option<usize> {
        self.entries.get(key).map(|e| e.index)
    }

    pub fn key_at(&self, index: usize) -> Option<&Key> {
        self.order.get(index)
    }

    /// Resolve a key to its block in `value`, trusting the index only as a
    /// fast path. A miss or a mismatch against the live value falls back to
    /// scanning `value` itself.
    pub fn resolve<'a>(&self, value: &'a [Block], key: &Key) -> Option<(usize, &'a Block)> {
        if let Some(i) = self.index_of(key)
            && let Some(block) = value.get(i)
            && block.key() == key
        {
            return Some((i, block));
        }
        value
            .iter()
            .position(|b| b.key() == key)
            .map(|i| (i, &value[i]))
    }
}
