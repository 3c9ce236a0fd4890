//! Index rebaser: maps pre-splice sequence positions to post-splice ones.
//!
//! Used by the merge engine. A merged patch runs its splice operations
//! before its child patches, so child patches whose index keys were recorded
//! against the pre-splice sequence must have those keys rewritten: entries
//! the splice removed are dropped, entries after it shift by the net size
//! change.

use indexmap::IndexMap;

use crate::node::Key;
use crate::patch::{Patch, SpliceOp};

/// Position remapping induced by one splice operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexAdjustment {
    start: usize,
    removed: usize,
    inserted: usize,
}

impl IndexAdjustment {
    /// New position of `index` after the splice, or `None` when the splice
    /// removed that position.
    pub fn remap(&self, index: usize) -> Option<usize> {
        if index < self.start {
            Some(index)
        } else if index < self.start + self.removed {
            None
        } else {
            Some(index - self.removed + self.inserted)
        }
    }
}

/// Returns the remapping induced by `op`, or `None` when the operation
/// neither removes nor inserts anything and no position moves.
pub fn index_adjustment(op: &SpliceOp) -> Option<IndexAdjustment> {
    if op.remove == 0 && op.insert.is_empty() {
        return None;
    }
    Some(IndexAdjustment {
        start: op.start,
        removed: op.remove,
        inserted: op.insert.len(),
    })
}

/// Rewrites every numeric key of `entries` through `adjustment`, dropping
/// entries whose position the splice removed. String keys pass through.
pub fn remap_index_keys<V>(
    entries: IndexMap<Key, V>,
    adjustment: &IndexAdjustment,
) -> IndexMap<Key, V> {
    let mut next = IndexMap::with_capacity(entries.len());
    for (key, value) in entries {
        match key.as_index() {
            Some(index) => match adjustment.remap(index) {
                Some(new_index) => {
                    next.insert(Key::Num(new_index as i64), value);
                }
                None => {}
            },
            None => {
                next.insert(key, value);
            }
        }
    }
    next
}

/// Rebases the index keys of a sequence patch's `children` through one
/// splice adjustment. `children` is dropped entirely if every entry fell
/// inside the removed run.
pub fn rebase_child_indexes(patch: &mut Patch, adjustment: &IndexAdjustment) {
    if let Some(children) = patch.children.take() {
        let next = remap_index_keys(children, adjustment);
        if !next.is_empty() {
            patch.children = Some(next);
        }
    }
}
