//! Convenience builder for assembling patches by hand.
//!
//! The mutation recorder is the canonical patch producer, but tests and
//! callers stitching patches together programmatically get the same
//! well-formed shapes from this builder: fields materialize only when first
//! used, `children` is never left empty, and debug builds verify the
//! one-disposition-per-key contract on `build`.

use indexmap::{IndexMap, IndexSet};
use std::rc::Rc;

use crate::node::{Key, Node};
use crate::patch::{Deletions, Patch, SpliceOp};

#[derive(Debug, Default)]
pub struct PatchBuilder {
    patch: Patch,
}

impl PatchBuilder {
    pub fn new() -> PatchBuilder {
        PatchBuilder::default()
    }

    /// Queues deletion of one key (keyed kinds, sequence index) or element
    /// (value sets). No-op when a delete-all is already queued.
    pub fn delete(mut self, key: impl Into<Key>) -> Self {
        match &mut self.patch.delete {
            Some(Deletions::All) => {}
            Some(Deletions::Keys(keys)) => {
                keys.insert(key.into());
            }
            None => {
                let mut keys = IndexSet::new();
                keys.insert(key.into());
                self.patch.delete = Some(Deletions::Keys(keys));
            }
        }
        self
    }

    /// Queues clearing of the whole target node, superseding any single-key
    /// deletes queued so far.
    pub fn delete_all(mut self) -> Self {
        self.patch.delete = Some(Deletions::All);
        self
    }

    /// Queues a replacement value for `key` (record, map, or sequence
    /// index).
    pub fn set(mut self, key: impl Into<Key>, value: Node) -> Self {
        self.patch
            .set
            .get_or_insert_with(IndexMap::new)
            .insert(key.into(), Rc::new(value));
        self
    }

    /// Queues insertion of a value-set element.
    pub fn add(mut self, element: impl Into<Key>) -> Self {
        self.patch
            .add
            .get_or_insert_with(IndexSet::new)
            .insert(element.into());
        self
    }

    /// Queues a splice operation, after any queued earlier.
    pub fn splice(mut self, start: usize, remove: usize, insert: Vec<Node>) -> Self {
        self.patch
            .ops
            .get_or_insert_with(Vec::new)
            .push(SpliceOp::new(start, remove, insert));
        self
    }

    /// Queues a nested patch descending into the child at `key`.
    pub fn child(mut self, key: impl Into<Key>, child: Patch) -> Self {
        self.patch
            .children
            .get_or_insert_with(IndexMap::new)
            .insert(key.into(), child);
        self
    }

    pub fn build(self) -> Patch {
        #[cfg(debug_assertions)]
        if let Err(err) = self.patch.check_invariants() {
            panic!("patch builder produced a malformed patch: {err}");
        }
        self.patch
    }
}
