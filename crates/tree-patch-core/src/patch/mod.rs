//! Patch data model.
//!
//! A patch describes the changes to apply to one tree node. All fields are
//! optional and presence-gated; which fields are legal depends on the kind
//! of the node the patch targets:
//!
//! | field      | meaning                          | legal on            |
//! |------------|----------------------------------|---------------------|
//! | `delete`   | delete-all, or keys/elements     | all container kinds |
//! | `set`      | key -> replacement value         | record, map, seq    |
//! | `add`      | values to insert                 | set                 |
//! | `ops`      | ordered splice operations        | seq                 |
//! | `children` | key -> nested patch (recursion)  | record, map, seq    |
//!
//! Well-formedness contract (the recorder's obligation, checked here only on
//! demand or in debug builds): a key appears in at most one of `delete`-keys,
//! `set`/`add`, and `children`; `children` is never present but empty. A
//! merged accumulator may additionally carry [`Deletions::All`] alongside a
//! non-empty `set`/`add`: that is the "clear everything, then set" shape the
//! merge engine produces, and the apply engine honors it.

use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};

use crate::apply::ApplyError;
use crate::node::{Key, Node};

/// The `delete` disposition of a patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deletions {
    /// Remove every entry/element of the target node.
    All,
    /// Remove the named keys (keyed kinds, sequence indices) or elements
    /// (value sets). Naming something absent is a no-op, not an error.
    Keys(IndexSet<Key>),
}

impl Deletions {
    pub fn is_all(&self) -> bool {
        matches!(self, Deletions::All)
    }
}

/// One splice-style sequence operation: remove `remove` items starting at
/// `start`, then insert `insert` there.
#[derive(Debug, Clone, PartialEq)]
pub struct SpliceOp {
    pub start: usize,
    pub remove: usize,
    pub insert: Vec<Rc<Node>>,
}

impl SpliceOp {
    pub fn new(start: usize, remove: usize, insert: Vec<Node>) -> SpliceOp {
        SpliceOp {
            start,
            remove,
            insert: insert.into_iter().map(Rc::new).collect(),
        }
    }
}

/// Description of the changes to apply to one tree node.
///
/// Created once per recorded mutation, then used as a mutable accumulator by
/// [`crate::merge::merge`] and consumed read-only by [`crate::apply::apply`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    pub delete: Option<Deletions>,
    pub set: Option<IndexMap<Key, Rc<Node>>>,
    pub add: Option<IndexSet<Key>>,
    pub ops: Option<Vec<SpliceOp>>,
    pub children: Option<IndexMap<Key, Patch>>,
}

impl Patch {
    /// A patch with no fields; applying it reallocates the target container
    /// without changing its contents.
    pub fn empty() -> Patch {
        Patch::default()
    }

    pub fn is_empty(&self) -> bool {
        self.delete.is_none()
            && self.set.is_none()
            && self.add.is_none()
            && self.ops.is_none()
            && self.children.is_none()
    }

    /// Verifies the well-formedness contract, recursively through nested
    /// child patches.
    ///
    /// The engines trust their input in release builds and run this check
    /// behind `debug_assertions`; hardened callers can invoke it at the
    /// boundary before trusting a patch from elsewhere.
    pub fn check_invariants(&self) -> Result<(), ApplyError> {
        if let Some(children) = &self.children {
            if children.is_empty() {
                return Err(ApplyError::MalformedPatch(
                    "`children` must be absent or non-empty".to_string(),
                ));
            }
        }
        if self.set.is_some() && self.add.is_some() {
            return Err(ApplyError::MalformedPatch(
                "`set` and `add` are mutually exclusive".to_string(),
            ));
        }
        if let Some(Deletions::Keys(keys)) = &self.delete {
            for key in keys {
                if self.set.as_ref().is_some_and(|set| set.contains_key(key)) {
                    return Err(ApplyError::MalformedPatch(format!(
                        "key {key} contested between `delete` and `set`"
                    )));
                }
                if self.add.as_ref().is_some_and(|add| add.contains(key)) {
                    return Err(ApplyError::MalformedPatch(format!(
                        "element {key} contested between `delete` and `add`"
                    )));
                }
                if self
                    .children
                    .as_ref()
                    .is_some_and(|children| children.contains_key(key))
                {
                    return Err(ApplyError::MalformedPatch(format!(
                        "key {key} contested between `delete` and `children`"
                    )));
                }
            }
        }
        if let (Some(set), Some(children)) = (&self.set, &self.children) {
            for key in set.keys() {
                if children.contains_key(key) {
                    return Err(ApplyError::MalformedPatch(format!(
                        "key {key} contested between `set` and `children`"
                    )));
                }
            }
        }
        if let Some(children) = &self.children {
            for child in children.values() {
                child.check_invariants()?;
            }
        }
        Ok(())
    }
}
