//! Apply engine: produce a new tree from a base tree plus a patch.
//!
//! `apply` is pure. It never mutates either argument, and it always returns
//! a freshly allocated top-level container, even for an empty patch, while
//! sharing every untouched child with the input tree via `Rc`.
//!
//! Field application order is fixed: `delete`, then `set`/`add`, then `ops`
//! in list order, then `children`. Child patches therefore see the node as
//! it stands after the current patch's own deletions, sets, and splices.

use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

use crate::node::{Key, Node, NodeKind, Scalar};
use crate::patch::{Deletions, Patch, SpliceOp};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApplyError {
    /// The patch violates the one-disposition-per-key contract or another
    /// structural rule. Deterministically detected, never silently applied.
    #[error("malformed patch: {0}")]
    MalformedPatch(String),
    /// A child patch names a key with nothing to recurse into: the key is
    /// absent from both the base node and the patch's own `set` entries.
    #[error("child patch at key {0} has no target to recurse into")]
    MissingPatchTarget(Key),
    /// The patch carries a field that is not legal for the target node's
    /// kind, e.g. `add` on a record or `ops` on a map.
    #[error("patch field `{field}` is not valid on a {kind} node")]
    KindMismatch { kind: NodeKind, field: &'static str },
}

/// Applies `patch` to `tree`, returning the new tree.
///
/// Untouched subtrees are shared by reference with the input; values taken
/// from the patch's `set`/`add`/`ops` fields are shared with the patch.
/// Opaque scalars pass through as-is and are never recursed into.
pub fn apply(tree: &Node, patch: &Patch) -> Result<Node, ApplyError> {
    if cfg!(debug_assertions) {
        patch.check_invariants()?;
    }
    match tree {
        Node::Record(entries) => {
            check_fields(NodeKind::Record, patch)?;
            apply_record(entries, patch)
        }
        Node::Map(entries) => {
            check_fields(NodeKind::Map, patch)?;
            apply_map(entries, patch)
        }
        Node::Set(elements) => {
            check_fields(NodeKind::Set, patch)?;
            Ok(apply_set(elements, patch))
        }
        Node::Seq(items) => {
            check_fields(NodeKind::Seq, patch)?;
            apply_seq(items, patch)
        }
        Node::Scalar(_) => {
            check_fields(NodeKind::Scalar, patch)?;
            Ok(tree.clone())
        }
    }
}

/// Rejects patch fields that are illegal for the target kind.
fn check_fields(kind: NodeKind, patch: &Patch) -> Result<(), ApplyError> {
    let (d_ok, s_ok, a_ok, o_ok, c_ok) = match kind {
        NodeKind::Record | NodeKind::Map => (true, true, false, false, true),
        NodeKind::Set => (true, false, true, false, false),
        NodeKind::Seq => (true, true, false, true, true),
        NodeKind::Scalar => (false, false, false, false, false),
    };
    if patch.delete.is_some() && !d_ok {
        return Err(ApplyError::KindMismatch { kind, field: "delete" });
    }
    if patch.set.is_some() && !s_ok {
        return Err(ApplyError::KindMismatch { kind, field: "set" });
    }
    if patch.add.is_some() && !a_ok {
        return Err(ApplyError::KindMismatch { kind, field: "add" });
    }
    if patch.ops.is_some() && !o_ok {
        return Err(ApplyError::KindMismatch { kind, field: "ops" });
    }
    if patch.children.is_some() && !c_ok {
        return Err(ApplyError::KindMismatch { kind, field: "children" });
    }
    Ok(())
}

fn apply_record(
    entries: &IndexMap<String, Rc<Node>>,
    patch: &Patch,
) -> Result<Node, ApplyError> {
    let mut next = entries.clone();
    match &patch.delete {
        Some(Deletions::All) => next.clear(),
        Some(Deletions::Keys(keys)) => {
            for key in keys {
                next.shift_remove(&key.as_record_key());
            }
        }
        None => {}
    }
    if let Some(set) = &patch.set {
        for (key, value) in set {
            next.insert(key.as_record_key(), Rc::clone(value));
        }
    }
    if let Some(children) = &patch.children {
        for (key, child_patch) in children {
            let name = key.as_record_key();
            let current = next
                .get(&name)
                .cloned()
                .ok_or_else(|| ApplyError::MissingPatchTarget(key.clone()))?;
            next.insert(name, Rc::new(apply(&current, child_patch)?));
        }
    }
    Ok(Node::Record(next))
}

fn apply_map(entries: &IndexMap<Key, Rc<Node>>, patch: &Patch) -> Result<Node, ApplyError> {
    let mut next = entries.clone();
    match &patch.delete {
        Some(Deletions::All) => next.clear(),
        Some(Deletions::Keys(keys)) => {
            for key in keys {
                next.shift_remove(key);
            }
        }
        None => {}
    }
    if let Some(set) = &patch.set {
        for (key, value) in set {
            next.insert(key.clone(), Rc::clone(value));
        }
    }
    if let Some(children) = &patch.children {
        for (key, child_patch) in children {
            let current = next
                .get(key)
                .cloned()
                .ok_or_else(|| ApplyError::MissingPatchTarget(key.clone()))?;
            next.insert(key.clone(), Rc::new(apply(&current, child_patch)?));
        }
    }
    Ok(Node::Map(next))
}

fn apply_set(elements: &IndexSet<Key>, patch: &Patch) -> Node {
    let mut next = elements.clone();
    match &patch.delete {
        Some(Deletions::All) => next.clear(),
        Some(Deletions::Keys(keys)) => {
            for key in keys {
                next.shift_remove(key);
            }
        }
        None => {}
    }
    if let Some(add) = &patch.add {
        for element in add {
            next.insert(element.clone());
        }
    }
    Node::Set(next)
}

fn apply_seq(items: &[Rc<Node>], patch: &Patch) -> Result<Node, ApplyError> {
    let mut next: Vec<Rc<Node>> = items.to_vec();
    match &patch.delete {
        Some(Deletions::All) => next.clear(),
        Some(Deletions::Keys(keys)) => {
            // Remove highest positions first so earlier removals do not
            // shift the ones still pending.
            let mut positions: Vec<usize> = Vec::with_capacity(keys.len());
            for key in keys {
                let index = seq_index(key)?;
                if index < next.len() {
                    positions.push(index);
                }
            }
            positions.sort_unstable_by(|a, b| b.cmp(a));
            positions.dedup();
            for index in positions {
                next.remove(index);
            }
        }
        None => {}
    }
    if let Some(set) = &patch.set {
        for (key, value) in set {
            let index = seq_index(key)?;
            if index >= next.len() {
                next.resize(index + 1, Rc::new(Node::Scalar(Scalar::Null)));
            }
            next[index] = Rc::clone(value);
        }
    }
    if let Some(ops) = &patch.ops {
        for op in ops {
            splice(&mut next, op);
        }
    }
    if let Some(children) = &patch.children {
        for (key, child_patch) in children {
            let index = seq_index(key)?;
            let current = next
                .get(index)
                .cloned()
                .ok_or_else(|| ApplyError::MissingPatchTarget(key.clone()))?;
            next[index] = Rc::new(apply(&current, child_patch)?);
        }
    }
    Ok(Node::Seq(next))
}

fn seq_index(key: &Key) -> Result<usize, ApplyError> {
    key.as_index().ok_or_else(|| {
        ApplyError::MalformedPatch(format!("key {key} is not a sequence index"))
    })
}

/// Splice with clamping: a start past the end appends, a run past the end
/// removes to the end.
fn splice(items: &mut Vec<Rc<Node>>, op: &SpliceOp) {
    let start = op.start.min(items.len());
    let end = start.saturating_add(op.remove).min(items.len());
    items.splice(start..end, op.insert.iter().cloned());
}
