//! Merge engine: fold a newer patch into an older accumulator, in place.
//!
//! `merge(target, addition)` rewrites `target` into a single patch
//! equivalent to "apply `target`, then apply `addition`". The precedence
//! between fields touching the same key, later cancelling earlier, is:
//! delete > set/add > sequence ops > child patch.
//!
//! `addition` is consumed: when `target` lacks a field, the addition's
//! substructure is moved in, not copied. Both patches must target the same
//! logical node; handing patches of different node kinds to `merge` is a
//! caller contract violation and is not checked here.

use std::rc::Rc;

use crate::apply::{apply, ApplyError};
use crate::patch::{Deletions, Patch};
use crate::rebase::{index_adjustment, rebase_child_indexes};

/// Merges `addition` into `target`.
///
/// The only fallible path is absorbing a child patch into a concrete value
/// `target` already has pending under `set`, which routes through
/// [`apply`]; a well-formed addition never fails.
pub fn merge(target: &mut Patch, addition: Patch) -> Result<(), ApplyError> {
    if cfg!(debug_assertions) {
        addition.check_invariants()?;
    }
    let Patch {
        delete,
        set,
        add,
        ops,
        children,
    } = addition;

    // Deletions: a later delete cancels an earlier pending set or recursion.
    match delete {
        Some(Deletions::Keys(keys)) => {
            if let Some(target_set) = &mut target.set {
                for key in &keys {
                    target_set.shift_remove(key);
                }
                if target_set.is_empty() {
                    target.set = None;
                }
            } else if let Some(target_add) = &mut target.add {
                for key in &keys {
                    target_add.shift_remove(key);
                }
                if target_add.is_empty() {
                    target.add = None;
                }
            }
            if let Some(target_children) = &mut target.children {
                for key in &keys {
                    target_children.shift_remove(key);
                }
                if target_children.is_empty() {
                    target.children = None;
                }
            }
            match &mut target.delete {
                // Delete-all already covers every later single-key delete.
                Some(Deletions::All) => {}
                Some(Deletions::Keys(existing)) => existing.extend(keys),
                None => target.delete = Some(Deletions::Keys(keys)),
            }
        }
        Some(Deletions::All) => {
            target.delete = Some(Deletions::All);
            target.set = None;
            target.add = None;
        }
        None => {}
    }

    // Set / add: a replacement value supersedes a queued delete, and (for
    // the keyed case) any queued recursive delta on the old value.
    if let Some(set) = set {
        if let Some(Deletions::Keys(deletes)) = &mut target.delete {
            for key in set.keys() {
                deletes.shift_remove(key);
            }
            if deletes.is_empty() {
                target.delete = None;
            }
        }
        if let Some(target_children) = &mut target.children {
            for key in set.keys() {
                target_children.shift_remove(key);
            }
            if target_children.is_empty() {
                target.children = None;
            }
        }
        match &mut target.set {
            Some(existing) => existing.extend(set),
            None => target.set = Some(set),
        }
    } else if let Some(add) = add {
        if let Some(Deletions::Keys(deletes)) = &mut target.delete {
            for element in &add {
                deletes.shift_remove(element);
            }
            if deletes.is_empty() {
                target.delete = None;
            }
        }
        match &mut target.add {
            Some(existing) => existing.extend(add),
            None => target.add = Some(add),
        }
    }

    // Sequence operations: combined order is target's ops, then addition's.
    // target's child patches were keyed against the sequence as it stood
    // before addition's ops ran, and the merged patch applies all ops before
    // any child patch, so each appended op rebases those keys first.
    if let Some(ops) = ops {
        for op in &ops {
            if let Some(adjustment) = index_adjustment(op) {
                rebase_child_indexes(target, &adjustment);
            }
        }
        match &mut target.ops {
            Some(existing) => existing.extend(ops),
            None => target.ops = Some(ops),
        }
    }

    // Child patches.
    if let Some(children) = children {
        let mut target_children = target.children.take().unwrap_or_default();
        for (key, child_patch) in children {
            if let Some(existing) = target_children.get_mut(&key) {
                // Two queued deltas for the same child: combine them.
                merge(existing, child_patch)?;
                continue;
            }
            let pending = target
                .set
                .as_ref()
                .and_then(|set| set.get(&key))
                .map(Rc::clone);
            if let Some(value) = pending {
                // target already replaces this child with a concrete value;
                // the recursive delta lands on that value right now instead
                // of being deferred.
                let updated = apply(&value, &child_patch)?;
                if let Some(set) = &mut target.set {
                    set.insert(key, Rc::new(updated));
                }
                continue;
            }
            target_children.insert(key, child_patch);
        }
        if !target_children.is_empty() {
            target.children = Some(target_children);
        }
    }

    Ok(())
}

/// Left-folds an ordered run of patches into a single equivalent patch.
///
/// Applying the result once equals applying each input patch in order. An
/// empty run folds to the empty patch.
pub fn merge_all<I>(patches: I) -> Result<Patch, ApplyError>
where
    I: IntoIterator<Item = Patch>,
{
    let mut iter = patches.into_iter();
    let mut accumulator = iter.next().unwrap_or_default();
    for patch in iter {
        merge(&mut accumulator, patch)?;
    }
    Ok(accumulator)
}
