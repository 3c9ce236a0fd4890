//! Record, merge, and replay structural changes to in-memory trees.
//!
//! A tree is built from keyed records, associative maps, unordered value
//! sets, and ordered sequences ([`Node`]). A [`Patch`] describes the changes
//! to one node; the two public contracts are:
//!
//! - [`apply`]: pure function from `(tree, patch)` to a new tree, sharing
//!   untouched subtrees with the input;
//! - [`merge`]: in-place combination of two sequential patches on the same
//!   node into one equivalent patch, including the index rebasing needed
//!   when the patches touch ordered sequences.
//!
//! The canonical flow: a recorder emits one patch per mutation, a single
//! writer folds a session's patches into one accumulator with [`merge`] (or
//! [`merge_all`]), and the finished patch is applied once with [`apply`].
//! Patch production and any wire encoding of patches live outside this
//! crate; the engines trust their input to be well-formed and verify the
//! contract only in debug builds (see [`Patch::check_invariants`]).
//!
//! Trees are single-threaded values (`Rc`-shared children) with no interior
//! mutability; `apply` may be called freely on independent arguments, while
//! a merge accumulator belongs to one writer at a time.

pub mod apply;
pub mod merge;
pub mod node;
pub mod patch;
pub mod patch_builder;
pub mod rebase;

pub use apply::{apply, ApplyError};
pub use merge::{merge, merge_all};
pub use node::{Key, Node, NodeKind, Scalar};
pub use patch::{Deletions, Patch, SpliceOp};
pub use patch_builder::PatchBuilder;
pub use rebase::{index_adjustment, remap_index_keys, IndexAdjustment};

/// Returns the crate version at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
