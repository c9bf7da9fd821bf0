// Copyright (c) the wrapgen contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Analysis passes over the declaration tree.
//!
//! The node kinds in [`crate::nodes`] are pure data; every behavior lives
//! here as a pass. Run order matters (single-threaded, whole-tree):
//!
//! 1. [`visibility::normalize_visibility`] — stamp effective access levels.
//! 2. [`scope::assign_scopes`] — parents and per-scope name maps.
//! 3. [`inject::inject_nested_scopes`] — relocate out-of-line `A::B`
//!    definitions into `A`.
//! 4. [`scope::assign_scopes`] again — maps must be rebuilt after any
//!    structural mutation.
//!
//! After these, the read-only engines ([`scope::Resolver`],
//! [`typedefs`], [`signature`], [`adaptor`]) may be used freely.

pub mod adaptor;
pub mod inject;
pub mod scope;
pub mod signature;
pub mod typedefs;
pub mod visibility;

use crate::nodes::DeclTree;

/// Run the mutation passes in their required order, leaving the tree ready
/// for resolution queries.
pub fn prepare(tree: &mut DeclTree) {
    visibility::normalize_visibility(tree);
    scope::assign_scopes(tree);
    inject::inject_nested_scopes(tree);
    scope::assign_scopes(tree);
}
