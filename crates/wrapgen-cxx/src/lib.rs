// Copyright (c) the wrapgen contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Semantic core of the C++ binding generator.
//!
//! Input is a [`nodes::DeclTree`]: the declaration tree of one C++ module as
//! serialized by the external front-end parser. The passes in [`pass`]
//! normalize it (visibility, scopes, out-of-line definitions) and provide
//! the query engines — name resolution, typedef collapsing, rescoping, call
//! signatures — that [`analysis::Analyzer`] drives to produce a binding
//! plan: which methods each class exposes, under what signatures and hash
//! keys, and whether a forwarding adaptor subclass is needed.
//!
//! What to generate is configured through the [`wrapgen_core::Policy`]
//! trait; this crate never reads configuration itself.

pub mod analysis;
pub mod nodes;
pub mod pass;

pub use analysis::{Analyzer, ClassAnalysis, MethodBinding, ModuleAnalysis, SkippedClass};
pub use nodes::{DeclTree, NodeId};
