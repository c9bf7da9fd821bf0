//! Core infrastructure shared by the wrapgen crates.
//!
//! This crate holds the pieces that are independent of the C++ declaration
//! model: the unified error type ([`WrapError`]) and the binding policy
//! interface ([`Policy`]) through which externally supplied per-class and
//! per-method rules reach the semantic core.

pub mod error;
pub mod policy;

pub use error::WrapError;
pub use policy::{ClassRules, NullPolicy, Policy, PolicyAnswer, PropertyRole, TablePolicy};
