//! Error types and exit code constants for wrapgen.
//!
//! This module provides the unified error type (`WrapError`) shared by the
//! semantic core and the CLI.
//!
//! ## Severity
//!
//! The error taxonomy mirrors how the analysis passes react to failure:
//! - *Resolution failure* is non-fatal at the engine level: the resolver
//!   returns `None` and only callers that require a result (rescoping,
//!   method re-homing) escalate to `Unresolved`.
//! - *Rescoping inconsistency* (`NoCommonAncestor`) is a structural defect
//!   in the tree and aborts the run when raised during typedef resolution.
//! - A base class that cannot be resolved is logged and dropped; it never
//!   becomes a `WrapError` on its own.
//!
//! ## Exit Code Mapping
//!
//! - `2`: Invalid arguments (bad input file, malformed JSON)
//! - `3`: Resolution errors (unresolved qualified id)
//! - `10`: Internal errors (broken tree invariants, rescoping inconsistency)

use thiserror::Error;

/// Unified error type for the wrapgen semantic core.
#[derive(Debug, Error)]
pub enum WrapError {
    /// A qualified id could not be resolved in any enclosing or base scope.
    #[error("unresolved qualified id `{id}` in scope `{scope}`")]
    Unresolved { id: String, scope: String },

    /// Rescoping found no common ancestor between the two scopes.
    #[error("cannot rescope `{id}` from `{from}` into `{to}`: no common ancestor")]
    NoCommonAncestor {
        id: String,
        from: String,
        to: String,
    },

    /// The declaration tree violates a structural invariant.
    #[error("malformed declaration tree: {message}")]
    MalformedTree { message: String },

    /// JSON (de)serialization failure when loading or writing a tree.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O failure when loading or writing a tree.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WrapError {
    /// Create a malformed-tree error.
    pub fn malformed(message: impl Into<String>) -> Self {
        WrapError::MalformedTree {
            message: message.into(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            WrapError::Unresolved { .. } => 3,
            WrapError::NoCommonAncestor { .. } => 10,
            WrapError::MalformedTree { .. } => 10,
            WrapError::Json(_) => 2,
            WrapError::Io(_) => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_display_names_both_scopes() {
        let err = WrapError::Unresolved {
            id: "ns::T".to_string(),
            scope: "ns::Widget".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unresolved qualified id `ns::T` in scope `ns::Widget`"
        );
    }

    #[test]
    fn exit_codes_follow_severity() {
        assert_eq!(
            WrapError::Unresolved {
                id: "x".into(),
                scope: "y".into()
            }
            .exit_code(),
            3
        );
        assert_eq!(
            WrapError::NoCommonAncestor {
                id: "x".into(),
                from: "a".into(),
                to: "b".into()
            }
            .exit_code(),
            10
        );
        assert_eq!(WrapError::malformed("broken").exit_code(), 10);
    }

    #[test]
    fn json_error_bridges() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = WrapError::from(json_err);
        assert_eq!(err.exit_code(), 2);
    }
}
