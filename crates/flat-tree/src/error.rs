//! Error types for flattening and toggling

use derive_more::Display;
use std::fmt;

/// Errors raised by the flattening engine and its collaborators.
///
/// Identities are carried pre-rendered with `Debug` so that the error does
/// not depend on the identity type of a particular tree source.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum TreeError {
    /// The source re-affirmed a node it never described
    #[display(fmt = "protocol violation: reference to unregistered node {}", id)]
    UnregisteredReference { id: String },
    /// The source yielded the same node twice in one traversal
    #[display(fmt = "protocol violation: node {} yielded twice in one traversal", id)]
    DuplicateNode { id: String },
    /// A toggle named a node that was never registered
    #[display(fmt = "unknown node {}", id)]
    UnknownIdentity { id: String },
    /// A node was inserted under an identity that is already taken
    #[display(fmt = "node {} already exists", id)]
    IdentityInUse { id: String },
    /// A recomputation or toggle was issued while one was in flight
    #[display(fmt = "tree recomputation already in progress")]
    Reentrant,
    /// Configuration rejected at construction
    #[display(fmt = "invalid options: {}", reason)]
    InvalidOptions { reason: String },
}

impl TreeError {
    pub(crate) fn unregistered(id: &impl fmt::Debug) -> Self {
        TreeError::UnregisteredReference {
            id: format!("{:?}", id),
        }
    }

    pub(crate) fn duplicate(id: &impl fmt::Debug) -> Self {
        TreeError::DuplicateNode {
            id: format!("{:?}", id),
        }
    }

    pub(crate) fn unknown(id: &impl fmt::Debug) -> Self {
        TreeError::UnknownIdentity {
            id: format!("{:?}", id),
        }
    }

    pub(crate) fn in_use(id: &impl fmt::Debug) -> Self {
        TreeError::IdentityInUse {
            id: format!("{:?}", id),
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        TreeError::InvalidOptions {
            reason: reason.into(),
        }
    }

    /// Returns true if the tree source broke the traversal protocol
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            TreeError::UnregisteredReference { .. } | TreeError::DuplicateNode { .. }
        )
    }
}

impl std::error::Error for TreeError {}

/// Result alias used throughout the crate
pub type Result<T, E = TreeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TreeError::unregistered(&"X");
        assert_eq!(
            err.to_string(),
            "protocol violation: reference to unregistered node \"X\""
        );
        assert!(err.is_protocol_violation());

        let err = TreeError::unknown(&7);
        assert_eq!(err.to_string(), "unknown node 7");
        assert!(!err.is_protocol_violation());

        assert!(TreeError::duplicate(&"a").is_protocol_violation());
        assert_eq!(
            TreeError::invalid("row_size must be positive").to_string(),
            "invalid options: row_size must be positive"
        );
    }
}
