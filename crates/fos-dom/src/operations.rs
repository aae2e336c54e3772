//! DOM Node Operations
//!
//! Error type shared by the tree manipulation primitives: appendChild,
//! insertBefore, removeChild and path resolution.

use thiserror::Error;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// Node not found
    #[error("Node not found")]
    NotFound,
    /// Hierarchy error (e.g., inserting ancestor)
    #[error("Hierarchy request error")]
    HierarchyRequest,
    /// Node is not a child
    #[error("Node is not a child")]
    NotAChild,
    /// Invalid node type
    #[error("Invalid node type")]
    InvalidNodeType,
    /// Absolute path could not be computed or resolved
    #[error("Path not resolved: {0}")]
    PathNotResolved(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(DomError::NotAChild.to_string(), "Node is not a child");
        assert_eq!(
            DomError::PathNotResolved("/html[1]".into()).to_string(),
            "Path not resolved: /html[1]"
        );
    }
}
