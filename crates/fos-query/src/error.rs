//! Query engine errors

use fos_dom::{DocumentId, DomError};
use fos_html::ParseError;

use crate::state::StateId;

/// Query, traversal and mutation failures
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Malformed selector: {0}")]
    Selector(String),

    #[error("Document {0} is not loaded")]
    DocumentNotLoaded(DocumentId),

    #[error("Structural error: {0}")]
    Structural(String),

    #[error("Node is not attached to any loaded document")]
    OrphanedNode,

    #[error("Unknown selection {0}")]
    UnknownState(StateId),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Dom(#[from] DomError),

    #[error(transparent)]
    Html(#[from] ParseError),
}

pub type Result<T> = std::result::Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = QueryError::DocumentNotLoaded(DocumentId(3));
        assert_eq!(err.to_string(), "Document doc-3 is not loaded");

        let err: QueryError = DomError::NotFound.into();
        assert!(matches!(err, QueryError::Dom(DomError::NotFound)));
    }
}
