//! Error types for canvas computations.

use crate::content::ContentId;
use thiserror::Error;

/// Errors raised while reading a content snapshot.
///
/// Every variant except `Serialization` signals an inconsistent snapshot handed
/// over by the caller. None of them are retried: the same input always
/// reproduces the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanvasError {
    #[error("Unresolved content id: {0}")]
    UnresolvedId(ContentId),
    #[error("Content {id} is not a {expected}")]
    UnexpectedKind { id: ContentId, expected: &'static str },
    #[error("Cyclic reference through content {0}")]
    CyclicReference(ContentId),
    #[error("Connector {0} has no segments")]
    InvalidConnector(ContentId),
    #[error("Cannot merge an empty list of bounds")]
    EmptyBounds,
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CanvasError {
    fn from(err: serde_json::Error) -> Self {
        CanvasError::Serialization(err.to_string())
    }
}

/// Result type for canvas computations.
pub type CanvasResult<T> = Result<T, CanvasError>;
