//! Error types.

use thiserror::Error;

use crate::path::{DocPath, PathError};

/// Errors raised by a document store backend.
///
/// Services pass these through unchanged; retrying is the store client's
/// business.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    InvalidPath(#[from] PathError),

    #[error("Document not found: {0}")]
    NotFound(DocPath),

    #[error("Failed to encode or decode document {path}: {source}")]
    Serialization {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn serialization(path: impl ToString, source: serde_json::Error) -> Self {
        StoreError::Serialization {
            path: path.to_string(),
            source,
        }
    }

    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        StoreError::Backend(Box::new(err))
    }
}

/// Input rejected before anything is written.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be {min} to {max} characters (got {len})")]
    Length {
        field: &'static str,
        len: usize,
        min: usize,
        max: usize,
    },

    #[error("{field} must have {min} to {max} entries (got {count})")]
    Count {
        field: &'static str,
        count: usize,
        min: usize,
        max: usize,
    },
}

/// Errors returned by the diary services.
#[derive(Error, Debug)]
pub enum DiaryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("User '{user_id}' is not the author of recipe '{recipe_id}'")]
    NotAuthor { user_id: String, recipe_id: String },
}

impl From<PathError> for DiaryError {
    fn from(err: PathError) -> Self {
        DiaryError::Store(StoreError::InvalidPath(err))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
pub type DiaryResult<T> = Result<T, DiaryError>;
