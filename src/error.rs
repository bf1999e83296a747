//! Failure taxonomy shared by the store, the service layer and the HTTP
//! surface.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Missing or malformed input. `errors` carries one message per offending
    /// field when more than one check failed.
    #[error("{message}")]
    Validation {
        message: String,
        errors: Vec<String>,
    },
    #[error("{0}")]
    NotFound(String),
    /// A unique field (tag name, derived video id) already exists.
    #[error("{0}")]
    Conflict(String),
    /// A tag cannot be removed while videos still point at it.
    #[error("{message}")]
    InUse { message: String, video_count: u64 },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl CatalogError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn invalid_fields(errors: Vec<String>) -> Self {
        Self::Validation {
            message: "invalid data".to_string(),
            errors,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }
}

impl From<libsql::Error> for CatalogError {
    fn from(err: libsql::Error) -> Self {
        Self::Internal(err.into())
    }
}

/// SQLite reports sparse-unique and unique-index rejections through the
/// error message only once it crosses the libsql boundary.
pub(crate) fn is_unique_violation(err: &libsql::Error) -> bool {
    err.to_string().contains("UNIQUE constraint failed")
}
