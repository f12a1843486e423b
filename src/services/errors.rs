use thiserror::Error;

use crate::repository::errors::RepositoryError;

/// Result type returned by service functions.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced to the HTTP layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found")]
    NotFound,
    /// The request is well formed but not allowed in the current state.
    #[error("{0}")]
    Validation(String),
    /// The data changed under the caller or a constraint refused the write.
    #[error("{0}")]
    Conflict(String),
    /// The request payload failed validation.
    #[error("{0}")]
    Form(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound,
            RepositoryError::ValidationError(message) => ServiceError::Validation(message),
            RepositoryError::Settlement(err) => ServiceError::Validation(err.to_string()),
            RepositoryError::Money(err) => ServiceError::Validation(err.to_string()),
            RepositoryError::Conflict(message) | RepositoryError::ConstraintViolation(message) => {
                ServiceError::Conflict(message)
            }
            other => ServiceError::Internal(other.to_string()),
        }
    }
}
