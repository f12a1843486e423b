use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

use crate::domain::money::MoneyError;
use crate::domain::payment::SettlementError;

/// Result type returned by repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors raised by the persistence layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The referenced row does not exist.
    #[error("record not found")]
    NotFound,
    /// A foreign key, unique or check constraint rejected the write.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    /// The requested change is not valid for the current state of the data.
    #[error("validation error: {0}")]
    ValidationError(String),
    /// The row changed under the caller or is claimed by another record.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The settlement could not be priced.
    #[error("settlement rejected: {0}")]
    Settlement(#[from] SettlementError),
    /// An amount could not be computed within the supported range.
    #[error("amount rejected: {0}")]
    Money(#[from] MoneyError),
    /// A stored value could not be mapped to the domain.
    #[error("invalid stored data: {0}")]
    InvalidData(String),
    #[error("database error: {0}")]
    DatabaseError(DieselError),
    #[error("connection pool error: {0}")]
    ConnectionError(#[from] diesel::r2d2::PoolError),
}

impl From<DieselError> for RepositoryError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => RepositoryError::NotFound,
            DieselError::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::UniqueViolation
                | DatabaseErrorKind::CheckViolation
                | DatabaseErrorKind::NotNullViolation,
                info,
            ) => RepositoryError::ConstraintViolation(info.message().to_string()),
            other => RepositoryError::DatabaseError(other),
        }
    }
}
