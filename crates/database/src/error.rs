use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Errors raised by the service layer
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Database(#[from] DbErr),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// `Conflict(message)` when `err` is a unique constraint violation
    pub fn unique_conflict(err: DbErr, message: impl Into<String>) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::conflict(message),
            _ => Self::Database(err),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_other_database_errors_pass_through() {
        let err = ServiceError::unique_conflict(DbErr::Custom("boom".to_string()), "taken");
        assert!(matches!(err, ServiceError::Database(_)));
    }
}
