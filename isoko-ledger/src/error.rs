use thiserror::Error;
use uuid::Uuid;

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Error type surfaced by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid {field}: {constraint}")]
    Validation {
        field: &'static str,
        constraint: String,
    },
    #[error("integrity violation: {0}")]
    Integrity(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl LedgerError {
    pub fn validation(field: &'static str, constraint: impl Into<String>) -> Self {
        Self::Validation {
            field,
            constraint: constraint.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Conflict(value.to_string())
            }
            other => Self::Storage(other.to_string()),
        }
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(value: std::io::Error) -> Self {
        Self::Storage(value.to_string())
    }
}
