//! Error types for the persistence layer.

use rusqlite::ErrorCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

/// Errors raised by queries and by the reference-integrity operations.
///
/// The first five variants are raised during validation, before anything is
/// written. The rest come from storage and abort the surrounding transaction.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("{0} not found")]
    NotFound(String),

    /// A uniqueness or single-owner rule would be broken.
    #[error("{0}")]
    Conflict(String),

    /// The entity's current state does not allow the operation.
    #[error("{0}")]
    InvalidState(String),

    /// The requester does not own the entity being written.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json column error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database lock poisoned")]
    LockPoisoned,
}

impl DbError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}

/// Maps a UNIQUE violation on insert/update to `Conflict`, so a race that
/// slips past a pre-check still surfaces as the same error.
pub(crate) fn unique_as_conflict(msg: &'static str) -> impl FnOnce(rusqlite::Error) -> DbError {
    move |err| match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            DbError::Conflict(msg.to_string())
        }
        _ => DbError::Sqlite(err),
    }
}
