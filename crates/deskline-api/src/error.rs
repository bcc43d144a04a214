//! HTTP error taxonomy.
//!
//! Every failure a handler can produce ends up as an [`ApiError`], which
//! renders the `fail` envelope. Storage and other internal faults are logged
//! here and replaced with a generic message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use deskline_db::DbError;
use deskline_types::api::Envelope;

use crate::identity::AuthError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Validation(String),

    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn forbidden() -> Self {
        Self::Forbidden("forbidden".into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InvalidState(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(Envelope::<()>::fail(self.to_string()))).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(what) => Self::NotFound(what),
            DbError::Conflict(msg) => Self::Conflict(msg),
            DbError::InvalidState(msg) => Self::InvalidState(msg),
            DbError::Validation(msg) => Self::Validation(msg),
            DbError::Forbidden(msg) => Self::Forbidden(msg),
            DbError::Sqlite(_) | DbError::Json(_) | DbError::LockPoisoned => {
                error!(error = %err, "Storage error");
                Self::Internal
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthorized => Self::Unauthorized,
            AuthError::InvalidOtp => Self::Unauthorized,
            AuthError::AccountDeleted => Self::Forbidden("account deleted".into()),
            AuthError::CredentialsChanged => {
                Self::Forbidden("credentials changed, sign in again".into())
            }
            AuthError::Db(db) => Self::from(db),
            AuthError::Hash | AuthError::Token(_) => {
                error!(error = %err, "Identity store error");
                Self::Internal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_errors_map_deterministically() {
        let cases = [
            (DbError::not_found("team 1"), StatusCode::NOT_FOUND),
            (DbError::conflict("dup"), StatusCode::CONFLICT),
            (DbError::invalid_state("busy"), StatusCode::UNPROCESSABLE_ENTITY),
            (DbError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (DbError::Forbidden("mine".into()), StatusCode::FORBIDDEN),
            (DbError::LockPoisoned, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn auth_errors_split_401_and_403() {
        assert_eq!(
            ApiError::from(AuthError::Unauthorized).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::InvalidOtp).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::AccountDeleted).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(AuthError::CredentialsChanged).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn storage_detail_is_not_exposed() {
        let err = ApiError::from(DbError::Sqlite(rusqlite_error()));
        assert_eq!(err.to_string(), "internal server error");
    }

    fn rusqlite_error() -> deskline_db::rusqlite::Error {
        deskline_db::rusqlite::Error::InvalidQuery
    }
}
