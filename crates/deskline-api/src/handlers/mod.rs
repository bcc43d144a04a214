pub mod answers;
pub mod auth;
pub mod conversations;
pub mod fields;
pub mod statuses;
pub mod teams;
pub mod tickets;
pub mod users;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::error;
use uuid::Uuid;

use deskline_types::api::Envelope;

use crate::error::ApiError;

pub type ApiResult = Result<Response, ApiError>;

/// JSON request body whose rejections render as `fail` envelopes.
pub struct Body<T>(pub T);

impl<S, T> FromRequest<S> for Body<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Body(value))
    }
}

/// A single `{id}` path segment, checked to be a UUID.
pub struct Id(pub String);

impl<S> FromRequestParts<S> for Id
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<Uuid>::from_request_parts(parts, state).await?;
        Ok(Id(id.to_string()))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        ApiError::validation("malformed id in path")
    }
}

fn respond<T: Serialize>(status: StatusCode, key: &'static str, value: T) -> ApiResult {
    let value = serde_json::to_value(value).map_err(|e| {
        error!("Response serialization failed: {}", e);
        ApiError::Internal
    })?;
    let mut data = serde_json::Map::new();
    data.insert(key.to_string(), value);
    Ok((status, Json(Envelope::success(data))).into_response())
}

/// `200` with `{"status":"success","data":{key: value}}`.
pub fn ok<T: Serialize>(key: &'static str, value: T) -> ApiResult {
    respond(StatusCode::OK, key, value)
}

pub fn created<T: Serialize>(key: &'static str, value: T) -> ApiResult {
    respond(StatusCode::CREATED, key, value)
}

/// Success with an empty payload, for deletes and other commands.
pub fn done() -> ApiResult {
    Ok(Json(Envelope::success(serde_json::Map::new())).into_response())
}
