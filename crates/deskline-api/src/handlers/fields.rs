use axum::Extension;
use axum::extract::State;

use deskline_db::models::NewField;
use deskline_types::api::CreateFieldRequest;
use deskline_types::models::FieldKind;

use super::{ApiResult, Body, Id, created, done, ok};
use crate::convert;
use crate::error::ApiError;
use crate::guard::{ADMIN, SessionUser, authorize};
use crate::state::{AppState, blocking};
use crate::validate;

pub async fn list_fields(
    State(state): State<AppState>,
    Extension(_me): Extension<SessionUser>,
) -> ApiResult {
    let rows = blocking(&state, |s| s.db.list_fields()).await?;
    ok("fields", rows.into_iter().map(convert::field).collect::<Vec<_>>())
}

pub async fn create_field(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Body(req): Body<CreateFieldRequest>,
) -> ApiResult {
    authorize(&me, &[ADMIN])?;
    let name = validate::name(&req.name, "field")?;
    if req.kind == FieldKind::Select && req.options.is_empty() {
        return Err(ApiError::validation("select fields need at least one option"));
    }

    let input = NewField {
        name,
        kind: req.kind,
        required: req.required,
        options: req.options,
    };
    let row = blocking(&state, move |s| s.db.create_field(&input)).await?;
    created("field", convert::field(row))
}

pub async fn delete_field(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Id(id): Id,
) -> ApiResult {
    authorize(&me, &[ADMIN])?;
    blocking(&state, move |s| s.db.delete_field(&id)).await?;
    done()
}
