use axum::Extension;
use axum::extract::State;

use deskline_db::models::StatusPatch;
use deskline_types::api::{CreateStatusRequest, UpdateStatusRequest};

use super::{ApiResult, Body, Id, created, done, ok};
use crate::convert;
use crate::guard::{ADMIN, SessionUser, authorize};
use crate::state::{AppState, blocking};
use crate::validate;

pub async fn list_statuses(
    State(state): State<AppState>,
    Extension(_me): Extension<SessionUser>,
) -> ApiResult {
    let rows = blocking(&state, |s| s.db.list_statuses()).await?;
    ok("statuses", rows.into_iter().map(convert::status).collect::<Vec<_>>())
}

pub async fn create_status(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Body(req): Body<CreateStatusRequest>,
) -> ApiResult {
    authorize(&me, &[ADMIN])?;
    let name = validate::name(&req.name, "status")?;

    let row = blocking(&state, move |s| s.db.create_status(&name, req.category)).await?;
    created("status", convert::status(row))
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Id(id): Id,
    Body(req): Body<UpdateStatusRequest>,
) -> ApiResult {
    authorize(&me, &[ADMIN])?;
    let patch = StatusPatch {
        name: validate::optional_name(req.name.as_deref(), "status")?,
        category: req.category,
        active: req.active,
    };

    let row = blocking(&state, move |s| s.db.update_status(&id, &patch)).await?;
    ok("status", convert::status(row))
}

pub async fn set_default(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Id(id): Id,
) -> ApiResult {
    authorize(&me, &[ADMIN])?;
    let row = blocking(&state, move |s| s.db.set_default_status(&id)).await?;
    ok("status", convert::status(row))
}

pub async fn delete_status(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Id(id): Id,
) -> ApiResult {
    authorize(&me, &[ADMIN])?;
    blocking(&state, move |s| s.db.delete_status(&id)).await?;
    done()
}
