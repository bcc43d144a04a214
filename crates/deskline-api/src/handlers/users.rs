use axum::Extension;
use axum::extract::State;

use deskline_db::models::{NewUser, UserPatch};
use deskline_types::api::{
    AssignTeamRequest, CreateUserRequest, ResetPasswordRequest, UpdateUserRequest,
};

use super::{ApiResult, Body, Id, created, done, ok};
use crate::convert;
use crate::error::ApiError;
use crate::guard::{ADMIN, STAFF, SessionUser, authorize};
use crate::identity::{self, AuthError};
use crate::state::{AppState, blocking};
use crate::validate;

pub async fn list_users(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
) -> ApiResult {
    authorize(&me, &[STAFF])?;
    let rows = blocking(&state, |s| s.db.list_users()).await?;
    ok("users", rows.into_iter().map(convert::user).collect::<Vec<_>>())
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Body(req): Body<CreateUserRequest>,
) -> ApiResult {
    authorize(&me, &[ADMIN])?;
    let email = validate::email(&req.email)?;
    let name = validate::name(&req.name, "user")?;
    validate::password(&req.password)?;

    let row = blocking(&state, move |s| {
        let password_hash = identity::hash_password(&req.password)?;
        let user = s.db.create_user(&NewUser {
            email,
            name,
            phone: req.phone,
            password_hash,
            role: req.role,
            capabilities: req.capabilities,
        })?;
        Ok::<_, AuthError>(user)
    })
    .await?;

    created("user", convert::user(row))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(_me): Extension<SessionUser>,
    Id(id): Id,
) -> ApiResult {
    let row = blocking(&state, move |s| s.db.get_user_by_id(&id))
        .await?
        .filter(|u| !u.deleted)
        .ok_or_else(|| ApiError::NotFound("user".into()))?;
    ok("user", convert::user(row))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Id(id): Id,
    Body(req): Body<UpdateUserRequest>,
) -> ApiResult {
    authorize(&me, &[ADMIN])?;
    let patch = UserPatch {
        name: validate::optional_name(req.name.as_deref(), "user")?,
        phone: req.phone,
        role: req.role,
        capabilities: req.capabilities,
    };

    let row = blocking(&state, move |s| s.db.update_user(&id, &patch)).await?;
    ok("user", convert::user(row))
}

/// `{"team_id": null}` takes the user out of their team. Supervisors are
/// limited to plain members entering or leaving the team they lead.
pub async fn assign_team(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Id(id): Id,
    Body(req): Body<AssignTeamRequest>,
) -> ApiResult {
    authorize(&me, &[STAFF])?;
    let team_id = req.team_id.map(|t| t.to_string());

    let row = blocking(&state, move |s| {
        s.db.assign_user_to_team(me.actor(), &id, team_id.as_deref())
    })
    .await?;
    ok("user", convert::user(row))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Id(id): Id,
    Body(req): Body<ResetPasswordRequest>,
) -> ApiResult {
    authorize(&me, &[ADMIN])?;
    validate::password(&req.new_password)?;

    blocking(&state, move |s| {
        if s.db.get_user_by_id(&id)?.is_none_or(|u| u.deleted) {
            return Err(ApiError::NotFound("user".into()));
        }
        identity::reset_password(&s.db, &id, &req.new_password)?;
        Ok(())
    })
    .await?;
    done()
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Id(id): Id,
) -> ApiResult {
    authorize(&me, &[ADMIN])?;
    blocking(&state, move |s| s.db.soft_delete_user(&id, &me.id)).await?;
    done()
}
