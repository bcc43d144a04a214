use axum::Extension;
use axum::extract::State;
use uuid::Uuid;

use deskline_db::DbError;
use deskline_db::models::{NewTeam, TeamPatch};
use deskline_types::api::{CreateTeamRequest, SetSupervisorRequest, UpdateTeamRequest};

use super::{ApiResult, Body, Id, created, done, ok};
use crate::convert;
use crate::guard::{ADMIN, SessionUser, authorize};
use crate::state::{AppState, blocking};
use crate::validate;

fn id_strings(ids: Vec<Uuid>) -> Vec<String> {
    ids.into_iter().map(|id| id.to_string()).collect()
}

pub async fn list_teams(
    State(state): State<AppState>,
    Extension(_me): Extension<SessionUser>,
) -> ApiResult {
    let rows = blocking(&state, |s| s.db.list_teams()).await?;
    ok(
        "teams",
        rows.into_iter()
            .map(|t| convert::team(t, None))
            .collect::<Vec<_>>(),
    )
}

/// Single-team read with the roster resolved.
pub async fn get_team(
    State(state): State<AppState>,
    Extension(_me): Extension<SessionUser>,
    Id(id): Id,
) -> ApiResult {
    let (team, members) = blocking(&state, move |s| {
        let team = s
            .db
            .get_team(&id)?
            .ok_or_else(|| DbError::not_found("team"))?;
        let members = s.db.get_team_members(&id)?;
        Ok::<_, DbError>((team, members))
    })
    .await?;
    ok("team", convert::team(team, Some(members)))
}

pub async fn create_team(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Body(req): Body<CreateTeamRequest>,
) -> ApiResult {
    authorize(&me, &[ADMIN])?;
    let input = NewTeam {
        name: validate::name(&req.name, "team")?,
        supervisor_id: req.supervisor_id.map(|id| id.to_string()),
        users: id_strings(req.users),
        conversation_id: req.conversation_id.map(|id| id.to_string()),
        answer_set_ids: id_strings(req.answer_set_ids),
        bot: false,
    };

    let row = blocking(&state, move |s| s.db.create_team(&input)).await?;
    created("team", convert::team(row, None))
}

pub async fn update_team(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Id(id): Id,
    Body(req): Body<UpdateTeamRequest>,
) -> ApiResult {
    authorize(&me, &[ADMIN])?;
    let patch = TeamPatch {
        name: validate::optional_name(req.name.as_deref(), "team")?,
        users: req.users.map(id_strings),
        conversation_id: req.conversation_id.map(|c| c.map(|id| id.to_string())),
        answer_set_ids: req.answer_set_ids.map(id_strings),
    };

    let row = blocking(&state, move |s| s.db.update_team(&id, &patch)).await?;
    ok("team", convert::team(row, None))
}

pub async fn set_supervisor(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Id(id): Id,
    Body(req): Body<SetSupervisorRequest>,
) -> ApiResult {
    authorize(&me, &[ADMIN])?;
    let candidate = req.user_id.to_string();

    let row = blocking(&state, move |s| s.db.set_team_supervisor(&id, &candidate)).await?;
    ok("team", convert::team(row, None))
}

pub async fn set_default(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Id(id): Id,
) -> ApiResult {
    authorize(&me, &[ADMIN])?;
    let row = blocking(&state, move |s| s.db.set_default_team(&id)).await?;
    ok("team", convert::team(row, None))
}

pub async fn delete_team(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Id(id): Id,
) -> ApiResult {
    authorize(&me, &[ADMIN])?;
    blocking(&state, move |s| s.db.delete_team(&id)).await?;
    done()
}
