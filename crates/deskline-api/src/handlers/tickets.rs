use axum::Extension;
use axum::extract::State;

use deskline_db::DbError;
use deskline_db::models::NewTicket;
use deskline_types::api::{CreateCommentRequest, CreateTicketRequest, SetTicketStatusRequest};

use super::{ApiResult, Body, Id, created, ok};
use crate::convert;
use crate::error::ApiError;
use crate::guard::{SessionUser, TICKETS, authorize};
use crate::state::{AppState, blocking};

pub async fn list_tickets(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
) -> ApiResult {
    authorize(&me, &[TICKETS])?;
    let rows = blocking(&state, |s| s.db.list_tickets()).await?;
    ok("tickets", rows.into_iter().map(convert::ticket).collect::<Vec<_>>())
}

pub async fn get_ticket(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Id(id): Id,
) -> ApiResult {
    authorize(&me, &[TICKETS])?;
    let row = blocking(&state, move |s| {
        s.db.get_ticket(&id)?
            .ok_or_else(|| DbError::not_found("ticket"))
    })
    .await?;
    ok("ticket", convert::ticket(row))
}

pub async fn create_ticket(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Body(req): Body<CreateTicketRequest>,
) -> ApiResult {
    authorize(&me, &[TICKETS])?;
    let subject = req.subject.trim().to_string();
    if subject.is_empty() {
        return Err(ApiError::validation("ticket subject is required"));
    }

    let input = NewTicket {
        subject,
        description: req.description,
        team_id: req.team_id.map(|id| id.to_string()),
        created_by: me.id.clone(),
        fields: req.fields,
    };
    let row = blocking(&state, move |s| s.db.create_ticket(&input)).await?;
    created("ticket", convert::ticket(row))
}

pub async fn set_status(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Id(id): Id,
    Body(req): Body<SetTicketStatusRequest>,
) -> ApiResult {
    authorize(&me, &[TICKETS])?;
    let status_id = req.status_id.to_string();

    let row = blocking(&state, move |s| s.db.set_ticket_status(&id, &status_id)).await?;
    ok("ticket", convert::ticket(row))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Id(id): Id,
) -> ApiResult {
    authorize(&me, &[TICKETS])?;
    let rows = blocking(&state, move |s| s.db.list_comments(&id)).await?;
    ok("comments", rows.into_iter().map(convert::comment).collect::<Vec<_>>())
}

pub async fn add_comment(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Id(id): Id,
    Body(req): Body<CreateCommentRequest>,
) -> ApiResult {
    authorize(&me, &[TICKETS])?;
    let body = req.body.trim().to_string();
    if body.is_empty() {
        return Err(ApiError::validation("comment body is required"));
    }

    let row = blocking(&state, move |s| s.db.add_comment(&id, &me.id, &body)).await?;
    created("comment", convert::comment(row))
}
