use axum::Extension;
use axum::extract::State;

use deskline_types::api::{CreateAnswerRequest, CreateAnswerSetRequest, UpdateAnswerRequest};
use deskline_types::models::Visibility;

use super::{ApiResult, Body, Id, created, done, ok};
use crate::convert;
use crate::error::ApiError;
use crate::guard::{ANSWERS, SessionUser, authorize};
use crate::state::{AppState, blocking};
use crate::validate;

/// Public sets plus the caller's own private set.
pub async fn list_answer_sets(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
) -> ApiResult {
    authorize(&me, &[ANSWERS])?;
    let sets = blocking(&state, move |s| s.db.list_answer_sets_for(&me.id)).await?;
    ok(
        "answer_sets",
        sets.into_iter()
            .map(|(set, answers)| convert::answer_set(set, answers))
            .collect::<Vec<_>>(),
    )
}

pub async fn get_answer_set(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Id(id): Id,
) -> ApiResult {
    authorize(&me, &[ANSWERS])?;
    let (set, answers) = blocking(&state, move |s| s.db.get_answer_set(&id))
        .await?
        .ok_or_else(|| ApiError::NotFound("answer set".into()))?;

    // Someone else's private set is reported as absent.
    if set.visibility == Visibility::Private && set.created_by != me.id {
        return Err(ApiError::NotFound("answer set".into()));
    }
    ok("answer_set", convert::answer_set(set, answers))
}

pub async fn create_answer_set(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Body(req): Body<CreateAnswerSetRequest>,
) -> ApiResult {
    authorize(&me, &[ANSWERS])?;
    let name = validate::name(&req.name, "answer set")?;

    let set = blocking(&state, move |s| {
        s.db.create_answer_set(me.actor(), &name, req.visibility)
    })
    .await?;
    created("answer_set", convert::answer_set(set, Vec::new()))
}

pub async fn delete_answer_set(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Id(id): Id,
) -> ApiResult {
    authorize(&me, &[ANSWERS])?;
    blocking(&state, move |s| s.db.delete_answer_set(&id, me.actor())).await?;
    done()
}

pub async fn create_answer(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Id(set_id): Id,
    Body(req): Body<CreateAnswerRequest>,
) -> ApiResult {
    authorize(&me, &[ANSWERS])?;
    let name = validate::name(&req.name, "answer")?;

    let answer = blocking(&state, move |s| {
        s.db.create_answer(&set_id, me.actor(), &name, &req.body)
    })
    .await?;
    created("answer", convert::answer(answer))
}

pub async fn update_answer(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Id(id): Id,
    Body(req): Body<UpdateAnswerRequest>,
) -> ApiResult {
    authorize(&me, &[ANSWERS])?;
    let name = validate::optional_name(req.name.as_deref(), "answer")?;
    if req.body.as_deref().is_some_and(|b| b.trim().is_empty()) {
        return Err(ApiError::validation("answer body is required"));
    }

    let answer = blocking(&state, move |s| {
        s.db.update_answer(&id, me.actor(), name.as_deref(), req.body.as_deref())
    })
    .await?;
    ok("answer", convert::answer(answer))
}

pub async fn delete_answer(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Id(id): Id,
) -> ApiResult {
    authorize(&me, &[ANSWERS])?;
    blocking(&state, move |s| s.db.delete_answer(&id, me.actor())).await?;
    done()
}
