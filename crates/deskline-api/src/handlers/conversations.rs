use axum::Extension;
use axum::extract::State;

use deskline_db::models::ConversationPatch;
use deskline_types::api::{CreateConversationRequest, UpdateConversationRequest};

use super::{ApiResult, Body, Id, created, done, ok};
use crate::convert;
use crate::guard::{ADMIN, SessionUser, authorize};
use crate::state::{AppState, blocking};
use crate::validate;

pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(_me): Extension<SessionUser>,
) -> ApiResult {
    let rows = blocking(&state, |s| s.db.list_conversations()).await?;
    ok(
        "conversations",
        rows.into_iter().map(convert::conversation).collect::<Vec<_>>(),
    )
}

pub async fn create_conversation(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Body(req): Body<CreateConversationRequest>,
) -> ApiResult {
    authorize(&me, &[ADMIN])?;
    let name = validate::name(&req.name, "conversation")?;

    let row = blocking(&state, move |s| {
        s.db.create_conversation(
            &name,
            req.welcome_message.as_deref(),
            req.off_hours_message.as_deref(),
        )
    })
    .await?;
    created("conversation", convert::conversation(row))
}

pub async fn update_conversation(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Id(id): Id,
    Body(req): Body<UpdateConversationRequest>,
) -> ApiResult {
    authorize(&me, &[ADMIN])?;
    let patch = ConversationPatch {
        name: validate::optional_name(req.name.as_deref(), "conversation")?,
        welcome_message: req.welcome_message,
        off_hours_message: req.off_hours_message,
    };

    let row = blocking(&state, move |s| s.db.update_conversation(&id, &patch)).await?;
    ok("conversation", convert::conversation(row))
}

/// Teams using the conversation are unlinked first.
pub async fn delete_conversation(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Id(id): Id,
) -> ApiResult {
    authorize(&me, &[ADMIN])?;
    blocking(&state, move |s| s.db.delete_conversation(&id)).await?;
    done()
}
