use axum::Extension;
use axum::extract::State;
use serde_json::json;
use tracing::{info, warn};

use deskline_types::api::{
    ChangePasswordRequest, LoginRequest, LoginResponse, OtpRequest, OtpVerifyRequest,
};

use super::{ApiResult, Body, done, ok};
use crate::convert;
use crate::error::ApiError;
use crate::guard::SessionUser;
use crate::identity::{self, AuthError};
use crate::state::{AppState, blocking};
use crate::validate;

pub async fn health() -> ApiResult {
    ok("health", json!({ "status": "ok" }))
}

pub async fn login(State(state): State<AppState>, Body(req): Body<LoginRequest>) -> ApiResult {
    let email = validate::email(&req.email)?;

    let (token, user) = blocking(&state, move |s| {
        let user = identity::authenticate(&s.db, &email, &req.password)?;
        let token = identity::begin_session(&s.db, &s.keys, &user)?;
        Ok::<_, AuthError>((token, user))
    })
    .await?;

    info!(user = %user.id, "Login");
    ok(
        "session",
        LoginResponse {
            token,
            user: convert::user(user),
        },
    )
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
) -> ApiResult {
    blocking(&state, move |s| identity::invalidate_session(&s.db, &me.id)).await?;
    done()
}

pub async fn me(State(state): State<AppState>, Extension(me): Extension<SessionUser>) -> ApiResult {
    let user = blocking(&state, move |s| s.db.get_user_by_id(&me.id))
        .await?
        .ok_or(ApiError::Unauthorized)?;
    ok("user", convert::user(user))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(me): Extension<SessionUser>,
    Body(req): Body<ChangePasswordRequest>,
) -> ApiResult {
    validate::password(&req.new_password)?;

    let token = blocking(&state, move |s| {
        let user = s.db.get_user_by_id(&me.id)?.ok_or(AuthError::Unauthorized)?;
        identity::change_password(&s.db, &s.keys, &user, &req.current_password, &req.new_password)
    })
    .await?;

    ok("token", token)
}

/// Issues a login code and sends it to the user's phone. The response is the
/// same whether or not the email is known.
pub async fn request_otp(State(state): State<AppState>, Body(req): Body<OtpRequest>) -> ApiResult {
    let email = validate::email(&req.email)?;

    let issued = blocking(&state, move |s| {
        let Some(user) = s.db.get_user_by_email(&email)? else {
            return Ok::<_, AuthError>(None);
        };
        if user.deleted {
            return Ok(None);
        }
        let code = identity::issue_otp(&s.db, &user)?;
        Ok(Some((user, code)))
    })
    .await?;

    if let Some((user, code)) = issued {
        match user.phone.as_deref() {
            Some(phone) => {
                if let Err(e) = state
                    .gateway
                    .send_template_message(phone, &state.otp_template, &[code])
                    .await
                {
                    warn!(user = %user.id, error = %e, "OTP delivery failed");
                }
            }
            None => warn!(user = %user.id, "OTP requested for a user without a phone"),
        }
    }

    done()
}

pub async fn verify_otp(
    State(state): State<AppState>,
    Body(req): Body<OtpVerifyRequest>,
) -> ApiResult {
    let email = validate::email(&req.email)?;

    let (token, user) = blocking(&state, move |s| {
        let user = s.db.get_user_by_email(&email)?.ok_or(AuthError::InvalidOtp)?;
        if user.deleted {
            return Err(AuthError::AccountDeleted);
        }
        if !identity::verify_otp(&s.db, &user.id, req.code.trim())? {
            return Err(AuthError::InvalidOtp);
        }
        let token = identity::begin_session(&s.db, &s.keys, &user)?;
        Ok((token, user))
    })
    .await?;

    info!(user = %user.id, "Login with one-time code");
    ok(
        "session",
        LoginResponse {
            token,
            user: convert::user(user),
        },
    )
}
