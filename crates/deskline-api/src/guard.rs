//! Authorization guard.
//!
//! [`require_session`] authenticates a request and leaves a [`SessionUser`]
//! in its extensions. Handlers then run their declared checks through
//! [`authorize`] before touching anything.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};

use deskline_db::Actor;
use deskline_db::models::UserRow;
use deskline_types::models::{Capability, CapabilitySet, Role};

use crate::error::ApiError;
use crate::identity;
use crate::state::{AppState, blocking};

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub capabilities: CapabilitySet,
}

impl SessionUser {
    pub fn actor(&self) -> Actor<'_> {
        Actor {
            id: &self.id,
            role: self.role,
        }
    }
}

impl From<UserRow> for SessionUser {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            name: row.name,
            role: row.role,
            capabilities: row.capabilities,
        }
    }
}

pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(ApiError::Unauthorized)?
        .token()
        .to_string();

    let user = blocking(&state, move |s| identity::validate_token(&s.db, &s.keys, &token)).await?;

    req.extensions_mut().insert(SessionUser::from(user));
    Ok(next.run(req).await)
}

/// One permission requirement.
#[derive(Debug, Clone, Copy)]
pub enum Check {
    Role(&'static [Role]),
    Capability(Capability),
    /// Passes when any inner check passes.
    AnyOf(&'static [Check]),
}

impl Check {
    fn passes(&self, user: &SessionUser) -> bool {
        match self {
            Check::Role(roles) => roles.contains(&user.role),
            Check::Capability(cap) => user.capabilities.contains(cap),
            Check::AnyOf(checks) => checks.iter().any(|c| c.passes(user)),
        }
    }
}

pub const ADMIN: Check = Check::Role(&[Role::Admin]);
pub const STAFF: Check = Check::Role(&[Role::Admin, Role::Supervisor]);
pub const ANSWERS: Check = Check::AnyOf(&[ADMIN, Check::Capability(Capability::Answers)]);
pub const TICKETS: Check = Check::Capability(Capability::Tickets);

/// Evaluates `checks` in order; the first failure ends the request.
pub fn authorize(user: &SessionUser, checks: &[Check]) -> Result<(), ApiError> {
    match checks.iter().find(|c| !c.passes(user)) {
        Some(_) => Err(ApiError::forbidden()),
        None => Ok(()),
    }
}

pub fn require_role(user: &SessionUser, allowed: &'static [Role]) -> Result<(), ApiError> {
    authorize(user, &[Check::Role(allowed)])
}

pub fn require_capability(user: &SessionUser, capability: Capability) -> Result<(), ApiError> {
    authorize(user, &[Check::Capability(capability)])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, caps: &[Capability]) -> SessionUser {
        SessionUser {
            id: "u".into(),
            email: "u@desk.test".into(),
            name: "U".into(),
            role,
            capabilities: caps.iter().copied().collect(),
        }
    }

    #[test]
    fn role_checks() {
        assert!(require_role(&user(Role::Admin, &[]), &[Role::Admin]).is_ok());
        assert!(matches!(
            require_role(&user(Role::Supervisor, &[]), &[Role::Admin]),
            Err(ApiError::Forbidden(_))
        ));
        assert!(authorize(&user(Role::Supervisor, &[]), &[STAFF]).is_ok());
    }

    #[test]
    fn capability_checks() {
        let agent = user(Role::User, &[Capability::Tickets]);
        assert!(require_capability(&agent, Capability::Tickets).is_ok());
        assert!(require_capability(&agent, Capability::Answers).is_err());
    }

    #[test]
    fn any_of_accepts_either_branch() {
        assert!(authorize(&user(Role::Admin, &[]), &[ANSWERS]).is_ok());
        assert!(authorize(&user(Role::User, &[Capability::Answers]), &[ANSWERS]).is_ok());
        assert!(authorize(&user(Role::Supervisor, &[]), &[ANSWERS]).is_err());
    }

    #[test]
    fn every_check_must_pass() {
        let sup = user(Role::Supervisor, &[Capability::Answers]);
        assert!(authorize(&sup, &[STAFF, ANSWERS]).is_ok());
        assert!(authorize(&sup, &[STAFF, TICKETS]).is_err());
        assert!(authorize(&sup, &[]).is_ok());
    }
}
