use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::models::{CapabilitySet, FieldKind, Role, StatusCategory, User, Visibility};

// -- Session token claims --

/// Claims carried by a session token. `sid` is the per-login secret whose
/// hash is kept on the user; a newer login replaces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub sid: String,
    pub iat_ms: i64,
    pub exp: usize,
}

// -- Envelope --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeStatus {
    Success,
    Fail,
}

/// Every response body: `{"status": "success", "data": {...}}` or
/// `{"status": "fail", "message": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: EnvelopeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: EnvelopeStatus::Success,
            data: Some(data),
            message: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: EnvelopeStatus::Fail,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Lets a PATCH body tell "absent" (`None`) apart from "set to null"
/// (`Some(None)`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OtpRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OtpVerifyRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub capabilities: CapabilitySet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,
    pub role: Option<Role>,
    pub capabilities: Option<CapabilitySet>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssignTeamRequest {
    pub team_id: Option<Uuid>,
}

// -- Teams --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTeamRequest {
    pub name: String,
    #[serde(default)]
    pub supervisor_id: Option<Uuid>,
    #[serde(default)]
    pub users: Vec<Uuid>,
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
    #[serde(default)]
    pub answer_set_ids: Vec<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTeamRequest {
    pub name: Option<String>,
    pub users: Option<Vec<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    pub conversation_id: Option<Option<Uuid>>,
    pub answer_set_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetSupervisorRequest {
    pub user_id: Uuid,
}

// -- Answers --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateAnswerSetRequest {
    pub name: String,
    pub visibility: Visibility,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateAnswerRequest {
    pub name: String,
    pub body: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateAnswerRequest {
    pub name: Option<String>,
    pub body: Option<String>,
}

// -- Conversations --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateConversationRequest {
    pub name: String,
    #[serde(default)]
    pub welcome_message: Option<String>,
    #[serde(default)]
    pub off_hours_message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateConversationRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub welcome_message: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub off_hours_message: Option<Option<String>>,
}

// -- Ticketing --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateStatusRequest {
    pub name: String,
    pub category: StatusCategory,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateStatusRequest {
    pub name: Option<String>,
    pub category: Option<StatusCategory>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateFieldRequest {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTicketRequest {
    pub subject: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub team_id: Option<Uuid>,
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetTicketStatusRequest {
    pub status_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let absent: UpdateTeamRequest = serde_json::from_str(r#"{"name":"Sales"}"#).unwrap();
        assert!(absent.conversation_id.is_none());

        let cleared: UpdateTeamRequest =
            serde_json::from_str(r#"{"conversation_id":null}"#).unwrap();
        assert_eq!(cleared.conversation_id, Some(None));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let res = serde_json::from_str::<UpdateUserRequest>(r#"{"deleted":true}"#);
        assert!(res.is_err());
    }

    #[test]
    fn fail_envelope_omits_data() {
        let body = serde_json::to_value(Envelope::<()>::fail("nope")).unwrap();
        assert_eq!(body, serde_json::json!({"status": "fail", "message": "nope"}));
    }
}
