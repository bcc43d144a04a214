//! Database row types and write inputs.
//! Distinct from deskline-types API models to keep the DB layer independent.

use deskline_types::models::{CapabilitySet, FieldKind, Role, StatusCategory, Visibility};

// -- Rows --

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub password: String,
    pub role: Role,
    pub capabilities: CapabilitySet,
    pub team_id: Option<String>,
    /// Derived: whether some team names this user as its supervisor.
    pub supervisor: bool,
    pub session_hash: Option<String>,
    pub credentials_changed_at: i64,
    pub deleted: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct TeamRow {
    pub id: String,
    pub name: String,
    pub supervisor_id: Option<String>,
    pub bot: bool,
    /// Derived from the settings singleton.
    pub is_default: bool,
    pub conversation_id: Option<String>,
    pub answer_set_ids: Vec<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct AnswerSetRow {
    pub id: String,
    pub name: String,
    pub visibility: Visibility,
    pub created_by: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct AnswerRow {
    pub id: String,
    pub name: String,
    pub body: String,
    pub created_by: String,
    pub answer_set_id: String,
    pub position: i64,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct ConversationRow {
    pub id: String,
    pub name: String,
    pub welcome_message: Option<String>,
    pub off_hours_message: Option<String>,
    pub team_ids: Vec<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct StatusRow {
    pub id: String,
    pub name: String,
    pub category: StatusCategory,
    pub active: bool,
    pub is_default: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct FieldRow {
    pub id: String,
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub options: Vec<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct TicketRow {
    pub id: String,
    pub subject: String,
    pub description: String,
    pub status_id: String,
    pub team_id: Option<String>,
    pub created_by: String,
    pub fields: serde_json::Map<String, serde_json::Value>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct CommentRow {
    pub id: String,
    pub ticket_id: String,
    pub author_id: String,
    pub body: String,
    pub created_at: String,
}

// -- Inputs --

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub capabilities: CapabilitySet,
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub phone: Option<Option<String>>,
    pub role: Option<Role>,
    pub capabilities: Option<CapabilitySet>,
}

#[derive(Debug, Clone, Default)]
pub struct NewTeam {
    pub name: String,
    pub supervisor_id: Option<String>,
    pub users: Vec<String>,
    pub conversation_id: Option<String>,
    pub answer_set_ids: Vec<String>,
    pub bot: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TeamPatch {
    pub name: Option<String>,
    pub users: Option<Vec<String>>,
    pub conversation_id: Option<Option<String>>,
    pub answer_set_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct ConversationPatch {
    pub name: Option<String>,
    pub welcome_message: Option<Option<String>>,
    pub off_hours_message: Option<Option<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct StatusPatch {
    pub name: Option<String>,
    pub category: Option<StatusCategory>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewField {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub options: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewTicket {
    pub subject: String,
    pub description: String,
    pub team_id: Option<String>,
    pub created_by: String,
    pub fields: serde_json::Map<String, serde_json::Value>,
}
