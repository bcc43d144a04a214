use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Returned when a stored or submitted string names no known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// -- Roles --

/// Workspace role. Closed on purpose: every guard matches exhaustively, so a
/// new role has to be considered everywhere a permission is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Supervisor,
    User,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Supervisor, Role::User];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Supervisor => "supervisor",
            Role::User => "user",
        }
    }

    /// Users, teams, conversations and ticket configuration.
    pub fn manages_workspace(self) -> bool {
        match self {
            Role::Admin => true,
            Role::Supervisor | Role::User => false,
        }
    }

    /// May be put in charge of a team.
    pub fn supervisor_capable(self) -> bool {
        match self {
            Role::Admin | Role::Supervisor => true,
            Role::User => false,
        }
    }

    /// Public answer sets and their answers.
    pub fn manages_shared_content(self) -> bool {
        match self {
            Role::Admin | Role::Supervisor => true,
            Role::User => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "supervisor" => Ok(Role::Supervisor),
            "user" => Ok(Role::User),
            other => Err(ParseEnumError::new("role", other)),
        }
    }
}

// -- Capabilities --

/// A functional area a user is allowed into, independent of role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Tickets,
    Messages,
    Broadcasts,
    Contacts,
    Answers,
    Reports,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::Tickets,
        Capability::Messages,
        Capability::Broadcasts,
        Capability::Contacts,
        Capability::Answers,
        Capability::Reports,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Tickets => "tickets",
            Capability::Messages => "messages",
            Capability::Broadcasts => "broadcasts",
            Capability::Contacts => "contacts",
            Capability::Answers => "answers",
            Capability::Reports => "reports",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tickets" => Ok(Capability::Tickets),
            "messages" => Ok(Capability::Messages),
            "broadcasts" => Ok(Capability::Broadcasts),
            "contacts" => Ok(Capability::Contacts),
            "answers" => Ok(Capability::Answers),
            "reports" => Ok(Capability::Reports),
            other => Err(ParseEnumError::new("capability", other)),
        }
    }
}

pub type CapabilitySet = BTreeSet<Capability>;

// -- Answer sets --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl FromStr for Visibility {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(ParseEnumError::new("visibility", other)),
        }
    }
}

// -- Ticket statuses --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    New,
    Open,
    Pending,
    Solved,
}

impl StatusCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusCategory::New => "new",
            StatusCategory::Open => "open",
            StatusCategory::Pending => "pending",
            StatusCategory::Solved => "solved",
        }
    }

    /// Solved statuses close a ticket and can never be handed out to new ones.
    pub fn can_be_default(self) -> bool {
        match self {
            StatusCategory::New | StatusCategory::Open | StatusCategory::Pending => true,
            StatusCategory::Solved => false,
        }
    }
}

impl FromStr for StatusCategory {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(StatusCategory::New),
            "open" => Ok(StatusCategory::Open),
            "pending" => Ok(StatusCategory::Pending),
            "solved" => Ok(StatusCategory::Solved),
            other => Err(ParseEnumError::new("status category", other)),
        }
    }
}

// -- Ticket fields --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Select,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Select => "select",
        }
    }
}

impl FromStr for FieldKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(FieldKind::Text),
            "number" => Ok(FieldKind::Number),
            "select" => Ok(FieldKind::Select),
            other => Err(ParseEnumError::new("field kind", other)),
        }
    }
}

// -- Resource views --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub capabilities: CapabilitySet,
    pub team_id: Option<Uuid>,
    pub supervisor: bool,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub supervisor_id: Option<Uuid>,
    pub default: bool,
    pub bot: bool,
    pub conversation_id: Option<Uuid>,
    pub answer_set_ids: Vec<Uuid>,
    /// Only filled in on single-team reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<User>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub id: Uuid,
    pub name: String,
    pub body: String,
    pub created_by: Uuid,
    pub answer_set_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSet {
    pub id: Uuid,
    pub name: String,
    pub visibility: Visibility,
    pub created_by: Uuid,
    pub answers: Vec<Answer>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub name: String,
    pub welcome_message: Option<String>,
    pub off_hours_message: Option<String>,
    pub team_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketStatus {
    pub id: Uuid,
    pub name: String,
    pub category: StatusCategory,
    pub active: bool,
    pub default: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketField {
    pub id: Uuid,
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub options: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub subject: String,
    pub description: String,
    pub status_id: Uuid,
    pub team_id: Option<Uuid>,
    pub created_by: Uuid,
    pub fields: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketComment {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_its_name() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn only_admins_manage_the_workspace() {
        assert!(Role::Admin.manages_workspace());
        assert!(!Role::Supervisor.manages_workspace());
        assert!(!Role::User.manages_workspace());
        assert!(Role::Supervisor.supervisor_capable());
        assert!(!Role::User.supervisor_capable());
    }

    #[test]
    fn solved_category_cannot_be_default() {
        assert!(!StatusCategory::Solved.can_be_default());
        assert!(StatusCategory::Open.can_be_default());
    }

    #[test]
    fn capabilities_serialize_as_snake_case() {
        let set: CapabilitySet = [Capability::Tickets, Capability::Answers].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["tickets","answers"]"#);
    }
}
