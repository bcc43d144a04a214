//! Row to response view conversion.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use deskline_db::models::{
    AnswerRow, AnswerSetRow, CommentRow, ConversationRow, FieldRow, StatusRow, TeamRow, TicketRow,
    UserRow,
};
use deskline_types::models::{
    Answer, AnswerSet, Conversation, Team, Ticket, TicketComment, TicketField, TicketStatus, User,
};

fn id(raw: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt id '{}': {}", raw, e);
        Uuid::default()
    })
}

fn opt_id(raw: &Option<String>) -> Option<Uuid> {
    raw.as_deref().map(id)
}

fn ids(raw: &[String]) -> Vec<Uuid> {
    raw.iter().map(|s| id(s)).collect()
}

/// Accepts RFC 3339 as well as SQLite's `YYYY-MM-DD HH:MM:SS` (UTC, no zone).
fn timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|t| t.and_utc()))
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

pub fn user(row: UserRow) -> User {
    User {
        id: id(&row.id),
        team_id: opt_id(&row.team_id),
        created_at: timestamp(&row.created_at),
        email: row.email,
        name: row.name,
        phone: row.phone,
        role: row.role,
        capabilities: row.capabilities,
        supervisor: row.supervisor,
        deleted: row.deleted,
    }
}

pub fn team(row: TeamRow, members: Option<Vec<UserRow>>) -> Team {
    Team {
        id: id(&row.id),
        supervisor_id: opt_id(&row.supervisor_id),
        conversation_id: opt_id(&row.conversation_id),
        answer_set_ids: ids(&row.answer_set_ids),
        created_at: timestamp(&row.created_at),
        name: row.name,
        default: row.is_default,
        bot: row.bot,
        users: members.map(|m| m.into_iter().map(user).collect()),
    }
}

pub fn answer(row: AnswerRow) -> Answer {
    Answer {
        id: id(&row.id),
        created_by: id(&row.created_by),
        answer_set_id: id(&row.answer_set_id),
        created_at: timestamp(&row.created_at),
        name: row.name,
        body: row.body,
    }
}

pub fn answer_set(row: AnswerSetRow, answers: Vec<AnswerRow>) -> AnswerSet {
    AnswerSet {
        id: id(&row.id),
        created_by: id(&row.created_by),
        created_at: timestamp(&row.created_at),
        name: row.name,
        visibility: row.visibility,
        answers: answers.into_iter().map(answer).collect(),
    }
}

pub fn conversation(row: ConversationRow) -> Conversation {
    Conversation {
        id: id(&row.id),
        team_ids: ids(&row.team_ids),
        created_at: timestamp(&row.created_at),
        name: row.name,
        welcome_message: row.welcome_message,
        off_hours_message: row.off_hours_message,
    }
}

pub fn status(row: StatusRow) -> TicketStatus {
    TicketStatus {
        id: id(&row.id),
        created_at: timestamp(&row.created_at),
        name: row.name,
        category: row.category,
        active: row.active,
        default: row.is_default,
    }
}

pub fn field(row: FieldRow) -> TicketField {
    TicketField {
        id: id(&row.id),
        created_at: timestamp(&row.created_at),
        name: row.name,
        kind: row.kind,
        required: row.required,
        options: row.options,
    }
}

pub fn ticket(row: TicketRow) -> Ticket {
    Ticket {
        id: id(&row.id),
        status_id: id(&row.status_id),
        team_id: opt_id(&row.team_id),
        created_by: id(&row.created_by),
        created_at: timestamp(&row.created_at),
        updated_at: timestamp(&row.updated_at),
        subject: row.subject,
        description: row.description,
        fields: row.fields,
    }
}

pub fn comment(row: CommentRow) -> TicketComment {
    TicketComment {
        id: id(&row.id),
        ticket_id: id(&row.ticket_id),
        author_id: id(&row.author_id),
        created_at: timestamp(&row.created_at),
        body: row.body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_timestamps_parse_as_utc() {
        let t = timestamp("2024-05-01 10:20:30");
        assert_eq!(t.to_rfc3339(), "2024-05-01T10:20:30+00:00");
    }

    #[test]
    fn corrupt_values_fall_back() {
        assert_eq!(id("not-a-uuid"), Uuid::default());
        assert_eq!(timestamp("yesterday"), DateTime::<Utc>::default());
    }
}
