use std::str::FromStr;

use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::de::DeserializeOwned;

use crate::error::unique_as_conflict;
use crate::models::{
    AnswerRow, AnswerSetRow, CommentRow, ConversationPatch, ConversationRow, FieldRow, NewField,
    NewUser, StatusRow, TeamRow, TicketRow, UserRow,
};
use crate::{Database, DbError, Result, new_id};

// Back-references (team rosters, set contents, conversation teams) are never
// stored; they are read through the forward edge on the owned row.

const USER_SELECT: &str = "
    SELECT u.id, u.email, u.name, u.phone, u.password, u.role, u.capabilities, u.team_id,
           EXISTS(SELECT 1 FROM teams t WHERE t.supervisor_id = u.id),
           u.session_hash, u.credentials_changed_at, u.deleted, u.created_at
    FROM users u";

const TEAM_SELECT: &str = "
    SELECT t.id, t.name, t.supervisor_id, t.bot,
           COALESCE(t.id = (SELECT default_team_id FROM settings WHERE id = 1), 0),
           t.conversation_id,
           (SELECT GROUP_CONCAT(l.answer_set_id) FROM team_answer_sets l WHERE l.team_id = t.id),
           t.created_at
    FROM teams t";

const ANSWER_SET_SELECT: &str =
    "SELECT id, name, visibility, created_by, created_at FROM answer_sets";

const ANSWER_SELECT: &str =
    "SELECT id, name, body, created_by, answer_set_id, position, created_at FROM answers";

const CONVERSATION_SELECT: &str = "
    SELECT c.id, c.name, c.welcome_message, c.off_hours_message,
           (SELECT GROUP_CONCAT(t.id) FROM teams t WHERE t.conversation_id = c.id),
           c.created_at
    FROM conversations c";

const STATUS_SELECT: &str = "
    SELECT s.id, s.name, s.category, s.active,
           COALESCE(s.id = (SELECT default_status_id FROM settings WHERE id = 1), 0),
           s.created_at
    FROM ticket_statuses s";

const FIELD_SELECT: &str =
    "SELECT id, name, kind, required, options, created_at FROM ticket_fields";

const TICKET_SELECT: &str = "
    SELECT id, subject, description, status_id, team_id, created_by, fields, created_at, updated_at
    FROM tickets";

// -- Column helpers --

fn parse_text<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_json<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn split_ids(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let joined: Option<String> = row.get(idx)?;
    Ok(joined
        .map(|s| s.split(',').map(str::to_string).collect())
        .unwrap_or_default())
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        phone: row.get(3)?,
        password: row.get(4)?,
        role: parse_text(row, 5)?,
        capabilities: parse_json(row, 6)?,
        team_id: row.get(7)?,
        supervisor: row.get(8)?,
        session_hash: row.get(9)?,
        credentials_changed_at: row.get(10)?,
        deleted: row.get(11)?,
        created_at: row.get(12)?,
    })
}

fn map_team(row: &Row<'_>) -> rusqlite::Result<TeamRow> {
    Ok(TeamRow {
        id: row.get(0)?,
        name: row.get(1)?,
        supervisor_id: row.get(2)?,
        bot: row.get(3)?,
        is_default: row.get(4)?,
        conversation_id: row.get(5)?,
        answer_set_ids: split_ids(row, 6)?,
        created_at: row.get(7)?,
    })
}

fn map_answer_set(row: &Row<'_>) -> rusqlite::Result<AnswerSetRow> {
    Ok(AnswerSetRow {
        id: row.get(0)?,
        name: row.get(1)?,
        visibility: parse_text(row, 2)?,
        created_by: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_answer(row: &Row<'_>) -> rusqlite::Result<AnswerRow> {
    Ok(AnswerRow {
        id: row.get(0)?,
        name: row.get(1)?,
        body: row.get(2)?,
        created_by: row.get(3)?,
        answer_set_id: row.get(4)?,
        position: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn map_conversation(row: &Row<'_>) -> rusqlite::Result<ConversationRow> {
    Ok(ConversationRow {
        id: row.get(0)?,
        name: row.get(1)?,
        welcome_message: row.get(2)?,
        off_hours_message: row.get(3)?,
        team_ids: split_ids(row, 4)?,
        created_at: row.get(5)?,
    })
}

fn map_status(row: &Row<'_>) -> rusqlite::Result<StatusRow> {
    Ok(StatusRow {
        id: row.get(0)?,
        name: row.get(1)?,
        category: parse_text(row, 2)?,
        active: row.get(3)?,
        is_default: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn map_field(row: &Row<'_>) -> rusqlite::Result<FieldRow> {
    Ok(FieldRow {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: parse_text(row, 2)?,
        required: row.get(3)?,
        options: parse_json(row, 4)?,
        created_at: row.get(5)?,
    })
}

fn map_ticket(row: &Row<'_>) -> rusqlite::Result<TicketRow> {
    Ok(TicketRow {
        id: row.get(0)?,
        subject: row.get(1)?,
        description: row.get(2)?,
        status_id: row.get(3)?,
        team_id: row.get(4)?,
        created_by: row.get(5)?,
        fields: parse_json(row, 6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn map_comment(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        ticket_id: row.get(1)?,
        author_id: row.get(2)?,
        body: row.get(3)?,
        created_at: row.get(4)?,
    })
}

// -- Users --

pub(crate) fn user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let sql = format!("{USER_SELECT} WHERE u.id = ?1");
    Ok(conn.query_row(&sql, [id], map_user).optional()?)
}

/// Like [`user_by_id`] but treats soft-deleted users as absent.
pub(crate) fn live_user(conn: &Connection, id: &str) -> Result<UserRow> {
    match user_by_id(conn, id)? {
        Some(user) if !user.deleted => Ok(user),
        _ => Err(DbError::not_found(format!("user {id}"))),
    }
}

pub(crate) fn user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let sql = format!("{USER_SELECT} WHERE u.email = ?1");
    Ok(conn.query_row(&sql, [email], map_user).optional()?)
}

pub(crate) fn team_members(conn: &Connection, team_id: &str) -> Result<Vec<UserRow>> {
    let sql = format!("{USER_SELECT} WHERE u.team_id = ?1 AND u.deleted = 0 ORDER BY u.name");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([team_id], map_user)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub(crate) fn insert_user(conn: &Connection, user: &NewUser) -> Result<String> {
    let id = new_id();
    conn.execute(
        "INSERT INTO users (id, email, name, phone, password, role, capabilities)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id,
            user.email,
            user.name,
            user.phone,
            user.password_hash,
            user.role.as_str(),
            serde_json::to_string(&user.capabilities)?,
        ],
    )
    .map_err(unique_as_conflict("email is already registered"))?;
    Ok(id)
}

// -- Teams --

pub(crate) fn team_by_id(conn: &Connection, id: &str) -> Result<Option<TeamRow>> {
    let sql = format!("{TEAM_SELECT} WHERE t.id = ?1");
    Ok(conn.query_row(&sql, [id], map_team).optional()?)
}

pub(crate) fn require_team(conn: &Connection, id: &str) -> Result<TeamRow> {
    team_by_id(conn, id)?.ok_or_else(|| DbError::not_found(format!("team {id}")))
}

/// The team `user_id` supervises, if any.
pub(crate) fn team_supervised_by(conn: &Connection, user_id: &str) -> Result<Option<TeamRow>> {
    let sql = format!("{TEAM_SELECT} WHERE t.supervisor_id = ?1");
    Ok(conn.query_row(&sql, [user_id], map_team).optional()?)
}

pub(crate) fn team_name_taken(conn: &Connection, name: &str, except: Option<&str>) -> Result<bool> {
    let taken = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM teams WHERE name = ?1 AND id IS NOT ?2)",
        params![name, except],
        |r| r.get(0),
    )?;
    Ok(taken)
}

// -- Answer sets --

pub(crate) fn answer_set_by_id(conn: &Connection, id: &str) -> Result<Option<AnswerSetRow>> {
    let sql = format!("{ANSWER_SET_SELECT} WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], map_answer_set).optional()?)
}

pub(crate) fn require_answer_set(conn: &Connection, id: &str) -> Result<AnswerSetRow> {
    answer_set_by_id(conn, id)?.ok_or_else(|| DbError::not_found(format!("answer set {id}")))
}

pub(crate) fn private_answer_set_of(conn: &Connection, user_id: &str) -> Result<Option<AnswerSetRow>> {
    let sql = format!("{ANSWER_SET_SELECT} WHERE created_by = ?1 AND visibility = 'private'");
    Ok(conn.query_row(&sql, [user_id], map_answer_set).optional()?)
}

pub(crate) fn answers_in_set(conn: &Connection, set_id: &str) -> Result<Vec<AnswerRow>> {
    let sql = format!("{ANSWER_SELECT} WHERE answer_set_id = ?1 ORDER BY position");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([set_id], map_answer)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub(crate) fn answer_by_id(conn: &Connection, id: &str) -> Result<Option<AnswerRow>> {
    let sql = format!("{ANSWER_SELECT} WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], map_answer).optional()?)
}

// -- Conversations --

pub(crate) fn conversation_by_id(conn: &Connection, id: &str) -> Result<Option<ConversationRow>> {
    let sql = format!("{CONVERSATION_SELECT} WHERE c.id = ?1");
    Ok(conn.query_row(&sql, [id], map_conversation).optional()?)
}

pub(crate) fn require_conversation(conn: &Connection, id: &str) -> Result<ConversationRow> {
    conversation_by_id(conn, id)?.ok_or_else(|| DbError::not_found(format!("conversation {id}")))
}

// -- Ticketing --

pub(crate) fn status_by_id(conn: &Connection, id: &str) -> Result<Option<StatusRow>> {
    let sql = format!("{STATUS_SELECT} WHERE s.id = ?1");
    Ok(conn.query_row(&sql, [id], map_status).optional()?)
}

pub(crate) fn require_status(conn: &Connection, id: &str) -> Result<StatusRow> {
    status_by_id(conn, id)?.ok_or_else(|| DbError::not_found(format!("ticket status {id}")))
}

pub(crate) fn default_status_id(conn: &Connection) -> Result<Option<String>> {
    let id = conn.query_row(
        "SELECT default_status_id FROM settings WHERE id = 1",
        [],
        |r| r.get(0),
    )?;
    Ok(id)
}

pub(crate) fn list_fields(conn: &Connection) -> Result<Vec<FieldRow>> {
    let sql = format!("{FIELD_SELECT} ORDER BY name");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], map_field)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub(crate) fn ticket_by_id(conn: &Connection, id: &str) -> Result<Option<TicketRow>> {
    let sql = format!("{TICKET_SELECT} WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], map_ticket).optional()?)
}

pub(crate) fn require_ticket(conn: &Connection, id: &str) -> Result<TicketRow> {
    ticket_by_id(conn, id)?.ok_or_else(|| DbError::not_found(format!("ticket {id}")))
}

impl Database {
    // -- Users --

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| user_by_id(conn, id))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| user_by_email(conn, email))
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("{USER_SELECT} WHERE u.deleted = 0 ORDER BY u.name");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn create_user(&self, user: &NewUser) -> Result<UserRow> {
        self.transaction(|tx| {
            let id = insert_user(tx, user)?;
            live_user(tx, &id)
        })
    }

    /// Stores the hash of the current session secret. Replacing it is what
    /// logs out every other holder of an older token.
    pub fn set_session(&self, user_id: &str, session_hash: Option<&str>, issued_at: Option<i64>) -> Result<()> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET session_hash = ?2, session_issued_at = ?3 WHERE id = ?1",
                params![user_id, session_hash, issued_at],
            )?;
            if n == 0 {
                return Err(DbError::not_found(format!("user {user_id}")));
            }
            Ok(())
        })
    }

    pub fn set_password(&self, user_id: &str, password_hash: &str, changed_at: i64) -> Result<()> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET password = ?2, credentials_changed_at = ?3
                 WHERE id = ?1 AND deleted = 0",
                params![user_id, password_hash, changed_at],
            )?;
            if n == 0 {
                return Err(DbError::not_found(format!("user {user_id}")));
            }
            Ok(())
        })
    }

    /// Replaces any outstanding OTP for the user.
    pub fn set_otp(&self, user_id: &str, otp_hash: &str, expires_at: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET otp_hash = ?2, otp_expires_at = ?3 WHERE id = ?1",
                params![user_id, otp_hash, expires_at],
            )?;
            Ok(())
        })
    }

    /// Atomically consumes a matching, unexpired OTP. Returns false when the
    /// code is wrong, expired or was already used. An expired code is cleared.
    pub fn consume_otp(&self, user_id: &str, otp_hash: &str, now: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET otp_hash = NULL, otp_expires_at = NULL
                 WHERE id = ?1 AND otp_hash = ?2 AND otp_expires_at >= ?3 AND deleted = 0",
                params![user_id, otp_hash, now],
            )?;
            if n == 1 {
                return Ok(true);
            }
            conn.execute(
                "UPDATE users SET otp_hash = NULL, otp_expires_at = NULL
                 WHERE id = ?1 AND otp_expires_at < ?2",
                params![user_id, now],
            )?;
            Ok(false)
        })
    }

    /// Outstanding OTP hash and expiry, if any.
    pub fn get_otp(&self, user_id: &str) -> Result<Option<(String, i64)>> {
        self.with_conn(|conn| {
            let row = conn.query_row(
                "SELECT otp_hash, otp_expires_at FROM users WHERE id = ?1",
                [user_id],
                |r| Ok((r.get::<_, Option<String>>(0)?, r.get::<_, Option<i64>>(1)?)),
            )
            .optional()?;
            Ok(match row {
                Some((Some(hash), Some(expires))) => Some((hash, expires)),
                _ => None,
            })
        })
    }

    // -- Teams --

    pub fn get_team(&self, id: &str) -> Result<Option<TeamRow>> {
        self.with_conn(|conn| team_by_id(conn, id))
    }

    pub fn list_teams(&self) -> Result<Vec<TeamRow>> {
        self.with_conn(|conn| {
            let sql = format!("{TEAM_SELECT} ORDER BY t.name");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_team)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_team_members(&self, team_id: &str) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| team_members(conn, team_id))
    }

    // -- Answer sets --

    pub fn get_answer_set(&self, id: &str) -> Result<Option<(AnswerSetRow, Vec<AnswerRow>)>> {
        self.with_conn(|conn| {
            let Some(set) = answer_set_by_id(conn, id)? else {
                return Ok(None);
            };
            let answers = answers_in_set(conn, &set.id)?;
            Ok(Some((set, answers)))
        })
    }

    /// Public sets plus the caller's own private set.
    pub fn list_answer_sets_for(&self, user_id: &str) -> Result<Vec<(AnswerSetRow, Vec<AnswerRow>)>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{ANSWER_SET_SELECT} WHERE visibility = 'public' OR created_by = ?1 ORDER BY name"
            );
            let mut stmt = conn.prepare(&sql)?;
            let sets = stmt
                .query_map([user_id], map_answer_set)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut out = Vec::with_capacity(sets.len());
            for set in sets {
                let answers = answers_in_set(conn, &set.id)?;
                out.push((set, answers));
            }
            Ok(out)
        })
    }

    pub fn get_answer(&self, id: &str) -> Result<Option<AnswerRow>> {
        self.with_conn(|conn| answer_by_id(conn, id))
    }

    // -- Conversations --

    pub fn get_conversation(&self, id: &str) -> Result<Option<ConversationRow>> {
        self.with_conn(|conn| conversation_by_id(conn, id))
    }

    pub fn list_conversations(&self) -> Result<Vec<ConversationRow>> {
        self.with_conn(|conn| {
            let sql = format!("{CONVERSATION_SELECT} ORDER BY c.name");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_conversation)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn create_conversation(
        &self,
        name: &str,
        welcome_message: Option<&str>,
        off_hours_message: Option<&str>,
    ) -> Result<ConversationRow> {
        self.transaction(|tx| {
            let id = new_id();
            tx.execute(
                "INSERT INTO conversations (id, name, welcome_message, off_hours_message)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, name, welcome_message, off_hours_message],
            )
            .map_err(unique_as_conflict("conversation name is already taken"))?;
            require_conversation(tx, &id)
        })
    }

    pub fn update_conversation(&self, id: &str, patch: &ConversationPatch) -> Result<ConversationRow> {
        self.transaction(|tx| {
            let current = require_conversation(tx, id)?;
            let name = patch.name.as_deref().unwrap_or(&current.name);
            let welcome = match &patch.welcome_message {
                Some(v) => v.as_deref(),
                None => current.welcome_message.as_deref(),
            };
            let off_hours = match &patch.off_hours_message {
                Some(v) => v.as_deref(),
                None => current.off_hours_message.as_deref(),
            };
            tx.execute(
                "UPDATE conversations SET name = ?2, welcome_message = ?3, off_hours_message = ?4
                 WHERE id = ?1",
                params![id, name, welcome, off_hours],
            )
            .map_err(unique_as_conflict("conversation name is already taken"))?;
            require_conversation(tx, id)
        })
    }

    // -- Ticketing --

    pub fn get_status(&self, id: &str) -> Result<Option<StatusRow>> {
        self.with_conn(|conn| status_by_id(conn, id))
    }

    pub fn list_statuses(&self) -> Result<Vec<StatusRow>> {
        self.with_conn(|conn| {
            let sql = format!("{STATUS_SELECT} ORDER BY s.name");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_status)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_fields(&self) -> Result<Vec<FieldRow>> {
        self.with_conn(list_fields)
    }

    pub fn create_field(&self, field: &NewField) -> Result<FieldRow> {
        if field.name.trim().is_empty() {
            return Err(DbError::Validation("field name is required".into()));
        }
        self.transaction(|tx| {
            let id = new_id();
            tx.execute(
                "INSERT INTO ticket_fields (id, name, kind, required, options)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    id,
                    field.name,
                    field.kind.as_str(),
                    field.required,
                    serde_json::to_string(&field.options)?,
                ],
            )
            .map_err(unique_as_conflict("field name is already taken"))?;
            let sql = format!("{FIELD_SELECT} WHERE id = ?1");
            Ok(tx.query_row(&sql, [&id], map_field)?)
        })
    }

    pub fn delete_field(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM ticket_fields WHERE id = ?1", [id])?;
            if n == 0 {
                return Err(DbError::not_found(format!("ticket field {id}")));
            }
            Ok(())
        })
    }

    pub fn get_ticket(&self, id: &str) -> Result<Option<TicketRow>> {
        self.with_conn(|conn| ticket_by_id(conn, id))
    }

    pub fn list_tickets(&self) -> Result<Vec<TicketRow>> {
        self.with_conn(|conn| {
            let sql = format!("{TICKET_SELECT} ORDER BY created_at DESC, id");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_ticket)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn add_comment(&self, ticket_id: &str, author_id: &str, body: &str) -> Result<CommentRow> {
        self.transaction(|tx| {
            require_ticket(tx, ticket_id)?;
            let id = new_id();
            tx.execute(
                "INSERT INTO ticket_comments (id, ticket_id, author_id, body) VALUES (?1, ?2, ?3, ?4)",
                params![id, ticket_id, author_id, body],
            )?;
            tx.execute(
                "UPDATE tickets SET updated_at = datetime('now') WHERE id = ?1",
                [ticket_id],
            )?;
            Ok(tx.query_row(
                "SELECT id, ticket_id, author_id, body, created_at FROM ticket_comments WHERE id = ?1",
                [&id],
                map_comment,
            )?)
        })
    }

    pub fn list_comments(&self, ticket_id: &str) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            require_ticket(conn, ticket_id)?;
            let mut stmt = conn.prepare(
                "SELECT id, ticket_id, author_id, body, created_at FROM ticket_comments
                 WHERE ticket_id = ?1 ORDER BY created_at, rowid",
            )?;
            let rows = stmt
                .query_map([ticket_id], map_comment)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use deskline_types::models::{Capability, Role};

    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: email.to_string(),
            phone: None,
            password_hash: "hash".into(),
            role: Role::User,
            capabilities: [Capability::Tickets].into_iter().collect(),
        }
    }

    #[test]
    fn duplicate_email_is_a_conflict() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&new_user("a@desk.test")).unwrap();
        let err = db.create_user(&new_user("a@desk.test")).unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[test]
    fn user_row_round_trips_capabilities() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user(&new_user("b@desk.test")).unwrap();
        assert!(user.capabilities.contains(&Capability::Tickets));
        assert!(!user.supervisor);
        assert_eq!(user.credentials_changed_at, 0);
    }

    #[test]
    fn otp_is_consumed_exactly_once() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user(&new_user("c@desk.test")).unwrap();
        db.set_otp(&user.id, "h", 1_000).unwrap();

        assert!(db.consume_otp(&user.id, "h", 500).unwrap());
        assert!(!db.consume_otp(&user.id, "h", 500).unwrap());
    }

    #[test]
    fn expired_otp_is_rejected_and_cleared() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user(&new_user("d@desk.test")).unwrap();
        db.set_otp(&user.id, "h", 1_000).unwrap();

        assert!(!db.consume_otp(&user.id, "h", 1_001).unwrap());
        assert!(db.get_otp(&user.id).unwrap().is_none());
    }

    #[test]
    fn wrong_otp_leaves_the_code_in_place() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user(&new_user("e@desk.test")).unwrap();
        db.set_otp(&user.id, "h", 1_000).unwrap();

        assert!(!db.consume_otp(&user.id, "nope", 500).unwrap());
        assert!(db.consume_otp(&user.id, "h", 500).unwrap());
    }

    #[test]
    fn conversation_names_are_unique() {
        let db = Database::open_in_memory().unwrap();
        db.create_conversation("Support", None, None).unwrap();
        let err = db.create_conversation("Support", Some("hi"), None).unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }
}
