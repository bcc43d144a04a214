//! Reference-integrity operations.
//!
//! Every operation here touches more than one row and is the only code path
//! allowed to change the edges between teams, users, answer sets, answers,
//! conversations and ticket statuses. Each one runs in a single transaction:
//! validation happens first and returns before anything is written, and any
//! later failure rolls the whole operation back.

use std::collections::BTreeSet;

use deskline_types::models::{FieldKind, Role, StatusCategory, Visibility};
use rusqlite::{Connection, params};
use tracing::info;

use crate::error::unique_as_conflict;
use crate::models::{
    AnswerRow, AnswerSetRow, NewTeam, NewTicket, StatusPatch, StatusRow, TeamPatch, TeamRow,
    TicketRow, UserPatch, UserRow,
};
use crate::queries::{
    answer_by_id, answers_in_set, default_status_id, list_fields, live_user,
    private_answer_set_of, require_answer_set, require_conversation, require_status, require_team,
    require_ticket, team_by_id, team_members, team_name_taken, team_supervised_by,
};
use crate::{Database, DbError, Result, new_id};

/// The user on whose behalf an ownership-checked write runs.
#[derive(Debug, Clone, Copy)]
pub struct Actor<'a> {
    pub id: &'a str,
    pub role: Role,
}

fn require_name(name: &str, what: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(DbError::Validation(format!("{what} name is required")));
    }
    Ok(())
}

fn dedup(ids: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    ids.iter().filter(|id| seen.insert(id.as_str())).cloned().collect()
}

fn default_team_id(conn: &Connection) -> Result<Option<String>> {
    let id = conn.query_row(
        "SELECT default_team_id FROM settings WHERE id = 1",
        [],
        |r| r.get(0),
    )?;
    Ok(id)
}

/// A user may join `team_id` unless they supervise some other team.
fn ensure_free_to_join(conn: &Connection, user: &UserRow, team_id: Option<&str>) -> Result<()> {
    if let Some(supervised) = team_supervised_by(conn, &user.id)? {
        if Some(supervised.id.as_str()) != team_id {
            return Err(DbError::conflict(format!(
                "user {} supervises team {}",
                user.email, supervised.name
            )));
        }
    }
    Ok(())
}

fn ensure_supervisor_candidate(conn: &Connection, user: &UserRow, team_id: Option<&str>) -> Result<()> {
    if !user.role.supervisor_capable() {
        return Err(DbError::invalid_state(format!(
            "user {} has role {} and cannot supervise a team",
            user.email, user.role
        )));
    }
    ensure_free_to_join(conn, user, team_id)
}

fn link_answer_sets(conn: &Connection, team_id: &str, set_ids: &[String]) -> Result<()> {
    conn.execute("DELETE FROM team_answer_sets WHERE team_id = ?1", [team_id])?;
    for set_id in dedup(set_ids) {
        require_answer_set(conn, &set_id)?;
        conn.execute(
            "INSERT INTO team_answer_sets (team_id, answer_set_id) VALUES (?1, ?2)",
            params![team_id, set_id],
        )?;
    }
    Ok(())
}

fn set_default_team_id(conn: &Connection, team_id: &str) -> Result<()> {
    conn.execute(
        "UPDATE settings SET default_team_id = ?1 WHERE id = 1",
        [team_id],
    )?;
    Ok(())
}

fn set_default_status_id(conn: &Connection, status_id: &str) -> Result<()> {
    conn.execute(
        "UPDATE settings SET default_status_id = ?1 WHERE id = 1",
        [status_id],
    )?;
    Ok(())
}

fn ensure_may_assign(
    conn: &Connection,
    actor: Actor<'_>,
    user: &UserRow,
    team_id: Option<&str>,
) -> Result<()> {
    if actor.role.manages_workspace() {
        return Ok(());
    }
    if user.role.manages_workspace() || user.supervisor {
        return Err(DbError::Forbidden(
            "only an administrator can move administrators or supervisors".into(),
        ));
    }
    let Some(own) = team_supervised_by(conn, actor.id)? else {
        return Err(DbError::Forbidden("you do not supervise a team".into()));
    };
    let current = user.team_id.as_deref();
    let allowed = match team_id {
        Some(target) => target == own.id && current.is_none_or(|t| t == own.id),
        None => current == Some(own.id.as_str()),
    };
    if !allowed {
        return Err(DbError::Forbidden(format!(
            "supervisors can only move users into or out of {}",
            own.name
        )));
    }
    Ok(())
}

/// Private sets are written only by their creator; public sets by roles that
/// manage shared content.
fn ensure_writable(set: &AnswerSetRow, actor: Actor<'_>) -> Result<()> {
    let allowed = match set.visibility {
        Visibility::Private => set.created_by == actor.id,
        Visibility::Public => actor.role.manages_shared_content(),
    };
    if !allowed {
        return Err(DbError::Forbidden(format!(
            "answer set {} is not writable by this user",
            set.name
        )));
    }
    Ok(())
}

fn validate_ticket_fields(
    conn: &Connection,
    values: &serde_json::Map<String, serde_json::Value>,
) -> Result<()> {
    let fields = list_fields(conn)?;

    for key in values.keys() {
        if !fields.iter().any(|f| &f.name == key) {
            return Err(DbError::Validation(format!("unknown ticket field {key}")));
        }
    }

    for field in &fields {
        let Some(value) = values.get(&field.name) else {
            if field.required {
                return Err(DbError::Validation(format!(
                    "ticket field {} is required",
                    field.name
                )));
            }
            continue;
        };
        let ok = match field.kind {
            FieldKind::Text => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Select => value
                .as_str()
                .is_some_and(|v| field.options.iter().any(|o| o == v)),
        };
        if !ok {
            return Err(DbError::Validation(format!(
                "invalid value for ticket field {}",
                field.name
            )));
        }
    }
    Ok(())
}

impl Database {
    // -- Teams --

    pub fn create_team(&self, input: &NewTeam) -> Result<TeamRow> {
        require_name(&input.name, "team")?;

        self.transaction(|tx| {
            if team_name_taken(tx, &input.name, None)? {
                return Err(DbError::conflict(format!("team name {} is taken", input.name)));
            }

            let supervisor = match &input.supervisor_id {
                Some(id) => {
                    let user = live_user(tx, id)?;
                    ensure_supervisor_candidate(tx, &user, None)?;
                    Some(user)
                }
                None => None,
            };

            let mut members = Vec::new();
            for id in dedup(&input.users) {
                let user = live_user(tx, &id)?;
                ensure_free_to_join(tx, &user, None)?;
                members.push(user);
            }

            if let Some(conversation_id) = &input.conversation_id {
                require_conversation(tx, conversation_id)?;
            }

            let id = new_id();
            tx.execute(
                "INSERT INTO teams (id, name, supervisor_id, bot, conversation_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    id,
                    input.name,
                    supervisor.as_ref().map(|u| u.id.as_str()),
                    input.bot,
                    input.conversation_id,
                ],
            )
            .map_err(unique_as_conflict("team name is taken"))?;

            for user in members.iter().chain(supervisor.iter()) {
                tx.execute("UPDATE users SET team_id = ?2 WHERE id = ?1", params![user.id, id])?;
            }

            link_answer_sets(tx, &id, &input.answer_set_ids)?;

            if !input.bot && default_team_id(tx)?.is_none() {
                set_default_team_id(tx, &id)?;
            }

            info!(team = %id, name = %input.name, "team created");
            require_team(tx, &id)
        })
    }

    pub fn update_team(&self, team_id: &str, patch: &TeamPatch) -> Result<TeamRow> {
        if let Some(name) = &patch.name {
            require_name(name, "team")?;
        }

        self.transaction(|tx| {
            let team = require_team(tx, team_id)?;

            if let Some(name) = &patch.name {
                if team_name_taken(tx, name, Some(team_id))? {
                    return Err(DbError::conflict(format!("team name {name} is taken")));
                }
            }

            let roster = match &patch.users {
                Some(_) if team.bot => {
                    return Err(DbError::invalid_state("the bot team roster cannot be edited"));
                }
                Some(ids) => {
                    let ids = dedup(ids);
                    if let Some(supervisor_id) = &team.supervisor_id {
                        if !ids.contains(supervisor_id) {
                            return Err(DbError::invalid_state(
                                "the team supervisor must stay on the roster",
                            ));
                        }
                    }
                    let mut users = Vec::with_capacity(ids.len());
                    for id in &ids {
                        let user = live_user(tx, id)?;
                        ensure_free_to_join(tx, &user, Some(team_id))?;
                        users.push(user);
                    }
                    Some(users)
                }
                None => None,
            };

            if let Some(Some(conversation_id)) = &patch.conversation_id {
                require_conversation(tx, conversation_id)?;
            }

            if let Some(name) = &patch.name {
                tx.execute("UPDATE teams SET name = ?2 WHERE id = ?1", params![team_id, name])
                    .map_err(unique_as_conflict("team name is taken"))?;
            }

            if let Some(users) = roster {
                let keep: BTreeSet<&str> = users.iter().map(|u| u.id.as_str()).collect();
                for member in team_members(tx, team_id)? {
                    if !keep.contains(member.id.as_str()) {
                        tx.execute("UPDATE users SET team_id = NULL WHERE id = ?1", [&member.id])?;
                    }
                }
                for user in &users {
                    tx.execute(
                        "UPDATE users SET team_id = ?2 WHERE id = ?1",
                        params![user.id, team_id],
                    )?;
                }
            }

            if let Some(conversation_id) = &patch.conversation_id {
                tx.execute(
                    "UPDATE teams SET conversation_id = ?2 WHERE id = ?1",
                    params![team_id, conversation_id],
                )?;
            }

            if let Some(set_ids) = &patch.answer_set_ids {
                link_answer_sets(tx, team_id, set_ids)?;
            }

            require_team(tx, team_id)
        })
    }

    /// Moves `user_id` into `team_id`, or out of any team when `None`.
    ///
    /// Leaving a team the user supervises also vacates the supervisor seat.
    /// Actors who do not manage the workspace may only move plain members
    /// into or out of the team they supervise.
    pub fn assign_user_to_team(
        &self,
        actor: Actor<'_>,
        user_id: &str,
        team_id: Option<&str>,
    ) -> Result<UserRow> {
        self.transaction(|tx| {
            let user = live_user(tx, user_id)?;
            ensure_may_assign(tx, actor, &user, team_id)?;

            match team_id {
                Some(team_id) => {
                    let team = require_team(tx, team_id)?;
                    if team.bot {
                        return Err(DbError::invalid_state("the bot team roster cannot be edited"));
                    }
                    ensure_free_to_join(tx, &user, Some(team_id))?;
                }
                None => {
                    tx.execute(
                        "UPDATE teams SET supervisor_id = NULL WHERE supervisor_id = ?1",
                        [user_id],
                    )?;
                }
            }

            tx.execute(
                "UPDATE users SET team_id = ?2 WHERE id = ?1",
                params![user_id, team_id],
            )?;
            live_user(tx, user_id)
        })
    }

    /// Puts `candidate_id` in charge of `team_id`, adding them to the roster
    /// if needed. The previous supervisor stays on as a plain member.
    pub fn set_team_supervisor(&self, team_id: &str, candidate_id: &str) -> Result<TeamRow> {
        self.transaction(|tx| {
            let team = require_team(tx, team_id)?;
            if team.bot {
                return Err(DbError::invalid_state("the bot team has no supervisor"));
            }

            let candidate = live_user(tx, candidate_id)?;
            ensure_supervisor_candidate(tx, &candidate, Some(team_id))?;

            if team.supervisor_id.as_deref() == Some(candidate_id) {
                return Ok(team);
            }

            tx.execute(
                "UPDATE teams SET supervisor_id = ?2 WHERE id = ?1",
                params![team_id, candidate_id],
            )?;
            tx.execute(
                "UPDATE users SET team_id = ?2 WHERE id = ?1",
                params![candidate_id, team_id],
            )?;

            info!(team = %team_id, supervisor = %candidate_id, "team supervisor changed");
            require_team(tx, team_id)
        })
    }

    /// Detaches every reference to the team, then deletes it.
    pub fn delete_team(&self, team_id: &str) -> Result<()> {
        self.transaction(|tx| {
            let team = require_team(tx, team_id)?;
            if team.is_default {
                return Err(DbError::invalid_state("the default team cannot be deleted"));
            }
            if team.bot {
                return Err(DbError::invalid_state("the bot team cannot be deleted"));
            }

            tx.execute("UPDATE users SET team_id = NULL WHERE team_id = ?1", [team_id])?;
            tx.execute(
                "UPDATE teams SET supervisor_id = NULL, conversation_id = NULL WHERE id = ?1",
                [team_id],
            )?;
            tx.execute("DELETE FROM team_answer_sets WHERE team_id = ?1", [team_id])?;
            tx.execute("UPDATE tickets SET team_id = NULL WHERE team_id = ?1", [team_id])?;
            tx.execute("DELETE FROM teams WHERE id = ?1", [team_id])?;

            info!(team = %team_id, name = %team.name, "team deleted");
            Ok(())
        })
    }

    pub fn set_default_team(&self, team_id: &str) -> Result<TeamRow> {
        self.transaction(|tx| {
            let team = require_team(tx, team_id)?;
            if team.bot {
                return Err(DbError::invalid_state("the bot team cannot be the default team"));
            }
            set_default_team_id(tx, team_id)?;
            require_team(tx, team_id)
        })
    }

    // -- Users --

    pub fn update_user(&self, user_id: &str, patch: &UserPatch) -> Result<UserRow> {
        if let Some(name) = &patch.name {
            require_name(name, "user")?;
        }

        self.transaction(|tx| {
            let user = live_user(tx, user_id)?;

            if let Some(role) = patch.role {
                if user.supervisor && !role.supervisor_capable() {
                    return Err(DbError::invalid_state(
                        "user supervises a team; assign another supervisor first",
                    ));
                }
            }

            let phone = match &patch.phone {
                Some(phone) => phone.as_deref(),
                None => user.phone.as_deref(),
            };
            let capabilities = patch.capabilities.as_ref().unwrap_or(&user.capabilities);

            tx.execute(
                "UPDATE users SET name = ?2, phone = ?3, role = ?4, capabilities = ?5 WHERE id = ?1",
                params![
                    user_id,
                    patch.name.as_deref().unwrap_or(&user.name),
                    phone,
                    patch.role.unwrap_or(user.role).as_str(),
                    serde_json::to_string(capabilities)?,
                ],
            )?;
            live_user(tx, user_id)
        })
    }

    /// Marks the user deleted and detaches them from their team, supervisor
    /// seat, session and pending OTP.
    pub fn soft_delete_user(&self, user_id: &str, requester_id: &str) -> Result<()> {
        if user_id == requester_id {
            return Err(DbError::invalid_state("you cannot delete your own account"));
        }

        self.transaction(|tx| {
            live_user(tx, user_id)?;
            tx.execute(
                "UPDATE teams SET supervisor_id = NULL WHERE supervisor_id = ?1",
                [user_id],
            )?;
            tx.execute(
                "UPDATE users SET team_id = NULL, session_hash = NULL, session_issued_at = NULL,
                                  otp_hash = NULL, otp_expires_at = NULL, deleted = 1
                 WHERE id = ?1",
                [user_id],
            )?;
            info!(user = %user_id, "user soft-deleted");
            Ok(())
        })
    }

    // -- Answer sets --

    pub fn create_answer_set(
        &self,
        actor: Actor<'_>,
        name: &str,
        visibility: Visibility,
    ) -> Result<AnswerSetRow> {
        require_name(name, "answer set")?;
        if visibility == Visibility::Public && !actor.role.manages_shared_content() {
            return Err(DbError::Forbidden(
                "public answer sets are managed by supervisors".into(),
            ));
        }

        self.transaction(|tx| {
            live_user(tx, actor.id)?;
            if visibility == Visibility::Private && private_answer_set_of(tx, actor.id)?.is_some() {
                return Err(DbError::conflict("user already has a private answer set"));
            }

            let id = new_id();
            tx.execute(
                "INSERT INTO answer_sets (id, name, visibility, created_by) VALUES (?1, ?2, ?3, ?4)",
                params![id, name, visibility.as_str(), actor.id],
            )
            .map_err(unique_as_conflict("user already has a private answer set"))?;
            require_answer_set(tx, &id)
        })
    }

    /// Public sets must be emptied first; a private set takes its answers with it.
    pub fn delete_answer_set(&self, set_id: &str, actor: Actor<'_>) -> Result<()> {
        self.transaction(|tx| {
            let set = require_answer_set(tx, set_id)?;
            ensure_writable(&set, actor)?;

            let answers = answers_in_set(tx, set_id)?;
            if set.visibility == Visibility::Public && !answers.is_empty() {
                return Err(DbError::invalid_state(format!(
                    "public answer set {} still holds {} answers",
                    set.name,
                    answers.len()
                )));
            }

            tx.execute("DELETE FROM team_answer_sets WHERE answer_set_id = ?1", [set_id])?;
            tx.execute("DELETE FROM answers WHERE answer_set_id = ?1", [set_id])?;
            tx.execute("DELETE FROM answer_sets WHERE id = ?1", [set_id])?;
            Ok(())
        })
    }

    pub fn create_answer(
        &self,
        set_id: &str,
        actor: Actor<'_>,
        name: &str,
        body: &str,
    ) -> Result<AnswerRow> {
        require_name(name, "answer")?;
        if body.trim().is_empty() {
            return Err(DbError::Validation("answer body is required".into()));
        }

        self.transaction(|tx| {
            let set = require_answer_set(tx, set_id)?;
            ensure_writable(&set, actor)?;

            let position: i64 = tx.query_row(
                "SELECT COALESCE(MAX(position) + 1, 0) FROM answers WHERE answer_set_id = ?1",
                [set_id],
                |r| r.get(0),
            )?;

            let id = new_id();
            tx.execute(
                "INSERT INTO answers (id, name, body, created_by, answer_set_id, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, name, body, actor.id, set_id, position],
            )
            .map_err(unique_as_conflict("answer name is taken"))?;

            answer_by_id(tx, &id)?.ok_or_else(|| DbError::not_found(format!("answer {id}")))
        })
    }

    pub fn update_answer(
        &self,
        answer_id: &str,
        actor: Actor<'_>,
        name: Option<&str>,
        body: Option<&str>,
    ) -> Result<AnswerRow> {
        if let Some(name) = name {
            require_name(name, "answer")?;
        }

        self.transaction(|tx| {
            let answer = answer_by_id(tx, answer_id)?
                .ok_or_else(|| DbError::not_found(format!("answer {answer_id}")))?;
            let set = require_answer_set(tx, &answer.answer_set_id)?;
            ensure_writable(&set, actor)?;

            tx.execute(
                "UPDATE answers SET name = ?2, body = ?3 WHERE id = ?1",
                params![
                    answer_id,
                    name.unwrap_or(&answer.name),
                    body.unwrap_or(&answer.body)
                ],
            )
            .map_err(unique_as_conflict("answer name is taken"))?;

            answer_by_id(tx, answer_id)?
                .ok_or_else(|| DbError::not_found(format!("answer {answer_id}")))
        })
    }

    /// Takes the answer out of its set's ordering and deletes it.
    pub fn delete_answer(&self, answer_id: &str, actor: Actor<'_>) -> Result<()> {
        self.transaction(|tx| {
            let answer = answer_by_id(tx, answer_id)?
                .ok_or_else(|| DbError::not_found(format!("answer {answer_id}")))?;
            let set = require_answer_set(tx, &answer.answer_set_id)?;
            ensure_writable(&set, actor)?;

            tx.execute("DELETE FROM answers WHERE id = ?1", [answer_id])?;
            tx.execute(
                "UPDATE answers SET position = position - 1
                 WHERE answer_set_id = ?1 AND position > ?2",
                params![answer.answer_set_id, answer.position],
            )?;
            Ok(())
        })
    }

    // -- Conversations --

    pub fn delete_conversation(&self, conversation_id: &str) -> Result<()> {
        self.transaction(|tx| {
            require_conversation(tx, conversation_id)?;
            tx.execute(
                "UPDATE teams SET conversation_id = NULL WHERE conversation_id = ?1",
                [conversation_id],
            )?;
            tx.execute("DELETE FROM conversations WHERE id = ?1", [conversation_id])?;
            Ok(())
        })
    }

    // -- Ticket statuses --

    /// The first status that may be default becomes default.
    pub fn create_status(&self, name: &str, category: StatusCategory) -> Result<StatusRow> {
        require_name(name, "status")?;

        self.transaction(|tx| {
            let id = new_id();
            tx.execute(
                "INSERT INTO ticket_statuses (id, name, category) VALUES (?1, ?2, ?3)",
                params![id, name, category.as_str()],
            )
            .map_err(unique_as_conflict("status name is taken"))?;

            if category.can_be_default() && default_status_id(tx)?.is_none() {
                set_default_status_id(tx, &id)?;
            }
            require_status(tx, &id)
        })
    }

    pub fn update_status(&self, status_id: &str, patch: &StatusPatch) -> Result<StatusRow> {
        if let Some(name) = &patch.name {
            require_name(name, "status")?;
        }

        self.transaction(|tx| {
            let status = require_status(tx, status_id)?;

            if status.is_default {
                if patch.active == Some(false) {
                    return Err(DbError::invalid_state("the default status cannot be deactivated"));
                }
                if patch.category.is_some_and(|c| !c.can_be_default()) {
                    return Err(DbError::invalid_state(
                        "the default status cannot move to the solved category",
                    ));
                }
            }

            tx.execute(
                "UPDATE ticket_statuses SET name = ?2, category = ?3, active = ?4 WHERE id = ?1",
                params![
                    status_id,
                    patch.name.as_deref().unwrap_or(&status.name),
                    patch.category.unwrap_or(status.category).as_str(),
                    patch.active.unwrap_or(status.active),
                ],
            )
            .map_err(unique_as_conflict("status name is taken"))?;
            require_status(tx, status_id)
        })
    }

    pub fn set_default_status(&self, status_id: &str) -> Result<StatusRow> {
        self.transaction(|tx| {
            let status = require_status(tx, status_id)?;
            if !status.category.can_be_default() {
                return Err(DbError::invalid_state(format!(
                    "status {} is in the solved category and cannot be default",
                    status.name
                )));
            }
            if !status.active {
                return Err(DbError::invalid_state(format!(
                    "status {} is inactive and cannot be default",
                    status.name
                )));
            }
            set_default_status_id(tx, status_id)?;
            require_status(tx, status_id)
        })
    }

    pub fn delete_status(&self, status_id: &str) -> Result<()> {
        self.transaction(|tx| {
            let status = require_status(tx, status_id)?;
            if status.is_default {
                return Err(DbError::invalid_state("the default status cannot be deleted"));
            }
            let in_use: i64 = tx.query_row(
                "SELECT COUNT(*) FROM tickets WHERE status_id = ?1",
                [status_id],
                |r| r.get(0),
            )?;
            if in_use > 0 {
                return Err(DbError::invalid_state(format!(
                    "status {} is used by {in_use} tickets",
                    status.name
                )));
            }
            tx.execute("DELETE FROM ticket_statuses WHERE id = ?1", [status_id])?;
            Ok(())
        })
    }

    // -- Tickets --

    /// New tickets start in the default status.
    pub fn create_ticket(&self, input: &NewTicket) -> Result<TicketRow> {
        if input.subject.trim().is_empty() {
            return Err(DbError::Validation("ticket subject is required".into()));
        }

        self.transaction(|tx| {
            let status_id = default_status_id(tx)?
                .ok_or_else(|| DbError::invalid_state("no default ticket status is configured"))?;
            if let Some(team_id) = &input.team_id {
                if team_by_id(tx, team_id)?.is_none() {
                    return Err(DbError::not_found(format!("team {team_id}")));
                }
            }
            validate_ticket_fields(tx, &input.fields)?;

            let id = new_id();
            tx.execute(
                "INSERT INTO tickets (id, subject, description, status_id, team_id, created_by, fields)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id,
                    input.subject,
                    input.description,
                    status_id,
                    input.team_id,
                    input.created_by,
                    serde_json::to_string(&input.fields)?,
                ],
            )?;
            require_ticket(tx, &id)
        })
    }

    pub fn set_ticket_status(&self, ticket_id: &str, status_id: &str) -> Result<TicketRow> {
        self.transaction(|tx| {
            require_ticket(tx, ticket_id)?;
            let status = require_status(tx, status_id)?;
            if !status.active {
                return Err(DbError::invalid_state(format!("status {} is inactive", status.name)));
            }
            tx.execute(
                "UPDATE tickets SET status_id = ?2, updated_at = datetime('now') WHERE id = ?1",
                params![ticket_id, status_id],
            )?;
            require_ticket(tx, ticket_id)
        })
    }
}
