use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id                      TEXT PRIMARY KEY,
                email                   TEXT NOT NULL UNIQUE,
                name                    TEXT NOT NULL,
                phone                   TEXT,
                password                TEXT NOT NULL,
                role                    TEXT NOT NULL,
                capabilities            TEXT NOT NULL DEFAULT '[]',
                team_id                 TEXT REFERENCES teams(id),
                session_hash            TEXT,
                session_issued_at       INTEGER,
                credentials_changed_at  INTEGER NOT NULL DEFAULT 0,
                otp_hash                TEXT,
                otp_expires_at          INTEGER,
                deleted                 INTEGER NOT NULL DEFAULT 0,
                created_at              TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_users_team ON users(team_id);

            CREATE TABLE conversations (
                id                  TEXT PRIMARY KEY,
                name                TEXT NOT NULL UNIQUE,
                welcome_message     TEXT,
                off_hours_message   TEXT,
                created_at          TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- supervisor_id is UNIQUE: one user supervises at most one team.
            CREATE TABLE teams (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL UNIQUE,
                supervisor_id   TEXT UNIQUE REFERENCES users(id),
                bot             INTEGER NOT NULL DEFAULT 0,
                conversation_id TEXT REFERENCES conversations(id),
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE answer_sets (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                visibility  TEXT NOT NULL,
                created_by  TEXT NOT NULL REFERENCES users(id),
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE UNIQUE INDEX idx_answer_sets_private_owner
                ON answer_sets(created_by) WHERE visibility = 'private';

            CREATE TABLE answers (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL UNIQUE,
                body            TEXT NOT NULL,
                created_by      TEXT NOT NULL REFERENCES users(id),
                answer_set_id   TEXT NOT NULL REFERENCES answer_sets(id),
                position        INTEGER NOT NULL,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_answers_set ON answers(answer_set_id, position);

            CREATE TABLE team_answer_sets (
                team_id         TEXT NOT NULL REFERENCES teams(id),
                answer_set_id   TEXT NOT NULL REFERENCES answer_sets(id),
                PRIMARY KEY (team_id, answer_set_id)
            );

            CREATE TABLE ticket_statuses (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL UNIQUE,
                category    TEXT NOT NULL,
                active      INTEGER NOT NULL DEFAULT 1,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE ticket_fields (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL UNIQUE,
                kind        TEXT NOT NULL,
                required    INTEGER NOT NULL DEFAULT 0,
                options     TEXT NOT NULL DEFAULT '[]',
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE tickets (
                id          TEXT PRIMARY KEY,
                subject     TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                status_id   TEXT NOT NULL REFERENCES ticket_statuses(id),
                team_id     TEXT REFERENCES teams(id),
                created_by  TEXT NOT NULL REFERENCES users(id),
                fields      TEXT NOT NULL DEFAULT '{}',
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_tickets_status ON tickets(status_id);

            CREATE TABLE ticket_comments (
                id          TEXT PRIMARY KEY,
                ticket_id   TEXT NOT NULL REFERENCES tickets(id) ON DELETE CASCADE,
                author_id   TEXT NOT NULL REFERENCES users(id),
                body        TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_comments_ticket ON ticket_comments(ticket_id, created_at);

            -- Singleton row holding the default team and default ticket status.
            CREATE TABLE settings (
                id                  INTEGER PRIMARY KEY CHECK (id = 1),
                default_team_id     TEXT REFERENCES teams(id),
                default_status_id   TEXT REFERENCES ticket_statuses(id)
            );

            INSERT INTO settings (id) VALUES (1);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
