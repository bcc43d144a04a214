use deskline_types::models::{Role, StatusCategory};
use tracing::info;

use crate::models::{NewTeam, NewUser};
use crate::{Database, Result};

pub const DEFAULT_TEAM: &str = "General";
pub const BOT_TEAM: &str = "Bot";

const STATUSES: &[(&str, StatusCategory)] = &[
    ("Open", StatusCategory::Open),
    ("Solved", StatusCategory::Solved),
];

impl Database {
    /// Creates the baseline workspace on an empty database. Safe to call on
    /// every startup.
    pub fn seed_defaults(&self) -> Result<()> {
        let teams = self.list_teams()?;

        if !teams.iter().any(|t| t.name == DEFAULT_TEAM) {
            let team = self.create_team(&NewTeam {
                name: DEFAULT_TEAM.into(),
                ..Default::default()
            })?;
            if !team.is_default {
                self.set_default_team(&team.id)?;
            }
            info!("Seeded default team {DEFAULT_TEAM}");
        }

        if !teams.iter().any(|t| t.bot) {
            self.create_team(&NewTeam {
                name: BOT_TEAM.into(),
                bot: true,
                ..Default::default()
            })?;
            info!("Seeded bot team {BOT_TEAM}");
        }

        if self.list_statuses()?.is_empty() {
            for (name, category) in STATUSES {
                self.create_status(name, *category)?;
            }
            info!("Seeded ticket statuses");
        }

        Ok(())
    }

    /// Inserts the bootstrap admin unless the email is already registered.
    /// Returns whether a user was created.
    pub fn ensure_admin(&self, admin: &NewUser) -> Result<bool> {
        if self.get_user_by_email(&admin.email)?.is_some() {
            return Ok(false);
        }
        let admin = NewUser {
            role: Role::Admin,
            ..admin.clone()
        };
        let user = self.create_user(&admin)?;
        info!(user = %user.id, email = %user.email, "Seeded bootstrap admin");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeding_twice_is_a_no_op() {
        let db = Database::open_in_memory().unwrap();
        db.seed_defaults().unwrap();
        db.seed_defaults().unwrap();

        let teams = db.list_teams().unwrap();
        assert_eq!(teams.len(), 2);
        let general = teams.iter().find(|t| t.name == DEFAULT_TEAM).unwrap();
        assert!(general.is_default);
        assert!(teams.iter().any(|t| t.bot && !t.is_default));

        let statuses = db.list_statuses().unwrap();
        assert_eq!(statuses.len(), 2);
        let open = statuses.iter().find(|s| s.name == "Open").unwrap();
        assert!(open.is_default);
    }

    #[test]
    fn admin_is_created_once() {
        let db = Database::open_in_memory().unwrap();
        let admin = NewUser {
            email: "root@desk.test".into(),
            name: "Root".into(),
            phone: None,
            password_hash: "hash".into(),
            role: Role::User,
            capabilities: Default::default(),
        };
        assert!(db.ensure_admin(&admin).unwrap());
        assert!(!db.ensure_admin(&admin).unwrap());

        let user = db.get_user_by_email("root@desk.test").unwrap().unwrap();
        assert_eq!(user.role, Role::Admin);
    }
}
