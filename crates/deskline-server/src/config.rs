use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use deskline_api::messaging::WhatsAppConfig;

/// Secrets shipped in sample configs. Starting with one of these would make
/// every session token forgeable.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me",
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "secret",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DESK_JWT_SECRET is unset or still a placeholder")]
    WeakSecret,

    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("DESK_ADMIN_EMAIL and DESK_ADMIN_PASSWORD must be set together")]
    PartialAdmin,
}

#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub session_ttl: chrono::Duration,
    pub request_timeout: Duration,
    pub admin: Option<AdminSeed>,
    pub whatsapp: Option<WhatsAppConfig>,
    pub otp_template: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| vars.get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = get("DESK_JWT_SECRET").ok_or(ConfigError::WeakSecret)?;
        if PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            return Err(ConfigError::WeakSecret);
        }

        let admin = match (get("DESK_ADMIN_EMAIL"), get("DESK_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed { email, password }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialAdmin),
        };

        let whatsapp = match (get("WHATSAPP_TOKEN"), get("WHATSAPP_PHONE_NUMBER_ID")) {
            (Some(token), Some(phone_number_id)) => Some(WhatsAppConfig {
                api_base: or("WHATSAPP_API_BASE", "https://graph.facebook.com/v19.0"),
                token,
                phone_number_id,
                language: or("WHATSAPP_LANGUAGE", "en"),
            }),
            _ => None,
        };

        let ttl_hours: i64 = parse("DESK_SESSION_TTL_HOURS", &or("DESK_SESSION_TTL_HOURS", "720"))?;
        let timeout_secs: u64 =
            parse("DESK_REQUEST_TIMEOUT_SECS", &or("DESK_REQUEST_TIMEOUT_SECS", "30"))?;

        Ok(Self {
            jwt_secret,
            db_path: PathBuf::from(or("DESK_DB_PATH", "deskline.db")),
            host: or("DESK_HOST", "0.0.0.0"),
            port: parse("DESK_PORT", &or("DESK_PORT", "3000"))?,
            session_ttl: chrono::Duration::hours(ttl_hours),
            request_timeout: Duration::from_secs(timeout_secs),
            admin,
            whatsapp,
            otp_template: or("WHATSAPP_OTP_TEMPLATE", "otp_code"),
        })
    }
}

fn parse<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply() {
        let cfg = Config::from_vars(vars(&[("DESK_JWT_SECRET", "s3cr3t-value")])).unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.session_ttl, chrono::Duration::hours(720));
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
        assert_eq!(cfg.otp_template, "otp_code");
        assert!(cfg.admin.is_none());
        assert!(cfg.whatsapp.is_none());
    }

    #[test]
    fn placeholder_secrets_are_refused() {
        assert!(matches!(
            Config::from_vars(vars(&[])),
            Err(ConfigError::WeakSecret)
        ));
        assert!(matches!(
            Config::from_vars(vars(&[("DESK_JWT_SECRET", "dev-secret-change-me")])),
            Err(ConfigError::WeakSecret)
        ));
    }

    #[test]
    fn bad_numbers_are_startup_errors() {
        let res = Config::from_vars(vars(&[
            ("DESK_JWT_SECRET", "s3cr3t-value"),
            ("DESK_PORT", "eighty"),
        ]));
        assert!(matches!(res, Err(ConfigError::Invalid { key: "DESK_PORT", .. })));
    }

    #[test]
    fn whatsapp_needs_token_and_number() {
        let cfg = Config::from_vars(vars(&[
            ("DESK_JWT_SECRET", "s3cr3t-value"),
            ("WHATSAPP_TOKEN", "tok"),
        ]))
        .unwrap();
        assert!(cfg.whatsapp.is_none());

        let cfg = Config::from_vars(vars(&[
            ("DESK_JWT_SECRET", "s3cr3t-value"),
            ("WHATSAPP_TOKEN", "tok"),
            ("WHATSAPP_PHONE_NUMBER_ID", "1234"),
            ("WHATSAPP_LANGUAGE", "es"),
        ]))
        .unwrap();
        let wa = cfg.whatsapp.unwrap();
        assert_eq!(wa.language, "es");
        assert_eq!(wa.api_base, "https://graph.facebook.com/v19.0");
    }

    #[test]
    fn admin_seed_is_all_or_nothing() {
        let res = Config::from_vars(vars(&[
            ("DESK_JWT_SECRET", "s3cr3t-value"),
            ("DESK_ADMIN_EMAIL", "root@desk.test"),
        ]));
        assert!(matches!(res, Err(ConfigError::PartialAdmin)));
    }
}
