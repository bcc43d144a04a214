//! Identity and session store.
//!
//! Credentials are Argon2id hashes. A session token is an HS256 JWT whose
//! `sid` claim is a random per-login secret; only its SHA-256 is kept on the
//! user, so beginning a new session silently invalidates the previous token.
//! OTP codes are stored hashed the same way and consumed by a conditional
//! update.
//!
//! Everything here is blocking and is meant to run on the blocking pool.

use std::sync::LazyLock;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::Rng;
use rand_core::OsRng;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use deskline_db::models::UserRow;
use deskline_db::{Database, DbError, now_ms};
use deskline_types::api::Claims;

const OTP_TTL_MS: i64 = 120_000;

/// Verified against when an email is unknown so a miss costs the same as a
/// wrong password.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("deskline-unknown-account").ok());

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("account deleted")]
    AccountDeleted,

    #[error("credentials changed since this session began")]
    CredentialsChanged,

    #[error("invalid or expired code")]
    InvalidOtp,

    #[error("password hashing failed")]
    Hash,

    #[error("token encoding failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Db(#[from] DbError),
}

pub type Result<T> = std::result::Result<T, AuthError>;

fn sha256_hex(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|_| AuthError::Hash)
}

fn verify_password(hash: &str, password: &str) -> Result<()> {
    let parsed = PasswordHash::new(hash).map_err(|_| AuthError::Hash)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::Unauthorized)
}

/// Signing keys and token lifetime for sessions.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

/// Checks an email/password pair. The password is verified before the
/// deleted flag so a deleted account is only revealed to its owner.
pub fn authenticate(db: &Database, email: &str, password: &str) -> Result<UserRow> {
    let Some(user) = db.get_user_by_email(email)? else {
        if let Some(dummy) = DUMMY_HASH.as_deref() {
            let _ = verify_password(dummy, password);
        }
        return Err(AuthError::Unauthorized);
    };
    verify_password(&user.password, password)?;
    if user.deleted {
        return Err(AuthError::AccountDeleted);
    }
    Ok(user)
}

/// Issues a token for `user`, replacing whatever session they had.
pub fn begin_session(db: &Database, keys: &SessionKeys, user: &UserRow) -> Result<String> {
    let sub: Uuid = user.id.parse().map_err(|_| AuthError::Unauthorized)?;

    let mut secret = [0u8; 32];
    rand::rng().fill(&mut secret);
    let sid = hex::encode(secret);

    let now = Utc::now();
    let claims = Claims {
        sub,
        sid,
        iat_ms: now.timestamp_millis(),
        exp: (now + keys.ttl).timestamp() as usize,
    };
    let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)?;

    db.set_session(&user.id, Some(&sha256_hex(&claims.sid)), Some(claims.iat_ms))?;
    info!(user = %user.id, "Session started");
    Ok(token)
}

pub fn validate_token(db: &Database, keys: &SessionKeys, token: &str) -> Result<UserRow> {
    let claims = decode::<Claims>(token, &keys.decoding, &Validation::new(Algorithm::HS256))
        .map_err(|_| AuthError::Unauthorized)?
        .claims;

    let user = db
        .get_user_by_id(&claims.sub.to_string())?
        .ok_or(AuthError::Unauthorized)?;

    if user.deleted {
        return Err(AuthError::AccountDeleted);
    }
    if claims.iat_ms < user.credentials_changed_at {
        return Err(AuthError::CredentialsChanged);
    }
    if user.session_hash.as_deref() != Some(sha256_hex(&claims.sid).as_str()) {
        return Err(AuthError::Unauthorized);
    }
    Ok(user)
}

pub fn invalidate_session(db: &Database, user_id: &str) -> Result<()> {
    db.set_session(user_id, None, None)?;
    info!(user = %user_id, "Session ended");
    Ok(())
}

/// Self-service change. Every existing token stops working and a fresh one
/// is returned.
pub fn change_password(
    db: &Database,
    keys: &SessionKeys,
    user: &UserRow,
    current: &str,
    new: &str,
) -> Result<String> {
    verify_password(&user.password, current)?;
    db.set_password(&user.id, &hash_password(new)?, now_ms())?;
    begin_session(db, keys, user)
}

/// Administrative reset; the user's outstanding tokens are rejected as stale.
pub fn reset_password(db: &Database, user_id: &str, new: &str) -> Result<()> {
    db.set_password(user_id, &hash_password(new)?, now_ms())?;
    info!(user = %user_id, "Password reset");
    Ok(())
}

/// Generates a fresh 6-digit code, replacing any pending one, and returns it
/// for delivery.
pub fn issue_otp(db: &Database, user: &UserRow) -> Result<String> {
    let code = format!("{:06}", rand::rng().random_range(0..1_000_000u32));
    db.set_otp(&user.id, &sha256_hex(&code), now_ms() + OTP_TTL_MS)?;
    Ok(code)
}

/// Consumes the code if it matches and has not expired. A code can succeed
/// only once.
pub fn verify_otp(db: &Database, user_id: &str, code: &str) -> Result<bool> {
    Ok(db.consume_otp(user_id, &sha256_hex(code), now_ms())?)
}
