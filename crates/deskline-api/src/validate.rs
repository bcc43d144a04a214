//! Input checks applied before a request reaches the store.

use crate::error::ApiError;

pub const MIN_PASSWORD_LEN: usize = 8;
const MAX_NAME_LEN: usize = 120;

/// Trims and lowercases an email, rejecting anything without a plausible
/// `local@domain.tld` shape.
pub fn email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid || email.chars().any(char::is_whitespace) {
        return Err(ApiError::validation("invalid email address"));
    }
    Ok(email)
}

pub fn password(raw: &str) -> Result<(), ApiError> {
    if raw.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn name(raw: &str, what: &str) -> Result<String, ApiError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ApiError::validation(format!("{what} name is required")));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ApiError::validation(format!("{what} name is too long")));
    }
    Ok(name.to_string())
}

pub fn optional_name(raw: Option<&str>, what: &str) -> Result<Option<String>, ApiError> {
    raw.map(|n| name(n, what)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails() {
        assert_eq!(email("  Ana@Desk.Test ").unwrap(), "ana@desk.test");
        for bad in ["", "ana", "@desk.test", "ana@desk", "ana@@desk.test", "a na@desk.test", "ana@desk."] {
            assert!(email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn passwords() {
        assert!(password("1234567").is_err());
        assert!(password("12345678").is_ok());
    }

    #[test]
    fn names_are_trimmed() {
        assert_eq!(name("  Sales ", "team").unwrap(), "Sales");
        assert!(name("   ", "team").is_err());
        assert_eq!(optional_name(None, "team").unwrap(), None);
    }
}
