/// Request body validators
///
/// Shape checks for registration and login input, applied at the HTTP
/// boundary before the credential store is reached:
/// 1. Login: restricted character set and length
/// 2. Password: length bounded by bcrypt's 72-byte input limit
/// 3. Display name: length limits, no control characters

use regex::Regex;
use lazy_static::lazy_static;

use crate::error::ValidationError;

const MIN_LOGIN_LENGTH: usize = 3;
const MAX_LOGIN_LENGTH: usize = 32;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 72; // bcrypt only reads 72 bytes
const MAX_NAME_LENGTH: usize = 64;

lazy_static! {
    static ref LOGIN_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_.\-]+$").unwrap();
}

/// Validates a login for registration
pub fn is_valid_login(login: &str) -> Result<String, ValidationError> {
    let trimmed = login.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("login"));
    }

    if trimmed.chars().count() < MIN_LOGIN_LENGTH {
        return Err(ValidationError::TooShort("login", MIN_LOGIN_LENGTH));
    }

    if trimmed.chars().count() > MAX_LOGIN_LENGTH {
        return Err(ValidationError::TooLong("login", MAX_LOGIN_LENGTH));
    }

    if !LOGIN_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("login"));
    }

    Ok(trimmed.to_string())
}

/// Validates a new password
///
/// Passwords are never trimmed: whitespace is part of the secret.
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password"));
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort("password", MIN_PASSWORD_LENGTH));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("password", MAX_PASSWORD_LENGTH));
    }

    Ok(())
}

/// Validates a display name
pub fn is_valid_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("fullName"));
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong("fullName", MAX_NAME_LENGTH));
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent("fullName"));
    }

    Ok(trimmed.to_string())
}

/// Login requests only need both fields present
pub fn require_present(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}
