// ============================
// crates/auth-lib/src/validation.rs
// ============================
//! Request input validation.

use thiserror::Error;

/// Minimum username length, counted after trimming
pub const MIN_USERNAME_LENGTH: usize = 3;

/// Possible validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("username and password are required")]
    MissingCredentials,

    #[error("username must be at least {MIN_USERNAME_LENGTH} characters")]
    UsernameTooShort,
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Require both credential fields to be present and non-empty.
pub fn require_credentials<'a>(
    username: Option<&'a str>,
    password: Option<&'a str>,
) -> ValidationResult<(&'a str, &'a str)> {
    match (username, password) {
        (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
            Ok((username, password))
        },
        _ => Err(ValidationError::MissingCredentials),
    }
}

/// Validate a username for registration. Returns the trimmed name, which is
/// what gets stored.
pub fn validate_username(raw: &str) -> ValidationResult<&str> {
    let username = raw.trim();
    if username.chars().count() < MIN_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooShort);
    }
    Ok(username)
}
