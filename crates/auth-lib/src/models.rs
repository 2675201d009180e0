// ================
// crates/auth-lib/src/models.rs
// ================
//! Persisted records and request/response contracts.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::lockout::FailureState;

pub type AccountId = i64;
pub type SessionId = i64;

/// A registered user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    /// Salted scrypt hash in PHC string format.
    pub password_hash: String,
    pub failed_attempts: u32,
    /// When set and in the future, login is refused regardless of credentials.
    pub lock_until: Option<DateTime<Utc>>,
}

impl Account {
    /// The lockout-relevant slice of this account.
    pub fn failure_state(&self) -> FailureState {
        FailureState {
            failed_attempts: self.failed_attempts,
            lock_until: self.lock_until,
        }
    }
}

/// An active session row. Valid strictly before `expires_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: AccountId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Registration request body. Fields are optional so a missing field is
/// reported as invalid input rather than a deserialization rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Login request body, same shape as registration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// The outcome of a successful login, handed to the HTTP layer for
/// cookie delivery.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub user_id: AccountId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
