// ============================
// crates/auth-lib/src/storage/mod.rs
// ============================
//! Storage abstraction for accounts and sessions.
//!
//! Both stores are traits so the service is handed explicit store handles
//! instead of reaching for process-global connection state. Every multi-step
//! operation (check-then-insert, increment-then-maybe-lock) is atomic with
//! respect to the backing state.

pub mod memory;
pub mod persistent;

pub use memory::MemoryStore;
pub use persistent::FileBackedStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::lockout::{FailureState, LockoutPolicy};
use crate::models::{Account, AccountId, Session, SessionId};

/// Storage failures. Everything except the two duplicate variants surfaces
/// to callers as a generic internal failure.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("username already exists")]
    DuplicateUsername,

    #[error("session token already exists")]
    DuplicateToken,

    #[error("account {0} not found")]
    AccountNotFound(AccountId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("snapshot encryption failed")]
    Crypto,

    #[error("corrupt store snapshot: {0}")]
    Corrupt(String),
}

/// Durable table of accounts.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Create an account. The existence check and the insert are one atomic
    /// unit, so concurrent registrations of one username admit exactly one.
    async fn create_account(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<AccountId, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError>;

    /// Apply one failed attempt under the given policy and return the
    /// post-transition state. Increment and lock land in the same write.
    async fn record_failed_attempt(
        &self,
        id: AccountId,
        policy: &LockoutPolicy,
        now: DateTime<Utc>,
    ) -> Result<FailureState, StoreError>;

    /// Zero the failure counter and clear any lock.
    async fn reset_failure_state(&self, id: AccountId) -> Result<(), StoreError>;
}

/// Durable table of active sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a session row. Fails on a token collision to preserve the
    /// token-uniqueness invariant.
    async fn create_session(
        &self,
        user_id: AccountId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn find_by_token(&self, token: &str) -> Result<Option<Session>, StoreError>;

    /// Delete a session. Deleting a token that does not exist is not an error.
    async fn delete_by_token(&self, token: &str) -> Result<(), StoreError>;

    /// Remove every session with `expires_at < now` and return how many were
    /// removed. Cost is proportional to the expired rows, not the table.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;
}

/// Serializable image of the whole store, used by the snapshot backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreState {
    pub accounts: Vec<Account>,
    pub sessions: Vec<Session>,
    pub next_account_id: AccountId,
    pub next_session_id: SessionId,
}
