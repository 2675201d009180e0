// ============================
// crates/auth-lib/src/storage/memory.rs
// ============================
//! In-memory store.
//!
//! All state sits behind one `RwLock`; each trait operation takes the lock
//! once, so concurrent flows against the same account serialize at the store
//! and never lose an update. A `BTreeMap` keyed by `(expires_at, id)` keeps
//! expiry reaping proportional to the number of expired rows.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use tokio::sync::RwLock;

use super::{CredentialStore, SessionStore, StoreError, StoreState};
use crate::auth::lockout::{FailureState, LockoutPolicy};
use crate::models::{Account, AccountId, Session, SessionId};

#[derive(Default)]
struct Inner {
    accounts: HashMap<AccountId, Account>,
    by_username: HashMap<String, AccountId>,
    sessions: HashMap<String, Session>,
    by_expiry: BTreeMap<(DateTime<Utc>, SessionId), String>,
    next_account_id: AccountId,
    next_session_id: SessionId,
}

/// Store backed by process memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the full store contents.
    pub async fn export_state(&self) -> StoreState {
        let inner = self.inner.read().await;
        StoreState {
            accounts: inner.accounts.values().cloned().collect(),
            sessions: inner.sessions.values().cloned().collect(),
            next_account_id: inner.next_account_id,
            next_session_id: inner.next_session_id,
        }
    }

    /// Replace the store contents with a snapshot, rebuilding the indexes.
    pub async fn import_state(&self, state: StoreState) {
        let mut inner = self.inner.write().await;
        inner.accounts = state
            .accounts
            .into_iter()
            .map(|account| (account.id, account))
            .collect();
        inner.by_username = inner
            .accounts
            .values()
            .map(|account| (account.username.clone(), account.id))
            .collect();
        inner.by_expiry = state
            .sessions
            .iter()
            .map(|session| ((session.expires_at, session.id), session.token.clone()))
            .collect();
        inner.sessions = state
            .sessions
            .into_iter()
            .map(|session| (session.token.clone(), session))
            .collect();
        inner.next_account_id = state.next_account_id;
        inner.next_session_id = state.next_session_id;
        gauge!("auth_sessions_active").set(inner.sessions.len() as f64);
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn create_account(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<AccountId, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.by_username.contains_key(username) {
            return Err(StoreError::DuplicateUsername);
        }
        inner.next_account_id += 1;
        let id = inner.next_account_id;
        let account = Account {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            failed_attempts: 0,
            lock_until: None,
        };
        inner.by_username.insert(username.to_string(), id);
        inner.accounts.insert(id, account);
        counter!("auth_accounts_created").increment(1);
        Ok(id)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_username
            .get(username)
            .and_then(|id| inner.accounts.get(id))
            .cloned())
    }

    async fn record_failed_attempt(
        &self,
        id: AccountId,
        policy: &LockoutPolicy,
        now: DateTime<Utc>,
    ) -> Result<FailureState, StoreError> {
        let mut inner = self.inner.write().await;
        let account = inner
            .accounts
            .get_mut(&id)
            .ok_or(StoreError::AccountNotFound(id))?;
        let next = policy.after_failure(&account.failure_state(), now);
        account.failed_attempts = next.failed_attempts;
        account.lock_until = next.lock_until;
        if next.lock_until.is_some() {
            counter!("auth_lockouts").increment(1);
        }
        Ok(next)
    }

    async fn reset_failure_state(&self, id: AccountId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let account = inner
            .accounts
            .get_mut(&id)
            .ok_or(StoreError::AccountNotFound(id))?;
        account.failed_attempts = 0;
        account.lock_until = None;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(
        &self,
        user_id: AccountId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.sessions.contains_key(token) {
            return Err(StoreError::DuplicateToken);
        }
        inner.next_session_id += 1;
        let id = inner.next_session_id;
        inner.by_expiry.insert((expires_at, id), token.to_string());
        inner.sessions.insert(
            token.to_string(),
            Session {
                id,
                user_id,
                token: token.to_string(),
                expires_at,
            },
        );
        counter!("auth_sessions_created").increment(1);
        gauge!("auth_sessions_active").set(inner.sessions.len() as f64);
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.sessions.get(token).cloned())
    }

    async fn delete_by_token(&self, token: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(session) = inner.sessions.remove(token) {
            inner.by_expiry.remove(&(session.expires_at, session.id));
            gauge!("auth_sessions_active").set(inner.sessions.len() as f64);
        }
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut inner = self.inner.write().await;
        // keys strictly below (now, MIN) are exactly the rows with
        // expires_at < now
        let live = inner.by_expiry.split_off(&(now, SessionId::MIN));
        let expired = std::mem::replace(&mut inner.by_expiry, live);
        for token in expired.values() {
            inner.sessions.remove(token);
        }
        let removed = expired.len();
        if removed > 0 {
            counter!("auth_sessions_reaped").increment(removed as u64);
            gauge!("auth_sessions_active").set(inner.sessions.len() as f64);
        }
        Ok(removed)
    }
}
