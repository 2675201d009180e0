//! Core business logic for the authentication flows.
//!
//! `DefaultAuth` orchestrates the password policy, the lockout state machine
//! and the two stores. Expired sessions are reaped at the start of the login
//! and validation flows; there is no background sweep.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::auth::{lockout, password, token, AuthService, LockoutPolicy, PasswordPolicy};
use crate::config::Settings;
use crate::error::AppError;
use crate::models::{AccountId, IssuedSession, LoginRequest, RegisterRequest};
use crate::storage::{CredentialStore, SessionStore, StoreError};
use crate::validation;

pub struct DefaultAuth {
    credentials: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionStore>,
    password_policy: PasswordPolicy,
    lockout: LockoutPolicy,
    session_ttl: Duration,
}

impl DefaultAuth {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        password_policy: PasswordPolicy,
        lockout: LockoutPolicy,
        session_ttl: Duration,
    ) -> Self {
        Self {
            credentials,
            sessions,
            password_policy,
            lockout,
            session_ttl,
        }
    }

    pub fn from_settings(
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        settings: &Settings,
    ) -> Self {
        Self::new(
            credentials,
            sessions,
            settings.password_policy.clone(),
            settings.lockout.policy(),
            settings.session_ttl(),
        )
    }

    /// Purge expired sessions. A reap failure is logged but never blocks the
    /// triggering flow; validation re-checks expiry regardless.
    async fn reap_expired_sessions(&self, now: DateTime<Utc>) {
        match self.sessions.delete_expired(now).await {
            Ok(0) => {},
            Ok(removed) => info!(removed, "reaped expired sessions"),
            Err(err) => warn!(error = %err, "failed to reap expired sessions"),
        }
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn register(&self, req: RegisterRequest) -> Result<AccountId, AppError> {
        let (username, pw) =
            validation::require_credentials(req.username.as_deref(), req.password.as_deref())?;
        let username = validation::validate_username(username)?;

        if !password::is_strong(pw, &self.password_policy) {
            return Err(AppError::WeakPassword);
        }

        let mut plain = pw.to_string();
        let hash = password::hash_password_secure(&mut plain)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let id = self
            .credentials
            .create_account(username, &hash)
            .await
            .map_err(|err| match err {
                StoreError::DuplicateUsername => AppError::DuplicateUsername,
                other => AppError::Store(other),
            })?;

        info!(username, id, "account registered");
        Ok(id)
    }

    async fn login(&self, req: LoginRequest) -> Result<IssuedSession, AppError> {
        let now = Utc::now();
        self.reap_expired_sessions(now).await;

        let (username, pw) =
            validation::require_credentials(req.username.as_deref(), req.password.as_deref())?;

        // The external response never distinguishes an unknown username from
        // a wrong password; only these log lines do.
        let Some(account) = self.credentials.find_by_username(username).await? else {
            warn!(username, "login attempt for unknown username");
            return Err(AppError::InvalidCredentials);
        };

        if lockout::is_locked(&account.failure_state(), now) {
            warn!(username, "login attempt against locked account");
            return Err(AppError::AccountLocked);
        }

        if !password::verify_password(&account.password_hash, pw) {
            let state = self
                .credentials
                .record_failed_attempt(account.id, &self.lockout, now)
                .await?;
            if state.lock_until.is_some() {
                warn!(username, "account locked after repeated failures");
            } else {
                warn!(username, failed_attempts = state.failed_attempts, "failed login");
            }
            return Err(AppError::InvalidCredentials);
        }

        self.credentials.reset_failure_state(account.id).await?;

        let token = token::generate_session_token();
        let expires_at = now + self.session_ttl;
        self.sessions
            .create_session(account.id, &token, expires_at)
            .await?;

        info!(username, user_id = account.id, "login successful");
        Ok(IssuedSession {
            user_id: account.id,
            token,
            expires_at,
        })
    }

    async fn logout(&self, token: Option<&str>) -> Result<(), AppError> {
        let Some(token) = token else {
            return Err(AppError::NotLoggedIn);
        };
        self.sessions.delete_by_token(token).await?;
        Ok(())
    }

    async fn validate_session(&self, token: Option<&str>) -> Result<AccountId, AppError> {
        let now = Utc::now();
        self.reap_expired_sessions(now).await;

        let Some(token) = token else {
            return Err(AppError::Unauthorized);
        };

        let session = self
            .sessions
            .find_by_token(token)
            .await?
            .ok_or(AppError::InvalidSession)?;

        // the reaper runs first, but validity is still re-checked here
        if session.expires_at <= now {
            return Err(AppError::InvalidSession);
        }

        Ok(session.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::time::Duration as StdDuration;

    const GOOD_PASSWORD: &str = "Str0ng!Pass";

    fn auth_with(lockout: LockoutPolicy, session_ttl: Duration) -> DefaultAuth {
        let store = Arc::new(MemoryStore::new());
        DefaultAuth::new(
            store.clone(),
            store,
            PasswordPolicy::default(),
            lockout,
            session_ttl,
        )
    }

    fn default_auth() -> DefaultAuth {
        auth_with(LockoutPolicy::default(), Duration::days(1))
    }

    fn register_req(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        }
    }

    fn login_req(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_rejects_missing_fields() {
        let auth = default_auth();
        let err = auth
            .register(RegisterRequest {
                username: Some("alice".to_string()),
                password: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput));
    }

    #[tokio::test]
    async fn test_register_rejects_short_username() {
        let auth = default_auth();
        let err = auth.register(register_req("al", GOOD_PASSWORD)).await.unwrap_err();
        assert!(matches!(err, AppError::UsernameTooShort));
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password() {
        let auth = default_auth();
        let err = auth.register(register_req("alice", "weakpass")).await.unwrap_err();
        assert!(matches!(err, AppError::WeakPassword));
    }

    #[tokio::test]
    async fn test_register_trims_username() {
        let auth = default_auth();
        auth.register(register_req("  alice  ", GOOD_PASSWORD))
            .await
            .unwrap();
        assert!(auth.login(login_req("alice", GOOD_PASSWORD)).await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let auth = default_auth();
        auth.register(register_req("alice", GOOD_PASSWORD)).await.unwrap();
        let err = auth
            .register(register_req("alice", GOOD_PASSWORD))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateUsername));
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_registration_admits_one() {
        let auth = Arc::new(default_auth());
        let (a, b) = tokio::join!(
            {
                let auth = auth.clone();
                async move { auth.register(register_req("alice", GOOD_PASSWORD)).await }
            },
            {
                let auth = auth.clone();
                async move { auth.register(register_req("alice", GOOD_PASSWORD)).await }
            },
        );
        assert_eq!(
            a.is_ok() as u8 + b.is_ok() as u8,
            1,
            "exactly one concurrent registration must win"
        );
    }

    #[tokio::test]
    async fn test_login_unknown_user_is_invalid_credentials() {
        let auth = default_auth();
        let err = auth
            .login(login_req("nobody", GOOD_PASSWORD))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_success_issues_fresh_tokens() {
        let auth = default_auth();
        auth.register(register_req("alice", GOOD_PASSWORD)).await.unwrap();
        let first = auth.login(login_req("alice", GOOD_PASSWORD)).await.unwrap();
        let second = auth.login(login_req("alice", GOOD_PASSWORD)).await.unwrap();
        assert_ne!(first.token, second.token);
        assert_eq!(first.user_id, second.user_id);
    }

    #[tokio::test]
    async fn test_lockout_after_repeated_failures() {
        let store = Arc::new(MemoryStore::new());
        let auth = DefaultAuth::new(
            store.clone(),
            store.clone(),
            PasswordPolicy::default(),
            LockoutPolicy::default(),
            Duration::days(1),
        );
        auth.register(register_req("alice", GOOD_PASSWORD)).await.unwrap();

        for _ in 0..5 {
            let err = auth.login(login_req("alice", "Wr0ng!Pass")).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidCredentials));
        }

        // counter reads zero the moment the lock lands
        let account = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(account.failed_attempts, 0);
        assert!(account.lock_until.is_some());

        // sixth attempt fails even with the correct password
        let err = auth.login(login_req("alice", GOOD_PASSWORD)).await.unwrap_err();
        assert!(matches!(err, AppError::AccountLocked));
    }

    #[tokio::test]
    async fn test_login_after_cooldown_succeeds() {
        let store = Arc::new(MemoryStore::new());
        let auth = DefaultAuth::new(
            store.clone(),
            store.clone(),
            PasswordPolicy::default(),
            LockoutPolicy::new(5, Duration::milliseconds(50)),
            Duration::days(1),
        );
        auth.register(register_req("alice", GOOD_PASSWORD)).await.unwrap();

        for _ in 0..5 {
            auth.login(login_req("alice", "Wr0ng!Pass")).await.unwrap_err();
        }
        let err = auth.login(login_req("alice", GOOD_PASSWORD)).await.unwrap_err();
        assert!(matches!(err, AppError::AccountLocked));

        tokio::time::sleep(StdDuration::from_millis(100)).await;

        let issued = auth.login(login_req("alice", GOOD_PASSWORD)).await.unwrap();
        assert!(!issued.token.is_empty());

        let account = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(account.failed_attempts, 0);
        assert_eq!(account.lock_until, None);
    }

    #[tokio::test]
    async fn test_success_resets_failure_counter() {
        let store = Arc::new(MemoryStore::new());
        let auth = DefaultAuth::new(
            store.clone(),
            store.clone(),
            PasswordPolicy::default(),
            LockoutPolicy::default(),
            Duration::days(1),
        );
        auth.register(register_req("alice", GOOD_PASSWORD)).await.unwrap();

        for _ in 0..3 {
            auth.login(login_req("alice", "Wr0ng!Pass")).await.unwrap_err();
        }
        auth.login(login_req("alice", GOOD_PASSWORD)).await.unwrap();

        let account = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(account.failed_attempts, 0);
        assert_eq!(account.lock_until, None);
    }

    #[tokio::test]
    async fn test_validate_session_round_trip() {
        let auth = default_auth();
        auth.register(register_req("alice", GOOD_PASSWORD)).await.unwrap();
        let issued = auth.login(login_req("alice", GOOD_PASSWORD)).await.unwrap();

        let user_id = auth.validate_session(Some(&issued.token)).await.unwrap();
        assert_eq!(user_id, issued.user_id);
    }

    #[tokio::test]
    async fn test_validate_session_requires_token() {
        let auth = default_auth();
        let err = auth.validate_session(None).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[tokio::test]
    async fn test_validate_session_rejects_unknown_token() {
        let auth = default_auth();
        let err = auth.validate_session(Some("no-such-token")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidSession));
    }

    #[tokio::test]
    async fn test_expired_session_rejected_and_reaped() {
        let store = Arc::new(MemoryStore::new());
        let auth = DefaultAuth::new(
            store.clone(),
            store.clone(),
            PasswordPolicy::default(),
            LockoutPolicy::default(),
            Duration::milliseconds(50),
        );
        auth.register(register_req("alice", GOOD_PASSWORD)).await.unwrap();
        let issued = auth.login(login_req("alice", GOOD_PASSWORD)).await.unwrap();

        tokio::time::sleep(StdDuration::from_millis(100)).await;

        let err = auth.validate_session(Some(&issued.token)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidSession));

        // the validation flow reaped the row, not just rejected it
        assert!(store.find_by_token(&issued.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout_invalidates_session() {
        let auth = default_auth();
        auth.register(register_req("alice", GOOD_PASSWORD)).await.unwrap();
        let issued = auth.login(login_req("alice", GOOD_PASSWORD)).await.unwrap();

        auth.logout(Some(&issued.token)).await.unwrap();
        let err = auth.validate_session(Some(&issued.token)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidSession));
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let auth = default_auth();
        auth.logout(Some("never-issued")).await.unwrap();
    }

    #[tokio::test]
    async fn test_logout_without_token_fails() {
        let auth = default_auth();
        let err = auth.logout(None).await.unwrap_err();
        assert!(matches!(err, AppError::NotLoggedIn));
    }
}
