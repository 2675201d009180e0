// ============================
// crates/auth-lib/src/lib.rs
// ============================
//! Credential and session authentication service.
//!
//! Registers accounts under a password policy, authenticates logins with
//! brute-force lockout, issues and invalidates opaque session tokens, and
//! reaps expired sessions opportunistically.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod router;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use crate::auth::{AuthService, DefaultAuth};
use crate::config::Settings;
use crate::storage::{CredentialStore, FileBackedStore, SessionStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Settings
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create application state over explicit store handles. The stores are
    /// constructed once at process start and injected here; nothing in the
    /// service reaches for global connection state.
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        settings: Settings,
    ) -> Self {
        let auth = Arc::new(DefaultAuth::from_settings(credentials, sessions, &settings));
        Self {
            auth,
            settings: Arc::new(settings),
        }
    }

    /// Open the file-backed store under the configured data directory and
    /// build state on top of it.
    pub async fn open(settings: Settings) -> anyhow::Result<Self> {
        let store = Arc::new(FileBackedStore::open(&settings.data_dir).await?);
        Ok(Self::new(store.clone(), store, settings))
    }
}
