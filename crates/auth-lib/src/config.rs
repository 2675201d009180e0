// ============================
// crates/auth-lib/src/config.rs
// ============================
//! Configuration management.
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use figment::{Figment, providers::{Env, Format, Json, Serialized, Toml, Yaml}};
use anyhow::Result;
use chrono::Duration;

use crate::auth::lockout::{LockoutPolicy, DEFAULT_LOCKOUT_SECS, DEFAULT_MAX_ATTEMPTS};
use crate::auth::password::PasswordPolicy;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Data directory path
    pub data_dir: PathBuf,
    /// Log level
    pub log_level: String,
    /// Session TTL in seconds
    pub session_ttl_secs: u64,
    /// Whether the session cookie carries the Secure attribute. Deployment
    /// flag: true under HTTPS.
    pub cookie_secure: bool,
    /// Password strength policy
    pub password_policy: PasswordPolicy,
    /// Account lockout settings
    pub lockout: LockoutSettings,
}

/// Lockout threshold and cooldown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockoutSettings {
    /// Failed attempts before the account locks
    pub max_attempts: u32,
    /// Lockout duration in seconds
    pub lockout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".parse().unwrap(),
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            session_ttl_secs: 60 * 60 * 24, // 1 day
            cookie_secure: false,
            password_policy: PasswordPolicy::default(),
            lockout: LockoutSettings::default(),
        }
    }
}

impl Default for LockoutSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            lockout_secs: DEFAULT_LOCKOUT_SECS,
        }
    }
}

impl Settings {
    /// Load settings from config files and environment, on top of defaults
    pub fn load() -> Result<Self> {
        let settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"))
            .merge(Yaml::file("config.yaml"))
            .merge(Json::file("config.json"))
            .merge(Env::prefixed("AUTHD_"))
            .extract()?;

        Ok(settings)
    }

    /// Load settings from an explicit TOML file, then environment
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("AUTHD_"))
            .extract()?;

        Ok(settings)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::seconds(self.session_ttl_secs as i64)
    }
}

impl LockoutSettings {
    pub fn policy(&self) -> LockoutPolicy {
        LockoutPolicy::new(self.max_attempts, Duration::seconds(self.lockout_secs as i64))
    }
}
