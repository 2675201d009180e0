// ============================
// crates/auth-lib/src/auth/lockout.rs
// ============================
//! Brute-force lockout state machine.
//!
//! An account moves `Active -> Locked` once enough consecutive failures
//! accumulate, and back to `Active` once the cooldown passes. The transition
//! is a pure function over [`FailureState`] so threshold and cooldown can be
//! tested without a store.

use chrono::{DateTime, Duration, Utc};

/// Default number of failed attempts before lockout
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default lockout duration (10 minutes)
pub const DEFAULT_LOCKOUT_SECS: u64 = 10 * 60;

/// The lockout-relevant fields of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FailureState {
    /// Consecutive failed attempts since the last success or lockout
    pub failed_attempts: u32,
    /// When the current lockout expires, if one is active
    pub lock_until: Option<DateTime<Utc>>,
}

/// Lockout policy: how many failures are tolerated and for how long the
/// account is suspended once the threshold is crossed.
#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    pub max_attempts: u32,
    pub lockout: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            lockout: Duration::seconds(DEFAULT_LOCKOUT_SECS as i64),
        }
    }
}

impl LockoutPolicy {
    pub fn new(max_attempts: u32, lockout: Duration) -> Self {
        Self { max_attempts, lockout }
    }

    /// State after one more failed attempt at `now`.
    ///
    /// Crossing the threshold sets `lock_until` and resets the counter to
    /// zero in the same transition; below the threshold the counter advances
    /// and any stale `lock_until` is cleared.
    pub fn after_failure(&self, state: &FailureState, now: DateTime<Utc>) -> FailureState {
        let attempts = state.failed_attempts + 1;
        if attempts >= self.max_attempts {
            FailureState {
                failed_attempts: 0,
                lock_until: Some(now + self.lockout),
            }
        } else {
            FailureState {
                failed_attempts: attempts,
                lock_until: None,
            }
        }
    }
}

/// Whether the account is refusing logins at `now`.
pub fn is_locked(state: &FailureState, now: DateTime<Utc>) -> bool {
    state.lock_until.is_some_and(|until| now < until)
}
