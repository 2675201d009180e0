// ============================
// crates/auth-lib/src/auth/password.rs
// ============================
//! Password hashing and strength policy.
use scrypt::{password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng}, Scrypt};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Symbols that satisfy the special-character requirement
pub const PASSWORD_SYMBOLS: &str = r#"!@#$%^&*(),.?":{}|<>"#;

/// Password strength policy. The deny-list is configuration, not hard state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_symbol: bool,
    /// Known-weak passwords, matched case-insensitively
    pub deny_list: Vec<String>,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: MIN_PASSWORD_LENGTH,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_symbol: true,
            deny_list: ["password", "12345678", "qwerty123"]
                .map(String::from)
                .to_vec(),
        }
    }
}

/// Hash a password using scrypt
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Scrypt
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?
        .to_string();
    Ok(hash)
}

/// Verify a password against a hash
pub fn verify_password(hash: &str, plain: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok()
}

/// Hash a password and zeroize the plaintext
pub fn hash_password_secure(plain: &mut String) -> anyhow::Result<String> {
    let hash = hash_password(plain)?;
    plain.zeroize();
    Ok(hash)
}

/// Check if a password meets the strength policy. Pure, no I/O.
pub fn is_strong(password: &str, policy: &PasswordPolicy) -> bool {
    if password.chars().count() < policy.min_length {
        return false;
    }

    if policy.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
        return false;
    }

    if policy.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
        return false;
    }

    if policy.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }

    if policy.require_symbol && !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        return false;
    }

    if policy
        .deny_list
        .iter()
        .any(|weak| weak.eq_ignore_ascii_case(password))
    {
        return false;
    }

    true
}
