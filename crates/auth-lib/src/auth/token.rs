// ============================
// crates/auth-lib/src/auth/token.rs
// ============================
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
/** Session token generation.
Tokens are opaque bearer credentials, so they come from OS entropy and are
never derived from account data. */
use rand::{rngs::OsRng, RngCore};

/// Default token size in bytes (32 bytes = 256 bits of entropy)
const DEFAULT_TOKEN_BYTES: usize = 32;

/** Generate a cryptographically secure session token.
# Returns
A base64 URL-safe encoded string without padding */
pub fn generate_session_token() -> String {
    generate_token_with_size(DEFAULT_TOKEN_BYTES)
}

/** Generate a cryptographically secure token with specified size
# Arguments
* `bytes` - The size of the random token in bytes */
pub fn generate_token_with_size(bytes: usize) -> String {
    let mut buffer = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buffer);
    URL_SAFE_NO_PAD.encode(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tokens_are_unique() {
        let tokens: HashSet<String> = (0..100).map(|_| generate_session_token()).collect();
        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn test_token_length() {
        // 32 bytes of entropy in unpadded base64 is 43 characters
        let token = generate_session_token();
        assert_eq!(token.len(), 43);

        assert!(generate_token_with_size(16).len() < token.len());
        assert!(generate_token_with_size(64).len() > token.len());
    }

    #[test]
    fn test_token_is_url_safe() {
        let token = generate_session_token();
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
