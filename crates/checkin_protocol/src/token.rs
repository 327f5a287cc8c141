//! Shared-credential token derivation.
//!
//! Both peers derive the same HMAC-SHA256 tag from the shared credential and
//! a fixed context string. The client sends the tag; the server recomputes it
//! and compares in constant time. The credential itself never crosses the
//! wire.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Context string bound into every auth token.
///
/// Versioned separately from the frame header so that a token-scheme change
/// invalidates old tokens even on the same protocol version.
pub const AUTH_CONTEXT: &[u8] = b"checkin auth token v1";

/// Length in bytes of an auth token.
pub const AUTH_TOKEN_LEN: usize = 32;

/// Derives the auth token for a shared credential.
pub fn auth_token(shared_key: &str) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(shared_key.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(AUTH_CONTEXT);
    mac.finalize().into_bytes().to_vec()
}

/// Verifies a presented token against a shared credential.
///
/// Comparison is constant-time via [`Mac::verify_slice`].
pub fn verify_token(shared_key: &str, token: &[u8]) -> bool {
    let mut mac = HmacSha256::new_from_slice(shared_key.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(AUTH_CONTEXT);
    mac.verify_slice(token).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_deterministic() {
        assert_eq!(auth_token("hunter2"), auth_token("hunter2"));
    }

    #[test]
    fn token_length() {
        assert_eq!(auth_token("hunter2").len(), AUTH_TOKEN_LEN);
    }

    #[test]
    fn distinct_keys_give_distinct_tokens() {
        assert_ne!(auth_token("hunter2"), auth_token("hunter3"));
    }

    #[test]
    fn verify_accepts_matching_token() {
        let token = auth_token("correct horse battery staple");
        assert!(verify_token("correct horse battery staple", &token));
    }

    #[test]
    fn verify_rejects_wrong_key() {
        let token = auth_token("hunter2");
        assert!(!verify_token("hunter3", &token));
    }

    #[test]
    fn verify_rejects_tampered_token() {
        let mut token = auth_token("hunter2");
        token[7] ^= 0xFF;
        assert!(!verify_token("hunter2", &token));
    }

    #[test]
    fn verify_rejects_truncated_token() {
        let token = auth_token("hunter2");
        assert!(!verify_token("hunter2", &token[..16]));
    }
}
