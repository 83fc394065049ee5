use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::session::model::Session;

type HmacSha256 = Hmac<Sha256>;

/// Signs session identifiers, issues CSRF tokens, and checks session
/// binding, all keyed off one shared secret.
///
/// Grounded on `original_source/tests/session/test_security.py`:
/// signatures and hashes are SHA-256 hex digests (64 characters),
/// comparisons are constant-time, and IP/User-Agent binding only
/// activates once the session has recorded a value to bind against.
pub struct SecurityManager {
    secret_key: SecretString,
}

impl SecurityManager {
    pub fn new<S: Into<SecretString>>(secret_key: S) -> Result<Self, String> {
        let secret_key = secret_key.into();
        if secret_key.expose_secret().len() < 32 {
            return Err("secret_key must be at least 32 characters".to_string());
        }
        Ok(Self { secret_key })
    }

    pub fn sign_session_id(&self, session_id: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret_key.expose_secret().as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(session_id.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Constant-time signature check, immune to timing side channels.
    pub fn verify_signature(&self, session_id: &str, signature: &str) -> bool {
        let expected = self.sign_session_id(session_id);
        expected.as_bytes().ct_eq(signature.as_bytes()).into()
    }

    pub fn generate_csrf_token(&self) -> String {
        Self::generate_token(32)
    }

    pub fn verify_csrf_token(&self, expected: &str, provided: &str) -> bool {
        expected.as_bytes().ct_eq(provided.as_bytes()).into()
    }

    /// Opaque URL-safe random token, for session IDs, OAuth-style state
    /// values, and CSRF tokens alike. Doesn't touch `secret_key`, so it's
    /// an associated function rather than a method — callable from
    /// anywhere a fresh random identifier is needed, not just from code
    /// holding a [`SecurityManager`].
    pub fn generate_token(byte_len: usize) -> String {
        let mut bytes = vec![0u8; byte_len];
        rand::Rng::fill(&mut rand::rng(), bytes.as_mut_slice());
        URL_SAFE_NO_PAD.encode(bytes)
    }

    pub fn hash_data(&self, data: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// A session with no recorded IP accepts any client IP; one that has
    /// bound to an address requires an exact match, including against a
    /// missing incoming address.
    pub fn check_ip_match(&self, session: &Session, ip_address: Option<&str>) -> bool {
        match &session.ip_address {
            None => true,
            Some(bound) => ip_address == Some(bound.as_str()),
        }
    }

    pub fn check_user_agent_match(&self, session: &Session, user_agent: Option<&str>) -> bool {
        match &session.user_agent {
            None => true,
            Some(bound) => user_agent == Some(bound.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SecurityManager {
        SecurityManager::new("a".repeat(32)).unwrap()
    }

    #[test]
    fn rejects_short_key() {
        assert!(SecurityManager::new("short".to_string()).is_err());
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let manager = manager();
        let signature = manager.sign_session_id("test-session-id");
        assert_eq!(signature.len(), 64);
        assert!(manager.verify_signature("test-session-id", &signature));
        assert!(!manager.verify_signature("test-session-id", "invalid"));
        assert!(!manager.verify_signature("different-id", &signature));
    }

    #[test]
    fn csrf_tokens_are_unique_and_verifiable() {
        let manager = manager();
        let a = manager.generate_csrf_token();
        let b = manager.generate_csrf_token();
        assert_ne!(a, b);
        assert!(manager.verify_csrf_token(&a, &a));
        assert!(!manager.verify_csrf_token(&a, "different"));
    }

    #[test]
    fn ip_match_requires_binding_first() {
        let manager = manager();
        let mut session = Session::new();
        assert!(manager.check_ip_match(&session, Some("192.168.1.1")));
        assert!(manager.check_ip_match(&session, None));

        session.ip_address = Some("192.168.1.1".to_string());
        assert!(manager.check_ip_match(&session, Some("192.168.1.1")));
        assert!(!manager.check_ip_match(&session, Some("192.168.1.2")));
        assert!(!manager.check_ip_match(&session, None));
    }

    #[test]
    fn user_agent_match_requires_binding_first() {
        let manager = manager();
        let mut session = Session::new();
        assert!(manager.check_user_agent_match(&session, Some("Mozilla/5.0")));

        session.user_agent = Some("Mozilla/5.0".to_string());
        assert!(manager.check_user_agent_match(&session, Some("Mozilla/5.0")));
        assert!(!manager.check_user_agent_match(&session, Some("Chrome/91.0")));
        assert!(!manager.check_user_agent_match(&session, None));
    }

    #[test]
    fn hash_data_is_deterministic() {
        let manager = manager();
        let a = manager.hash_data("test data");
        let b = manager.hash_data("test data");
        let c = manager.hash_data("different data");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
