use secrecy::SecretString;
use serde::Deserialize;

/// Where to look for an inbound session token, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenSource {
    Cookie,
    Header,
    Bearer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Lax,
    Strict,
    None,
}

/// Wire format for [`super::SessionToken`], selected by
/// [`SessionConfig::token_format`].
///
/// Grounded on `original_source/tests/session/test_token_serializers.py`,
/// which exercises both a `SimpleTokenSerializer` (the plain
/// `id.signature.issued_at` string) and a `JWTTokenSerializer` wrapping
/// `pyjwt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenFormat {
    Simple,
    Jwt,
}

/// Session-management configuration.
///
/// Field set and defaults are grounded verbatim on
/// `original_source/fastapi_cachex/session/config.py`'s `SessionConfig`
/// pydantic model. `secret_key` takes a [`SecretString`] the way the
/// original accepts a Pydantic `SecretStr`, confirmed by
/// `test_session_manager_accepts_secretstr`.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub session_ttl: i64,
    pub absolute_timeout: Option<i64>,
    pub sliding_expiration: bool,
    pub sliding_threshold: f64,

    pub cookie_name: String,
    pub cookie_max_age: Option<i64>,
    pub cookie_path: String,
    pub cookie_domain: Option<String>,
    pub cookie_secure: bool,
    pub cookie_httponly: bool,
    pub cookie_samesite: SameSite,

    pub header_name: String,
    pub use_bearer_token: bool,
    pub token_source_priority: Vec<TokenSource>,

    pub secret_key: SecretString,
    pub ip_binding: bool,
    pub user_agent_binding: bool,
    pub regenerate_on_login: bool,

    pub backend_key_prefix: String,

    pub enable_csrf: bool,
    pub csrf_cookie_name: String,
    pub csrf_header_name: String,

    pub token_format: TokenFormat,
    pub jwt_algorithm: String,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,
}

impl SessionConfig {
    /// Builds a config from a secret key, applying every other default
    /// from the source model. Fails the same way the original's
    /// `min_length=32` constraint does when the key is too short.
    pub fn new<S: Into<SecretString>>(secret_key: S) -> Result<Self, String> {
        let secret_key = secret_key.into();
        if secrecy::ExposeSecret::expose_secret(&secret_key).len() < 32 {
            return Err("secret_key must be at least 32 characters".to_string());
        }
        Ok(Self {
            session_ttl: 3600,
            absolute_timeout: None,
            sliding_expiration: true,
            sliding_threshold: 0.5,

            cookie_name: "fastapi_session".to_string(),
            cookie_max_age: None,
            cookie_path: "/".to_string(),
            cookie_domain: None,
            cookie_secure: true,
            cookie_httponly: true,
            cookie_samesite: SameSite::Lax,

            header_name: "X-Session-Token".to_string(),
            use_bearer_token: true,
            token_source_priority: vec![TokenSource::Cookie, TokenSource::Header, TokenSource::Bearer],

            secret_key,
            ip_binding: false,
            user_agent_binding: false,
            regenerate_on_login: true,

            backend_key_prefix: "session:".to_string(),

            enable_csrf: false,
            csrf_cookie_name: "fastapi_csrf".to_string(),
            csrf_header_name: "X-CSRF-Token".to_string(),

            token_format: TokenFormat::Simple,
            jwt_algorithm: "HS256".to_string(),
            jwt_issuer: None,
            jwt_audience: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_secret_key() {
        assert!(SessionConfig::new("short".to_string()).is_err());
    }

    #[test]
    fn defaults_match_source_model() {
        let config = SessionConfig::new("a".repeat(32)).unwrap();
        assert_eq!(config.session_ttl, 3600);
        assert!(config.sliding_expiration);
        assert_eq!(config.sliding_threshold, 0.5);
        assert_eq!(config.backend_key_prefix, "session:");
        assert_eq!(
            config.token_source_priority,
            vec![TokenSource::Cookie, TokenSource::Header, TokenSource::Bearer]
        );
    }
}
