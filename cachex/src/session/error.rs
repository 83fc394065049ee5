/// Errors raised by `SessionManager` and `SecurityManager`.
///
/// Variants and their triggers are grounded on
/// `original_source/tests/session/test_manager.py` and
/// `test_security.py`: a malformed token string is a `SessionTokenError`,
/// a well-formed token with a bad signature is a `SessionSecurityError`,
/// and IP/User-Agent binding mismatches surface as `SessionSecurityError`
/// with a message containing "IP address mismatch" or "User-Agent
/// mismatch" respectively, matched verbatim by the original test suite.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("malformed session token: {0}")]
    Token(String),

    #[error("session not found")]
    NotFound,

    #[error("session has expired")]
    Expired,

    #[error("session is not active")]
    Invalid,

    #[error("session security check failed: {0}")]
    Security(String),
}

impl SessionError {
    pub fn ip_mismatch() -> Self {
        SessionError::Security("IP address mismatch".into())
    }

    pub fn user_agent_mismatch() -> Self {
        SessionError::Security("User-Agent mismatch".into())
    }

    pub fn bad_signature() -> Self {
        SessionError::Security("Invalid session signature".into())
    }
}
