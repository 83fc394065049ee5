use super::error::SessionError;
use super::model::SessionToken;

/// Converts a [`SessionToken`] to and from its transport-level string
/// form.
///
/// Grounded on `original_source/tests/session/test_token_serializers.py`,
/// which exercises a plain `SimpleTokenSerializer` alongside a
/// `JWTTokenSerializer` behind the same interface.
pub trait TokenSerializer {
    fn to_string_token(&self, token: &SessionToken) -> Result<String, SessionError>;
    fn from_string(&self, token: &str) -> Result<SessionToken, SessionError>;
}

/// The original `id.signature.issued_at` wire format.
pub struct SimpleTokenSerializer;

impl TokenSerializer for SimpleTokenSerializer {
    fn to_string_token(&self, token: &SessionToken) -> Result<String, SessionError> {
        Ok(token.to_string_token())
    }

    fn from_string(&self, token: &str) -> Result<SessionToken, SessionError> {
        SessionToken::from_string(token)
    }
}

#[cfg(feature = "jwt")]
pub use jwt::JwtTokenSerializer;

#[cfg(feature = "jwt")]
mod jwt {
    use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
    use secrecy::ExposeSecret;
    use serde::{Deserialize, Serialize};

    use super::super::config::SessionConfig;
    use super::{SessionError, SessionToken, TokenSerializer};

    #[derive(Serialize, Deserialize)]
    struct Claims {
        sid: String,
        iat: i64,
        exp: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        iss: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        aud: Option<String>,
    }

    /// Wraps `jsonwebtoken` the way the original wraps `pyjwt`: claims
    /// `{sid, iat, exp, iss?, aud?}`, `exp = iat + session_ttl`.
    ///
    /// The session-level HMAC signature carried by [`SessionToken`] is
    /// left empty; the JWT's own signature is what gets verified on
    /// decode, so [`super::super::manager::SessionManager`] skips its
    /// separate signature check for this format.
    pub struct JwtTokenSerializer {
        encoding_key: EncodingKey,
        decoding_key: DecodingKey,
        algorithm: Algorithm,
        issuer: Option<String>,
        audience: Option<String>,
        ttl_seconds: i64,
    }

    impl JwtTokenSerializer {
        pub fn new(config: &SessionConfig) -> Result<Self, SessionError> {
            let algorithm = match config.jwt_algorithm.as_str() {
                "HS256" => Algorithm::HS256,
                "HS384" => Algorithm::HS384,
                "HS512" => Algorithm::HS512,
                other => {
                    return Err(SessionError::Token(format!(
                        "unsupported JWT algorithm: {other}"
                    )))
                }
            };
            let secret = config.secret_key.expose_secret();
            Ok(Self {
                encoding_key: EncodingKey::from_secret(secret.as_bytes()),
                decoding_key: DecodingKey::from_secret(secret.as_bytes()),
                algorithm,
                issuer: config.jwt_issuer.clone(),
                audience: config.jwt_audience.clone(),
                ttl_seconds: config.session_ttl,
            })
        }
    }

    impl TokenSerializer for JwtTokenSerializer {
        fn to_string_token(&self, token: &SessionToken) -> Result<String, SessionError> {
            let iat = token.issued_at.unwrap_or_else(chrono::Utc::now).timestamp();
            let claims = Claims {
                sid: token.session_id.clone(),
                iat,
                exp: iat + self.ttl_seconds,
                iss: self.issuer.clone(),
                aud: self.audience.clone(),
            };
            encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
                .map_err(|e| SessionError::Token(format!("Invalid JWT token: {e}")))
        }

        fn from_string(&self, token: &str) -> Result<SessionToken, SessionError> {
            let mut validation = Validation::new(self.algorithm);
            if let Some(iss) = &self.issuer {
                validation.set_issuer(&[iss]);
            }
            if let Some(aud) = &self.audience {
                validation.set_audience(&[aud]);
            }
            let data = decode::<Claims>(token, &self.decoding_key, &validation)
                .map_err(|e| SessionError::Token(format!("Invalid JWT token: {e}")))?;
            let issued_at = chrono::DateTime::from_timestamp(data.claims.iat, 0);
            Ok(SessionToken {
                session_id: data.claims.sid,
                signature: String::new(),
                issued_at,
            })
        }
    }
}
