use std::sync::Arc;

use chrono::Utc;

use crate::backend::Backend;
use crate::cache::content::{Content, ETagContent};
use crate::security::SecurityManager;

use super::config::{SessionConfig, TokenFormat};
use super::error::SessionError;
use super::model::{Session, SessionToken, SessionUser};
use super::token_serializer::{SimpleTokenSerializer, TokenSerializer};

/// Creates, loads, renews, and retires [`Session`] records.
///
/// Grounded on `original_source/tests/session/test_manager.py`: sessions
/// are stored JSON-encoded under `backend_key_prefix + session_id`,
/// tokens are the signed `SessionToken` wire format, and an inactive or
/// past-expiry session surfaces as `SessionInvalidError`/
/// `SessionExpiredError` rather than `SessionNotFoundError` once it has
/// actually been loaded from the backend.
pub struct SessionManager {
    backend: Arc<dyn Backend>,
    pub config: SessionConfig,
    pub security: SecurityManager,
    serializer: Box<dyn TokenSerializer + Send + Sync>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn Backend>, config: SessionConfig) -> Result<Self, String> {
        let security = SecurityManager::new(config.secret_key.clone())?;
        let serializer: Box<dyn TokenSerializer + Send + Sync> = match config.token_format {
            TokenFormat::Simple => Box::new(SimpleTokenSerializer),
            #[cfg(feature = "jwt")]
            TokenFormat::Jwt => Box::new(
                super::token_serializer::JwtTokenSerializer::new(&config)
                    .map_err(|e| e.to_string())?,
            ),
            #[cfg(not(feature = "jwt"))]
            TokenFormat::Jwt => {
                return Err("token_format = Jwt requires the `jwt` feature".to_string())
            }
        };
        Ok(Self {
            backend,
            config,
            security,
            serializer,
        })
    }

    fn backend_key(&self, session_id: &str) -> String {
        format!("{}{}", self.config.backend_key_prefix, session_id)
    }

    fn issue_token(
        &self,
        session_id: &str,
        issued_at: chrono::DateTime<Utc>,
    ) -> Result<String, SessionError> {
        let signature = match self.config.token_format {
            TokenFormat::Simple => self.security.sign_session_id(session_id),
            TokenFormat::Jwt => String::new(),
        };
        let token = SessionToken {
            session_id: session_id.to_string(),
            signature,
            issued_at: Some(issued_at),
        };
        self.serializer.to_string_token(&token)
    }

    /// Persists a session, JSON-encoded, with a backend TTL derived from
    /// `expires_at` so the backing store can reap records on its own
    /// schedule in addition to the session-level expiry check.
    pub async fn _save_session(&self, session: &Session) -> Result<(), SessionError> {
        let json = serde_json::to_value(session)
            .map_err(|e| SessionError::Token(format!("failed to encode session: {e}")))?;
        let entry = ETagContent::new(String::new(), Content::Json(json));
        let ttl = session
            .expires_at
            .map(|expires_at| (expires_at - Utc::now()).num_seconds().max(1) as u64);
        self.backend
            .set(&self.backend_key(&session.session_id), entry, ttl)
            .await
            .map_err(|e| SessionError::Token(e.to_string()))
    }

    pub async fn create_session(
        &self,
        user: Option<SessionUser>,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<(Session, String), SessionError> {
        let mut session = Session::new();
        session.user = user;
        session.ip_address = ip_address.map(str::to_string);
        session.user_agent = user_agent.map(str::to_string);
        session.renew(self.config.session_ttl);

        self._save_session(&session).await?;
        let token = self.issue_token(&session.session_id, Utc::now())?;
        Ok((session, token))
    }

    async fn load_by_id(&self, session_id: &str) -> Result<Session, SessionError> {
        let entry = self
            .backend
            .get(&self.backend_key(session_id))
            .await
            .map_err(|e| SessionError::Token(e.to_string()))?
            .ok_or(SessionError::NotFound)?;
        match &entry.content {
            Content::Json(value) => serde_json::from_value(value.clone())
                .map_err(|e| SessionError::Token(format!("corrupt session record: {e}"))),
            _ => Err(SessionError::Token("corrupt session record".to_string())),
        }
    }

    /// Validates the token, loads the session, enforces expiry/status
    /// and IP/User-Agent binding, then applies sliding-expiration
    /// renewal if the remaining TTL has dropped below the configured
    /// threshold.
    pub async fn get_session(
        &self,
        token: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<Session, SessionError> {
        let parsed = self.serializer.from_string(token)?;
        if self.config.token_format == TokenFormat::Simple
            && !self
                .security
                .verify_signature(&parsed.session_id, &parsed.signature)
        {
            return Err(SessionError::bad_signature());
        }

        let mut session = self.load_by_id(&parsed.session_id).await?;

        if session.is_expired() {
            return Err(SessionError::Expired);
        }
        if !session.is_valid() {
            return Err(SessionError::Invalid);
        }
        if !self.security.check_ip_match(&session, ip_address) {
            return Err(SessionError::ip_mismatch());
        }
        if !self
            .security
            .check_user_agent_match(&session, user_agent)
        {
            return Err(SessionError::user_agent_mismatch());
        }

        session.last_accessed = Utc::now();

        if self.config.sliding_expiration {
            if let Some(expires_at) = session.expires_at {
                let remaining = (expires_at - Utc::now()).num_seconds().max(0) as f64;
                let threshold = self.config.session_ttl as f64 * self.config.sliding_threshold;
                if remaining < threshold {
                    session.renew(self.config.session_ttl);
                }
            }
        }

        self._save_session(&session).await?;
        Ok(session)
    }

    pub async fn update_session(&self, session: &Session) -> Result<(), SessionError> {
        self._save_session(session).await
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<(), SessionError> {
        self.backend
            .delete(&self.backend_key(session_id))
            .await
            .map_err(|e| SessionError::Token(e.to_string()))
    }

    pub async fn regenerate_session_id(
        &self,
        mut session: Session,
    ) -> Result<(Session, String), SessionError> {
        let old_id = session.session_id.clone();
        session.regenerate_id();
        self._save_session(&session).await?;
        self.delete_session(&old_id).await?;
        let token = self.issue_token(&session.session_id, Utc::now())?;
        Ok((session, token))
    }

    pub async fn invalidate_session(&self, mut session: Session) -> Result<(), SessionError> {
        session.status = super::model::SessionStatus::Invalidated;
        self._save_session(&session).await
    }

    /// Scans every record under `backend_key_prefix`, deleting those
    /// whose stored `expires_at` has passed. Returns the count removed.
    pub async fn clear_expired_sessions(&self) -> Result<usize, SessionError> {
        let keys = self
            .backend
            .keys(&self.config.backend_key_prefix)
            .await
            .map_err(|e| SessionError::Token(e.to_string()))?;
        let mut cleared = 0;
        for key in keys {
            let Some(entry) = self
                .backend
                .get(&key)
                .await
                .map_err(|e| SessionError::Token(e.to_string()))?
            else {
                continue;
            };
            let Content::Json(value) = entry.content else {
                continue;
            };
            let Ok(session) = serde_json::from_value::<Session>(value) else {
                continue;
            };
            if session.is_expired() {
                self.backend
                    .delete(&key)
                    .await
                    .map_err(|e| SessionError::Token(e.to_string()))?;
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    /// Deletes every session belonging to `user_id`. Returns the count removed.
    pub async fn delete_user_sessions(&self, user_id: &str) -> Result<usize, SessionError> {
        let keys = self
            .backend
            .keys(&self.config.backend_key_prefix)
            .await
            .map_err(|e| SessionError::Token(e.to_string()))?;
        let mut deleted = 0;
        for key in keys {
            let Some(entry) = self
                .backend
                .get(&key)
                .await
                .map_err(|e| SessionError::Token(e.to_string()))?
            else {
                continue;
            };
            let Content::Json(value) = entry.content else {
                continue;
            };
            let Ok(session) = serde_json::from_value::<Session>(value) else {
                continue;
            };
            if session.user.as_ref().map(|u| u.user_id.as_str()) == Some(user_id) {
                self.backend
                    .delete(&key)
                    .await
                    .map_err(|e| SessionError::Token(e.to_string()))?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}
