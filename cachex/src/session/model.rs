use std::collections::HashMap;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::security::SecurityManager;

use super::error::SessionError;

/// Identity information attached to a [`Session`].
///
/// Grounded on `original_source/tests/session/test_models.py`'s
/// `SessionUser` fixtures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl SessionUser {
    pub fn new<S: Into<String>>(user_id: S, username: S) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            email: None,
            roles: Vec::new(),
            permissions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    Invalidated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashMessage {
    pub message: String,
    pub category: String,
}

fn new_session_id() -> String {
    SecurityManager::generate_token(32)
}

/// Server-side session record.
///
/// Grounded on `original_source/tests/session/test_models.py`: a fresh
/// session is `ACTIVE` with no expiry set until the manager assigns one.
/// `is_valid` combines status and expiry; `renew` only ever extends
/// `expires_at` forward, never backward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub status: SessionStatus,
    pub user: Option<SessionUser>,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[serde(default)]
    pub data: HashMap<String, Value>,
    #[serde(default)]
    pub flash_messages: Vec<FlashMessage>,
}

impl Default for Session {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            session_id: new_session_id(),
            status: SessionStatus::Active,
            user: None,
            created_at: now,
            last_accessed: now,
            expires_at: None,
            ip_address: None,
            user_agent: None,
            data: HashMap::new(),
            flash_messages: Vec::new(),
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() > expires_at,
            None => false,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == SessionStatus::Active && !self.is_expired()
    }

    /// Extends `expires_at` to at least `now + ttl_seconds`, never moving
    /// it backward.
    pub fn renew(&mut self, ttl_seconds: i64) {
        let candidate = Utc::now() + Duration::seconds(ttl_seconds);
        self.expires_at = Some(match self.expires_at {
            Some(current) if current > candidate => current,
            _ => candidate,
        });
    }

    pub fn regenerate_id(&mut self) -> String {
        self.session_id = new_session_id();
        self.session_id.clone()
    }

    pub fn add_flash_message<S: Into<String>>(&mut self, message: S, category: S) {
        self.flash_messages.push(FlashMessage {
            message: message.into(),
            category: category.into(),
        });
    }

    /// Returns the flash messages, optionally clearing them.
    pub fn get_flash_messages(&mut self, clear: bool) -> Vec<FlashMessage> {
        let messages = self.flash_messages.clone();
        if clear {
            self.flash_messages.clear();
        }
        messages
    }
}

/// Signed, transport-level representation of a session handle.
///
/// Serialized as `session_id.signature` or, when an issue time is
/// attached, `session_id.signature.issued_at` with `issued_at` in
/// RFC 3339 UTC (e.g. `2024-01-01T00:00:00Z`). Grounded on
/// `original_source/tests/session/test_models.py`'s
/// `test_session_token_to_string`/`from_string` round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub session_id: String,
    pub signature: String,
    pub issued_at: Option<DateTime<Utc>>,
}

impl SessionToken {
    pub fn new<S: Into<String>>(session_id: S, signature: S) -> Self {
        Self {
            session_id: session_id.into(),
            signature: signature.into(),
            issued_at: Some(Utc::now()),
        }
    }

    pub fn to_string_token(&self) -> String {
        match self.issued_at {
            Some(issued_at) => format!(
                "{}.{}.{}",
                self.session_id,
                self.signature,
                issued_at.to_rfc3339_opts(SecondsFormat::Secs, true)
            ),
            None => format!("{}.{}", self.session_id, self.signature),
        }
    }

    pub fn from_string(token: &str) -> Result<Self, SessionError> {
        let parts: Vec<&str> = token.splitn(3, '.').collect();
        match parts.as_slice() {
            [session_id, signature] => Ok(Self {
                session_id: session_id.to_string(),
                signature: signature.to_string(),
                issued_at: None,
            }),
            [session_id, signature, issued_at] => {
                let issued_at = DateTime::parse_from_rfc3339(issued_at)
                    .map_err(|_| SessionError::Token("Invalid timestamp".to_string()))?
                    .with_timezone(&Utc);
                Ok(Self {
                    session_id: session_id.to_string(),
                    signature: signature.to_string(),
                    issued_at: Some(issued_at),
                })
            }
            _ => Err(SessionError::Token("Invalid token format".to_string())),
        }
    }
}
