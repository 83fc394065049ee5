use std::sync::Arc;

use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};

use crate::backend::Backend;
use crate::cache::content::{Content, ETagContent};
use crate::security::SecurityManager;

use super::error::StateError;
use super::model::StateData;

const DEFAULT_TTL_SECONDS: i64 = 600;

/// Issues and redeems single-use OAuth-style state tokens.
///
/// Grounded on `original_source/tests/state/test_manager.py`: a state is
/// opaque, consumption is destructive and non-repeatable
/// (`test_state_reuse_prevention`), `validate_state`/`get_state_metadata`
/// are non-destructive and swallow every corruption error into a plain
/// `false`/`None`, and the default key prefix is `"oauth_state:"`.
pub struct StateManager {
    backend: Arc<dyn Backend>,
    pub key_prefix: String,
}

impl StateManager {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self::with_prefix(backend, "oauth_state:".to_string())
    }

    pub fn with_prefix(backend: Arc<dyn Backend>, key_prefix: String) -> Self {
        Self { backend, key_prefix }
    }

    fn backend_key(&self, state: &str) -> String {
        format!("{}{}", self.key_prefix, state)
    }

    /// Generates an opaque, unguessable state token and stores its
    /// metadata for later consumption.
    pub async fn create_state(
        &self,
        metadata: Option<serde_json::Value>,
        ttl: Option<i64>,
    ) -> Result<String, StateError> {
        let state = SecurityManager::generate_token(32);
        let ttl = ttl.unwrap_or(DEFAULT_TTL_SECONDS);
        let now = Utc::now();
        let data = StateData {
            state: state.clone(),
            created_at: now,
            expires_at: now + Duration::seconds(ttl),
            metadata: metadata.unwrap_or(serde_json::json!({})),
        };
        self.store(&state, &data, ttl).await?;
        Ok(state)
    }

    async fn store(&self, state: &str, data: &StateData, ttl: i64) -> Result<(), StateError> {
        let json = serde_json::to_string(data)
            .map_err(|e| StateError::Data(format!("Failed to encode state data: {e}")))?;
        let etag = hex::encode(Sha256::digest(json.as_bytes()));
        let entry = ETagContent::new(etag, Content::Text(json));
        self.backend
            .set(&self.backend_key(state), entry, Some(ttl.max(0) as u64))
            .await
            .map_err(|e| StateError::Data(e.to_string()))
    }

    async fn load(&self, state: &str) -> Result<Option<StateData>, StateError> {
        let entry = self
            .backend
            .get(&self.backend_key(state))
            .await
            .map_err(|e| StateError::Data(e.to_string()))?;
        let Some(entry) = entry else {
            return Ok(None);
        };
        let raw = match &entry.content {
            Content::Text(s) => s.clone(),
            Content::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            Content::Json(v) => v.to_string(),
        };
        let data: StateData = serde_json::from_str(&raw)
            .map_err(|e| StateError::Data(format!("Failed to parse state data: {e}")))?;
        if data.expires_at < Utc::now() {
            return Err(StateError::Expired);
        }
        Ok(Some(data))
    }

    /// Redeems a state token exactly once: the backend record is
    /// deleted whether or not the token was valid.
    pub async fn consume_state(&self, state: &str) -> Result<StateData, StateError> {
        let result = self.load(state).await;
        let _ = self.backend.delete(&self.backend_key(state)).await;
        match result {
            Ok(Some(data)) => Ok(data),
            Ok(None) => Err(StateError::Invalid),
            Err(StateError::Expired) => Err(StateError::Invalid),
            Err(e) => Err(e),
        }
    }

    /// Checks a state token without consuming it. Any failure, including
    /// corruption or expiry, reads as `false`.
    pub async fn validate_state(&self, state: &str) -> bool {
        matches!(self.load(state).await, Ok(Some(_)))
    }

    /// Returns a state's metadata without consuming it, or `None` if the
    /// token is unknown, expired, or corrupt.
    pub async fn get_state_metadata(&self, state: &str) -> Option<serde_json::Value> {
        match self.load(state).await {
            Ok(Some(data)) => Some(data.metadata),
            _ => None,
        }
    }

    pub async fn delete_state(&self, state: &str) -> bool {
        self.backend.delete(&self.backend_key(state)).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;

    fn manager() -> StateManager {
        StateManager::new(Arc::new(MemoryBackend::new()))
    }

    #[tokio::test]
    async fn create_and_consume_round_trip() {
        let manager = manager();
        let state = manager.create_state(None, None).await.unwrap();
        let data = manager.consume_state(&state).await.unwrap();
        assert_eq!(data.state, state);
        assert!(!manager.validate_state(&state).await);
    }

    #[tokio::test]
    async fn consuming_twice_fails() {
        let manager = manager();
        let state = manager.create_state(None, None).await.unwrap();
        manager.consume_state(&state).await.unwrap();
        assert!(matches!(
            manager.consume_state(&state).await,
            Err(StateError::Invalid)
        ));
    }

    #[tokio::test]
    async fn metadata_round_trips() {
        let manager = manager();
        let metadata = serde_json::json!({"user_id": "u1"});
        let state = manager
            .create_state(Some(metadata.clone()), None)
            .await
            .unwrap();
        let got = manager.get_state_metadata(&state).await;
        assert_eq!(got, Some(metadata));
    }

    #[tokio::test]
    async fn invalid_state_validates_false() {
        let manager = manager();
        assert!(!manager.validate_state("nonexistent").await);
        assert_eq!(manager.get_state_metadata("nonexistent").await, None);
    }

    #[tokio::test]
    async fn custom_prefix_isolates_managers() {
        let backend = Arc::new(MemoryBackend::new());
        let a = StateManager::with_prefix(backend.clone(), "a:".to_string());
        let b = StateManager::with_prefix(backend, "b:".to_string());
        let state = a.create_state(None, None).await.unwrap();
        assert!(a.validate_state(&state).await);
        assert!(!b.validate_state(&state).await);
    }
}
