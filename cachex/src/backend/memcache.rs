use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::content::ETagContent;

use super::error::BackendError;
use super::interface::Backend;

/// Default namespace prepended to every key this driver writes, matching
/// `fastapi_cachex/backends/base.py`'s default `key_prefix`.
pub const DEFAULT_KEY_PREFIX: &str = "fastapi_cachex:";

/// Connection and namespacing settings for [`MemcacheBackend`].
#[derive(Debug, Clone)]
pub struct MemcacheBackendConfig {
    pub servers: Vec<String>,
    pub key_prefix: String,
}

impl MemcacheBackendConfig {
    pub fn new(servers: Vec<String>) -> Self {
        Self {
            servers,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }
}

/// Memcached-backed cache driver.
///
/// Grounded on `original_source/tests/backends/test_memcached.py`:
/// construction fails loudly when the client library cannot reach any
/// configured server, and pattern-based clearing degrades to a warning
/// rather than an error, since the memcached protocol has no
/// key-enumeration command to build it on. Because there is no
/// enumeration either, `clear_path(path, include_params=false)` treats
/// `path` as the literal key to delete rather than scanning for matches.
///
/// `memcache::Client` is synchronous, so it is wrapped in an `Arc` and
/// every call runs inside `tokio::task::spawn_blocking`.
pub struct MemcacheBackend {
    client: Arc<memcache::Client>,
    key_prefix: String,
}

impl MemcacheBackend {
    pub fn new(servers: Vec<String>) -> Result<Self, BackendError> {
        Self::with_config(MemcacheBackendConfig::new(servers))
    }

    pub fn with_config(config: MemcacheBackendConfig) -> Result<Self, BackendError> {
        let client = memcache::Client::connect(config.servers.join(","))
            .map_err(|e| BackendError::Construction(e.to_string()))?;
        Ok(Self {
            client: Arc::new(client),
            key_prefix: config.key_prefix,
        })
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{key}", self.key_prefix)
    }
}

#[async_trait]
impl Backend for MemcacheBackend {
    async fn get(&self, key: &str) -> Result<Option<ETagContent>, BackendError> {
        let client = self.client.clone();
        let key = self.prefixed(key);
        let raw: Option<String> = tokio::task::spawn_blocking(move || client.get(&key))
            .await
            .map_err(|e| BackendError::Operation(e.to_string()))?
            .map_err(|e| BackendError::Memcache(e.to_string()))?;
        match raw {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        key: &str,
        value: ETagContent,
        ttl: Option<u64>,
    ) -> Result<(), BackendError> {
        let encoded = serde_json::to_string(&value)?;
        let client = self.client.clone();
        let key = self.prefixed(key);
        let expiry = ttl.unwrap_or(0) as u32;
        tokio::task::spawn_blocking(move || client.set(&key, encoded.as_str(), expiry))
            .await
            .map_err(|e| BackendError::Operation(e.to_string()))?
            .map_err(|e| BackendError::Memcache(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        let client = self.client.clone();
        let key = self.prefixed(key);
        tokio::task::spawn_blocking(move || client.delete(&key))
            .await
            .map_err(|e| BackendError::Operation(e.to_string()))?
            .map_err(|e| BackendError::Memcache(e.to_string()))?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), BackendError> {
        let client = self.client.clone();
        tokio::task::spawn_blocking(move || client.flush())
            .await
            .map_err(|e| BackendError::Operation(e.to_string()))?
            .map_err(|e| BackendError::Memcache(e.to_string()))
    }

    async fn clear_path(&self, path: &str, include_params: bool) -> Result<usize, BackendError> {
        if include_params {
            tracing::warn!("memcached backend does not support pattern matching");
            return Ok(0);
        }
        let client = self.client.clone();
        let key = self.prefixed(path);
        let deleted: bool = tokio::task::spawn_blocking(move || client.delete(&key))
            .await
            .map_err(|e| BackendError::Operation(e.to_string()))?
            .map_err(|e| BackendError::Memcache(e.to_string()))?;
        Ok(if deleted { 1 } else { 0 })
    }

    async fn clear_pattern(&self, _pattern: &str) -> Result<usize, BackendError> {
        tracing::warn!("memcached backend does not support pattern matching");
        Ok(0)
    }

    async fn len(&self) -> Result<usize, BackendError> {
        tracing::warn!("Memcached backend cannot report entry count");
        Ok(0)
    }

    async fn keys(&self, _prefix: &str) -> Result<Vec<String>, BackendError> {
        tracing::warn!("Memcached backend does not support key enumeration");
        Ok(Vec::new())
    }

    async fn introspect(&self) -> Result<Vec<(String, ETagContent, Option<i64>)>, BackendError> {
        tracing::warn!("Memcached backend does not support key enumeration");
        Ok(Vec::new())
    }
}
