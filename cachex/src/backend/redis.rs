use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, AsyncIter};

use crate::cache::content::ETagContent;
use crate::cache::key::parse_cache_key;

use super::error::BackendError;
use super::interface::Backend;

/// Default namespace prepended to every key this driver writes, matching
/// `original_source/fastapi_cachex/backends/base.py`'s default
/// `key_prefix`.
pub const DEFAULT_KEY_PREFIX: &str = "fastapi_cachex:";

/// Connection and namespacing settings for [`RedisBackend`].
#[derive(Debug, Clone)]
pub struct RedisBackendConfig {
    pub dsn: String,
    pub key_prefix: String,
}

impl RedisBackendConfig {
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }
}

/// Remote key-value cache backend, grounded on `actix-cloud`'s
/// `RedisBackend` (`memorydb/redis.rs`): a thin wrapper around
/// `redis::aio::ConnectionManager`.
///
/// Values are stored as the JSON envelope described in the data model
/// (an `{"etag", "content"}` object) since Redis values are opaque
/// bytes/strings, unlike the in-memory driver which keeps the typed
/// [`ETagContent`] directly.
///
/// Every key sent to the server is namespaced under `key_prefix` (default
/// `"fastapi_cachex:"`), so several independently-configured drivers can
/// share a Redis instance without colliding.
///
/// Enumeration-based operations (`clear_path`, `clear_pattern`) use
/// `SCAN` rather than `KEYS`, since `KEYS` blocks the server for the
/// duration of the scan on a large keyspace, and the scan itself is
/// limited to `key_prefix*` so it never touches keys owned by another
/// driver instance.
#[derive(Clone)]
pub struct RedisBackend {
    client: ConnectionManager,
    key_prefix: String,
}

impl RedisBackend {
    pub async fn new(dsn: &str) -> Result<Self, BackendError> {
        Self::with_config(RedisBackendConfig::new(dsn)).await
    }

    pub async fn with_config(config: RedisBackendConfig) -> Result<Self, BackendError> {
        let client = redis::Client::open(config.dsn.as_str())
            .map_err(|e| BackendError::Construction(e.to_string()))?;
        let client = ConnectionManager::new(client)
            .await
            .map_err(BackendError::Redis)?;
        Ok(Self {
            client,
            key_prefix: config.key_prefix,
        })
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{key}", self.key_prefix)
    }

    fn strip_prefix<'a>(&self, key: &'a str) -> &'a str {
        key.strip_prefix(self.key_prefix.as_str()).unwrap_or(key)
    }

    /// Returns logical (prefix-stripped) keys owned by this driver.
    async fn scan_keys(&self) -> Result<Vec<String>, BackendError> {
        let mut conn = self.client.clone();
        let pattern = format!("{}*", self.key_prefix);
        let mut iter: AsyncIter<String> = conn
            .scan_match(pattern)
            .await
            .map_err(BackendError::Redis)?;
        let mut keys = Vec::new();
        while let Some(key) = futures::StreamExt::next(&mut iter).await {
            keys.push(self.strip_prefix(&key).to_string());
        }
        Ok(keys)
    }
}

#[async_trait]
impl Backend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<ETagContent>, BackendError> {
        let raw: Option<String> = self
            .client
            .clone()
            .get(self.prefixed(key))
            .await
            .map_err(BackendError::Redis)?;
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
        let key = self.prefixed(key);
        let mut conn = self.client.clone();
        match ttl {
            Some(secs) if secs > 0 => conn
                .set_ex::<_, _, ()>(key, encoded, secs)
                .await
                .map_err(BackendError::Redis),
            _ => conn
                .set::<_, _, ()>(key, encoded)
                .await
                .map_err(BackendError::Redis),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        self.client
            .clone()
            .del::<_, ()>(self.prefixed(key))
            .await
            .map_err(BackendError::Redis)
    }

    async fn clear(&self) -> Result<(), BackendError> {
        let keys: Vec<String> = self
            .scan_keys()
            .await?
            .into_iter()
            .map(|k| self.prefixed(&k))
            .collect();
        if keys.is_empty() {
            return Ok(());
        }
        self.client
            .clone()
            .del::<_, ()>(keys)
            .await
            .map_err(BackendError::Redis)
    }

    async fn clear_path(&self, path: &str, include_params: bool) -> Result<usize, BackendError> {
        if !include_params {
            let key = self.prefixed(path);
            let existed: bool = self.client.clone().exists(&key).await.map_err(BackendError::Redis)?;
            if !existed {
                return Ok(0);
            }
            self.client
                .clone()
                .del::<_, ()>(&key)
                .await
                .map_err(BackendError::Redis)?;
            return Ok(1);
        }

        let keys = self.scan_keys().await?;
        let matching: Vec<String> = keys
            .into_iter()
            .filter(|k| parse_cache_key(k).2 == path)
            .map(|k| self.prefixed(&k))
            .collect();
        if matching.is_empty() {
            return Ok(0);
        }
        let count = matching.len();
        self.client
            .clone()
            .del::<_, ()>(matching)
            .await
            .map_err(BackendError::Redis)?;
        Ok(count)
    }

    async fn clear_pattern(&self, pattern: &str) -> Result<usize, BackendError> {
        let glob = glob::Pattern::new(pattern)
            .map_err(|e| BackendError::Operation(format!("invalid glob pattern: {e}")))?;
        let keys = self.scan_keys().await?;
        let matching: Vec<String> = keys
            .into_iter()
            .filter(|k| glob.matches(&parse_cache_key(k).2))
            .map(|k| self.prefixed(&k))
            .collect();
        if matching.is_empty() {
            return Ok(0);
        }
        let count = matching.len();
        self.client
            .clone()
            .del::<_, ()>(matching)
            .await
            .map_err(BackendError::Redis)?;
        Ok(count)
    }

    async fn len(&self) -> Result<usize, BackendError> {
        Ok(self.scan_keys().await?.len())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, BackendError> {
        Ok(self
            .scan_keys()
            .await?
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect())
    }

    async fn introspect(&self) -> Result<Vec<(String, ETagContent, Option<i64>)>, BackendError> {
        let keys = self.scan_keys().await?;
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            let mut conn = self.client.clone();
            let prefixed = self.prefixed(&key);
            let raw: Option<String> = conn.get(&prefixed).await.map_err(BackendError::Redis)?;
            let Some(raw) = raw else { continue };
            let value: ETagContent = serde_json::from_str(&raw)?;
            let ttl: i64 = conn.ttl(&prefixed).await.map_err(BackendError::Redis)?;
            let expiry = if ttl > 0 {
                Some(chrono::Utc::now().timestamp() + ttl)
            } else {
                None
            };
            out.push((key, value, expiry));
        }
        Ok(out)
    }
}
