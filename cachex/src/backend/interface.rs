use async_trait::async_trait;

use crate::cache::content::ETagContent;

use super::error::BackendError;

/// Pluggable storage driver for cached responses.
///
/// Grounded on `actix-cloud`'s `MemoryDB` trait
/// (`memorydb/interface.rs`), generalized from string values to
/// [`ETagContent`] and extended with pattern-based clearing, since the
/// source library exposes `clear_path`/`clear_pattern` as first-class
/// operations rather than leaving them to the caller.
///
/// Drivers that cannot enumerate keys (e.g. Memcached) must still
/// implement `clear_path`/`clear_pattern`, but may degrade to a no-op
/// that emits a `tracing::warn!` rather than failing the call.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetch a cached value, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<ETagContent>, BackendError>;

    /// Store a value with an optional TTL in seconds. `None` never expires.
    async fn set(
        &self,
        key: &str,
        value: ETagContent,
        ttl: Option<u64>,
    ) -> Result<(), BackendError>;

    /// Remove a single key. Missing keys are not an error.
    async fn delete(&self, key: &str) -> Result<(), BackendError>;

    /// Remove every cached entry.
    async fn clear(&self) -> Result<(), BackendError>;

    /// Remove every cached entry whose path component exactly matches `path`.
    ///
    /// `include_params = false` removes only the entry with no query
    /// string; `include_params = true` removes every entry under `path`
    /// regardless of query string. Returns the number of entries removed.
    async fn clear_path(&self, path: &str, include_params: bool) -> Result<usize, BackendError>;

    /// Remove every cached entry whose path component matches the glob
    /// `pattern`, regardless of query string. Returns the number of
    /// entries removed.
    async fn clear_pattern(&self, pattern: &str) -> Result<usize, BackendError>;

    /// Number of entries currently stored, for monitoring routes.
    async fn len(&self) -> Result<usize, BackendError>;

    /// All keys starting with `prefix`, used by session enumeration
    /// (`clear_expired_sessions`, `delete_user_sessions`). Drivers that
    /// cannot enumerate keys return an empty list and log a warning
    /// rather than failing the call.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, BackendError>;

    /// Every `(key, value, expiry)` triple currently stored, for the
    /// `/cached-hits` monitoring route. Degrades the same way as
    /// [`Backend::keys`] on drivers without enumeration support.
    async fn introspect(&self) -> Result<Vec<(String, ETagContent, Option<i64>)>, BackendError>;
}
