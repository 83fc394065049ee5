/// Errors raised by cache backend drivers and the global backend proxy.
///
/// Grounded on `original_source/fastapi_cachex/exceptions.py`'s
/// `CacheXError` hierarchy and `proxy.py`'s `BackendNotFoundError`.
#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    #[error("no cache backend has been configured; call BackendProxy::set_backend first")]
    BackendNotFound,

    #[error("backend construction failed: {0}")]
    Construction(String),

    #[error("backend operation failed: {0}")]
    Operation(String),

    #[cfg(feature = "redis")]
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[cfg(feature = "memcache")]
    #[error("memcache error: {0}")]
    Memcache(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
