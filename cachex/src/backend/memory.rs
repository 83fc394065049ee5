use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use glob::Pattern;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cache::content::{CacheItem, ETagContent};
use crate::cache::key::parse_cache_key;

use super::error::BackendError;
use super::interface::Backend;

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// In-process cache backend, grounded on `actix-cloud`'s `DefaultBackend`
/// (`memorydb/default.rs`) but simplified from a priority-queue eviction
/// scheme to a periodic sweep, and switched from `parking_lot::RwLock` to
/// a single `tokio::sync::Mutex` held for the duration of each operation,
/// per the source library's `MemoryBackend`
/// (`original_source/fastapi_cachex/backends/memory.py`) which protects
/// its dict with one `asyncio.Lock`.
///
/// The background sweeper mirrors `MemoryBackend.start_cleanup`/
/// `stop_cleanup`: idempotent start, a cancellable loop instead of a
/// bare `asyncio.Task`, and a swallowed cancellation on stop.
pub struct MemoryBackend {
    data: Arc<Mutex<HashMap<String, CacheItem>>>,
    cleanup_interval: Duration,
    sweeper: Mutex<Option<(JoinHandle<()>, CancellationToken)>>,
    running: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_cleanup_interval(Duration::from_secs(60))
    }

    pub fn with_cleanup_interval(cleanup_interval: Duration) -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            cleanup_interval,
            sweeper: Mutex::new(None),
            running: AtomicBool::new(false),
        }
    }

    /// Starts the background sweep task. Calling this more than once is a
    /// no-op, matching the source's `start_cleanup` guard on
    /// `self._cleanup_task`.
    pub async fn start_cleanup(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let token = CancellationToken::new();
        let data = self.data.clone();
        let interval = self.cleanup_interval;
        let child_token = token.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = child_token.cancelled() => break,
                    _ = ticker.tick() => {
                        let cutoff = now();
                        let mut guard = data.lock().await;
                        guard.retain(|_, item| item.is_valid(cutoff));
                    }
                }
            }
        });
        *self.sweeper.lock().await = Some((handle, token));
    }

    /// Stops the background sweep task. A no-op if it was never started.
    pub async fn stop_cleanup(&self) {
        if let Some((handle, token)) = self.sweeper.lock().await.take() {
            token.cancel();
            let _ = handle.await;
        }
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<ETagContent>, BackendError> {
        let cutoff = now();
        let mut guard = self.data.lock().await;
        match guard.get(key) {
            Some(item) if item.is_valid(cutoff) => Ok(Some(item.value.clone())),
            Some(_) => {
                guard.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        key: &str,
        value: ETagContent,
        ttl: Option<u64>,
    ) -> Result<(), BackendError> {
        let expiry = ttl.map(|secs| now().saturating_add(secs as i64));
        self.data
            .lock()
            .await
            .insert(key.to_owned(), CacheItem::new(value, expiry));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        self.data.lock().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), BackendError> {
        self.data.lock().await.clear();
        Ok(())
    }

    async fn clear_path(&self, path: &str, include_params: bool) -> Result<usize, BackendError> {
        let mut guard = self.data.lock().await;
        let before = guard.len();
        guard.retain(|key, _| {
            let (_, _, parsed_path, query) = parse_cache_key(key);
            !(parsed_path == path && (include_params || query.is_empty()))
        });
        Ok(before - guard.len())
    }

    async fn clear_pattern(&self, pattern: &str) -> Result<usize, BackendError> {
        let glob = Pattern::new(pattern)
            .map_err(|e| BackendError::Operation(format!("invalid glob pattern: {e}")))?;
        let mut guard = self.data.lock().await;
        let before = guard.len();
        guard.retain(|key, _| !glob.matches(&parse_cache_key(key).2));
        Ok(before - guard.len())
    }

    async fn len(&self) -> Result<usize, BackendError> {
        Ok(self.data.lock().await.len())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, BackendError> {
        let cutoff = now();
        let guard = self.data.lock().await;
        Ok(guard
            .iter()
            .filter(|(k, v)| k.starts_with(prefix) && v.is_valid(cutoff))
            .map(|(k, _)| k.clone())
            .collect())
    }

    async fn introspect(&self) -> Result<Vec<(String, ETagContent, Option<i64>)>, BackendError> {
        let guard = self.data.lock().await;
        Ok(guard
            .iter()
            .map(|(k, v)| (k.clone(), v.value.clone(), v.expiry))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::content::Content;

    fn item(text: &str) -> ETagContent {
        ETagContent::new(format!("\"{text}\""), Content::Text(text.to_string()))
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let backend = MemoryBackend::new();
        backend.set("k", item("v"), None).await.unwrap();
        let got = backend.get("k").await.unwrap().unwrap();
        assert_eq!(got.content, Content::Text("v".to_string()));
    }

    #[tokio::test]
    async fn expired_entry_reads_as_absent() {
        let backend = MemoryBackend::new();
        backend.set("k", item("v"), Some(0)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(backend.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_path_removes_matching_entries() {
        let backend = MemoryBackend::new();
        let key = format!("GET{sep}host{sep}/users{sep}", sep = crate::cache::key::CACHE_KEY_SEPARATOR);
        backend.set(&key, item("v"), None).await.unwrap();
        let removed = backend.clear_path("/users", true).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(backend.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn clear_path_without_params_spares_queried_entries() {
        let backend = MemoryBackend::new();
        let sep = crate::cache::key::CACHE_KEY_SEPARATOR;
        let bare = format!("GET{sep}h{sep}/a{sep}");
        let queried = format!("GET{sep}h{sep}/a{sep}x=1");
        backend.set(&bare, item("v"), None).await.unwrap();
        backend.set(&queried, item("v"), None).await.unwrap();

        let removed = backend.clear_path("/a", false).await.unwrap();

        assert_eq!(removed, 1);
        assert!(backend.get(&bare).await.unwrap().is_none());
        assert!(backend.get(&queried).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn start_cleanup_is_idempotent() {
        let backend = Arc::new(MemoryBackend::with_cleanup_interval(Duration::from_millis(50)));
        backend.start_cleanup().await;
        backend.start_cleanup().await;
        backend.stop_cleanup().await;
    }
}
