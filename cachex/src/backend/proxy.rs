use std::sync::Arc;

use parking_lot::RwLock;

use super::error::BackendError;
use super::interface::Backend;

/// Process-wide slot holding the active cache backend.
///
/// Grounded on `original_source/fastapi_cachex/proxy.py`'s
/// `BackendProxy`/module-global `_default_backend`: a resettable global
/// that panics-free callers query via `get_backend`, which returns
/// [`BackendError::BackendNotFound`] rather than raising when unset.
pub struct BackendProxy {
    slot: RwLock<Option<Arc<dyn Backend>>>,
}

impl BackendProxy {
    pub const fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    pub fn set_backend(&self, backend: Arc<dyn Backend>) {
        tracing::info!(backend = std::any::type_name::<dyn Backend>(), "cache backend set");
        *self.slot.write() = Some(backend);
    }

    pub fn get_backend(&self) -> Result<Arc<dyn Backend>, BackendError> {
        self.slot
            .read()
            .clone()
            .ok_or(BackendError::BackendNotFound)
    }

    pub fn clear_backend(&self) {
        *self.slot.write() = None;
    }
}

impl Default for BackendProxy {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide default backend, used by the `#[cached(...)]` attribute
/// macro and anything else that cannot have a backend threaded through
/// it explicitly. Equivalent to `original_source/fastapi_cachex/proxy.py`'s
/// module-global `_default_backend`.
pub static GLOBAL_BACKEND: BackendProxy = BackendProxy::new();

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;

    #[test]
    fn unset_backend_errors() {
        let proxy = BackendProxy::new();
        assert!(matches!(
            proxy.get_backend(),
            Err(BackendError::BackendNotFound)
        ));
    }

    #[test]
    fn set_then_get_backend() {
        let proxy = BackendProxy::new();
        proxy.set_backend(Arc::new(MemoryBackend::new()));
        assert!(proxy.get_backend().is_ok());
        proxy.clear_backend();
        assert!(proxy.get_backend().is_err());
    }
}
