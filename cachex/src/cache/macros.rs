use std::future::Future;

use actix_web::http::{
    header::{self, HeaderValue},
    StatusCode,
};
use actix_web::{HttpRequest, HttpResponse};

use crate::backend::{BackendError, GLOBAL_BACKEND};

use super::config::CacheConfig;
use super::content::{Content, ETagContent};
use super::key::{CacheKeyBuilder, DefaultCacheKeyBuilder, RequestParts};

/// Runtime support for the `#[cached(...)]` attribute macro
/// (`cachex-codegen`). Not meant to be called directly; kept public only
/// because the macro expands into a call to it from the caller's crate.
///
/// Reads through [`GLOBAL_BACKEND`] rather than [`crate::cache::CacheLayer`]'s
/// explicit `Arc<dyn Backend>`, since a handler-level attribute has no
/// access to the `App::wrap` chain's middleware state. If no backend has
/// been installed yet, a default in-process memory backend is installed
/// lazily on first use rather than bypassing the cache.
pub async fn cached_call<F, Fut>(req: &HttpRequest, config: CacheConfig, handler: F) -> HttpResponse
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = HttpResponse>,
{
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "invalid #[cached] configuration");
        return HttpResponse::from_error(e);
    }

    let backend = match GLOBAL_BACKEND.get_backend() {
        Ok(backend) => backend,
        Err(BackendError::BackendNotFound) => match install_default_backend() {
            Some(backend) => backend,
            None => return handler().await,
        },
        Err(e) => return HttpResponse::from_error(actix_web::error::ErrorInternalServerError(e)),
    };

    let conn = req.connection_info();
    let key = DefaultCacheKeyBuilder.build(&RequestParts {
        host: conn.host().to_string(),
        method: req.method().clone(),
        path: req.path().to_string(),
        query: req.query_string().to_string(),
    });
    drop(conn);

    let if_none_match = req
        .headers()
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if let Ok(Some(entry)) = backend.get(&key).await {
        if let Some(client_etag) = &if_none_match {
            if etag_matches(client_etag, &entry.etag) {
                return HttpResponse::NotModified()
                    .insert_header((header::ETAG, entry.etag))
                    .finish();
            }
        }
        if !config.no_cache {
            return respond_with(&config, &entry);
        }
    }

    let response = handler().await;
    let status = response.status();
    let (parts, body) = response.into_parts();
    if status != StatusCode::OK || config.no_store {
        return parts.set_body(body);
    }

    let bytes = match actix_web::body::to_bytes(body).await {
        Ok(bytes) => bytes,
        Err(_) => return parts.set_body(actix_web::body::BoxBody::new(())),
    };
    let etag = compute_etag(&bytes);
    let entry = ETagContent::new(etag.clone(), Content::Bytes(bytes.to_vec()));
    if !config.no_cache && config.max_age.is_some() {
        let _ = backend.set(&key, entry, config.max_age).await;
    }

    let mut out = parts.set_body(actix_web::body::BoxBody::new(bytes));
    out.headers_mut().insert(
        header::ETAG,
        HeaderValue::from_str(&etag).unwrap_or(HeaderValue::from_static("")),
    );
    out.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_str(&config.header_value()).unwrap_or(HeaderValue::from_static("")),
    );
    out
}

/// Installs a default in-process memory backend into [`GLOBAL_BACKEND`]
/// and returns it, per the documented recovery behavior for
/// `BackendNotFoundError`. Returns `None` when the `memory` feature is
/// disabled, so the caller falls back to an uncached call instead.
#[cfg(feature = "memory")]
fn install_default_backend() -> Option<std::sync::Arc<dyn crate::backend::Backend>> {
    tracing::info!("no cache backend configured; installing default in-process memory backend");
    let backend: std::sync::Arc<dyn crate::backend::Backend> =
        std::sync::Arc::new(crate::backend::memory::MemoryBackend::new());
    GLOBAL_BACKEND.set_backend(backend.clone());
    Some(backend)
}

#[cfg(not(feature = "memory"))]
fn install_default_backend() -> Option<std::sync::Arc<dyn crate::backend::Backend>> {
    None
}

fn compute_etag(bytes: &actix_web::web::Bytes) -> String {
    let digest = md5::compute(bytes.as_ref());
    format!("W/\"{:x}\"", digest)
}

fn strip_weak(s: &str) -> &str {
    s.strip_prefix("W/").unwrap_or(s)
}

fn etag_matches(client_etag: &str, stored_etag: &str) -> bool {
    strip_weak(client_etag) == strip_weak(stored_etag)
}

fn respond_with(config: &CacheConfig, entry: &ETagContent) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((header::ETAG, entry.etag.clone()))
        .insert_header((header::CACHE_CONTROL, config.header_value()))
        .body(entry.content.as_bytes().into_owned())
}
