use std::collections::BTreeSet;

use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::backend::Backend;
use crate::cache::key::parse_cache_key;

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[derive(Serialize)]
struct CachedHit {
    cache_key: String,
    method: String,
    host: String,
    path: String,
    query_params: String,
    etag: String,
    is_expired: bool,
    ttl_remaining: Option<f64>,
}

#[derive(Serialize)]
struct Summary {
    total_cached_entries: usize,
    active_entries: usize,
    frequently_cached_routes: Vec<String>,
}

#[derive(Serialize)]
struct CachedHitsResponse {
    cached_hits: Vec<CachedHit>,
    total_hits: usize,
    valid_hits: usize,
    expired_hits: usize,
    unique_routes: usize,
    summary: Summary,
}

/// `GET {prefix}/cached-hits`: a read-only snapshot of everything the
/// configured backend currently holds.
///
/// Grounded on `original_source/tests/test_routes.py`'s
/// `TestCachedHitsRoute`: an unset backend reads as an all-zero, empty
/// response rather than an error, and `frequently_cached_routes` is
/// deduplicated — reproduced here via a `BTreeSet` for deterministic
/// ordering, since the source's set iteration order is incidental.
pub async fn cached_hits(backend: Option<web::Data<std::sync::Arc<dyn Backend>>>) -> HttpResponse {
    let Some(backend) = backend else {
        return HttpResponse::Ok().json(CachedHitsResponse {
            cached_hits: Vec::new(),
            total_hits: 0,
            valid_hits: 0,
            expired_hits: 0,
            unique_routes: 0,
            summary: Summary {
                total_cached_entries: 0,
                active_entries: 0,
                frequently_cached_routes: Vec::new(),
            },
        });
    };

    let entries = match backend.introspect().await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(error = %e, "failed to introspect cache backend");
            Vec::new()
        }
    };

    let cutoff = now();
    let mut routes = BTreeSet::new();
    let mut valid_hits = 0usize;
    let mut expired_hits = 0usize;

    let hits: Vec<CachedHit> = entries
        .into_iter()
        .map(|(key, value, expiry)| {
            let (method, host, path, query_params) = parse_cache_key(&key);
            let is_expired = matches!(expiry, Some(exp) if exp <= cutoff);
            if is_expired {
                expired_hits += 1;
            } else {
                valid_hits += 1;
            }
            if !path.is_empty() {
                routes.insert(path.clone());
            }
            CachedHit {
                cache_key: key,
                method,
                host,
                path,
                query_params,
                etag: value.etag,
                is_expired,
                ttl_remaining: expiry.map(|exp| (exp - cutoff).max(0) as f64),
            }
        })
        .collect();

    let total_hits = hits.len();
    HttpResponse::Ok().json(CachedHitsResponse {
        total_hits,
        valid_hits,
        expired_hits,
        unique_routes: routes.len(),
        summary: Summary {
            total_cached_entries: total_hits,
            active_entries: valid_hits,
            frequently_cached_routes: routes.into_iter().collect(),
        },
        cached_hits: hits,
    })
}

#[derive(Serialize)]
struct CachedRecord {
    cache_key: String,
    method: String,
    host: String,
    path: String,
    query_params: String,
    etag: String,
    content_type: &'static str,
    content_size: usize,
    content_preview: String,
    is_expired: bool,
    ttl_remaining: Option<f64>,
}

#[derive(Serialize)]
struct RecordsSummary {
    total_entries: usize,
    valid_entries: usize,
    estimated_cache_size_kb: f64,
}

#[derive(Serialize)]
struct CachedRecordsResponse {
    cached_records: Vec<CachedRecord>,
    total_records: usize,
    active_records: usize,
    expired_records: usize,
    unique_routes: usize,
    total_cache_size_bytes: usize,
    summary: RecordsSummary,
}

const CONTENT_PREVIEW_BYTES: usize = 100;

/// `GET {prefix}/cached-records`: the same introspection data as
/// `cached_hits`, enriched with per-entry content metadata (type, size,
/// a 100-byte preview) and a cache-size summary.
///
/// Grounded on `original_source/tests/test_routes.py`'s
/// `TestCachedRecordsRoute`: field names (`cached_records`,
/// `total_records`, `active_records`, `expired_records`,
/// `total_cache_size_bytes`, `summary.{total_entries,valid_entries,
/// estimated_cache_size_kb}`) differ from `cached_hits`'s, even though
/// both routes introspect the same backend.
pub async fn cached_records(
    backend: Option<web::Data<std::sync::Arc<dyn Backend>>>,
) -> HttpResponse {
    let Some(backend) = backend else {
        return HttpResponse::Ok().json(CachedRecordsResponse {
            cached_records: Vec::new(),
            total_records: 0,
            active_records: 0,
            expired_records: 0,
            unique_routes: 0,
            total_cache_size_bytes: 0,
            summary: RecordsSummary {
                total_entries: 0,
                valid_entries: 0,
                estimated_cache_size_kb: 0.0,
            },
        });
    };

    let entries = match backend.introspect().await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(error = %e, "failed to introspect cache backend");
            Vec::new()
        }
    };

    let cutoff = now();
    let mut routes = BTreeSet::new();
    let mut active_records = 0usize;
    let mut expired_records = 0usize;
    let mut total_cache_size_bytes = 0usize;

    let records: Vec<CachedRecord> = entries
        .into_iter()
        .map(|(key, value, expiry)| {
            let (method, host, path, query_params) = parse_cache_key(&key);
            let is_expired = matches!(expiry, Some(exp) if exp <= cutoff);
            if is_expired {
                expired_records += 1;
            } else {
                active_records += 1;
            }
            if !path.is_empty() {
                routes.insert(path.clone());
            }

            let content_type = match &value.content {
                crate::cache::content::Content::Bytes(_) => "bytes",
                crate::cache::content::Content::Text(_) | crate::cache::content::Content::Json(_) => "str",
            };
            let content_size = value.content.len();
            total_cache_size_bytes += content_size;

            CachedRecord {
                cache_key: key,
                method,
                host,
                path,
                query_params,
                etag: value.etag,
                content_type,
                content_size,
                content_preview: value.content.preview(CONTENT_PREVIEW_BYTES),
                is_expired,
                ttl_remaining: expiry.map(|exp| (exp - cutoff).max(0) as f64),
            }
        })
        .collect();

    let total_records = records.len();
    HttpResponse::Ok().json(CachedRecordsResponse {
        total_records,
        active_records,
        expired_records,
        unique_routes: routes.len(),
        total_cache_size_bytes,
        summary: RecordsSummary {
            total_entries: total_records,
            valid_entries: active_records,
            estimated_cache_size_kb: total_cache_size_bytes as f64 / 1024.0,
        },
        cached_records: records,
    })
}
