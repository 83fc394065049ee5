/// Errors raised while building or applying a cache configuration.
///
/// Grounded on `original_source/fastapi_cachex/cache.py`'s `CacheControl`
/// precedence logic: a `stale-while-revalidate`/`stale-if-error` directive
/// without a `stale_ttl` is a configuration error caught at decoration
/// time, not a runtime one.
#[derive(thiserror::Error, Debug)]
pub enum CacheConfigError {
    #[error("stale_ttl must be set when stale_while_revalidate or stale_if_error is used")]
    MissingStaleTtl,

    #[error("no_store cannot be combined with other Cache-Control directives")]
    NoStoreExclusive,

    #[error("invalid cache key builder output: {0}")]
    InvalidKey(String),
}

impl actix_web::ResponseError for CacheConfigError {
    fn error_response(&self) -> actix_web::HttpResponse {
        actix_web::HttpResponse::InternalServerError().body(self.to_string())
    }
}
