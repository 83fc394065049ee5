use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    body::{BoxBody, EitherBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{
        header::{self, HeaderValue},
        Method, StatusCode,
    },
    HttpResponse,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::backend::Backend;

use super::config::CacheConfig;
use super::content::{Content, ETagContent};
use super::key::{CacheKeyBuilder, DefaultCacheKeyBuilder, RequestParts};

/// Response-caching middleware.
///
/// Structured after `actix-cloud`'s `csrf::Middleware`/`MiddlewareService`
/// pair (`Rc`-shared state, boxed-future `call`), generalized to read
/// from and write to a pluggable [`Backend`] instead of checking a
/// cookie against a header.
///
/// Only `GET` and `HEAD` requests are considered cacheable; every other
/// method passes straight through.
pub struct CacheLayer {
    config: Rc<CacheConfig>,
    key_builder: Rc<dyn CacheKeyBuilder>,
    backend: Arc<dyn Backend>,
}

impl Clone for CacheLayer {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            key_builder: self.key_builder.clone(),
            backend: self.backend.clone(),
        }
    }
}

impl CacheLayer {
    pub fn new(config: CacheConfig, backend: Arc<dyn Backend>) -> Self {
        Self {
            config: Rc::new(config),
            key_builder: Rc::new(DefaultCacheKeyBuilder),
            backend,
        }
    }

    pub fn with_key_builder(mut self, key_builder: Rc<dyn CacheKeyBuilder>) -> Self {
        self.key_builder = key_builder;
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for CacheLayer
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: actix_web::body::MessageBody + 'static,
    B::Error: std::fmt::Debug + std::fmt::Display,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = CacheLayerService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CacheLayerService {
            service: Rc::new(service),
            config: self.config.clone(),
            key_builder: self.key_builder.clone(),
            backend: self.backend.clone(),
        }))
    }
}

pub struct CacheLayerService<S> {
    service: Rc<S>,
    config: Rc<CacheConfig>,
    key_builder: Rc<dyn CacheKeyBuilder>,
    backend: Arc<dyn Backend>,
}

impl<S> CacheLayerService<S> {
    fn cache_key(&self, req: &ServiceRequest) -> String {
        let conn = req.connection_info();
        let parts = RequestParts {
            host: conn.host().to_string(),
            method: req.method().clone(),
            path: req.path().to_string(),
            query: req.query_string().to_string(),
        };
        drop(conn);
        self.key_builder.build(&parts)
    }

    fn if_none_match(req: &ServiceRequest) -> Option<String> {
        req.headers()
            .get(header::IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
    }
}

impl<S, B> Service<ServiceRequest> for CacheLayerService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: actix_web::body::MessageBody + 'static,
    B::Error: std::fmt::Debug + std::fmt::Display,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if !matches!(*req.method(), Method::GET | Method::HEAD) {
            let srv = self.service.clone();
            return Box::pin(async move { Ok(srv.call(req).await?.map_into_left_body()) });
        }

        if let Err(e) = self.config.validate() {
            return Box::pin(async move { Err(e.into()) });
        }

        let srv = self.service.clone();
        let config = self.config.clone();
        let backend = self.backend.clone();
        let key = self.cache_key(&req);
        let if_none_match = Self::if_none_match(&req);

        Box::pin(async move {
            let cached = backend.get(&key).await.map_err(|e| {
                actix_web::error::ErrorInternalServerError(e)
            })?;

            if let Some(entry) = cached {
                if let Some(client_etag) = &if_none_match {
                    if etag_matches(client_etag, &entry.etag) {
                        return Ok(req.into_response(not_modified(&entry.etag)).map_into_right_body());
                    }
                }
                if !config.no_cache {
                    return Ok(req
                        .into_response(respond_with(&config, &entry))
                        .map_into_right_body());
                }
            }

            let res = srv.call(req).await?;
            let status = res.status();
            if status != StatusCode::OK {
                return Ok(res.map_into_left_body());
            }

            let (http_req, res) = res.into_parts();
            let (res, body) = res.into_parts();
            let bytes = match actix_web::body::to_bytes(body).await {
                Ok(b) => b,
                Err(e) => return Err(actix_web::error::ErrorInternalServerError(e)),
            };

            let etag = compute_etag(&bytes);
            let entry = ETagContent::new(etag.clone(), Content::Bytes(bytes.to_vec()));

            if !config.no_store && !config.no_cache && config.max_age.is_some() {
                let _ = backend.set(&key, entry.clone(), config.max_age).await;
            }

            if let Some(client_etag) = &if_none_match {
                if etag_matches(client_etag, &etag) {
                    let response = ServiceResponse::new(http_req, not_modified(&etag));
                    return Ok(response.map_into_right_body());
                }
            }

            let mut out = res.set_body(BoxBody::new(bytes));
            out.headers_mut().insert(
                header::ETAG,
                HeaderValue::from_str(&etag).unwrap_or(HeaderValue::from_static("")),
            );
            out.headers_mut().insert(
                header::CACHE_CONTROL,
                HeaderValue::from_str(&config.header_value()).unwrap_or(HeaderValue::from_static("")),
            );
            Ok(ServiceResponse::new(http_req, out).map_into_right_body())
        })
    }
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

fn not_modified(etag: &str) -> HttpResponse {
    HttpResponse::NotModified()
        .insert_header((header::ETAG, etag))
        .finish()
}

fn respond_with(config: &CacheConfig, entry: &ETagContent) -> HttpResponse {
    let mut builder = HttpResponse::Ok();
    builder.insert_header((header::ETAG, entry.etag.clone()));
    builder.insert_header((header::CACHE_CONTROL, config.header_value()));
    builder.body(entry.content.as_bytes().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn etag_match_ignores_weak_prefix() {
        assert!(etag_matches("W/\"abc\"", "\"abc\""));
        assert!(etag_matches("\"abc\"", "\"abc\""));
        assert!(!etag_matches("\"abc\"", "\"def\""));
    }
}
