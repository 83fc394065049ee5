use actix_web::dev::ServiceRequest;
use actix_web::http::header;

use super::config::{SessionConfig, TokenSource};

/// Pulls a raw session token string out of a request, trying each source
/// in `token_source_priority` order and returning the first hit.
///
/// Grounded on `original_source/fastapi_cachex/session/config.py`'s
/// `token_source_priority` field; the original dependency resolves the
/// same way, checking each source in turn rather than all at once.
pub fn extract_token(req: &ServiceRequest, config: &SessionConfig) -> Option<String> {
    for source in &config.token_source_priority {
        let found = match source {
            TokenSource::Cookie => req
                .cookie(&config.cookie_name)
                .map(|c| c.value().to_string()),
            TokenSource::Header => req
                .headers()
                .get(config.header_name.as_str())
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string()),
            TokenSource::Bearer => {
                if !config.use_bearer_token {
                    None
                } else {
                    req.headers()
                        .get(header::AUTHORIZATION)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.strip_prefix("Bearer "))
                        .map(|s| s.to_string())
                }
            }
        };
        if found.is_some() {
            return found;
        }
    }
    None
}
