use actix_web::http::Method;

/// Separator used to join the components of a cache key.
///
/// Chosen, per `original_source/fastapi_cachex/types.py`, to avoid
/// colliding with the `:` that appears in `host:port` pairs and in IPv6
/// literals, which a naive colon-joined key would mangle.
pub const CACHE_KEY_SEPARATOR: &str = "|||";

/// The request attributes a [`CacheKeyBuilder`] may draw on.
#[derive(Debug, Clone)]
pub struct RequestParts {
    pub host: String,
    pub method: Method,
    pub path: String,
    pub query: String,
}

/// Builds the string used to look up and store a cached response.
///
/// A trait rather than a free function so callers can vary the key shape
/// (e.g. ignore query parameters, fold in a header) the way the source
/// library lets a decorator accept a custom key function.
pub trait CacheKeyBuilder: Send + Sync {
    fn build(&self, parts: &RequestParts) -> String;
}

/// Default key shape: `method|||host|||path|||query`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCacheKeyBuilder;

impl CacheKeyBuilder for DefaultCacheKeyBuilder {
    fn build(&self, parts: &RequestParts) -> String {
        format!(
            "{}{sep}{}{sep}{}{sep}{}",
            parts.method,
            parts.host,
            parts.path,
            parts.query,
            sep = CACHE_KEY_SEPARATOR
        )
    }
}

/// Inverse of [`CacheKeyBuilder::build`] for the default key shape.
///
/// Returns four empty strings on any malformed input rather than
/// panicking or erroring, matching
/// `original_source/tests/test_cache_key.py`'s sentinel behavior for
/// keys that were never produced by `DefaultCacheKeyBuilder`.
pub fn parse_cache_key(key: &str) -> (String, String, String, String) {
    let parts: Vec<&str> = key.split(CACHE_KEY_SEPARATOR).collect();
    if parts.len() != 4 {
        return (String::new(), String::new(), String::new(), String::new());
    }
    (
        parts[0].to_string(),
        parts[1].to_string(),
        parts[2].to_string(),
        parts[3].to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(host: &str, path: &str, query: &str) -> RequestParts {
        RequestParts {
            host: host.to_string(),
            method: Method::GET,
            path: path.to_string(),
            query: query.to_string(),
        }
    }

    #[test]
    fn round_trips_host_with_port() {
        let builder = DefaultCacheKeyBuilder;
        let key = builder.build(&parts("example.com:8080", "/users", "id=1"));
        let (method, host, path, query) = parse_cache_key(&key);
        assert_eq!(method, "GET");
        assert_eq!(host, "example.com:8080");
        assert_eq!(path, "/users");
        assert_eq!(query, "id=1");
    }

    #[test]
    fn preserves_ipv6_literal() {
        let builder = DefaultCacheKeyBuilder;
        let key = builder.build(&parts("[::1]:8080", "/health", ""));
        let (_, host, path, _) = parse_cache_key(&key);
        assert_eq!(host, "[::1]:8080");
        assert_eq!(path, "/health");
    }

    #[test]
    fn malformed_key_returns_empty_sentinels() {
        let (method, host, path, query) = parse_cache_key("not-a-cache-key");
        assert_eq!(method, "");
        assert_eq!(host, "");
        assert_eq!(path, "");
        assert_eq!(query, "");
    }
}
