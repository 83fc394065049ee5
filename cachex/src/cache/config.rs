use super::error::CacheConfigError;

/// Visibility directive for a cached response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// Per-route cache behaviour, built once when a handler is decorated and
/// reused for every request it serves.
///
/// Grounded on `original_source/fastapi_cachex/cache.py`'s `cache()`
/// decorator parameters and its `CacheControl` directive-assembly order,
/// which this type reproduces in [`CacheConfig::header_value`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub max_age: Option<u64>,
    pub stale_ttl: Option<u64>,
    pub no_store: bool,
    pub no_cache: bool,
    pub must_revalidate: bool,
    pub visibility: Option<Visibility>,
    pub immutable: bool,
    pub stale_while_revalidate: bool,
    pub stale_if_error: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age: Some(60),
            stale_ttl: None,
            no_store: false,
            no_cache: false,
            must_revalidate: false,
            visibility: None,
            immutable: false,
            stale_while_revalidate: false,
            stale_if_error: false,
        }
    }
}

impl CacheConfig {
    /// Validates directive combinations that the source library rejects
    /// at decoration time rather than at request time.
    pub fn validate(&self) -> Result<(), CacheConfigError> {
        if (self.stale_while_revalidate || self.stale_if_error) && self.stale_ttl.is_none() {
            return Err(CacheConfigError::MissingStaleTtl);
        }
        Ok(())
    }

    /// Assembles the `Cache-Control` header value, honoring the
    /// precedence rules from the source's directive emission logic:
    /// `no-store` is exclusive of every other directive; `no-cache` and
    /// `must-revalidate` may combine but exclude `max-age`-based
    /// directives; visibility, `max-age`, staleness and `immutable`
    /// follow in that order otherwise.
    pub fn header_value(&self) -> String {
        let mut directives: Vec<String> = Vec::new();

        if self.no_store {
            return "no-store".to_string();
        }

        if self.no_cache {
            directives.push("no-cache".to_string());
            if self.must_revalidate {
                directives.push("must-revalidate".to_string());
            }
            return directives.join(", ");
        }

        if let Some(visibility) = self.visibility {
            directives.push(
                match visibility {
                    Visibility::Public => "public",
                    Visibility::Private => "private",
                }
                .to_string(),
            );
        }

        if let Some(max_age) = self.max_age {
            directives.push(format!("max-age={max_age}"));
        }

        if self.must_revalidate {
            directives.push("must-revalidate".to_string());
        }

        if self.stale_while_revalidate {
            if let Some(stale_ttl) = self.stale_ttl {
                directives.push(format!("stale-while-revalidate={stale_ttl}"));
            }
        }

        if self.stale_if_error {
            if let Some(stale_ttl) = self.stale_ttl {
                directives.push(format!("stale-if-error={stale_ttl}"));
            }
        }

        if self.immutable {
            directives.push("immutable".to_string());
        }

        directives.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_store_is_exclusive() {
        let config = CacheConfig {
            no_store: true,
            max_age: Some(30),
            ..Default::default()
        };
        assert_eq!(config.header_value(), "no-store");
    }

    #[test]
    fn no_cache_excludes_max_age() {
        let config = CacheConfig {
            no_cache: true,
            must_revalidate: true,
            max_age: Some(30),
            ..Default::default()
        };
        assert_eq!(config.header_value(), "no-cache, must-revalidate");
    }

    #[test]
    fn must_revalidate_without_no_cache_joins_the_ordered_sequence() {
        let config = CacheConfig {
            max_age: Some(60),
            visibility: Some(Visibility::Public),
            must_revalidate: true,
            ..Default::default()
        };
        assert_eq!(
            config.header_value(),
            "public, max-age=60, must-revalidate"
        );
    }

    #[test]
    fn public_max_age_and_immutable() {
        let config = CacheConfig {
            max_age: Some(3600),
            visibility: Some(Visibility::Public),
            immutable: true,
            ..Default::default()
        };
        assert_eq!(config.header_value(), "public, max-age=3600, immutable");
    }

    #[test]
    fn stale_directives_require_stale_ttl() {
        let config = CacheConfig {
            stale_while_revalidate: true,
            stale_ttl: None,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CacheConfigError::MissingStaleTtl)
        ));
    }

    #[test]
    fn stale_while_revalidate_rendered_with_ttl() {
        let config = CacheConfig {
            max_age: Some(60),
            stale_while_revalidate: true,
            stale_ttl: Some(120),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(
            config.header_value(),
            "max-age=60, stale-while-revalidate=120"
        );
    }
}
