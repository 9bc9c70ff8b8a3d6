//! HTTP cache control module
//!
//! Decides the `Cache-Control` header for a served resource.

use crate::cache::INDEX_DOCUMENT;

/// Cache control policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Cacheable for the given number of seconds
    MaxAge(u64),
    /// Never stored by clients or intermediaries
    NoStore,
}

impl CachePolicy {
    /// Convert to Cache-Control header value
    pub fn to_header_value(self) -> String {
        match self {
            Self::MaxAge(max_age) => format!("max-age={max_age}"),
            Self::NoStore => "no-store".to_string(),
        }
    }
}

/// Per-server `Cache-Control` rules
#[derive(Debug, Clone)]
pub struct CacheControlRules {
    max_age: u64,
    /// Relative paths without leading slash
    no_store: Vec<String>,
}

impl CacheControlRules {
    pub fn new(max_age: u64, no_store_paths: &[String]) -> Self {
        let no_store = no_store_paths
            .iter()
            .map(|p| p.trim_start_matches('/').to_string())
            .collect();
        Self { max_age, no_store }
    }

    /// Policy for the resource at `relative_path` (as resolved by the cache)
    ///
    /// The root index document is always `no-store` so that a new deployment is
    /// picked up immediately, whichever URL led to it.
    pub fn policy_for(&self, relative_path: &str) -> CachePolicy {
        if relative_path.is_empty()
            || relative_path == INDEX_DOCUMENT
            || self.no_store.iter().any(|p| p == relative_path)
        {
            CachePolicy::NoStore
        } else {
            CachePolicy::MaxAge(self.max_age)
        }
    }
}
