// Application state module
// Shared, immutable-after-startup state handed to every connection

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use super::types::Config;
use crate::cache::{CacheOptions, ResponseCache};
use crate::error::ServerError;
use crate::handler::auth::BasicAuth;
use crate::http::{CacheControlRules, ContentNegotiator};
use crate::logger::AccessLogFormat;

/// Application state
pub struct AppState {
    pub config: Config,
    pub cache: ResponseCache,
    pub negotiator: ContentNegotiator,
    pub cache_rules: CacheControlRules,
    pub auth: Option<BasicAuth>,
    pub access_log_format: AccessLogFormat,

    // Cached config values for fast access on the request path
    pub cached_access_log: AtomicBool,

    /// Connections currently being served
    pub open_connections: AtomicU64,
}

impl AppState {
    /// Build the state for `config`
    ///
    /// Fails on invalid configuration, such as a zero cache byte budget, so the
    /// server never starts in a degraded mode.
    pub fn new(config: Config) -> Result<Self, ServerError> {
        let cache = ResponseCache::new(CacheOptions {
            root: config.files.directory.clone(),
            spa_mode: config.files.spa_mode,
            enabled: config.cache.enabled,
            byte_budget: config.cache.byte_budget,
        })?;

        Ok(Self {
            negotiator: ContentNegotiator::new(config.compression.gzip, config.compression.brotli),
            cache_rules: CacheControlRules::new(
                config.cache.max_age,
                &config.cache.no_store_paths,
            ),
            auth: BasicAuth::from_config(&config.auth),
            access_log_format: AccessLogFormat::parse(&config.logging.access_log_format),
            cached_access_log: AtomicBool::new(config.logging.access_log),
            open_connections: AtomicU64::new(0),
            cache,
            config,
        })
    }

    pub fn access_log_enabled(&self) -> bool {
        self.cached_access_log.load(Ordering::Relaxed)
    }

    /// Reserve a connection slot, honouring `performance.max_connections`
    pub fn try_acquire_connection(&self) -> bool {
        let limit = self.config.performance.max_connections;
        self.open_connections
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |open| match limit {
                Some(max) if open >= max => None,
                _ => Some(open + 1),
            })
            .is_ok()
    }

    pub fn release_connection(&self) {
        self.open_connections.fetch_sub(1, Ordering::AcqRel);
    }
}
