// Configuration module entry point
// Loads the server configuration and holds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

use crate::error::ServerError;

// Re-export public types
pub use state::AppState;
pub use types::{
    AuthConfig, CacheConfig, CompressionConfig, Config, FilesConfig, LoggingConfig,
    PerformanceConfig, ServerConfig,
};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from the default `config.toml` plus environment
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// The file is optional. Environment variables prefixed `SPA__` override it,
    /// e.g. `SPA__CACHE__BYTE_BUDGET=1048576`.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("SPA")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cache.no_store_paths")
                    .try_parsing(true),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("files.directory", "./dist")?
            .set_default("files.spa_mode", true)?
            .set_default("compression.gzip", true)?
            .set_default("compression.brotli", true)?
            .set_default("compression.threshold", 1024)?
            .set_default("cache.enabled", true)?
            .set_default("cache.byte_budget", 52_428_800)? // 50MB
            .set_default("cache.max_age", 604_800)? // 7 days
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.connection_timeout", 30)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse().map_err(|_| ServerError::InvalidAddress(addr))
    }

    /// Any precompression codec enabled
    pub const fn compression_enabled(&self) -> bool {
        self.compression.gzip || self.compression.brotli
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::path::Path;

    /// Build a config rooted at `root` with every feature on and a 50KB budget
    pub fn config_for(root: &Path) -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                workers: None,
            },
            files: FilesConfig {
                directory: root.to_path_buf(),
                spa_mode: true,
            },
            compression: CompressionConfig {
                gzip: true,
                brotli: true,
                threshold: 1024,
            },
            cache: CacheConfig {
                enabled: true,
                byte_budget: 50 * 1024,
                max_age: 604_800,
                no_store_paths: Vec::new(),
            },
            auth: AuthConfig::default(),
            logging: LoggingConfig {
                access_log: false,
                access_log_format: "combined".to_string(),
                access_log_file: None,
                error_log_file: None,
            },
            performance: PerformanceConfig {
                keep_alive: true,
                connection_timeout: 30,
                max_connections: None,
            },
        }
    }
}
