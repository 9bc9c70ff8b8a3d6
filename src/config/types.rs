// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub files: FilesConfig,
    pub compression: CompressionConfig,
    pub cache: CacheConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Served tree configuration
#[derive(Debug, Deserialize, Clone)]
pub struct FilesConfig {
    /// Root of the served tree
    pub directory: PathBuf,
    /// Serve the root `index.html` for paths that match no file
    pub spa_mode: bool,
}

/// Precompression configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CompressionConfig {
    pub gzip: bool,
    pub brotli: bool,
    /// Files smaller than this many bytes get no sidecars
    pub threshold: u64,
}

/// Response cache and `Cache-Control` configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Upper bound on resident payload bytes
    pub byte_budget: u64,
    /// `max-age` value in seconds
    pub max_age: u64,
    /// Resources answered with `Cache-Control: no-store`
    #[serde(default)]
    pub no_store_paths: Vec<String>,
}

/// Basic authentication configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    /// Credential pair in `user:pass` form
    #[serde(default)]
    pub basic_auth: Option<String>,
    #[serde(default)]
    pub realm: Option<String>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Upper bound for a single connection, in seconds
    pub connection_timeout: u64,
    pub max_connections: Option<u64>,
}
