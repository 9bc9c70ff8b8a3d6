//! Error types
//!
//! Startup errors are fatal and abort before the listener is bound.
//! Request-path errors are recovered by the handler and turned into responses.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised while building or starting the server
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("cache byte budget must be greater than zero")]
    InvalidCacheBudget,

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid listen address '{0}'")]
    InvalidAddress(String),

    #[error(transparent)]
    Compression(#[from] CompressionError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors produced by the precompression pass
#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("compression target does not exist: {}", .0.display())]
    TargetMissing(PathBuf),

    #[error("failed to compress {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Errors returned by the response cache
///
/// `Clone` so that every waiter of a coalesced population receives the same outcome.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("failed to read {}: {message}", path.display())]
    Read { path: PathBuf, message: String },
}

impl CacheError {
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;
