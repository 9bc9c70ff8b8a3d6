//! Static asset server for single-page applications
//!
//! Serves a directory tree with precompressed `.gz`/`.br` sidecars, SPA
//! fallback routing, a byte-bounded in-memory response cache and optional
//! HTTP Basic authentication.

pub mod cache;
pub mod compression;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

pub use error::{CacheError, CompressionError, Result, ServerError};
