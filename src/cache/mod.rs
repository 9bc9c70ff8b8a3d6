//! In-memory response cache
//!
//! Holds immutable response payloads keyed by (relative path, encoding variant)
//! under a fixed byte budget.

pub mod item;
pub mod response_cache;
pub mod store;

pub use item::{CacheKey, ResponseItem};
pub use response_cache::{CacheOptions, CacheStats, ResponseCache};
pub use store::{ItemStore, LruStore};

/// Document served for the root, for directories and for SPA fallbacks
pub const INDEX_DOCUMENT: &str = "index.html";
