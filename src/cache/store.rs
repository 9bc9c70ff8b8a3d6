//! Eviction policies
//!
//! The response cache owns byte accounting; a store only decides ordering and
//! which entry goes first when the budget is exceeded.

use lru::LruCache;
use std::sync::Arc;

use super::item::{CacheKey, ResponseItem};

/// Keyed storage with an eviction order
pub trait ItemStore: Send {
    /// Look up an entry, recording the access
    fn get(&mut self, key: &CacheKey) -> Option<Arc<ResponseItem>>;

    /// Insert an entry, returning the one it replaced
    fn put(&mut self, key: CacheKey, item: Arc<ResponseItem>) -> Option<Arc<ResponseItem>>;

    /// Remove and return the next entry to evict
    fn pop_victim(&mut self) -> Option<(CacheKey, Arc<ResponseItem>)>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&mut self);
}

/// Least-recently-used eviction (default)
pub struct LruStore {
    entries: LruCache<CacheKey, Arc<ResponseItem>>,
}

impl LruStore {
    pub fn new() -> Self {
        // Capacity is bounded by bytes in the cache, not by entry count
        Self {
            entries: LruCache::unbounded(),
        }
    }
}

impl Default for LruStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemStore for LruStore {
    fn get(&mut self, key: &CacheKey) -> Option<Arc<ResponseItem>> {
        self.entries.get(key).map(Arc::clone)
    }

    fn put(&mut self, key: CacheKey, item: Arc<ResponseItem>) -> Option<Arc<ResponseItem>> {
        self.entries.put(key, item)
    }

    fn pop_victim(&mut self) -> Option<(CacheKey, Arc<ResponseItem>)> {
        self.entries.pop_lru()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::encoding::EncodingVariant;
    use hyper::body::Bytes;

    fn item(name: &str) -> Arc<ResponseItem> {
        Arc::new(ResponseItem::new(
            name.to_string(),
            name.to_string(),
            "text/plain".to_string(),
            Bytes::from(name.to_string()),
            EncodingVariant::Identity,
        ))
    }

    fn key(name: &str) -> CacheKey {
        CacheKey::new(name, EncodingVariant::Identity)
    }

    #[test]
    fn test_victim_is_least_recently_used() {
        let mut store = LruStore::new();
        store.put(key("a"), item("a"));
        store.put(key("b"), item("b"));
        store.put(key("c"), item("c"));

        // Touch "a" so "b" becomes the oldest access
        assert!(store.get(&key("a")).is_some());

        let (victim, _) = store.pop_victim().unwrap();
        assert_eq!(victim, key("b"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_put_returns_replaced() {
        let mut store = LruStore::new();
        assert!(store.put(key("a"), item("a")).is_none());
        let old = store.put(key("a"), item("a2")).unwrap();
        assert_eq!(old.name, "a");
        assert_eq!(store.len(), 1);

        store.clear();
        assert!(store.is_empty());
        assert!(store.pop_victim().is_none());
    }

    #[test]
    fn test_variants_are_distinct_keys() {
        let mut store = LruStore::new();
        store.put(key("a"), item("a"));
        store.put(CacheKey::new("a", EncodingVariant::Gzip), item("a.gz"));
        assert_eq!(store.len(), 2);
        assert_eq!(
            store
                .get(&CacheKey::new("a", EncodingVariant::Gzip))
                .unwrap()
                .name,
            "a.gz"
        );
    }
}
