//! Bounded response cache
//!
//! Entries are populated lazily on first request and never change afterwards.
//! Resident payload bytes never exceed the configured budget; an item larger
//! than the whole budget is served without being stored.

use hyper::body::Bytes;
use std::collections::HashMap;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::fs;
use tokio::sync::OnceCell;

use super::item::{CacheKey, ResponseItem};
use super::store::{ItemStore, LruStore};
use super::INDEX_DOCUMENT;
use crate::error::{CacheError, ServerError};
use crate::http::encoding::EncodingVariant;
use crate::http::mime;
use crate::logger;

type Population = Result<Arc<ResponseItem>, CacheError>;

/// Pending population shared by every request for the same missing key
type Flight = Arc<OnceCell<Population>>;

/// Settings the cache is built from
#[derive(Debug, Clone)]
pub struct CacheOptions {
    pub root: PathBuf,
    pub spa_mode: bool,
    pub enabled: bool,
    pub byte_budget: u64,
}

/// Point-in-time cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    /// Disk reads performed
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
    pub resident_bytes: u64,
    pub byte_budget: u64,
}

struct CacheState<S> {
    store: S,
    resident_bytes: u64,
}

/// Keyed store of immutable responses with single-flight population
pub struct ResponseCache<S: ItemStore = LruStore> {
    root: PathBuf,
    spa_mode: bool,
    enabled: bool,
    byte_budget: u64,
    state: Mutex<CacheState<S>>,
    inflight: Mutex<HashMap<CacheKey, Flight>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl ResponseCache<LruStore> {
    /// Create an empty LRU cache
    ///
    /// Fails when the byte budget is zero.
    pub fn new(options: CacheOptions) -> Result<Self, ServerError> {
        Self::with_store(options, LruStore::new())
    }
}

impl<S: ItemStore> ResponseCache<S> {
    /// Create an empty cache using a custom eviction policy
    pub fn with_store(options: CacheOptions, store: S) -> Result<Self, ServerError> {
        if options.byte_budget == 0 {
            return Err(ServerError::InvalidCacheBudget);
        }

        Ok(Self {
            root: options.root,
            spa_mode: options.spa_mode,
            enabled: options.enabled,
            byte_budget: options.byte_budget,
            state: Mutex::new(CacheState {
                store,
                resident_bytes: 0,
            }),
            inflight: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        })
    }

    /// Return the cached item for `(relative_path, variant)`, reading it on first use
    ///
    /// `relative_path` must already be normalized (see `handler::path::resolve`).
    /// The root, any directory and, in SPA mode, any missing path resolve to the
    /// root index document, whose own content type then replaces `content_type`.
    pub async fn get_or_create(
        &self,
        relative_path: &str,
        variant: EncodingVariant,
        content_type: &str,
    ) -> Result<Arc<ResponseItem>, CacheError> {
        let requested = CacheKey::new(relative_path, variant);
        if let Some(item) = self.lookup(&requested) {
            return Ok(item);
        }

        let resolved = self.resolve_source(relative_path).await?;
        let (key, content_type) = if resolved == relative_path {
            (requested, content_type)
        } else {
            let content_type = mime::content_type_for(Path::new(&resolved));
            let key = CacheKey::new(resolved, variant);
            if let Some(item) = self.lookup(&key) {
                return Ok(item);
            }
            (key, content_type)
        };

        let guard = FlightGuard {
            cache: self,
            key: &key,
            flight: self.flight_for(&key),
        };
        let population = guard
            .flight
            .get_or_init(|| self.populate(&key, content_type))
            .await
            .clone();
        population
    }

    pub fn stats(&self) -> CacheStats {
        let state = lock(&self.state);
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: state.store.len(),
            resident_bytes: state.resident_bytes,
            byte_budget: self.byte_budget,
        }
    }

    /// Drop every entry (used at shutdown)
    pub fn clear(&self) {
        let mut state = lock(&self.state);
        state.store.clear();
        state.resident_bytes = 0;
    }

    fn lookup(&self, key: &CacheKey) -> Option<Arc<ResponseItem>> {
        if !self.enabled {
            return None;
        }
        let item = lock(&self.state).store.get(key)?;
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(item)
    }

    /// Map a requested path to the logical resource to read
    async fn resolve_source(&self, relative_path: &str) -> Result<String, CacheError> {
        if relative_path.is_empty() {
            return Ok(INDEX_DOCUMENT.to_string());
        }
        if !is_contained(relative_path) {
            return Err(CacheError::NotFound(relative_path.to_string()));
        }

        match fs::metadata(self.root.join(relative_path)).await {
            Ok(meta) if meta.is_dir() => Ok(INDEX_DOCUMENT.to_string()),
            Ok(_) => Ok(relative_path.to_string()),
            Err(_) if self.spa_mode => Ok(INDEX_DOCUMENT.to_string()),
            Err(_) => Err(CacheError::NotFound(relative_path.to_string())),
        }
    }

    /// File holding the bytes for `key`: the source itself or its sidecar
    fn file_for(&self, key: &CacheKey) -> PathBuf {
        let source = self.root.join(&key.path);
        match key.variant.sidecar_extension() {
            None => source,
            Some(ext) => {
                let mut name = OsString::from(source);
                name.push(".");
                name.push(ext);
                PathBuf::from(name)
            }
        }
    }

    async fn populate(&self, key: &CacheKey, content_type: &str) -> Population {
        // A previous flight for this key may have completed after our lookup
        if let Some(item) = self.lookup(key) {
            return Ok(item);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let file = self.file_for(key);
        let payload = match fs::read(&file).await {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CacheError::NotFound(key.path.clone()));
            }
            Err(e) => {
                return Err(CacheError::Read {
                    path: file,
                    message: e.to_string(),
                });
            }
        };

        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let item = Arc::new(ResponseItem::new(
            name,
            key.path.clone(),
            content_type.to_string(),
            payload,
            key.variant,
        ));

        if self.enabled {
            self.insert(key.clone(), Arc::clone(&item));
        }
        Ok(item)
    }

    fn insert(&self, key: CacheKey, item: Arc<ResponseItem>) {
        let size = item.size();
        if size > self.byte_budget {
            logger::log_cache_oversize(&item.name, size, self.byte_budget);
            return;
        }

        let mut evicted = 0;
        {
            let mut state = lock(&self.state);
            if let Some(old) = state.store.put(key, item) {
                state.resident_bytes -= old.size();
            }
            state.resident_bytes += size;

            while state.resident_bytes > self.byte_budget {
                let Some((_, victim)) = state.store.pop_victim() else {
                    break;
                };
                state.resident_bytes -= victim.size();
                evicted += 1;
            }
        }

        if evicted > 0 {
            self.evictions.fetch_add(evicted, Ordering::Relaxed);
            logger::log_cache_eviction(evicted, self.byte_budget);
        }
    }

    fn flight_for(&self, key: &CacheKey) -> Flight {
        let mut inflight = lock(&self.inflight);
        Arc::clone(inflight.entry(key.clone()).or_default())
    }

    fn finish_flight(&self, key: &CacheKey, flight: &Flight) {
        let mut inflight = lock(&self.inflight);
        if inflight.get(key).is_some_and(|f| Arc::ptr_eq(f, flight)) {
            inflight.remove(key);
        }
    }
}

/// Removes the in-flight entry once its request finishes or is dropped mid-await
struct FlightGuard<'a, S: ItemStore> {
    cache: &'a ResponseCache<S>,
    key: &'a CacheKey,
    flight: Flight,
}

impl<S: ItemStore> Drop for FlightGuard<'_, S> {
    fn drop(&mut self) {
        self.cache.finish_flight(self.key, &self.flight);
    }
}

/// Only plain descending components are allowed below the root
fn is_contained(relative_path: &str) -> bool {
    Path::new(relative_path)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;
    use tempfile::TempDir;

    const TEXT: &str = "text/plain; charset=utf-8";

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        std_fs::write(dir.path().join("index.html"), "<html>index</html>").unwrap();
        std_fs::write(dir.path().join("vite.svg"), "<svg/>".repeat(300)).unwrap();
        std_fs::write(dir.path().join("vite.svg.gz"), b"gz-bytes").unwrap();
        std_fs::create_dir(dir.path().join("assets")).unwrap();
        std_fs::write(dir.path().join("assets/a.txt"), "a".repeat(40)).unwrap();
        std_fs::write(dir.path().join("assets/b.txt"), "b".repeat(40)).unwrap();
        std_fs::write(dir.path().join("assets/c.txt"), "c".repeat(40)).unwrap();
        dir
    }

    fn options(root: &Path, spa_mode: bool, byte_budget: u64) -> CacheOptions {
        CacheOptions {
            root: root.to_path_buf(),
            spa_mode,
            enabled: true,
            byte_budget,
        }
    }

    #[test]
    fn test_zero_budget_is_rejected() {
        let dir = tree();
        let result = ResponseCache::new(options(dir.path(), true, 0));
        assert!(matches!(result, Err(ServerError::InvalidCacheBudget)));
    }

    #[tokio::test]
    async fn test_root_and_directories_serve_index() {
        let dir = tree();
        let cache = ResponseCache::new(options(dir.path(), false, 50 * 1024)).unwrap();

        let root = cache.get_or_create("", EncodingVariant::Identity, TEXT).await.unwrap();
        assert_eq!(root.name, "index.html");
        assert_eq!(root.content_type, mime::HTML);

        let assets = cache
            .get_or_create("assets", EncodingVariant::Identity, TEXT)
            .await
            .unwrap();
        assert_eq!(assets.name, "index.html");
        assert_eq!(assets.relative_path, INDEX_DOCUMENT);
    }

    #[tokio::test]
    async fn test_variants_read_sidecars() {
        let dir = tree();
        let cache = ResponseCache::new(options(dir.path(), true, 50 * 1024)).unwrap();

        let plain = cache
            .get_or_create("vite.svg", EncodingVariant::Identity, "image/svg+xml")
            .await
            .unwrap();
        assert_eq!(plain.name, "vite.svg");
        assert_eq!(plain.content_type, "image/svg+xml");

        let gz = cache
            .get_or_create("vite.svg", EncodingVariant::Gzip, "image/svg+xml")
            .await
            .unwrap();
        assert_eq!(gz.name, "vite.svg.gz");
        assert_eq!(gz.payload, Bytes::from_static(b"gz-bytes"));
        assert_eq!(gz.variant, EncodingVariant::Gzip);

        let br = cache
            .get_or_create("vite.svg", EncodingVariant::Brotli, "image/svg+xml")
            .await;
        assert_eq!(br, Err(CacheError::NotFound("vite.svg".to_string())));
        assert_eq!(cache.stats().entries, 2);
    }

    #[tokio::test]
    async fn test_missing_path_depends_on_spa_mode() {
        let dir = tree();

        let spa = ResponseCache::new(options(dir.path(), true, 50 * 1024)).unwrap();
        let item = spa
            .get_or_create("some/client/route", EncodingVariant::Identity, TEXT)
            .await
            .unwrap();
        assert_eq!(item.name, "index.html");

        let plain = ResponseCache::new(options(dir.path(), false, 50 * 1024)).unwrap();
        let err = plain
            .get_or_create("fdsfds.go", EncodingVariant::Identity, TEXT)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(plain.stats().entries, 0);
    }

    #[tokio::test]
    async fn test_escaping_paths_are_not_found() {
        let dir = tree();
        let cache = ResponseCache::new(options(dir.path(), false, 50 * 1024)).unwrap();
        let err = cache
            .get_or_create("../index.html", EncodingVariant::Identity, TEXT)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_second_request_is_a_hit() {
        let dir = tree();
        let cache = ResponseCache::new(options(dir.path(), true, 50 * 1024)).unwrap();

        let first = cache.get_or_create("assets/a.txt", EncodingVariant::Identity, TEXT).await.unwrap();
        // Changing the file on disk must not affect the cached payload
        std_fs::write(dir.path().join("assets/a.txt"), "changed").unwrap();
        let second = cache.get_or_create("assets/a.txt", EncodingVariant::Identity, TEXT).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[tokio::test]
    async fn test_budget_evicts_least_recently_used() {
        let dir = tree();
        let cache = ResponseCache::new(options(dir.path(), false, 100)).unwrap();

        cache.get_or_create("assets/a.txt", EncodingVariant::Identity, TEXT).await.unwrap();
        cache.get_or_create("assets/b.txt", EncodingVariant::Identity, TEXT).await.unwrap();
        // Refresh "a" so that "b" is the oldest access
        cache.get_or_create("assets/a.txt", EncodingVariant::Identity, TEXT).await.unwrap();
        cache.get_or_create("assets/c.txt", EncodingVariant::Identity, TEXT).await.unwrap();

        let stats = cache.stats();
        assert!(stats.resident_bytes <= 100);
        assert_eq!(stats.resident_bytes, 80);
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.evictions, 1);

        // "a" is still resident, "b" has to be read again
        let misses = cache.stats().misses;
        cache.get_or_create("assets/a.txt", EncodingVariant::Identity, TEXT).await.unwrap();
        assert_eq!(cache.stats().misses, misses);
        cache.get_or_create("assets/b.txt", EncodingVariant::Identity, TEXT).await.unwrap();
        assert_eq!(cache.stats().misses, misses + 1);
        assert!(cache.stats().resident_bytes <= 100);
    }

    #[tokio::test]
    async fn test_oversize_item_is_served_uncached() {
        let dir = tree();
        let cache = ResponseCache::new(options(dir.path(), false, 100)).unwrap();

        cache.get_or_create("assets/a.txt", EncodingVariant::Identity, TEXT).await.unwrap();
        let big = cache
            .get_or_create("vite.svg", EncodingVariant::Identity, "image/svg+xml")
            .await
            .unwrap();
        assert_eq!(big.len(), 1800);

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.resident_bytes, 40);
        assert_eq!(stats.evictions, 0);
    }

    #[tokio::test]
    async fn test_disabled_cache_stores_nothing() {
        let dir = tree();
        let mut opts = options(dir.path(), true, 50 * 1024);
        opts.enabled = false;
        let cache = ResponseCache::new(opts).unwrap();

        for _ in 0..3 {
            let item = cache.get_or_create("vite.svg", EncodingVariant::Identity, TEXT).await.unwrap();
            assert_eq!(item.name, "vite.svg");
        }
        let stats = cache.stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.resident_bytes, 0);
        assert_eq!(stats.misses, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_read_once() {
        let dir = tree();
        let cache = Arc::new(ResponseCache::new(options(dir.path(), true, 50 * 1024)).unwrap());

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move {
                    cache
                        .get_or_create("vite.svg", EncodingVariant::Gzip, "image/svg+xml")
                        .await
                })
            })
            .collect();

        for task in tasks {
            let item = task.await.unwrap().unwrap();
            assert_eq!(item.name, "vite.svg.gz");
        }

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.resident_bytes, 8);
    }

    #[tokio::test]
    async fn test_dropped_request_leaves_no_flight_behind() {
        let dir = tree();
        let cache = Arc::new(ResponseCache::new(options(dir.path(), true, 50 * 1024)).unwrap());
        let key = CacheKey::new("vite.svg", EncodingVariant::Identity);

        // Hold the population of this key open indefinitely
        let flight = cache.flight_for(&key);
        let (started_tx, started_rx) = tokio::sync::oneshot::channel();
        let holder = {
            let flight = Arc::clone(&flight);
            tokio::spawn(async move {
                flight
                    .get_or_init(|| async move {
                        let _ = started_tx.send(());
                        std::future::pending::<Population>().await
                    })
                    .await;
            })
        };
        started_rx.await.unwrap();

        let waiter = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache
                    .get_or_create("vite.svg", EncodingVariant::Identity, "image/svg+xml")
                    .await
            })
        };

        // Map, this test, the holder and the waiter each own a handle
        while Arc::strong_count(&flight) < 4 {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        waiter.abort();
        assert!(waiter.await.unwrap_err().is_cancelled());
        assert!(lock(&cache.inflight).is_empty());

        holder.abort();
    }

    #[tokio::test]
    async fn test_clear_resets_accounting() {
        let dir = tree();
        let cache = ResponseCache::new(options(dir.path(), true, 50 * 1024)).unwrap();
        cache.get_or_create("assets/a.txt", EncodingVariant::Identity, TEXT).await.unwrap();
        cache.clear();
        let stats = cache.stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.resident_bytes, 0);
    }
}
