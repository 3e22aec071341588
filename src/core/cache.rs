

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::debug;


/// Key/value capability shared by every worker. Writes are last-writer-wins;
/// entries disappear once their TTL elapses.
pub trait ObjectStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn put(&self, key: &str, value: &str, ttl: Option<Duration>);
}

impl<S: ObjectStore + ?Sized> ObjectStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str, ttl: Option<Duration>) {
        (**self).put(key, value, ttl)
    }
}


struct CacheEntry {
    value: String,
    stored_at: Instant,
    ttl: Option<Duration>,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.ttl.is_some_and(|ttl| self.stored_at.elapsed() >= ttl)
    }
}


#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}


/// Process-local store for tests and single-worker deployments. It cannot be
/// shared between processes.
pub struct InMemoryObjectStore {
    entries: Mutex<LruCache<String, CacheEntry>>,
    prefix: String,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl InMemoryObjectStore {
    pub fn new(capacity: usize, namespace: &str) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            prefix: format!("{namespace}:obj"),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn normalize_key(&self, key: &str) -> String {
        if key.starts_with(&self.prefix) {
            key.to_string()
        } else {
            format!("{}:{}", self.prefix, key)
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.entries.lock().len(),
        }
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new(crate::DEFAULT_CACHE_CAPACITY, "directory")
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn get(&self, key: &str) -> Option<String> {
        let key = self.normalize_key(key);
        let mut entries = self.entries.lock();

        let expired = match entries.get(&key) {
            Some(entry) if !entry.is_expired() => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.pop(&key);
            debug!("Cache entry expired for {}", key);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    fn put(&self, key: &str, value: &str, ttl: Option<Duration>) {
        let key = self.normalize_key(key);
        self.entries.lock().put(
            key,
            CacheEntry {
                value: value.to_string(),
                stored_at: Instant::now(),
                ttl,
            },
        );
    }
}
