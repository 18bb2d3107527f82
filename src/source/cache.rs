//! Uploaded-PDF cache
//!
//! Analyzed PDFs can be kept under a UUID key so later calls can refer to
//! them without re-sending the bytes. Entries are bounded by count, by total
//! bytes and by age.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

struct CachedPdf {
    data: Vec<u8>,
    inserted: Instant,
}

struct CacheInner {
    lru: LruCache<String, CachedPdf>,
    total_bytes: usize,
}

impl CacheInner {
    fn pop(&mut self, key: &str) -> Option<CachedPdf> {
        let entry = self.lru.pop(key)?;
        self.total_bytes = self.total_bytes.saturating_sub(entry.data.len());
        Some(entry)
    }
}

/// Cache manager for PDF data with entry count, byte budget and age limits
pub struct CacheManager {
    inner: Mutex<CacheInner>,
    max_bytes: usize,
}

impl CacheManager {
    /// Create a new cache manager with the specified entry capacity and byte budget
    pub fn new(capacity: usize, max_bytes: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(CacheInner {
                lru: LruCache::new(capacity),
                total_bytes: 0,
            }),
            max_bytes,
        }
    }

    /// Store PDF data in the cache.
    /// Rejects entries larger than max_bytes entirely.
    /// Evicts LRU entries until byte budget is satisfied.
    pub fn put(&self, key: String, data: Vec<u8>) {
        self.put_at(key, data, Instant::now());
    }

    fn put_at(&self, key: String, data: Vec<u8>, inserted: Instant) {
        let new_size = data.len();
        if new_size > self.max_bytes {
            return;
        }

        let mut inner = self.inner.lock();
        inner.pop(&key);

        while inner.total_bytes + new_size > self.max_bytes {
            match inner.lru.pop_lru() {
                Some((_, evicted)) => {
                    inner.total_bytes = inner.total_bytes.saturating_sub(evicted.data.len());
                }
                None => break,
            }
        }

        inner.total_bytes += new_size;
        if let Some((_, evicted)) = inner.lru.push(key, CachedPdf { data, inserted }) {
            // push returns the displaced LRU entry when the count limit is hit
            inner.total_bytes = inner.total_bytes.saturating_sub(evicted.data.len());
        }
    }

    /// Get PDF data from the cache
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.lock().lru.get(key).map(|entry| entry.data.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().lru.contains(key)
    }

    pub fn remove(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.lock().pop(key).map(|entry| entry.data)
    }

    /// Drop every entry older than `ttl`, returning how many were dropped
    pub fn evict_expired(&self, ttl: Duration) -> usize {
        self.evict_older_than(ttl, Instant::now())
    }

    fn evict_older_than(&self, ttl: Duration, now: Instant) -> usize {
        let mut inner = self.inner.lock();
        let expired: Vec<String> = inner
            .lru
            .iter()
            .filter(|(_, entry)| now.saturating_duration_since(entry.inserted) > ttl)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            inner.pop(key);
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().lru.is_empty()
    }

    /// Get total bytes currently stored in cache
    pub fn total_bytes(&self) -> usize {
        self.inner.lock().total_bytes
    }

    /// Generate a new cache key that is guaranteed not to collide with existing keys.
    pub fn generate_unique_key(&self) -> String {
        let inner = self.inner.lock();
        loop {
            let key = uuid::Uuid::new_v4().to_string();
            if !inner.lru.contains(&key) {
                return key;
            }
        }
    }
}
