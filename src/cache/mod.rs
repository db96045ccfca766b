//! LRU result cache with TTL
//!
//! Keys are SHA-256 over the raw upload bytes plus the requested language
//! list, so identical images asked with different languages cache
//! separately. A capacity of zero disables caching entirely.

use lru::LruCache;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Thread-safe LRU cache for OCR responses.
pub struct ResultCache<V> {
    entries: Option<Mutex<LruCache<String, CacheEntry<V>>>>,
    ttl: Duration,
}

impl<V: Clone> ResultCache<V> {
    /// Create a cache with the given capacity and TTL. Capacity 0 disables
    /// the cache; `get` then always misses and `put` is a no-op.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let entries = NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap)));
        Self { entries, ttl }
    }

    /// Cache key for an upload: SHA-256 over the image bytes and the
    /// normalized language list.
    pub fn key(image_bytes: &[u8], languages: &[String]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(image_bytes);
        for lang in languages {
            hasher.update(b"|");
            hasher.update(lang.as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    /// Look up a cached value, dropping it if the TTL has passed.
    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.as_ref()?;
        let mut cache = entries.lock().ok()?;

        match cache.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                debug!("Cache hit for {}", &key[..12.min(key.len())]);
                Some(entry.value.clone())
            }
            Some(_) => {
                cache.pop(key);
                None
            }
            None => None,
        }
    }

    /// Insert a value, evicting the least recently used entry when full.
    pub fn put(&self, key: String, value: V) {
        if let Some(entries) = &self.entries {
            if let Ok(mut cache) = entries.lock() {
                cache.put(
                    key,
                    CacheEntry {
                        value,
                        inserted_at: Instant::now(),
                    },
                );
            }
        }
    }

    /// Number of live entries (expired entries count until evicted).
    pub fn len(&self) -> usize {
        self.entries
            .as_ref()
            .and_then(|entries| entries.lock().ok().map(|cache| cache.len()))
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether caching is enabled at all.
    pub fn enabled(&self) -> bool {
        self.entries.is_some()
    }
}
