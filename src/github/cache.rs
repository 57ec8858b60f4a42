// In-memory response cache with per-endpoint TTLs.
//
// Entries expire lazily: a stale entry is removed on the read that finds
// it. There is no background sweep and no size bound.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use crate::config::CacheConfig;

/// Cached payload and the moment it was captured.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub payload: Value,
    pub cached_at: Instant,
}

impl CacheEntry {
    pub fn new(payload: Value) -> Self {
        Self {
            payload,
            cached_at: Instant::now(),
        }
    }

    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() < ttl
    }
}

/// Storage backing the response cache.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<CacheEntry>;
    fn set(&self, key: &str, entry: CacheEntry);
    fn remove(&self, key: &str);
}

/// Process-wide map guarded by a mutex. Concurrent misses on the same key
/// both go upstream; there is no in-flight de-duplication.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, entry: CacheEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), entry);
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// Endpoint class, inferred from the URL shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheClass {
    /// File contents and raw markdown
    Content,
    /// Issue and review comment listings
    Comments,
    /// Pull request listings, details, commits
    Proposals,
}

impl CacheClass {
    pub fn for_url(url: &str) -> Self {
        if url.contains("/contents/")
            || url.contains("/raw/")
            || url.contains("raw.githubusercontent.com")
        {
            CacheClass::Content
        } else if url.contains("/comments") {
            CacheClass::Comments
        } else {
            CacheClass::Proposals
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub proposals: Duration,
    pub content: Duration,
    pub comments: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for CacheTtls {
    fn from(config: &CacheConfig) -> Self {
        Self {
            proposals: Duration::from_secs(config.proposals_ttl_secs),
            content: Duration::from_secs(config.content_ttl_secs),
            comments: Duration::from_secs(config.comments_ttl_secs),
        }
    }
}

impl CacheTtls {
    pub fn for_url(&self, url: &str) -> Duration {
        match CacheClass::for_url(url) {
            CacheClass::Content => self.content,
            CacheClass::Comments => self.comments,
            CacheClass::Proposals => self.proposals,
        }
    }
}

/// TTL policy over a [`CacheStore`].
pub struct ResponseCache {
    store: Box<dyn CacheStore>,
    ttls: CacheTtls,
}

impl ResponseCache {
    pub fn new(store: Box<dyn CacheStore>, ttls: CacheTtls) -> Self {
        Self { store, ttls }
    }

    pub fn in_memory(ttls: CacheTtls) -> Self {
        Self::new(Box::new(MemoryCache::new()), ttls)
    }

    /// Return the payload for `key` if it is younger than the TTL for `url`.
    /// A stale entry is evicted before reporting a miss.
    pub fn read(&self, key: &str, url: &str) -> Option<Value> {
        let entry = self.store.get(key)?;
        if entry.is_fresh(self.ttls.for_url(url)) {
            debug!(url, "using cached data");
            return Some(entry.payload);
        }

        debug!(url, "evicting stale cache entry");
        self.store.remove(key);
        None
    }

    pub fn write(&self, key: &str, payload: Value) {
        self.store.set(key, CacheEntry::new(payload));
    }

    pub fn evict(&self, key: &str) {
        self.store.remove(key);
    }
}
