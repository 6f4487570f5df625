//! Session-scoped fetched-data cache.
//!
//! Owned by one orchestrator rather than shared process-wide, so two
//! sessions never observe each other's data. Entries expire after a fixed
//! TTL and the whole cache is dropped on `reset_loading()`.

use loadman_core::Instant;
use loadman_timing::Clock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct CacheEntry {
    value: Value,
    stored_at: Instant,
}

/// TTL-evicting cache for fetched payloads, keyed by resource name.
pub struct SessionCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl SessionCache {
    /// Create a cache whose entries live for `ttl`.
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Store a payload, replacing any previous entry and restarting its TTL.
    pub fn insert(&self, key: impl Into<String>, value: Value) {
        let entry = CacheEntry {
            value,
            stored_at: self.clock.now(),
        };
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .insert(key.into(), entry);
    }

    /// Fetch a payload if present and fresh; expired entries are removed.
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        match entries.get(key) {
            Some(entry) if now - entry.stored_at < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Drop every expired entry.
    pub fn evict_expired(&self) {
        let now = self.clock.now();
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .retain(|_, entry| now - entry.stored_at < self.ttl);
    }

    /// Drop everything; used on epoch reset.
    pub fn clear(&self) {
        self.entries.lock().expect("cache lock poisoned").clear();
    }

    /// Number of stored entries, including any not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
