//! TTL cache of catalog snapshots

use crate::catalog::CatalogSnapshot;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cache key for a (masked endpoint, schema) pair: 12 hex chars of SHA-256
pub fn cache_key(masked_endpoint: &str, schema: &str) -> String {
    let digest = Sha256::digest(format!("{}:{}", masked_endpoint, schema).as_bytes());
    hex::encode(digest)[..12].to_string()
}

struct CacheEntry {
    snapshot: Arc<CatalogSnapshot>,
    fetched_at: Instant,
}

/// Snapshot cache shared by concurrent callers.
///
/// Entries are replaced wholesale, never edited, so a caller holding an
/// `Arc<CatalogSnapshot>` keeps a consistent view after expiry or invalidation.
pub struct SchemaCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl SchemaCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Fresh snapshot for the key, dropping it if expired
    pub fn get(&self, key: &str) -> Option<Arc<CatalogSnapshot>> {
        {
            let entry = self.entries.get(key)?;
            if entry.fetched_at.elapsed() < self.ttl {
                return Some(entry.snapshot.clone());
            }
        }

        if self.evict_expired(key) {
            tracing::debug!(key = %key, "Schema cache entry expired");
        }
        None
    }

    /// Removes the entry only if it is still expired under the shard lock, so
    /// a snapshot inserted by another caller since the read survives.
    fn evict_expired(&self, key: &str) -> bool {
        self.entries
            .remove_if(key, |_, entry| entry.fetched_at.elapsed() >= self.ttl)
            .is_some()
    }

    pub fn insert(&self, key: String, snapshot: Arc<CatalogSnapshot>) {
        self.entries.insert(
            key,
            CacheEntry {
                snapshot,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Drop a key, e.g. after a schema change. Returns whether it was cached.
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
