use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::models::NormalizedMetadata;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: NormalizedMetadata,
    stored_at: Instant,
}

/// In-process TTL cache for enrichment results.
///
/// Keyed by external id (or title when no id exists). Staleness is
/// checked lazily on read; there is no background eviction and entries
/// are never deleted, only overwritten. Concurrent overwrites are
/// harmless since entries are idempotent derivations of the same
/// upstream truth.
pub struct MetadataCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl MetadataCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Get a cached value; entries older than the TTL read as misses
    pub async fn get(&self, key: &str) -> Option<NormalizedMetadata> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() >= self.ttl {
            return None;
        }
        Some(entry.value.clone())
    }

    /// Insert or overwrite; last writer wins on races
    pub async fn put(&self, key: &str, value: NormalizedMetadata) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Number of stored entries, including stale ones
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.len()
    }
}
