//! In-process cache with per-entry time-to-live
//!
//! Backs both the bearer token cache and the per-artist response cache.
//! Constructed once per process and shared through `Arc`, never as a global.
//!
//! Expired entries are treated as absent and evicted lazily on access;
//! there is no background sweeper. `purge_expired` exists for callers that
//! want to reclaim memory explicitly.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Stored value plus the bookkeeping needed to decide validity
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub stored_at: Instant,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    /// An entry is valid iff `now - stored_at < ttl`
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }
}

/// Key/value cache with time-based expiry
///
/// Writes are last-write-wins per key. Keys are independent, so concurrent
/// writers of different keys never observe each other.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    default_ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Look up a key, returning a clone of the value if it has not expired
    ///
    /// An expired entry found here is removed before returning `None`.
    pub async fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(entry) if entry.is_valid_at(now) => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        // Entry may have been refreshed between the two locks
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key) {
            if entry.is_valid_at(now) {
                return Some(entry.value.clone());
            }
            entries.remove(key);
            tracing::trace!("Evicted expired cache entry");
        }
        None
    }

    /// Store a value with the cache's default TTL
    pub async fn insert(&self, key: K, value: V) {
        self.insert_with_ttl(key, value, self.default_ttl).await;
    }

    /// Store a value with an explicit TTL, replacing any previous entry
    pub async fn insert_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            stored_at: Instant::now(),
            ttl,
        };
        self.entries.write().await.insert(key, entry);
    }

    pub async fn remove(&self, key: &K) -> Option<V> {
        self.entries.write().await.remove(key).map(|e| e.value)
    }

    /// Number of stored entries, including expired entries not yet evicted
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop every expired entry, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_valid_at(now));
        before - entries.len()
    }
}
