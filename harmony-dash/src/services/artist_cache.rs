//! Per-artist response cache keyed by display name

use harmony_common::TtlCache;
use std::time::Duration;

use crate::models::ArtistRecord;

/// Default lifetime of a cached artist record
pub const ARTIST_TTL: Duration = Duration::from_secs(3600);

pub struct ArtistCache {
    entries: TtlCache<String, ArtistRecord>,
}

impl ArtistCache {
    pub fn new() -> Self {
        Self::with_ttl(ARTIST_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: TtlCache::new(ttl),
        }
    }

    /// Cached record for `name`, or `None` if absent or expired
    pub async fn get(&self, name: &str) -> Option<ArtistRecord> {
        self.entries.get(&name.to_string()).await
    }

    pub async fn put(&self, name: &str, record: ArtistRecord) {
        self.entries.insert(name.to_string(), record).await;
    }

    pub async fn put_with_ttl(&self, name: &str, record: ArtistRecord, ttl: Duration) {
        self.entries.insert_with_ttl(name.to_string(), record, ttl).await;
    }

    pub async fn len(&self) -> usize {
        self.entries.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.is_empty().await
    }
}

impl Default for ArtistCache {
    fn default() -> Self {
        Self::new()
    }
}
