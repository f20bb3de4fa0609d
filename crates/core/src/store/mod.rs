//! Durable storage for cached podcasts and cache freshness.

mod sqlite;
mod types;

pub use sqlite::SqliteStore;
pub use types::*;

use chrono::{DateTime, Utc};

/// Storage for podcast records.
pub trait PodcastStore: Send + Sync {
    /// Insert or update podcasts matched by external id, all marked featured.
    ///
    /// Runs as one transaction. An entry that violates a constraint (such as
    /// a feed URL already owned by another record) is skipped and counted;
    /// any other failure aborts the whole pass.
    fn upsert_featured(
        &self,
        podcasts: &[PodcastUpsert],
        now: DateTime<Utc>,
    ) -> Result<UpsertSummary, StoreError>;

    /// Featured podcasts by popularity score (absent last), then title.
    fn list_featured(&self, limit: u32) -> Result<Vec<PodcastRecord>, StoreError>;

    /// Get a podcast by local id.
    fn get(&self, id: &str) -> Result<PodcastRecord, StoreError>;

    /// Number of featured podcasts.
    fn count_featured(&self) -> Result<u64, StoreError>;
}

/// Storage for cache freshness timestamps.
pub trait CacheStore: Send + Sync {
    fn get_cache_entry(&self, key: &str) -> Result<Option<CacheEntry>, StoreError>;

    /// Create or update the entry for `key`.
    fn touch_cache_entry(&self, key: &str, at: DateTime<Utc>) -> Result<(), StoreError>;
}
