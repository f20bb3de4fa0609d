//! Cache freshness tracking.
//!
//! A cache key is fresh while less than its TTL has passed since its last
//! successful refresh. Missing entries and unreadable storage count as stale.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::error;

use crate::clock::Clock;
use crate::store::{CacheStore, StoreError};

/// Whether `last_refreshed` is still within `ttl` of `now`.
pub fn is_within_ttl(last_refreshed: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    now.signed_duration_since(last_refreshed) < ttl
}

/// Tracks the last successful refresh per cache key.
pub struct FreshnessTracker {
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
}

impl FreshnessTracker {
    pub fn new(store: Arc<dyn CacheStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Current time from the tracker's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn is_fresh(&self, key: &str, ttl: Duration) -> bool {
        match self.store.get_cache_entry(key) {
            Ok(Some(entry)) => is_within_ttl(entry.last_refreshed_at, self.clock.now(), ttl),
            Ok(None) => false,
            Err(e) => {
                error!("Failed to read cache entry '{}': {}", key, e);
                false
            }
        }
    }

    /// Record a successful refresh of `key` at the current time.
    pub fn touch(&self, key: &str) -> Result<DateTime<Utc>, StoreError> {
        let now = self.clock.now();
        self.store.touch_cache_entry(key, now)?;
        Ok(now)
    }

    pub fn last_refreshed(&self, key: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self
            .store
            .get_cache_entry(key)?
            .map(|entry| entry.last_refreshed_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CacheEntry, SqliteStore};
    use crate::testing::ManualClock;
    use chrono::TimeZone;

    const KEY: &str = "best_podcasts_overall";

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    fn tracker() -> (FreshnessTracker, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(t0()));
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        (FreshnessTracker::new(store, clock.clone()), clock)
    }

    #[test]
    fn test_ttl_boundary() {
        let ttl = Duration::hours(24);
        assert!(is_within_ttl(t0(), t0() + ttl - Duration::seconds(1), ttl));
        assert!(!is_within_ttl(t0(), t0() + ttl, ttl));
        assert!(!is_within_ttl(t0(), t0() + ttl + Duration::seconds(1), ttl));
    }

    #[test]
    fn test_missing_entry_is_stale() {
        let (tracker, _) = tracker();
        assert!(!tracker.is_fresh(KEY, Duration::hours(24)));
        assert_eq!(tracker.last_refreshed(KEY).unwrap(), None);
    }

    #[test]
    fn test_touch_then_age_out() {
        let (tracker, clock) = tracker();
        let ttl = Duration::hours(24);

        let touched = tokio_test::assert_ok!(tracker.touch(KEY));
        assert_eq!(touched, t0());
        assert!(tracker.is_fresh(KEY, ttl));

        clock.advance(ttl - Duration::seconds(1));
        assert!(tracker.is_fresh(KEY, ttl));

        clock.advance(Duration::seconds(2));
        assert!(!tracker.is_fresh(KEY, ttl));
        assert_eq!(tracker.last_refreshed(KEY).unwrap(), Some(t0()));
    }

    #[test]
    fn test_touch_updates_existing_entry() {
        let (tracker, clock) = tracker();
        tracker.touch(KEY).unwrap();
        clock.advance(Duration::hours(30));
        tracker.touch(KEY).unwrap();
        assert_eq!(
            tracker.last_refreshed(KEY).unwrap(),
            Some(t0() + Duration::hours(30))
        );
    }

    struct UnreadableStore;

    impl CacheStore for UnreadableStore {
        fn get_cache_entry(&self, _key: &str) -> Result<Option<CacheEntry>, StoreError> {
            Err(StoreError::Database("disk I/O error".to_string()))
        }

        fn touch_cache_entry(&self, _key: &str, _at: DateTime<Utc>) -> Result<(), StoreError> {
            Err(StoreError::Database("disk I/O error".to_string()))
        }
    }

    #[test]
    fn test_read_error_counts_as_stale() {
        let tracker = FreshnessTracker::new(
            Arc::new(UnreadableStore),
            Arc::new(ManualClock::new(t0())),
        );
        assert!(!tracker.is_fresh(KEY, Duration::hours(24)));
        tokio_test::assert_err!(tracker.last_refreshed(KEY));
        tokio_test::assert_err!(tracker.touch(KEY));
    }
}
