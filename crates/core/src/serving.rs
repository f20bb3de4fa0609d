//! Read path for popular podcasts.
//!
//! In inline mode a read of a stale key refreshes it first; in background
//! mode reads only ever see what is already stored. Refresh failures never
//! fail a read: the stored podcasts are served as they are.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::config::{CacheConfig, RefreshMode};
use crate::refresh::{PodcastRefresher, RefreshOutcome};
use crate::store::{PodcastRecord, PodcastStore, StoreError};

pub const DEFAULT_LIMIT: u32 = 4;
pub const MAX_LIMIT: u32 = 20;

/// Bring a requested limit into `1..=MAX_LIMIT`.
pub fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_LIMIT)
}

/// Freshness of the popular-podcasts cache key.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub key: String,
    pub last_refreshed_at: Option<DateTime<Utc>>,
    pub ttl_hours: u32,
    pub fresh: bool,
    pub refresh_mode: RefreshMode,
    pub featured_count: u64,
}

/// Serves featured podcasts, refreshing the cache as configured.
pub struct PopularPodcasts {
    refresher: Arc<PodcastRefresher>,
    store: Arc<dyn PodcastStore>,
    cache: CacheConfig,
}

impl PopularPodcasts {
    pub fn new(
        refresher: Arc<PodcastRefresher>,
        store: Arc<dyn PodcastStore>,
        cache: CacheConfig,
    ) -> Self {
        Self {
            refresher,
            store,
            cache,
        }
    }

    pub fn refresher(&self) -> &Arc<PodcastRefresher> {
        &self.refresher
    }

    /// Top featured podcasts, at most `limit` (clamped to `1..=20`).
    pub async fn get_top_entries(&self, limit: u32) -> Result<Vec<PodcastRecord>, StoreError> {
        if self.cache.refresh_mode == RefreshMode::Inline {
            match self
                .refresher
                .refresh_if_stale(&self.cache.key, self.cache.ttl())
                .await
            {
                Ok(RefreshOutcome::Refreshed(report)) => {
                    debug!("Refreshed '{}' before serving", report.key)
                }
                Ok(RefreshOutcome::AlreadyFresh) => {}
                Err(e) => debug!("Serving stored podcasts after failed refresh: {}", e),
            }
        }

        self.store.list_featured(clamp_limit(limit))
    }

    /// Current time as seen by the freshness clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.refresher.freshness().now()
    }

    pub fn get(&self, id: &str) -> Result<PodcastRecord, StoreError> {
        self.store.get(id)
    }

    pub fn cache_status(&self) -> Result<CacheStatus, StoreError> {
        let freshness = self.refresher.freshness();
        let last_refreshed_at = freshness.last_refreshed(&self.cache.key)?;

        Ok(CacheStatus {
            key: self.cache.key.clone(),
            last_refreshed_at,
            ttl_hours: self.cache.ttl_hours,
            fresh: freshness.is_fresh(&self.cache.key, self.cache.ttl()),
            refresh_mode: self.cache.refresh_mode,
            featured_count: self.store.count_featured()?,
        })
    }
}
