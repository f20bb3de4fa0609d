//! Refresh orchestration.
//!
//! One refresh cycle fetches the catalog's best podcasts, resolves artwork
//! for each, upserts them as featured records in one transaction and then
//! marks the cache key as refreshed. Cycles for the same key never overlap.

mod background;

pub use background::BackgroundRefresher;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{error, info, warn};

use crate::artwork::{ArtworkSource, RequestPacer};
use crate::config::RefreshConfig;
use crate::freshness::FreshnessTracker;
use crate::metrics::{RECORDS_UPSERTED, REFRESH_ATTEMPTS, REFRESH_DURATION};
use crate::podcast_catalog::{CatalogEntry, CatalogError, CatalogSource};
use crate::store::{PodcastStore, PodcastUpsert, StoreError};

/// Errors that end a refresh cycle without touching the cache key.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("Catalog fetch failed: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The cycle this caller waited on failed; no new cycle was started.
    #[error("Concurrent refresh failed: {0}")]
    Concurrent(String),
}

/// Summary of one successful refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub key: String,
    pub fetched: u32,
    pub inserted: u32,
    pub updated: u32,
    pub skipped: u32,
    pub artwork_hits: u32,
    pub refreshed_at: DateTime<Utc>,
}

/// Result of a conditional refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed(RefreshReport),
    /// Another caller refreshed the key while this one waited.
    AlreadyFresh,
}

/// Serializes cycles for one key and remembers how the last one ended.
#[derive(Default)]
struct KeyGuard {
    /// Failure message of the last completed cycle, `None` after a success.
    last_failure: AsyncMutex<Option<String>>,
    completed: AtomicU64,
}

/// Runs refresh cycles for cache keys.
pub struct PodcastRefresher {
    catalog: Arc<dyn CatalogSource>,
    artwork: Arc<dyn ArtworkSource>,
    store: Arc<dyn PodcastStore>,
    freshness: Arc<FreshnessTracker>,
    config: RefreshConfig,
    request_delay: Duration,
    guards: Mutex<HashMap<String, Arc<KeyGuard>>>,
}

impl PodcastRefresher {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        artwork: Arc<dyn ArtworkSource>,
        store: Arc<dyn PodcastStore>,
        freshness: Arc<FreshnessTracker>,
        config: RefreshConfig,
        request_delay: Duration,
    ) -> Self {
        Self {
            catalog,
            artwork,
            store,
            freshness,
            config,
            request_delay,
            guards: Mutex::new(HashMap::new()),
        }
    }

    pub fn freshness(&self) -> &FreshnessTracker {
        &self.freshness
    }

    /// Run one refresh cycle for `key`, waiting for any cycle already in flight.
    pub async fn refresh(&self, key: &str) -> Result<RefreshReport, RefreshError> {
        let guard = self.guard_for(key);
        let mut last_failure = guard.last_failure.lock().await;
        let result = self.run_cycle(key).await;
        *last_failure = result.as_ref().err().map(ToString::to_string);
        guard.completed.fetch_add(1, Ordering::SeqCst);
        result
    }

    /// Refresh `key` only if it is stale once the key's guard is held.
    ///
    /// Concurrent callers queue on the guard and share the cycle that was in
    /// flight when they arrived: after a success they return
    /// [`RefreshOutcome::AlreadyFresh`], after a failure they return
    /// [`RefreshError::Concurrent`] without contacting the catalog again.
    pub async fn refresh_if_stale(
        &self,
        key: &str,
        ttl: chrono::Duration,
    ) -> Result<RefreshOutcome, RefreshError> {
        if self.freshness.is_fresh(key, ttl) {
            return Ok(RefreshOutcome::AlreadyFresh);
        }

        let guard = self.guard_for(key);
        let seen = guard.completed.load(Ordering::SeqCst);
        let mut last_failure = guard.last_failure.lock().await;

        if guard.completed.load(Ordering::SeqCst) != seen {
            if let Some(message) = last_failure.as_ref() {
                REFRESH_ATTEMPTS.with_label_values(&["joined_failed"]).inc();
                return Err(RefreshError::Concurrent(message.clone()));
            }
            REFRESH_ATTEMPTS.with_label_values(&["already_fresh"]).inc();
            return Ok(RefreshOutcome::AlreadyFresh);
        }

        if self.freshness.is_fresh(key, ttl) {
            REFRESH_ATTEMPTS.with_label_values(&["already_fresh"]).inc();
            return Ok(RefreshOutcome::AlreadyFresh);
        }

        let result = self.run_cycle(key).await;
        *last_failure = result.as_ref().err().map(ToString::to_string);
        guard.completed.fetch_add(1, Ordering::SeqCst);
        result.map(RefreshOutcome::Refreshed)
    }

    fn guard_for(&self, key: &str) -> Arc<KeyGuard> {
        let mut guards = self.guards.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(guards.entry(key.to_string()).or_default())
    }

    async fn run_cycle(&self, key: &str) -> Result<RefreshReport, RefreshError> {
        info!("Refreshing cache key '{}' from {}", key, self.catalog.name());
        let started = Instant::now();

        let result = self.refresh_inner(key).await;

        let label = match &result {
            Ok(_) => "success",
            Err(RefreshError::Catalog(_)) => "catalog_failed",
            Err(RefreshError::Store(_)) => "store_failed",
            Err(RefreshError::Concurrent(_)) => "joined_failed",
        };
        REFRESH_ATTEMPTS.with_label_values(&[label]).inc();
        REFRESH_DURATION
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());

        match &result {
            Ok(report) => info!(
                "Refreshed '{}': {} fetched, {} inserted, {} updated, {} skipped, {} with artwork",
                key,
                report.fetched,
                report.inserted,
                report.updated,
                report.skipped,
                report.artwork_hits
            ),
            Err(RefreshError::Catalog(e)) if e.is_configuration() => {
                warn!("Skipping refresh of '{}': {}", key, e)
            }
            Err(e) => error!("Refresh of '{}' failed: {}", key, e),
        }

        result
    }

    async fn refresh_inner(&self, key: &str) -> Result<RefreshReport, RefreshError> {
        let entries = self
            .catalog
            .fetch_top_entries(self.config.genre_id, self.config.page)
            .await?;
        let fetched = entries.len() as u32;

        let (upserts, artwork_hits) = self.enrich(entries).await;

        let summary = self
            .store
            .upsert_featured(&upserts, self.freshness.now())?;
        RECORDS_UPSERTED
            .with_label_values(&["inserted"])
            .inc_by(u64::from(summary.inserted));
        RECORDS_UPSERTED
            .with_label_values(&["updated"])
            .inc_by(u64::from(summary.updated));
        RECORDS_UPSERTED
            .with_label_values(&["skipped"])
            .inc_by(u64::from(summary.skipped));

        let refreshed_at = self.freshness.touch(key)?;

        Ok(RefreshReport {
            key: key.to_string(),
            fetched,
            inserted: summary.inserted,
            updated: summary.updated,
            skipped: summary.skipped,
            artwork_hits,
            refreshed_at,
        })
    }

    /// Resolve artwork for every entry; the resolver is released on return.
    async fn enrich(&self, entries: Vec<CatalogEntry>) -> (Vec<PodcastUpsert>, u32) {
        let resolver = match self.artwork.open() {
            Ok(resolver) => Some(resolver),
            Err(e) => {
                warn!("Artwork lookups disabled for this refresh: {}", e);
                None
            }
        };
        let pacer = RequestPacer::new(self.request_delay);

        let mut upserts = Vec::with_capacity(entries.len());
        let mut hits = 0;
        for entry in entries {
            let artwork = match &resolver {
                Some(resolver) => {
                    pacer.wait().await;
                    resolver
                        .resolve(entry.itunes_id.as_deref(), &entry.title)
                        .await
                }
                None => None,
            };
            if artwork.is_some() {
                hits += 1;
            }
            upserts.push(PodcastUpsert::from_entry(entry, artwork));
        }

        (upserts, hits)
    }
}
