//! Mock catalog source for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::podcast_catalog::{CatalogEntry, CatalogError, CatalogSource};

/// A recorded catalog fetch for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFetch {
    pub genre_id: u32,
    pub page: u32,
}

/// Mock implementation of the CatalogSource trait.
///
/// Provides controllable behavior for testing:
/// - Return a configurable list of entries
/// - Track fetches for assertions
/// - Simulate failures and slow responses
///
/// # Example
///
/// ```rust,ignore
/// use podcache_core::testing::{MockCatalogSource, fixtures};
///
/// let catalog = MockCatalogSource::new();
/// catalog.set_entries(vec![fixtures::catalog_entry("ln-1", "Show", Some(80))]).await;
///
/// let entries = catalog.fetch_top_entries(0, 1).await?;
/// assert_eq!(entries.len(), 1);
/// assert_eq!(catalog.fetch_count().await, 1);
/// ```
#[derive(Debug)]
pub struct MockCatalogSource {
    entries: Arc<RwLock<Vec<CatalogEntry>>>,
    fetches: Arc<RwLock<Vec<RecordedFetch>>>,
    /// If set, the next fetch will fail with this error.
    next_error: Arc<RwLock<Option<CatalogError>>>,
    /// Artificial latency applied to every fetch.
    delay: Arc<RwLock<Option<Duration>>>,
    /// When set, every fetch fails as rate limited.
    rate_limited: Arc<RwLock<bool>>,
}

impl Default for MockCatalogSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalogSource {
    /// Create a new mock returning no entries.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            fetches: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(None)),
            rate_limited: Arc::new(RwLock::new(false)),
        }
    }

    /// Create a mock returning the given entries.
    pub fn with_entries(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(entries)),
            ..Self::new()
        }
    }

    /// Replace the entries returned by subsequent fetches.
    pub async fn set_entries(&self, entries: Vec<CatalogEntry>) {
        *self.entries.write().await = entries;
    }

    /// Delay every fetch by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    // =========================================================================
    // Fetch Recording
    // =========================================================================

    /// Get all recorded fetches.
    pub async fn recorded_fetches(&self) -> Vec<RecordedFetch> {
        self.fetches.read().await.clone()
    }

    /// Get the number of fetches performed.
    pub async fn fetch_count(&self) -> usize {
        self.fetches.read().await.len()
    }

    // =========================================================================
    // Error Injection
    // =========================================================================

    /// Configure the next fetch to fail with the given error.
    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    /// Clear any pending error.
    pub async fn clear_next_error(&self) {
        *self.next_error.write().await = None;
    }

    /// Make every fetch fail with `RateLimitExceeded` until cleared.
    pub async fn set_rate_limited(&self, limited: bool) {
        *self.rate_limited.write().await = limited;
    }
}

#[async_trait]
impl CatalogSource for MockCatalogSource {
    async fn fetch_top_entries(
        &self,
        genre_id: u32,
        page: u32,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        self.fetches
            .write()
            .await
            .push(RecordedFetch { genre_id, page });

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        if *self.rate_limited.read().await {
            return Err(CatalogError::RateLimitExceeded);
        }

        Ok(self.entries.read().await.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
