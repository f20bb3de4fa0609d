//! Mock artwork source for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::artwork::{ArtworkError, ArtworkResolver, ArtworkSet, ArtworkSource};

/// A recorded artwork lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedLookup {
    pub itunes_id: Option<String>,
    pub title: String,
}

/// Mock implementation of the ArtworkSource trait.
///
/// Artwork is keyed by podcast title; unknown titles resolve to `None`.
/// Opened resolvers are counted so tests can check that every cycle
/// releases its resolver.
#[derive(Debug, Default)]
pub struct MockArtworkSource {
    artwork: Arc<RwLock<HashMap<String, ArtworkSet>>>,
    lookups: Arc<RwLock<Vec<RecordedLookup>>>,
    opened: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
    fail_open: AtomicBool,
}

impl MockArtworkSource {
    /// Create a mock that finds no artwork.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `title` to `set`.
    pub async fn set_artwork(&self, title: &str, set: ArtworkSet) {
        self.artwork.write().await.insert(title.to_string(), set);
    }

    /// Make `open` fail.
    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    /// Get all recorded lookups.
    pub async fn recorded_lookups(&self) -> Vec<RecordedLookup> {
        self.lookups.read().await.clone()
    }

    /// Number of resolvers opened so far.
    pub fn opened_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of resolvers opened and not yet dropped.
    pub fn live_count(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl ArtworkSource for MockArtworkSource {
    fn open(&self) -> Result<Box<dyn ArtworkResolver>, ArtworkError> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(ArtworkError::ParseError("mock open failure".to_string()));
        }

        self.opened.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(MockArtworkResolver {
            artwork: Arc::clone(&self.artwork),
            lookups: Arc::clone(&self.lookups),
            live: Arc::clone(&self.live),
        }))
    }
}

struct MockArtworkResolver {
    artwork: Arc<RwLock<HashMap<String, ArtworkSet>>>,
    lookups: Arc<RwLock<Vec<RecordedLookup>>>,
    live: Arc<AtomicUsize>,
}

impl Drop for MockArtworkResolver {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ArtworkResolver for MockArtworkResolver {
    async fn resolve(&self, itunes_id: Option<&str>, title: &str) -> Option<ArtworkSet> {
        self.lookups.write().await.push(RecordedLookup {
            itunes_id: itunes_id.map(str::to_string),
            title: title.to_string(),
        });
        self.artwork.read().await.get(title).cloned()
    }
}
