//! Durable records kept by the podcast store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::artwork::ArtworkSet;
use crate::podcast_catalog::CatalogEntry;

/// Errors from the podcast/cache store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Podcast not found: {0}")]
    NotFound(String),
}

/// A cached podcast.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PodcastRecord {
    /// Local identifier (UUID v4).
    pub id: String,
    /// Identifier in the upstream catalog.
    pub external_id: String,
    pub title: String,
    pub publisher: Option<String>,
    pub description: Option<String>,
    /// Cover image from the catalog.
    pub image_url: Option<String>,
    pub artwork_small: Option<String>,
    pub artwork_medium: Option<String>,
    pub artwork_large: Option<String>,
    pub feed_url: Option<String>,
    pub total_episodes: Option<i64>,
    pub listen_score: Option<i64>,
    /// Comma-joined genre ids.
    pub genre_ids: Option<String>,
    pub catalog_url: Option<String>,
    pub itunes_id: Option<String>,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field values written for one podcast by a refresh cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PodcastUpsert {
    pub external_id: String,
    pub title: String,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub artwork_small: Option<String>,
    pub artwork_medium: Option<String>,
    pub artwork_large: Option<String>,
    pub feed_url: Option<String>,
    pub total_episodes: Option<i64>,
    pub listen_score: Option<i64>,
    pub genre_ids: Option<String>,
    pub catalog_url: Option<String>,
    pub itunes_id: Option<String>,
}

impl PodcastUpsert {
    /// Build the record fields for a catalog entry.
    ///
    /// Without resolved artwork, all three size slots carry the catalog's
    /// cover URL.
    pub fn from_entry(entry: CatalogEntry, artwork: Option<ArtworkSet>) -> Self {
        let genre_ids = entry.genre_ids_joined();
        let (small, medium, large) = match artwork {
            Some(set) => (Some(set.small), Some(set.medium), Some(set.large)),
            None => (
                entry.cover_url.clone(),
                entry.cover_url.clone(),
                entry.cover_url.clone(),
            ),
        };

        Self {
            external_id: entry.external_id,
            title: entry.title,
            publisher: entry.publisher,
            description: entry.description,
            image_url: entry.cover_url,
            artwork_small: small,
            artwork_medium: medium,
            artwork_large: large,
            feed_url: entry.feed_url,
            total_episodes: entry.total_episodes,
            listen_score: entry.listen_score,
            genre_ids,
            catalog_url: entry.catalog_url,
            itunes_id: entry.itunes_id,
        }
    }
}

/// What an upsert pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertSummary {
    pub inserted: u32,
    pub updated: u32,
    /// Entries rolled back because they violated a constraint.
    pub skipped: u32,
}

/// Last successful refresh of a logical cache key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntry {
    pub key: String,
    pub last_refreshed_at: DateTime<Utc>,
}
