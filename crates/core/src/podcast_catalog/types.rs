//! Types produced by the podcast catalog client.

use serde::{Deserialize, Serialize};

/// One ranked podcast from the upstream catalog, already normalized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    /// Catalog identifier (unique, never empty).
    pub external_id: String,
    /// Podcast title.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Single cover image URL from the catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    /// RSS feed URL (always http or https when present).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_episodes: Option<i64>,
    /// Popularity score used for ranking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_score: Option<i64>,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    /// Page of this podcast on the catalog's website.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_url: Option<String>,
    /// Identifier in the artwork service (iTunes collection id).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub itunes_id: Option<String>,
}

impl CatalogEntry {
    /// Genre ids as stored: comma-joined, absent when there are none.
    pub fn genre_ids_joined(&self) -> Option<String> {
        if self.genre_ids.is_empty() {
            return None;
        }
        Some(
            self.genre_ids
                .iter()
                .map(|g| g.to_string())
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}

/// Keep a feed URL only if it is usable as a playback source.
pub fn normalize_feed_url(feed_url: Option<String>) -> Option<String> {
    feed_url.filter(|url| url.starts_with("http://") || url.starts_with("https://"))
}
