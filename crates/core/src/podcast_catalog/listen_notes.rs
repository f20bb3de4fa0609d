//! Listen Notes podcast API client.
//!
//! Listen Notes requires an API key, sent in the `X-ListenAPI-Key` header.
//! Free-tier responses replace some fields with upgrade notices; those are
//! normalized to absent.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::lenient::{Lenient, LooseId};
use super::types::{normalize_feed_url, CatalogEntry};
use super::{CatalogError, CatalogSource};
use crate::config::CatalogConfig;
use crate::metrics::observe_external_call;

const SERVICE: &str = "listen_notes";

/// Listen Notes API client.
pub struct ListenNotesClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ListenNotesClient {
    /// Create a new Listen Notes client.
    ///
    /// A missing or empty API key is accepted here; every fetch then fails
    /// with [`CatalogError::NotConfigured`] without touching the network.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_secs)))
            .build()?;

        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Whether an API key is available.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn request_best_podcasts(
        &self,
        api_key: &str,
        genre_id: u32,
        page: u32,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        let url = format!("{}/best_podcasts", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("X-ListenAPI-Key", api_key)
            .query(&[("genre_id", genre_id), ("page", page)])
            .send()
            .await?;

        let status = response.status();
        if status == 401 {
            return Err(CatalogError::NotConfigured(
                "Invalid Listen Notes API key".to_string(),
            ));
        }
        if status == 429 {
            return Err(CatalogError::RateLimitExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        parse_best_podcasts(&body)
    }
}

#[async_trait::async_trait]
impl CatalogSource for ListenNotesClient {
    async fn fetch_top_entries(
        &self,
        genre_id: u32,
        page: u32,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(CatalogError::NotConfigured(
                "Listen Notes API key is not set".to_string(),
            ));
        };

        info!(
            "Fetching best podcasts from Listen Notes (genre_id={}, page={})",
            genre_id, page
        );

        let started = Instant::now();
        let result = self.request_best_podcasts(api_key, genre_id, page).await;
        observe_external_call(
            SERVICE,
            "best_podcasts",
            started.elapsed().as_secs_f64(),
            result.is_ok(),
        );

        if let Ok(entries) = &result {
            info!("Fetched {} podcasts from Listen Notes", entries.len());
        }
        result
    }

    fn name(&self) -> &'static str {
        SERVICE
    }
}

// ============================================================================
// Listen Notes API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct BestPodcastsResponse {
    #[serde(default)]
    podcasts: Vec<Lenient<RawPodcast>>,
}

#[derive(Debug, Deserialize)]
struct RawPodcast {
    #[serde(default)]
    id: Lenient<LooseId>,
    #[serde(default)]
    title: Lenient<String>,
    #[serde(default)]
    publisher: Lenient<String>,
    #[serde(default)]
    description: Lenient<String>,
    #[serde(default)]
    image: Lenient<String>,
    #[serde(default)]
    rss: Lenient<String>,
    #[serde(default)]
    total_episodes: Lenient<i64>,
    #[serde(default)]
    listen_score: Lenient<i64>,
    #[serde(default)]
    genre_ids: Lenient<Vec<i64>>,
    #[serde(default)]
    listennotes_url: Lenient<String>,
    #[serde(default)]
    itunes_id: Lenient<LooseId>,
}

impl RawPodcast {
    fn into_entry(self) -> Option<CatalogEntry> {
        let external_id = self.id.into_inner().and_then(LooseId::into_string)?;

        Some(CatalogEntry {
            external_id,
            title: self
                .title
                .into_inner()
                .unwrap_or_else(|| "Unknown".to_string()),
            publisher: self.publisher.into_inner(),
            description: self.description.into_inner(),
            cover_url: self.image.into_inner(),
            feed_url: normalize_feed_url(self.rss.into_inner()),
            total_episodes: self.total_episodes.into_inner(),
            listen_score: self.listen_score.into_inner(),
            genre_ids: self.genre_ids.into_inner().unwrap_or_default(),
            catalog_url: self.listennotes_url.into_inner(),
            itunes_id: self.itunes_id.into_inner().and_then(LooseId::into_string),
        })
    }
}

/// Parse a `best_podcasts` response body into normalized entries.
///
/// Entries without an identifier are dropped.
pub(crate) fn parse_best_podcasts(body: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
    let response: BestPodcastsResponse = serde_json::from_str(body).map_err(|e| {
        CatalogError::ParseError(format!("Failed to parse best podcasts response: {}", e))
    })?;

    let total = response.podcasts.len();
    let entries: Vec<CatalogEntry> = response
        .podcasts
        .into_iter()
        .filter_map(|p| p.into_inner().and_then(RawPodcast::into_entry))
        .collect();

    if entries.len() < total {
        debug!(
            "Dropped {} catalog entries without a usable identifier",
            total - entries.len()
        );
    }

    Ok(entries)
}
