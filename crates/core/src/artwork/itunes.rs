//! iTunes Search API client.
//!
//! No API key is required. Responses are served as `text/javascript`, so
//! bodies are read as text and parsed explicitly.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{
    derive_artwork_set, ArtworkError, ArtworkResolver, ArtworkSet, ArtworkSource,
    ArtworkStrategy, ChainedArtworkResolver,
};
use crate::config::ArtworkConfig;
use crate::metrics::observe_external_call;
use crate::podcast_catalog::Lenient;

const SERVICE: &str = "itunes";

/// iTunes API client.
///
/// Keeps at most one idle connection to the API host; it is closed when the
/// client is dropped.
pub struct ItunesClient {
    client: Client,
    base_url: String,
    country: String,
    search_limit: u32,
}

impl ItunesClient {
    /// Create a new iTunes client.
    pub fn new(config: &ArtworkConfig) -> Result<Self, ArtworkError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_secs)))
            .pool_max_idle_per_host(1)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            country: config.country.clone(),
            search_limit: config.search_limit,
        })
    }

    /// Look up a podcast by iTunes collection id and return its `artworkUrl100`.
    pub async fn lookup_artwork_url(&self, itunes_id: &str) -> Result<Option<String>, ArtworkError> {
        let url = format!("{}/lookup", self.base_url);
        debug!("iTunes lookup: id={}", itunes_id);

        let started = Instant::now();
        let result = self
            .get_first_artwork(self.client.get(&url).query(&[("id", itunes_id)]))
            .await;
        observe_external_call(
            SERVICE,
            "lookup",
            started.elapsed().as_secs_f64(),
            result.is_ok(),
        );
        result
    }

    /// Search podcasts by name and return the first result's `artworkUrl100`.
    pub async fn search_artwork_url(&self, term: &str) -> Result<Option<String>, ArtworkError> {
        let url = format!("{}/search", self.base_url);
        debug!("iTunes search: term='{}'", term);

        let limit = self.search_limit.to_string();
        let request = self.client.get(&url).query(&[
            ("term", term),
            ("entity", "podcast"),
            ("country", self.country.as_str()),
            ("limit", limit.as_str()),
        ]);

        let started = Instant::now();
        let result = self.get_first_artwork(request).await;
        observe_external_call(
            SERVICE,
            "search",
            started.elapsed().as_secs_f64(),
            result.is_ok(),
        );
        result
    }

    async fn get_first_artwork(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Option<String>, ArtworkError> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArtworkError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_first_artwork_url(&body)
    }
}

// ============================================================================
// iTunes API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct ItunesResponse {
    #[serde(default)]
    results: Vec<Lenient<ItunesResult>>,
}

#[derive(Debug, Deserialize)]
struct ItunesResult {
    #[serde(rename = "artworkUrl100", default)]
    artwork_url_100: Lenient<String>,
}

/// Extract `artworkUrl100` of the first result, if any.
fn parse_first_artwork_url(body: &str) -> Result<Option<String>, ArtworkError> {
    let response: ItunesResponse = serde_json::from_str(body)
        .map_err(|e| ArtworkError::ParseError(format!("Failed to parse iTunes response: {}", e)))?;

    Ok(response
        .results
        .into_iter()
        .next()
        .and_then(Lenient::into_inner)
        .and_then(|r| r.artwork_url_100.into_inner())
        .filter(|url| !url.is_empty()))
}

fn artwork_from(result: Result<Option<String>, ArtworkError>, context: &str) -> Option<ArtworkSet> {
    match result {
        Ok(Some(url)) => {
            let set = derive_artwork_set(&url);
            if set.is_none() {
                debug!("iTunes artwork URL has no 100x100bb token ({}): {}", context, url);
            }
            set
        }
        Ok(None) => None,
        Err(e) => {
            warn!("iTunes request failed ({}): {}", context, e);
            None
        }
    }
}

/// Resolve artwork through the iTunes id supplied by the catalog.
pub struct LookupById {
    client: Arc<ItunesClient>,
}

impl LookupById {
    pub fn new(client: Arc<ItunesClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ArtworkStrategy for LookupById {
    fn name(&self) -> &'static str {
        "lookup_by_id"
    }

    async fn resolve(&self, itunes_id: Option<&str>, _title: &str) -> Option<ArtworkSet> {
        let id = itunes_id?;
        artwork_from(self.client.lookup_artwork_url(id).await, "lookup")
    }
}

/// Resolve artwork by searching for the podcast's display name.
pub struct SearchByName {
    client: Arc<ItunesClient>,
}

impl SearchByName {
    pub fn new(client: Arc<ItunesClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ArtworkStrategy for SearchByName {
    fn name(&self) -> &'static str {
        "search_by_name"
    }

    async fn resolve(&self, _itunes_id: Option<&str>, title: &str) -> Option<ArtworkSet> {
        if title.trim().is_empty() {
            return None;
        }
        artwork_from(self.client.search_artwork_url(title).await, "search")
    }
}

/// Opens iTunes-backed resolvers: lookup by id first, then search by name.
pub struct ItunesArtworkSource {
    config: ArtworkConfig,
}

impl ItunesArtworkSource {
    pub fn new(config: ArtworkConfig) -> Self {
        Self { config }
    }
}

impl ArtworkSource for ItunesArtworkSource {
    fn open(&self) -> Result<Box<dyn ArtworkResolver>, ArtworkError> {
        let client = Arc::new(ItunesClient::new(&self.config)?);
        Ok(Box::new(ChainedArtworkResolver::new(vec![
            Box::new(LookupById::new(Arc::clone(&client))),
            Box::new(SearchByName::new(client)),
        ])))
    }
}
