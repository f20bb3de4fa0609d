//! Podcast artwork resolution.
//!
//! Artwork comes from the iTunes lookup/search API. A resolver tries an
//! ordered list of strategies and the first one that yields artwork wins.
//! Every failure below this module becomes "no artwork"; callers fall back
//! to the catalog's cover image.

mod itunes;
mod pacer;

pub use itunes::{ItunesArtworkSource, ItunesClient, LookupById, SearchByName};
pub use pacer::RequestPacer;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::metrics::ARTWORK_RESOLUTIONS;

/// Errors raised by the artwork transport. Never leave this module's resolvers.
#[derive(Debug, Error)]
pub enum ArtworkError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Unexpected status: {0}")]
    Status(u16),

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Artwork URLs in three size classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkSet {
    /// 300x300
    pub small: String,
    /// 600x600
    pub medium: String,
    /// Largest available rendition.
    pub large: String,
}

impl ArtworkSet {
    /// The same URL in every slot (used when no artwork could be resolved).
    pub fn uniform(url: &str) -> Self {
        Self {
            small: url.to_string(),
            medium: url.to_string(),
            large: url.to_string(),
        }
    }
}

static ARTWORK_100_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<prefix>.*)100x100bb\.(?P<ext>[A-Za-z0-9]+)(?P<rest>.*)$").unwrap());

/// Derive the three size classes from an `artworkUrl100`.
///
/// The last `100x100bb.<ext>` token is replaced; the extension and anything
/// after it (query string, fragment) are kept. Returns `None` when the token
/// is missing.
pub fn derive_artwork_set(artwork_url_100: &str) -> Option<ArtworkSet> {
    let caps = ARTWORK_100_TOKEN.captures(artwork_url_100)?;
    let prefix = &caps["prefix"];
    let ext = &caps["ext"];
    let rest = &caps["rest"];

    Some(ArtworkSet {
        small: format!("{prefix}300x300bb.{ext}{rest}"),
        medium: format!("{prefix}600x600bb.{ext}{rest}"),
        large: format!("{prefix}100000x100000-999.{ext}{rest}"),
    })
}

/// One way of finding artwork for a podcast.
#[async_trait]
pub trait ArtworkStrategy: Send + Sync {
    /// Name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// `None` when the strategy does not apply, found nothing, or failed.
    async fn resolve(&self, itunes_id: Option<&str>, title: &str) -> Option<ArtworkSet>;
}

/// Resolves artwork for one podcast.
#[async_trait]
pub trait ArtworkResolver: Send + Sync {
    async fn resolve(&self, itunes_id: Option<&str>, title: &str) -> Option<ArtworkSet>;
}

/// Opens artwork resolvers.
///
/// A resolver holds a network connection; it is opened for one refresh cycle
/// and the connection is released when the resolver is dropped.
pub trait ArtworkSource: Send + Sync {
    fn open(&self) -> Result<Box<dyn ArtworkResolver>, ArtworkError>;
}

/// Tries strategies in order; first success wins.
pub struct ChainedArtworkResolver {
    strategies: Vec<Box<dyn ArtworkStrategy>>,
}

impl ChainedArtworkResolver {
    pub fn new(strategies: Vec<Box<dyn ArtworkStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }
}

#[async_trait]
impl ArtworkResolver for ChainedArtworkResolver {
    async fn resolve(&self, itunes_id: Option<&str>, title: &str) -> Option<ArtworkSet> {
        for strategy in &self.strategies {
            match strategy.resolve(itunes_id, title).await {
                Some(set) => {
                    ARTWORK_RESOLUTIONS
                        .with_label_values(&[strategy.name(), "hit"])
                        .inc();
                    debug!("Artwork for '{}' resolved by {}", title, strategy.name());
                    return Some(set);
                }
                None => {
                    ARTWORK_RESOLUTIONS
                        .with_label_values(&[strategy.name(), "miss"])
                        .inc();
                }
            }
        }
        None
    }
}
