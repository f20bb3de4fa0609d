//! Podcast catalog integration (Listen Notes).
//!
//! The catalog supplies the ranked list of popular podcasts that the cache
//! serves. Responses are normalized field by field so degraded API tiers
//! produce absent fields instead of failures.

mod lenient;
mod listen_notes;
mod types;

pub use lenient::{Lenient, LooseId};
pub use listen_notes::ListenNotesClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when fetching from the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

impl CatalogError {
    /// Misconfiguration, as opposed to a transient upstream failure.
    pub fn is_configuration(&self) -> bool {
        matches!(self, CatalogError::NotConfigured(_))
    }
}

/// Source of ranked catalog entries.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch one page of the best podcasts for a genre (0 = overall).
    async fn fetch_top_entries(
        &self,
        genre_id: u32,
        page: u32,
    ) -> Result<Vec<CatalogEntry>, CatalogError>;

    /// Name used in logs and metrics.
    fn name(&self) -> &'static str;
}
