//! Testing utilities and mock implementations.
//!
//! Mocks for the catalog and artwork collaborators plus a manual clock, so
//! refresh and serving behavior can be tested without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use podcache_core::testing::{fixtures, ManualClock, MockArtworkSource, MockCatalogSource};
//!
//! let catalog = MockCatalogSource::with_entries(vec![
//!     fixtures::catalog_entry("ln-1", "Show", Some(80)),
//! ]);
//! let artwork = MockArtworkSource::new();
//! let clock = ManualClock::new(fixtures::epoch());
//! ```

mod manual_clock;
mod mock_artwork;
mod mock_catalog_source;

pub use manual_clock::ManualClock;
pub use mock_artwork::{MockArtworkSource, RecordedLookup};
pub use mock_catalog_source::{MockCatalogSource, RecordedFetch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};

    use crate::artwork::ArtworkSet;
    use crate::podcast_catalog::CatalogEntry;

    /// A fixed reference instant.
    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0)
            .single()
            .unwrap_or_default()
    }

    /// Create a catalog entry with reasonable defaults.
    pub fn catalog_entry(external_id: &str, title: &str, listen_score: Option<i64>) -> CatalogEntry {
        CatalogEntry {
            external_id: external_id.to_string(),
            title: title.to_string(),
            publisher: Some(format!("{} Media", title)),
            description: Some(format!("A podcast called {}.", title)),
            cover_url: Some(format!("https://cdn.example.com/{}/cover.jpg", external_id)),
            feed_url: Some(format!("https://feeds.example.com/{}", external_id)),
            total_episodes: Some(120),
            listen_score,
            genre_ids: vec![67, 133],
            catalog_url: Some(format!("https://www.listennotes.com/c/{}/", external_id)),
            itunes_id: None,
        }
    }

    /// Create an artwork set in the iTunes size layout.
    pub fn artwork_set(slug: &str) -> ArtworkSet {
        let base = format!("https://is1-ssl.mzstatic.com/image/thumb/Podcasts/{}", slug);
        ArtworkSet {
            small: format!("{}/300x300bb.jpg", base),
            medium: format!("{}/600x600bb.jpg", base),
            large: format!("{}/100000x100000-999.jpg", base),
        }
    }
}
