pub mod artwork;
pub mod clock;
pub mod config;
pub mod freshness;
pub mod metrics;
pub mod podcast_catalog;
pub mod refresh;
pub mod serving;
pub mod store;
pub mod testing;

pub use artwork::{
    derive_artwork_set, ArtworkResolver, ArtworkSet, ArtworkSource, ArtworkStrategy,
    ChainedArtworkResolver, ItunesArtworkSource, ItunesClient, RequestPacer,
};
pub use clock::{Clock, SystemClock};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, Environment,
    RefreshMode, SanitizedConfig,
};
pub use freshness::{is_within_ttl, FreshnessTracker};
pub use podcast_catalog::{CatalogEntry, CatalogError, CatalogSource, ListenNotesClient};
pub use refresh::{
    BackgroundRefresher, PodcastRefresher, RefreshError, RefreshOutcome, RefreshReport,
};
pub use serving::{CacheStatus, PopularPodcasts};
pub use store::{CacheStore, PodcastRecord, PodcastStore, SqliteStore, StoreError};
