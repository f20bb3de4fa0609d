use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub artwork: ArtworkConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

/// Deployment environment. Only transport concerns (CORS) depend on it.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Local,
    Deployed,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("podcache.db")
}

/// Listen Notes catalog configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Listen Notes API key. When absent every refresh fails fast.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL (default: https://listen-api.listennotes.com/api/v2)
    #[serde(default = "default_catalog_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_catalog_timeout")]
    pub timeout_secs: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_catalog_base_url(),
            timeout_secs: default_catalog_timeout(),
        }
    }
}

fn default_catalog_base_url() -> String {
    "https://listen-api.listennotes.com/api/v2".to_string()
}

fn default_catalog_timeout() -> u32 {
    30
}

/// iTunes artwork lookup configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtworkConfig {
    /// Base URL (default: https://itunes.apple.com)
    #[serde(default = "default_artwork_base_url")]
    pub base_url: String,
    /// Storefront country used by the search strategy.
    #[serde(default = "default_country")]
    pub country: String,
    /// Maximum results requested by the search strategy.
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_artwork_timeout")]
    pub timeout_secs: u32,
    /// Minimum delay between two artwork resolutions, in milliseconds.
    /// iTunes enforces a request-rate ceiling.
    #[serde(default = "default_request_delay")]
    pub request_delay_ms: u64,
}

impl ArtworkConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl Default for ArtworkConfig {
    fn default() -> Self {
        Self {
            base_url: default_artwork_base_url(),
            country: default_country(),
            search_limit: default_search_limit(),
            timeout_secs: default_artwork_timeout(),
            request_delay_ms: default_request_delay(),
        }
    }
}

fn default_artwork_base_url() -> String {
    "https://itunes.apple.com".to_string()
}

fn default_country() -> String {
    "us".to_string()
}

fn default_search_limit() -> u32 {
    5
}

fn default_artwork_timeout() -> u32 {
    10
}

fn default_request_delay() -> u64 {
    500
}

/// How stale data gets refreshed.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RefreshMode {
    /// A stale read refreshes synchronously before answering.
    #[default]
    Inline,
    /// Reads never refresh; a background task keeps the key fresh.
    Background,
}

/// Cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Cache key for the popular podcast result set.
    #[serde(default = "default_cache_key")]
    pub key: String,
    /// Time to live in hours (default: 24)
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u32,
    #[serde(default)]
    pub refresh_mode: RefreshMode,
    /// Poll interval of the background refresher, in seconds.
    #[serde(default = "default_background_interval")]
    pub background_interval_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.ttl_hours))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key: default_cache_key(),
            ttl_hours: default_ttl_hours(),
            refresh_mode: RefreshMode::default(),
            background_interval_secs: default_background_interval(),
        }
    }
}

pub const DEFAULT_CACHE_KEY: &str = "best_podcasts_overall";

fn default_cache_key() -> String {
    DEFAULT_CACHE_KEY.to_string()
}

fn default_ttl_hours() -> u32 {
    24
}

fn default_background_interval() -> u64 {
    300
}

/// What a refresh cycle fetches.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RefreshConfig {
    /// Listen Notes genre filter. 0 = overall best podcasts.
    #[serde(default)]
    pub genre_id: u32,
    /// Catalog page fetched per cycle (1-indexed).
    #[serde(default = "default_page")]
    pub page: u32,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            genre_id: 0,
            page: default_page(),
        }
    }
}

fn default_page() -> u32 {
    1
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub catalog: SanitizedCatalogConfig,
    pub artwork: ArtworkConfig,
    pub cache: CacheConfig,
    pub refresh: RefreshConfig,
}

/// Sanitized catalog config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCatalogConfig {
    pub base_url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            environment: config.environment,
            server: config.server.clone(),
            database: config.database.clone(),
            catalog: SanitizedCatalogConfig {
                base_url: config.catalog.base_url.clone(),
                api_key_configured: config
                    .catalog
                    .api_key
                    .as_deref()
                    .is_some_and(|k| !k.is_empty()),
                timeout_secs: config.catalog.timeout_secs,
            },
            artwork: config.artwork.clone(),
            cache: config.cache.clone(),
            refresh: config.refresh.clone(),
        }
    }
}
