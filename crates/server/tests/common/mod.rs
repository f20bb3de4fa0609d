//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock upstreams injected, enabling E2E testing without network
//! access.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use podcache_core::testing::{ManualClock, MockArtworkSource, MockCatalogSource};
use podcache_core::{
    config::{CacheConfig, CatalogConfig, DatabaseConfig},
    Config, Environment, FreshnessTracker, PodcastRefresher, PopularPodcasts, RefreshMode,
    SqliteStore,
};

/// Re-export fixtures for test convenience
pub use podcache_core::testing::fixtures;

/// Test fixture for E2E testing with mock dependencies.
///
/// Provides an in-process server with fully controllable mocks for:
/// - The podcast catalog (MockCatalogSource)
/// - Artwork resolution (MockArtworkSource)
/// - Wall clock (ManualClock)
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock catalog - configure the best-podcasts listing
    pub catalog: Arc<MockCatalogSource>,
    /// Mock artwork source - configure resolved artwork per title
    pub artwork: Arc<MockArtworkSource>,
    /// Clock used for freshness decisions
    pub clock: Arc<ManualClock>,
    /// Store backing the server, for seeding and inspection
    pub store: Arc<SqliteStore>,
    /// Temporary directory for test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let catalog = Arc::new(MockCatalogSource::new());
        let artwork = Arc::new(MockArtworkSource::new());
        let clock = Arc::new(ManualClock::new(fixtures::epoch()));

        let config = Config {
            environment: test_config.environment,
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            catalog: CatalogConfig {
                api_key: Some("secret-test-key".to_string()),
                ..Default::default()
            },
            cache: CacheConfig {
                refresh_mode: test_config.refresh_mode,
                ..Default::default()
            },
            ..Default::default()
        };

        let store = Arc::new(SqliteStore::new(&db_path).expect("Failed to create store"));
        let freshness = Arc::new(FreshnessTracker::new(store.clone(), clock.clone()));
        let refresher = Arc::new(PodcastRefresher::new(
            catalog.clone(),
            artwork.clone(),
            store.clone(),
            freshness,
            config.refresh.clone(),
            Duration::ZERO,
        ));
        let podcasts = Arc::new(PopularPodcasts::new(
            refresher,
            store.clone(),
            config.cache.clone(),
        ));

        let state = Arc::new(podcache_server::state::AppState::new(config, podcasts));
        let router = podcache_server::api::create_router(state);

        Self {
            router,
            catalog,
            artwork,
            clock,
            store,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub refresh_mode: RefreshMode,
    pub environment: Environment,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            refresh_mode: RefreshMode::Inline,
            environment: Environment::Deployed,
        }
    }
}

impl TestConfig {
    /// Reads never trigger a refresh.
    pub fn background() -> Self {
        Self {
            refresh_mode: RefreshMode::Background,
            ..Default::default()
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
