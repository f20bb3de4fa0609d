//! End-to-end tests with mocked external dependencies.
//!
//! These tests run the full server stack in-process with mock implementations
//! for the external services (Listen Notes, iTunes).

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Duration;
use podcache_core::{CatalogError, PodcastStore};
use serde_json::json;
use tower::ServiceExt;

use common::{fixtures, TestConfig, TestFixture};

async fn seed_catalog(fixture: &TestFixture) {
    fixture
        .catalog
        .set_entries(vec![
            fixtures::catalog_entry("ln-1", "Mid Show", Some(70)),
            fixtures::catalog_entry("ln-2", "Top Show", Some(95)),
            fixtures::catalog_entry("ln-3", "Unscored Show", None),
            fixtures::catalog_entry("ln-4", "Low Show", Some(40)),
            fixtures::catalog_entry("ln-5", "Second Show", Some(90)),
            fixtures::catalog_entry("ln-6", "Also Mid", Some(70)),
        ])
        .await;
}

// =============================================================================
// Basic API Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/health").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "status", json!("ok"));
}

#[tokio::test]
async fn test_config_hides_api_key() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/config").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["catalog"]["api_key_configured"], true);
    assert!(response.body["catalog"].get("api_key").is_none());
    assert!(!response.text.contains("secret-test-key"));
    assert_eq!(response.body["cache"]["key"], "best_podcasts_overall");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/nothing-here").await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

// =============================================================================
// Popular Podcasts
// =============================================================================

#[tokio::test]
async fn test_popular_defaults_to_four_ordered_by_score() {
    let fixture = TestFixture::new().await;
    seed_catalog(&fixture).await;

    let response = fixture.get("/api/v1/podcasts/popular").await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "count", json!(4));
    let titles: Vec<&str> = response.body["podcasts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Top Show", "Second Show", "Also Mid", "Mid Show"]);
    assert_eq!(fixture.catalog.fetch_count().await, 1);
}

#[tokio::test]
async fn test_popular_unscored_podcasts_come_last() {
    let fixture = TestFixture::new().await;
    seed_catalog(&fixture).await;

    let response = fixture.get("/api/v1/podcasts/popular?limit=20").await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "count", json!(6));
    assert_eq!(response.body["podcasts"][5]["title"], "Unscored Show");
    assert!(response.body["podcasts"][5]["listen_score"].is_null());
}

#[tokio::test]
async fn test_popular_limit_out_of_range_is_rejected() {
    let fixture = TestFixture::new().await;
    seed_catalog(&fixture).await;

    for path in [
        "/api/v1/podcasts/popular?limit=0",
        "/api/v1/podcasts/popular?limit=21",
    ] {
        let response = fixture.get(path).await;
        assert_status!(response, StatusCode::BAD_REQUEST);
        assert!(response.body["error"].as_str().unwrap().contains("limit"));
    }

    // Rejected requests never reach the catalog
    assert_eq!(fixture.catalog.fetch_count().await, 0);
}

#[tokio::test]
async fn test_popular_limit_bounds_are_accepted() {
    let fixture = TestFixture::new().await;
    seed_catalog(&fixture).await;

    let one = fixture.get("/api/v1/podcasts/popular?limit=1").await;
    assert_status!(one, StatusCode::OK);
    assert_json_path!(one.body, "count", json!(1));

    let twenty = fixture.get("/api/v1/podcasts/popular?limit=20").await;
    assert_status!(twenty, StatusCode::OK);
}

#[tokio::test]
async fn test_popular_non_numeric_limit_is_rejected() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/podcasts/popular?limit=many").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_fresh_cache_is_served_without_fetching() {
    let fixture = TestFixture::new().await;
    seed_catalog(&fixture).await;

    fixture.get("/api/v1/podcasts/popular").await;
    fixture.clock.advance(Duration::hours(23));
    let response = fixture.get("/api/v1/podcasts/popular").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(fixture.catalog.fetch_count().await, 1);
}

#[tokio::test]
async fn test_stale_cache_is_refreshed_on_read() {
    let fixture = TestFixture::new().await;
    seed_catalog(&fixture).await;
    fixture.get("/api/v1/podcasts/popular").await;

    fixture
        .catalog
        .set_entries(vec![fixtures::catalog_entry("ln-9", "New Leader", Some(99))])
        .await;
    fixture.clock.advance(Duration::hours(25));

    let response = fixture.get("/api/v1/podcasts/popular").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(fixture.catalog.fetch_count().await, 2);
    assert_eq!(response.body["podcasts"][0]["title"], "New Leader");
}

#[tokio::test]
async fn test_refresh_failure_still_serves_stored_podcasts() {
    let fixture = TestFixture::new().await;
    seed_catalog(&fixture).await;
    fixture.get("/api/v1/podcasts/popular").await;

    fixture.clock.advance(Duration::hours(25));
    fixture
        .catalog
        .set_next_error(CatalogError::ApiError {
            status: 500,
            message: "upstream down".to_string(),
        })
        .await;

    let response = fixture.get("/api/v1/podcasts/popular").await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "count", json!(4));
    assert_eq!(response.body["podcasts"][0]["title"], "Top Show");
}

#[tokio::test]
async fn test_empty_cache_with_failing_catalog_returns_empty_list() {
    let fixture = TestFixture::new().await;
    fixture
        .catalog
        .set_next_error(CatalogError::NotConfigured("no api key".to_string()))
        .await;

    let response = fixture.get("/api/v1/podcasts/popular").await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "count", json!(0));
    assert_eq!(response.body["podcasts"], json!([]));
}

#[tokio::test]
async fn test_resolved_artwork_is_exposed() {
    let fixture = TestFixture::new().await;
    seed_catalog(&fixture).await;
    fixture
        .artwork
        .set_artwork("Top Show", fixtures::artwork_set("top-show"))
        .await;

    let response = fixture.get("/api/v1/podcasts/popular?limit=2").await;

    let top = &response.body["podcasts"][0];
    assert_eq!(top["title"], "Top Show");
    assert!(top["artwork_large"]
        .as_str()
        .unwrap()
        .ends_with("top-show/100000x100000-999.jpg"));

    // Without resolved artwork, every size falls back to the catalog cover
    let second = &response.body["podcasts"][1];
    assert_eq!(second["artwork_small"], second["image_url"]);
    assert_eq!(second["artwork_large"], second["image_url"]);
}

#[tokio::test]
async fn test_background_mode_reads_never_fetch() {
    let fixture = TestFixture::with_config(TestConfig::background()).await;
    seed_catalog(&fixture).await;

    let response = fixture.get("/api/v1/podcasts/popular").await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "count", json!(0));
    assert_eq!(fixture.catalog.fetch_count().await, 0);
}

// =============================================================================
// Podcast Lookup
// =============================================================================

#[tokio::test]
async fn test_get_podcast_by_id() {
    let fixture = TestFixture::new().await;
    seed_catalog(&fixture).await;

    let list = fixture.get("/api/v1/podcasts/popular?limit=1").await;
    let id = list.body["podcasts"][0]["id"].as_str().unwrap().to_string();

    let response = fixture.get(&format!("/api/v1/podcasts/{}", id)).await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "id", json!(id));
    assert_json_path!(response.body, "title", json!("Top Show"));
    assert_json_path!(response.body, "genre_ids", json!([67, 133]));
    assert!(response.body.get("external_id").is_none());
}

#[tokio::test]
async fn test_get_podcast_matches_store_record() {
    let fixture = TestFixture::new().await;
    seed_catalog(&fixture).await;
    fixture.get("/api/v1/podcasts/popular").await;

    let stored = fixture.store.list_featured(1).unwrap().remove(0);
    let response = fixture
        .get(&format!("/api/v1/podcasts/{}", stored.id))
        .await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["feed_url"], json!(stored.feed_url));
}

#[tokio::test]
async fn test_get_unknown_podcast_is_404() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .get("/api/v1/podcasts/550e8400-e29b-41d4-a716-446655440000")
        .await;

    assert_status!(response, StatusCode::NOT_FOUND);
    assert_json_path!(response.body, "error", json!("Podcast not found"));
}

// =============================================================================
// Cache Status
// =============================================================================

#[tokio::test]
async fn test_cache_status_before_first_refresh() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/podcasts/cache").await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "key", json!("best_podcasts_overall"));
    assert_json_path!(response.body, "fresh", json!(false));
    assert_json_path!(response.body, "featured_count", json!(0));
    assert_json_path!(response.body, "refresh_mode", json!("inline"));
    assert!(response.body["last_refreshed_at"].is_null());
}

#[tokio::test]
async fn test_cache_status_after_refresh() {
    let fixture = TestFixture::new().await;
    seed_catalog(&fixture).await;
    fixture.get("/api/v1/podcasts/popular").await;

    let response = fixture.get("/api/v1/podcasts/cache").await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "fresh", json!(true));
    assert_json_path!(response.body, "featured_count", json!(6));
    assert_json_path!(response.body, "ttl_hours", json!(24));
    assert!(response.body["last_refreshed_at"].is_string());

    fixture.clock.advance(Duration::hours(24));
    let stale = fixture.get("/api/v1/podcasts/cache").await;
    assert_json_path!(stale.body, "fresh", json!(false));
}

// =============================================================================
// Metrics and transport
// =============================================================================

#[tokio::test]
async fn test_metrics_endpoint_exposes_prometheus_text() {
    let fixture = TestFixture::new().await;
    seed_catalog(&fixture).await;
    fixture.get("/api/v1/podcasts/popular").await;

    let response = fixture.get("/api/v1/metrics").await;

    assert_status!(response, StatusCode::OK);
    assert!(response.text.contains("podcache_http_requests_total"));
    assert!(response.text.contains("podcache_featured_podcasts"));
    assert!(response.text.contains("podcache_refresh_attempts_total"));
}

#[tokio::test]
async fn test_metrics_label_podcast_lookups_by_route() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/podcasts/not-a-real-id").await;
    assert_status!(response, StatusCode::NOT_FOUND);

    let metrics = fixture.get("/api/v1/metrics").await;
    assert!(metrics
        .text
        .contains(r#"path="/api/v1/podcasts/{id}",status="404""#));
    assert!(!metrics.text.contains("not-a-real-id"));
}

#[tokio::test]
async fn test_local_environment_allows_cross_origin_reads() {
    let fixture = TestFixture::with_config(TestConfig {
        environment: podcache_core::Environment::Local,
        ..Default::default()
    })
    .await;

    let request = Request::builder()
        .uri("/api/v1/health")
        .header("Origin", "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = fixture.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_deployed_environment_sends_no_cors_headers() {
    let fixture = TestFixture::new().await;

    let request = Request::builder()
        .uri("/api/v1/health")
        .header("Origin", "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = fixture.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response
        .headers()
        .contains_key("access-control-allow-origin"));
}
