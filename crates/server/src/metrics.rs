//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the podcache server:
//! - HTTP request metrics (latency, counts)
//! - Cache contents and freshness (collected dynamically)
//! - Core refresh and external service metrics (registered from core)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use tracing::error;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "podcache_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("podcache_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "podcache_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Cache Metrics (collected dynamically)
// =============================================================================

/// Featured podcasts in the store.
pub static FEATURED_PODCASTS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "podcache_featured_podcasts",
        "Number of featured podcasts in the cache",
    )
    .unwrap()
});

/// Whether the popular-podcasts cache key is fresh (1) or stale (0).
pub static CACHE_FRESH: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "podcache_cache_fresh",
        "Whether the popular podcasts cache is fresh (1) or stale (0)",
    )
    .unwrap()
});

/// Seconds since the last successful refresh (-1 if never refreshed).
pub static CACHE_AGE_SECONDS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "podcache_cache_age_seconds",
        "Seconds since the last successful refresh, -1 if never refreshed",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Cache
    registry
        .register(Box::new(FEATURED_PODCASTS.clone()))
        .unwrap();
    registry.register(Box::new(CACHE_FRESH.clone())).unwrap();
    registry
        .register(Box::new(CACHE_AGE_SECONDS.clone()))
        .unwrap();

    // Core metrics (refresh, artwork, external services)
    for metric in podcache_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the cache gauges reflect the store.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let podcasts = state.podcasts();
    match podcasts.cache_status() {
        Ok(status) => {
            FEATURED_PODCASTS.set(status.featured_count as i64);
            CACHE_FRESH.set(if status.fresh { 1 } else { 0 });
            let age = status
                .last_refreshed_at
                .map(|at| (podcasts.now() - at).num_seconds())
                .unwrap_or(-1);
            CACHE_AGE_SECONDS.set(age);
        }
        Err(e) => error!("Failed to collect cache metrics: {}", e),
    }
}

/// Path label for requests that matched no route.
pub const UNMATCHED_PATH: &str = "unmatched";
