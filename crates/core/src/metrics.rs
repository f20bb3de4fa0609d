//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Refresh cycles (attempts, duration, entries stored)
//! - Artwork resolution
//! - External services (Listen Notes, iTunes)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Refresh Metrics
// =============================================================================

/// Refresh attempts total by result.
pub static REFRESH_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "podcache_refresh_attempts_total",
            "Total cache refresh attempts",
        ),
        &["result"], // "success", "catalog_failed", "store_failed", "already_fresh", "joined_failed"
    )
    .unwrap()
});

/// Refresh duration in seconds.
pub static REFRESH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "podcache_refresh_duration_seconds",
            "Duration of a full refresh cycle",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["result"],
    )
    .unwrap()
});

/// Podcast records written per refresh.
pub static RECORDS_UPSERTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "podcache_records_upserted_total",
            "Podcast records written by refresh cycles",
        ),
        &["kind"], // "inserted", "updated", "skipped"
    )
    .unwrap()
});

// =============================================================================
// Artwork Metrics
// =============================================================================

/// Artwork resolutions by strategy and result.
pub static ARTWORK_RESOLUTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "podcache_artwork_resolutions_total",
            "Artwork resolution attempts",
        ),
        &["strategy", "result"], // result: "hit", "miss"
    )
    .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// External service request duration.
pub static EXTERNAL_SERVICE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "podcache_external_service_duration_seconds",
            "Duration of external service calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["service", "operation"],
    )
    .unwrap()
});

/// External service requests total.
pub static EXTERNAL_SERVICE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "podcache_external_service_requests_total",
            "Total external service requests",
        ),
        &["service", "operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Record the outcome of one external call.
pub fn observe_external_call(service: &str, operation: &str, elapsed_secs: f64, success: bool) {
    EXTERNAL_SERVICE_DURATION
        .with_label_values(&[service, operation])
        .observe(elapsed_secs);
    EXTERNAL_SERVICE_REQUESTS
        .with_label_values(&[service, operation, if success { "success" } else { "error" }])
        .inc();
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Refresh
        Box::new(REFRESH_ATTEMPTS.clone()),
        Box::new(REFRESH_DURATION.clone()),
        Box::new(RECORDS_UPSERTED.clone()),
        // Artwork
        Box::new(ARTWORK_RESOLUTIONS.clone()),
        // External services
        Box::new(EXTERNAL_SERVICE_DURATION.clone()),
        Box::new(EXTERNAL_SERVICE_REQUESTS.clone()),
    ]
}
