use axum::{middleware, routing::get, Router};
use podcache_core::Environment;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{handlers, middleware::metrics_middleware, podcasts};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let environment = state.environment();

    // API routes
    let api_routes = Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::get_metrics))
        // Podcasts
        .route("/podcasts/popular", get(podcasts::list_popular))
        .route("/podcasts/cache", get(podcasts::cache_status))
        .route("/podcasts/{id}", get(podcasts::get_podcast))
        .with_state(state);

    let router = Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http());

    match environment {
        Environment::Local => router.layer(CorsLayer::permissive()),
        _ => router,
    }
}
