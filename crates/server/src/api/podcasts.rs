//! Podcast API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use podcache_core::serving::{DEFAULT_LIMIT, MAX_LIMIT};
use podcache_core::{CacheStatus, PodcastRecord, StoreError};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PopularParams {
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Podcast fields exposed to clients.
#[derive(Debug, Serialize)]
pub struct PodcastPublic {
    pub id: String,
    pub title: String,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub artwork_small: Option<String>,
    pub artwork_medium: Option<String>,
    pub artwork_large: Option<String>,
    pub feed_url: Option<String>,
    pub total_episodes: Option<i64>,
    pub listen_score: Option<i64>,
    pub genre_ids: Vec<i64>,
    pub updated_at: DateTime<Utc>,
}

impl From<PodcastRecord> for PodcastPublic {
    fn from(record: PodcastRecord) -> Self {
        let genre_ids = record
            .genre_ids
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .filter_map(|id| id.trim().parse().ok())
            .collect();

        Self {
            id: record.id,
            title: record.title,
            publisher: record.publisher,
            description: record.description,
            image_url: record.image_url,
            artwork_small: record.artwork_small,
            artwork_medium: record.artwork_medium,
            artwork_large: record.artwork_large,
            feed_url: record.feed_url,
            total_episodes: record.total_episodes,
            listen_score: record.listen_score,
            genre_ids,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PodcastListResponse {
    pub podcasts: Vec<PodcastPublic>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/podcasts/popular
///
/// Featured podcasts by popularity. A stale cache is refreshed first when
/// running in inline mode.
pub async fn list_popular(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PopularParams>,
) -> Result<Json<PodcastListResponse>, impl IntoResponse> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            format!("limit must be between 1 and {}", MAX_LIMIT),
        ));
    }

    match state.podcasts().get_top_entries(limit).await {
        Ok(records) => {
            let podcasts: Vec<PodcastPublic> = records.into_iter().map(Into::into).collect();
            let count = podcasts.len();
            Ok(Json(PodcastListResponse { podcasts, count }))
        }
        Err(e) => Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            e.to_string(),
        )),
    }
}

/// GET /api/v1/podcasts/{id}
pub async fn get_podcast(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PodcastPublic>, impl IntoResponse> {
    match state.podcasts().get(&id) {
        Ok(record) => Ok(Json(record.into())),
        Err(StoreError::NotFound(_)) => {
            Err(error_response(StatusCode::NOT_FOUND, "Podcast not found"))
        }
        Err(e) => Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            e.to_string(),
        )),
    }
}

/// GET /api/v1/podcasts/cache
///
/// Freshness of the popular-podcasts cache key.
pub async fn cache_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CacheStatus>, impl IntoResponse> {
    state.podcasts().cache_status().map(Json).map_err(|e| {
        error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(genre_ids: Option<&str>) -> PodcastRecord {
        let at = DateTime::parse_from_rfc3339("2024-01-15T09:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        PodcastRecord {
            id: "abc".to_string(),
            external_id: "ext-1".to_string(),
            title: "Show".to_string(),
            publisher: None,
            description: None,
            image_url: None,
            artwork_small: None,
            artwork_medium: None,
            artwork_large: None,
            feed_url: None,
            total_episodes: None,
            listen_score: Some(70),
            genre_ids: genre_ids.map(str::to_string),
            catalog_url: Some("https://catalog.example/ext-1".to_string()),
            itunes_id: Some("111".to_string()),
            featured: true,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_public_record_splits_genres() {
        let public = PodcastPublic::from(record(Some("68,99, 144")));
        assert_eq!(public.genre_ids, vec![68, 99, 144]);
    }

    #[test]
    fn test_public_record_without_genres() {
        assert!(PodcastPublic::from(record(None)).genre_ids.is_empty());
        assert!(PodcastPublic::from(record(Some(""))).genre_ids.is_empty());
    }

    #[test]
    fn test_public_record_hides_internal_fields() {
        let json = serde_json::to_value(PodcastPublic::from(record(None))).unwrap();
        assert!(json.get("external_id").is_none());
        assert!(json.get("itunes_id").is_none());
        assert!(json.get("featured").is_none());
        assert_eq!(json["listen_score"], 70);
    }
}
