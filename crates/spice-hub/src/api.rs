//! # API Handlers
//!
//! Axum handlers over [`SpiceService`]. Request validation the core leaves
//! to its callers (rating range, required fields) happens here.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use spice_core::{is_valid_rating, DiningOption, Restaurant, RestaurantId, RATING_MAX, RATING_MIN};

use crate::cache::FilterData;
use crate::error::SpiceError;
use crate::monitor::{render_prometheus, PerformanceSummary, SlowQuery};
use crate::query::FilterRequest;
use crate::reviews::{RestaurantReviews, ReviewSubmission, SubmitOutcome, SubmitStatus, UserReview};
use crate::service::SpiceService;
use crate::store::entity::{HealthReport, HealthStatus};

pub type AppState = Arc<SpiceService>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/restaurants", get(list_restaurants))
        .route("/api/restaurants/search", get(search_restaurants))
        .route("/api/restaurants/:id/options", get(restaurant_options))
        .route("/api/filters", get(filter_options))
        .route("/api/reviews", post(submit_review))
        .route("/api/reviews/restaurant/:name", get(restaurant_reviews))
        .route("/api/reviews/user", get(user_reviews))
        .route("/api/health", get(health))
        .route("/api/metrics", get(metrics_summary).delete(metrics_reset))
        .route("/metrics", get(metrics_prometheus))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Serialize, Deserialize, Debug)]
pub struct ApiError {
    pub error: String,
}

#[derive(Debug)]
pub enum AppError {
    Core(SpiceError),
    BadRequest(String),
}

impl From<SpiceError> for AppError {
    fn from(e: SpiceError) -> Self {
        Self::Core(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::Core(e @ SpiceError::StorageUnavailable { .. }) => {
                (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            }
            AppError::Core(e @ SpiceError::NotFound { .. }) => (StatusCode::NOT_FOUND, e.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };
        (status, Json(ApiError { error })).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Restaurants
// =============================================================================

/// Build a search request from query parameters. `location` may repeat and
/// may hold a comma-separated list.
pub fn filter_from_params(params: &[(String, String)]) -> FilterRequest {
    params
        .iter()
        .fold(FilterRequest::new(), |request, (key, value)| match key.as_str() {
            "name" => request.name(value),
            "cuisine" => request.cuisine(value),
            "day" => request.day(value),
            "time" => request.time(value),
            "location" | "locations" => value.split(',').fold(request, |r, l| r.location(l)),
            "reviewer" | "user" => request.reviewer(value),
            _ => request,
        })
}

pub async fn search_restaurants(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Vec<Restaurant>> {
    let request = filter_from_params(&params);
    Ok(Json(state.search(&request).await?))
}

pub async fn list_restaurants(State(state): State<AppState>) -> ApiResult<Vec<Restaurant>> {
    Ok(Json(state.list_all_restaurants().await?))
}

#[derive(Deserialize, Debug, Default)]
pub struct OptionsParams {
    pub day: Option<String>,
    pub time: Option<String>,
}

pub async fn restaurant_options(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<OptionsParams>,
) -> ApiResult<Vec<DiningOption>> {
    let options = state
        .options_for(
            Some(RestaurantId(id)),
            params.day.as_deref(),
            params.time.as_deref(),
        )
        .await?;
    Ok(Json(options))
}

pub async fn filter_options(State(state): State<AppState>) -> ApiResult<FilterData> {
    let data = state.filter_options().await?;
    Ok(Json(FilterData::clone(&data)))
}

// =============================================================================
// Reviews
// =============================================================================

pub async fn restaurant_reviews(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<RestaurantReviews> {
    Ok(Json(state.reviews_for_restaurant(&name).await?))
}

#[derive(Deserialize, Debug, Default)]
pub struct UserParams {
    #[serde(default)]
    pub q: String,
}

pub async fn user_reviews(
    State(state): State<AppState>,
    Query(params): Query<UserParams>,
) -> ApiResult<Vec<UserReview>> {
    Ok(Json(state.reviews_by_user(&params.q).await?))
}

fn validate_submission(submission: &ReviewSubmission) -> Result<(), AppError> {
    if submission.restaurant_name.trim().is_empty() {
        return Err(AppError::BadRequest("restaurant_name is required".into()));
    }
    if submission.user_name.trim().is_empty() {
        return Err(AppError::BadRequest("user_name is required".into()));
    }
    if !is_valid_rating(submission.rating) {
        return Err(AppError::BadRequest(format!(
            "rating must be between {RATING_MIN} and {RATING_MAX}"
        )));
    }
    Ok(())
}

pub async fn submit_review(
    State(state): State<AppState>,
    Json(submission): Json<ReviewSubmission>,
) -> Result<(StatusCode, Json<SubmitOutcome>), AppError> {
    validate_submission(&submission)?;
    let outcome = state.submit(&submission).await?;
    let status = match outcome.status {
        SubmitStatus::Success => StatusCode::CREATED,
        SubmitStatus::RestaurantNotFound => StatusCode::NOT_FOUND,
        SubmitStatus::RestaurantIdMissing => StatusCode::CONFLICT,
    };
    Ok((status, Json(outcome)))
}

// =============================================================================
// Health & Metrics
// =============================================================================

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let report = state.health_check().await;
    let status = match report.status {
        HealthStatus::Ok => StatusCode::OK,
        HealthStatus::Error => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(report))
}

#[derive(Serialize, Debug)]
pub struct MetricsResponse {
    #[serde(flatten)]
    pub summary: PerformanceSummary,
    pub slow_queries: Vec<SlowQuery>,
}

pub async fn metrics_summary(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        summary: state.performance_summary().await,
        slow_queries: state.slow_queries().await,
    })
}

pub async fn metrics_reset(State(state): State<AppState>) -> StatusCode {
    state.reset_stats().await;
    StatusCode::NO_CONTENT
}

pub async fn metrics_prometheus(State(state): State<AppState>) -> impl IntoResponse {
    let body = render_prometheus(&state.performance_summary().await);
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}

#[cfg(test)]
mod tests {
    use spice_core::{Day, MealTime};

    use super::*;
    use crate::cache::FilterDataCache;
    use crate::monitor::QueryMonitor;
    use crate::store::entity::testing::DownCatalog;
    use crate::store::memory::{MemoryCatalog, MemoryReviewStore};
    use crate::store::EntityStore;

    fn state() -> AppState {
        let store = EntityStore::new(
            Arc::new(MemoryCatalog::new(
                vec![
                    Restaurant::new(1, "Joe's").with_cuisine("Italian").with_location("Downtown"),
                    Restaurant::new(2, "Zuma").with_location("Brickell"),
                ],
                vec![DiningOption::new(1, Day::Friday, MealTime::Dinner, "$49")],
            )),
            Arc::new(MemoryReviewStore::new()),
        );
        Arc::new(SpiceService::new(
            store,
            FilterDataCache::default(),
            QueryMonitor::default(),
        ))
    }

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn submission(restaurant: &str, rating: i32) -> ReviewSubmission {
        ReviewSubmission {
            restaurant_name: restaurant.into(),
            user_name: "Ann".into(),
            rating,
            comment: "great".into(),
        }
    }

    #[test]
    fn test_params_build_filter() {
        let request = filter_from_params(&params(&[
            ("name", "joe"),
            ("day", "All"),
            ("location", "Downtown,Brickell"),
            ("location", "Edgewater"),
            ("unknown", "x"),
        ]));
        assert_eq!(request.name.as_deref(), Some("joe"));
        assert_eq!(request.day, None);
        assert_eq!(request.locations.len(), 3);
    }

    #[tokio::test]
    async fn test_search_handler() {
        let Json(found) = search_restaurants(
            State(state()),
            Query(params(&[("day", "Friday")])),
        )
        .await
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Joe's");
    }

    #[tokio::test]
    async fn test_submit_validation() {
        let s = state();
        for bad in [submission("Joe's", 0), submission("Joe's", 11), submission(" ", 5)] {
            let err = submit_review(State(s.clone()), Json(bad)).await.unwrap_err();
            assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_submit_statuses() {
        let s = state();
        let (status, Json(outcome)) = submit_review(State(s.clone()), Json(submission("Joe's", 9)))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert!(outcome.is_success());

        let (status, _) = submit_review(State(s.clone()), Json(submission("Nowhere", 9)))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NOT_FOUND);

        let Json(reviews) = restaurant_reviews(State(s), Path("Joe's".to_string()))
            .await
            .unwrap();
        assert_eq!(reviews.total_reviews, 1);
    }

    #[tokio::test]
    async fn test_unknown_restaurant_reviews_is_404() {
        let err = restaurant_reviews(State(state()), Path("Nowhere".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_storage_failure_is_503() {
        let store = EntityStore::new(Arc::new(DownCatalog), Arc::new(MemoryReviewStore::new()));
        let s = Arc::new(SpiceService::new(
            store,
            FilterDataCache::default(),
            QueryMonitor::default(),
        ));

        let err = list_restaurants(State(s.clone())).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);

        let (status, Json(report)) = health(State(s)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(report.status, HealthStatus::Error);
    }

    #[tokio::test]
    async fn test_metrics_reflect_handled_requests() {
        let s = state();
        list_restaurants(State(s.clone())).await.unwrap();
        let Json(metrics) = metrics_summary(State(s.clone())).await;
        assert_eq!(metrics.summary.total_queries, 1);
        assert!(metrics.summary.query_stats.contains_key("list_all_restaurants"));

        assert_eq!(metrics_reset(State(s.clone())).await, StatusCode::NO_CONTENT);
        let Json(metrics) = metrics_summary(State(s)).await;
        assert_eq!(metrics.summary.total_queries, 0);
    }
}
