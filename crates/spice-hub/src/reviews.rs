//! # Review Aggregation
//!
//! Per-restaurant review summaries, per-user review history and review
//! submission. Submitting a review invalidates the filter-data cache before
//! it returns, so the reviewer shows up in the user list on the next read.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use spice_core::{mean_rating, Review};

use crate::cache::FilterDataCache;
use crate::error::{SpiceError, SpiceResult};
use crate::store::EntityStore;

/// Placeholder shown for a review whose restaurant is not in the catalog.
pub const UNKNOWN_RESTAURANT: &str = "Unknown";

/// Timestamp format used in user review listings.
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantReviews {
    /// Newest first.
    pub reviews: Vec<Review>,
    /// `None` when there are no reviews.
    pub avg_rating: Option<f64>,
    pub total_reviews: usize,
}

/// One entry of a user's review history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserReview {
    pub restaurant_name: String,
    pub rating: i32,
    pub comment: String,
    /// `YYYY-MM-DD HH:MM`, or empty when the review has no timestamp.
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSubmission {
    pub restaurant_name: String,
    pub user_name: String,
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitStatus {
    Success,
    RestaurantNotFound,
    RestaurantIdMissing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOutcome {
    pub status: SubmitStatus,
    pub message: String,
}

impl SubmitOutcome {
    fn new(status: SubmitStatus) -> Self {
        let message = match status {
            SubmitStatus::Success => "Review submitted successfully!",
            SubmitStatus::RestaurantNotFound => "Restaurant not found.",
            SubmitStatus::RestaurantIdMissing => "Restaurant ID not found.",
        };
        Self {
            status,
            message: message.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SubmitStatus::Success
    }
}

/// Reviews of the restaurant named exactly `name`, with count and mean.
///
/// A name that resolves to no restaurant, or to a legacy row with no id, is
/// [`SpiceError::NotFound`]. A restaurant with no reviews is not an error.
pub async fn reviews_for_restaurant(
    store: &EntityStore,
    name: &str,
) -> SpiceResult<RestaurantReviews> {
    let id = store
        .restaurant_by_name(name)
        .await?
        .and_then(|restaurant| restaurant.id)
        .ok_or_else(|| SpiceError::restaurant_not_found(name))?;

    let mut reviews = store.reviews_for(id).await?;
    reviews.sort_by(Review::recency_cmp);

    Ok(RestaurantReviews {
        avg_rating: mean_rating(reviews.iter().map(|r| r.rating)),
        total_reviews: reviews.len(),
        reviews,
    })
}

/// Every review by a user whose name contains `needle`, ignoring case,
/// newest first. An empty needle lists every review.
pub async fn reviews_by_user(store: &EntityStore, needle: &str) -> SpiceResult<Vec<UserReview>> {
    let mut reviews = store.reviews_by_user(needle.trim()).await?;
    reviews.sort_by(Review::recency_cmp);

    let mut history = Vec::with_capacity(reviews.len());
    for review in reviews {
        let restaurant_name = store
            .restaurant_by_id(review.restaurant_id)
            .await?
            .map(|r| r.name)
            .unwrap_or_else(|| UNKNOWN_RESTAURANT.to_string());

        history.push(UserReview {
            restaurant_name,
            rating: review.rating,
            comment: review.comment,
            created_at: review
                .created_at
                .map(|at| at.format(CREATED_AT_FORMAT).to_string())
                .unwrap_or_default(),
        });
    }
    Ok(history)
}

/// Record a review for the restaurant named exactly
/// `submission.restaurant_name`.
///
/// User name and comment are trimmed. The rating is stored as given.
pub async fn submit(
    store: &EntityStore,
    cache: &FilterDataCache,
    submission: &ReviewSubmission,
) -> SpiceResult<SubmitOutcome> {
    let Some(restaurant) = store.restaurant_by_name(&submission.restaurant_name).await? else {
        return Ok(SubmitOutcome::new(SubmitStatus::RestaurantNotFound));
    };
    let Some(restaurant_id) = restaurant.id else {
        tracing::warn!(restaurant = %restaurant.name, "Review rejected: restaurant has no id");
        return Ok(SubmitOutcome::new(SubmitStatus::RestaurantIdMissing));
    };

    let inserted = store
        .insert_review(Review {
            restaurant_id,
            user_name: submission.user_name.trim().to_string(),
            rating: submission.rating,
            comment: submission.comment.trim().to_string(),
            created_at: Some(Utc::now()),
        })
        .await;
    // A timed-out insert may still land, so the cache goes stale either way.
    cache.invalidate();
    inserted?;

    tracing::info!(
        restaurant = %restaurant.name,
        restaurant_id = %restaurant_id,
        rating = submission.rating,
        "Review submitted"
    );
    Ok(SubmitOutcome::new(SubmitStatus::Success))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use spice_core::{Restaurant, RestaurantId};

    use super::*;
    use crate::store::entity::testing::DownReviews;
    use crate::store::memory::{MemoryCatalog, MemoryReviewStore};

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::new(
            vec![
                Restaurant::new(1, "Joe's").with_cuisine("Italian").with_location("Downtown"),
                Restaurant::new(2, "Zuma"),
                Restaurant {
                    id: None,
                    name: "Legacy Diner".into(),
                    cuisine: None,
                    location: None,
                    link: None,
                },
            ],
            vec![],
        )
    }

    fn review(id: i64, user: &str, rating: i32, at: Option<i64>) -> Review {
        Review {
            restaurant_id: RestaurantId(id),
            user_name: user.into(),
            rating,
            comment: format!("{user} says {rating}"),
            created_at: at.map(|secs| Utc.timestamp_opt(secs, 0).unwrap()),
        }
    }

    fn store_with(reviews: Vec<Review>) -> EntityStore {
        EntityStore::new(
            Arc::new(catalog()),
            Arc::new(MemoryReviewStore::with_reviews(reviews)),
        )
    }

    fn submission(restaurant: &str, user: &str, rating: i32, comment: &str) -> ReviewSubmission {
        ReviewSubmission {
            restaurant_name: restaurant.into(),
            user_name: user.into(),
            rating,
            comment: comment.into(),
        }
    }

    #[tokio::test]
    async fn test_average_and_recency_order() {
        let store = store_with(vec![
            review(1, "Ann", 2, Some(1_000)),
            review(1, "Bo", 8, None),
            review(1, "Cy", 10, Some(3_000)),
            review(2, "Ann", 1, Some(2_000)),
        ]);
        let summary = reviews_for_restaurant(&store, "Joe's").await.unwrap();
        assert_eq!(summary.total_reviews, 3);
        let avg = summary.avg_rating.unwrap();
        assert!((avg - 6.666_666).abs() < 1e-4);
        assert_eq!(format!("{avg:.1}"), "6.7");

        let users: Vec<&str> = summary.reviews.iter().map(|r| r.user_name.as_str()).collect();
        assert_eq!(users, vec!["Cy", "Ann", "Bo"]);
    }

    #[tokio::test]
    async fn test_zero_reviews_is_not_an_error() {
        let summary = reviews_for_restaurant(&store_with(vec![]), "Zuma").await.unwrap();
        assert_eq!(summary.total_reviews, 0);
        assert_eq!(summary.avg_rating, None);
        assert!(summary.reviews.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_or_idless_restaurant_is_not_found() {
        let store = store_with(vec![]);
        for name in ["Nowhere", "joe's", "Legacy Diner"] {
            let err = reviews_for_restaurant(&store, name).await.unwrap_err();
            assert!(matches!(err, SpiceError::NotFound { .. }), "{name}");
        }
    }

    #[tokio::test]
    async fn test_user_history_is_enriched_and_sorted() {
        let store = store_with(vec![
            review(1, "Ann", 9, Some(1_723_000_000)),
            review(42, "ann", 4, Some(1_723_100_000)),
            review(2, "Bo", 3, Some(1_723_200_000)),
            review(2, "Annette", 7, None),
        ]);
        let history = reviews_by_user(&store, "  ANN ").await.unwrap();
        let rows: Vec<(&str, i32, &str)> = history
            .iter()
            .map(|r| (r.restaurant_name.as_str(), r.rating, r.created_at.as_str()))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("Unknown", 4, "2024-08-08 06:53"),
                ("Joe's", 9, "2024-08-07 03:06"),
                ("Zuma", 7, ""),
            ]
        );
        assert_eq!(reviews_by_user(&store, "").await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_submit_then_summarize() {
        let store = store_with(vec![]);
        let cache = FilterDataCache::default();

        let outcome = submit(&store, &cache, &submission("Joe's", "  Ann ", 9, " great "))
            .await
            .unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.message, "Review submitted successfully!");

        let summary = reviews_for_restaurant(&store, "Joe's").await.unwrap();
        assert_eq!(summary.total_reviews, 1);
        assert_eq!(summary.avg_rating, Some(9.0));
        assert_eq!(summary.reviews[0].user_name, "Ann");
        assert_eq!(summary.reviews[0].comment, "great");
        assert!(summary.reviews[0].created_at.is_some());
    }

    #[tokio::test]
    async fn test_submit_rejections() {
        let store = store_with(vec![]);
        let cache = FilterDataCache::default();

        let missing = submit(&store, &cache, &submission("Nowhere", "Ann", 9, ""))
            .await
            .unwrap();
        assert_eq!(missing.status, SubmitStatus::RestaurantNotFound);

        let idless = submit(&store, &cache, &submission("Legacy Diner", "Ann", 9, ""))
            .await
            .unwrap();
        assert_eq!(idless.status, SubmitStatus::RestaurantIdMissing);
        assert_eq!(idless.message, "Restaurant ID not found.");
    }

    #[tokio::test]
    async fn test_submit_passes_rating_through() {
        let store = store_with(vec![]);
        let cache = FilterDataCache::default();
        submit(&store, &cache, &submission("Zuma", "Bo", 42, ""))
            .await
            .unwrap();
        let summary = reviews_for_restaurant(&store, "Zuma").await.unwrap();
        assert_eq!(summary.reviews[0].rating, 42);
    }

    #[tokio::test]
    async fn test_submit_fails_when_review_store_is_down() {
        let store = EntityStore::new(Arc::new(catalog()), Arc::new(DownReviews));
        let cache = FilterDataCache::default();
        cache
            .get_or_refresh(|| async { Ok(crate::cache::FilterData::default()) })
            .await
            .unwrap();

        let err = submit(&store, &cache, &submission("Joe's", "Ann", 9, ""))
            .await
            .unwrap_err();
        let reloaded = cache
            .get_or_refresh(|| async {
                Ok(crate::cache::FilterData {
                    users: vec!["Ann".into()],
                    ..Default::default()
                })
            })
            .await
            .unwrap();
        assert_eq!(reloaded.users, vec!["Ann"]);
        assert!(matches!(
            err,
            SpiceError::StorageUnavailable {
                operation: "insert_review",
                ..
            }
        ));
    }
}
