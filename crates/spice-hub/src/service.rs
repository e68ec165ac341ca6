//! # Spice Service
//!
//! The composition root of the core: one [`EntityStore`], the
//! [`FilterDataCache`] it feeds, and the [`QueryMonitor`] every inbound
//! operation runs under. Handlers and the CLI only ever talk to this type.

use std::sync::Arc;

use spice_core::{DiningOption, Restaurant, RestaurantId};

use crate::cache::{FilterData, FilterDataCache};
use crate::error::SpiceResult;
use crate::monitor::{PerformanceSummary, QueryMonitor, SlowQuery};
use crate::query::{executor, FilterRequest};
use crate::reviews::{self, RestaurantReviews, ReviewSubmission, SubmitOutcome, UserReview};
use crate::store::entity::HealthReport;
use crate::store::EntityStore;

pub struct SpiceService {
    store: EntityStore,
    cache: FilterDataCache,
    monitor: QueryMonitor,
}

impl SpiceService {
    pub fn new(store: EntityStore, cache: FilterDataCache, monitor: QueryMonitor) -> Self {
        Self {
            store,
            cache,
            monitor,
        }
    }

    pub async fn search(&self, request: &FilterRequest) -> SpiceResult<Vec<Restaurant>> {
        self.monitor
            .track("search_restaurants", executor::execute(request, &self.store))
            .await
    }

    pub async fn list_all_restaurants(&self) -> SpiceResult<Vec<Restaurant>> {
        self.monitor
            .track("list_all_restaurants", executor::list_all(&self.store))
            .await
    }

    pub async fn filter_options(&self) -> SpiceResult<Arc<FilterData>> {
        let store = &self.store;
        self.monitor
            .track(
                "get_filter_data",
                self.cache.get_or_refresh(move || async move {
                    let facets = store.catalog_facets().await?;
                    let users = store.user_names().await?;
                    Ok(FilterData::from_sources(facets, users))
                }),
            )
            .await
    }

    pub async fn options_for(
        &self,
        restaurant: Option<RestaurantId>,
        day: Option<&str>,
        time: Option<&str>,
    ) -> SpiceResult<Vec<DiningOption>> {
        self.monitor
            .track(
                "get_restaurant_options",
                crate::options::options_for(&self.store, restaurant, day, time),
            )
            .await
    }

    pub async fn reviews_for_restaurant(&self, name: &str) -> SpiceResult<RestaurantReviews> {
        self.monitor
            .track(
                "get_restaurant_reviews",
                reviews::reviews_for_restaurant(&self.store, name),
            )
            .await
    }

    pub async fn reviews_by_user(&self, needle: &str) -> SpiceResult<Vec<UserReview>> {
        self.monitor
            .track("get_user_reviews", reviews::reviews_by_user(&self.store, needle))
            .await
    }

    pub async fn submit(&self, submission: &ReviewSubmission) -> SpiceResult<SubmitOutcome> {
        self.monitor
            .track(
                "submit_review",
                reviews::submit(&self.store, &self.cache, submission),
            )
            .await
    }

    pub async fn health_check(&self) -> HealthReport {
        self.store.health().await
    }

    pub async fn performance_summary(&self) -> PerformanceSummary {
        self.monitor.summary().await
    }

    pub async fn slow_queries(&self) -> Vec<SlowQuery> {
        self.monitor.slow_queries().await
    }

    pub async fn reset_stats(&self) {
        self.monitor.reset().await;
    }
}

#[cfg(test)]
mod tests {
    use spice_core::{Day, MealTime, Review};

    use super::*;
    use crate::store::entity::testing::{CountingCatalog, DownReviews};
    use crate::store::memory::{MemoryCatalog, MemoryReviewStore};

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::new(
            vec![
                Restaurant::new(1, "Joe's").with_cuisine("Italian").with_location("Downtown"),
                Restaurant::new(2, "Zuma").with_cuisine("Japanese").with_location("Brickell"),
            ],
            vec![
                DiningOption::new(1, Day::Friday, MealTime::Dinner, "$49"),
                DiningOption::new(2, Day::Monday, MealTime::Lunch, "$35"),
            ],
        )
    }

    fn service_with(store: EntityStore) -> SpiceService {
        SpiceService::new(store, FilterDataCache::default(), QueryMonitor::default())
    }

    fn submission(restaurant: &str, user: &str, rating: i32) -> ReviewSubmission {
        ReviewSubmission {
            restaurant_name: restaurant.into(),
            user_name: user.into(),
            rating,
            comment: "great".into(),
        }
    }

    #[tokio::test]
    async fn test_filter_options_content() {
        let service = service_with(EntityStore::new(
            Arc::new(catalog()),
            Arc::new(MemoryReviewStore::with_reviews([Review {
                restaurant_id: RestaurantId(1),
                user_name: "Bo".into(),
                rating: 7,
                comment: String::new(),
                created_at: None,
            }])),
        ));
        let data = service.filter_options().await.unwrap();
        assert_eq!(data.restaurants, vec!["Joe's", "Zuma"]);
        assert_eq!(data.cuisines, vec!["Italian", "Japanese"]);
        assert_eq!(data.locations, vec!["Brickell", "Downtown"]);
        assert_eq!(data.days, vec![Day::Monday, Day::Friday]);
        assert_eq!(data.times, vec![MealTime::Lunch, MealTime::Dinner]);
        assert_eq!(data.users, vec!["Bo"]);
    }

    #[tokio::test]
    async fn test_filter_options_are_cached() {
        let counting = Arc::new(CountingCatalog::new(catalog()));
        let service = service_with(EntityStore::new(
            counting.clone(),
            Arc::new(MemoryReviewStore::new()),
        ));
        service.filter_options().await.unwrap();
        service.filter_options().await.unwrap();
        assert_eq!(counting.calls(), 1);
    }

    #[tokio::test]
    async fn test_new_reviewer_visible_right_after_submit() {
        let service = service_with(EntityStore::new(
            Arc::new(catalog()),
            Arc::new(MemoryReviewStore::new()),
        ));
        assert!(service.filter_options().await.unwrap().users.is_empty());

        let outcome = service.submit(&submission("Joe's", "Ann", 9)).await.unwrap();
        assert!(outcome.is_success());

        assert_eq!(service.filter_options().await.unwrap().users, vec!["Ann"]);
        let summary = service.reviews_for_restaurant("Joe's").await.unwrap();
        assert_eq!(summary.total_reviews, 1);
        assert_eq!(summary.avg_rating, Some(9.0));
    }

    #[tokio::test]
    async fn test_search_and_options_through_service() {
        let service = service_with(EntityStore::new(
            Arc::new(catalog()),
            Arc::new(MemoryReviewStore::new()),
        ));
        let friday = service
            .search(&FilterRequest::new().day("Friday"))
            .await
            .unwrap();
        assert_eq!(friday.len(), 1);
        assert_eq!(friday[0].name, "Joe's");
        assert!(service
            .search(&FilterRequest::new().day("Saturday"))
            .await
            .unwrap()
            .is_empty());

        let options = service
            .options_for(friday[0].id, Some("All"), None)
            .await
            .unwrap();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].price, "$49");

        let all = service.list_all_restaurants().await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_operations_are_monitored() {
        let service = service_with(EntityStore::new(
            Arc::new(catalog()),
            Arc::new(DownReviews),
        ));
        service.search(&FilterRequest::new()).await.unwrap();
        assert!(service.reviews_by_user("ann").await.is_err());

        let summary = service.performance_summary().await;
        assert_eq!(summary.total_queries, 2);
        assert_eq!(summary.query_stats["search_restaurants"].errors, 0);
        assert_eq!(summary.query_stats["get_user_reviews"].errors, 1);

        service.reset_stats().await;
        assert_eq!(service.performance_summary().await.total_queries, 0);
    }

    #[tokio::test]
    async fn test_filter_options_without_cache_or_store_fail() {
        let service = service_with(EntityStore::new(
            Arc::new(catalog()),
            Arc::new(DownReviews),
        ));
        assert!(service.filter_options().await.is_err());
    }
}
