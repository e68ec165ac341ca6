//! # Entity Store
//!
//! Composes a [`CatalogStore`] and a [`ReviewStore`] that may be entirely
//! different engines. Every call is bounded by the configured timeout and
//! every failure is normalized into [`SpiceError::StorageUnavailable`]
//! before it leaves this module.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use spice_core::{DiningOption, Restaurant, RestaurantId, Review};

use super::{
    CatalogFacets, CatalogStore, RestaurantFilter, ReviewStore, SlotFilter, StoreError,
    StoreResult,
};
use crate::error::{SpiceError, SpiceResult};

/// Default bound on a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Ok,
    Error,
}

/// Result of probing both stores.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub message: Option<String>,
    pub collections: Vec<String>,
}

#[derive(Clone)]
pub struct EntityStore {
    catalog: Arc<dyn CatalogStore>,
    reviews: Arc<dyn ReviewStore>,
    timeout: Duration,
}

impl EntityStore {
    pub fn new(catalog: Arc<dyn CatalogStore>, reviews: Arc<dyn ReviewStore>) -> Self {
        Self {
            catalog,
            reviews,
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run one store call under the timeout, normalizing its failure.
    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> SpiceResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        let outcome = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                operation,
                timeout_ms: self.timeout.as_millis(),
            }),
        };

        outcome.map_err(|e| {
            tracing::error!(operation, error = %e, "Store call failed");
            SpiceError::unavailable(operation, e)
        })
    }

    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------

    pub async fn find_restaurants(&self, filter: &RestaurantFilter) -> SpiceResult<Vec<Restaurant>> {
        self.bounded("find_restaurants", self.catalog.find_restaurants(filter))
            .await
    }

    pub async fn restaurant_by_name(&self, name: &str) -> SpiceResult<Option<Restaurant>> {
        self.bounded("restaurant_by_name", self.catalog.restaurant_by_name(name))
            .await
    }

    pub async fn restaurant_by_id(&self, id: RestaurantId) -> SpiceResult<Option<Restaurant>> {
        self.bounded("restaurant_by_id", self.catalog.restaurant_by_id(id))
            .await
    }

    pub async fn restaurants_with_options(
        &self,
        candidates: &BTreeSet<RestaurantId>,
        slot: &SlotFilter,
    ) -> SpiceResult<BTreeSet<RestaurantId>> {
        self.bounded(
            "restaurants_with_options",
            self.catalog.restaurants_with_options(candidates, slot),
        )
        .await
    }

    pub async fn options_for(
        &self,
        id: RestaurantId,
        slot: &SlotFilter,
    ) -> SpiceResult<Vec<DiningOption>> {
        self.bounded("options_for", self.catalog.options_for(id, slot))
            .await
    }

    pub async fn catalog_facets(&self) -> SpiceResult<CatalogFacets> {
        self.bounded("catalog_facets", self.catalog.facets()).await
    }

    // -------------------------------------------------------------------------
    // Reviews
    // -------------------------------------------------------------------------

    pub async fn insert_review(&self, review: Review) -> SpiceResult<()> {
        self.bounded("insert_review", self.reviews.insert(review))
            .await
    }

    pub async fn reviews_for(&self, id: RestaurantId) -> SpiceResult<Vec<Review>> {
        self.bounded("reviews_for", self.reviews.reviews_for(id))
            .await
    }

    pub async fn reviews_by_user(&self, needle: &str) -> SpiceResult<Vec<Review>> {
        self.bounded("reviews_by_user", self.reviews.reviews_by_user(needle))
            .await
    }

    pub async fn reviewed_by(
        &self,
        candidates: &BTreeSet<RestaurantId>,
        needle: &str,
    ) -> SpiceResult<BTreeSet<RestaurantId>> {
        self.bounded("reviewed_by", self.reviews.reviewed_by(candidates, needle))
            .await
    }

    pub async fn user_names(&self) -> SpiceResult<BTreeSet<String>> {
        self.bounded("user_names", self.reviews.user_names()).await
    }

    // -------------------------------------------------------------------------
    // Health
    // -------------------------------------------------------------------------

    /// Ping both stores and report the record sets they hold.
    pub async fn health(&self) -> HealthReport {
        let pings = async {
            self.bounded("ping_catalog", self.catalog.ping()).await?;
            self.bounded("ping_reviews", self.reviews.ping()).await
        };

        match pings.await {
            Ok(()) => {
                let mut collections = self.catalog.collections();
                collections.extend(self.reviews.collections());
                HealthReport {
                    status: HealthStatus::Ok,
                    message: Some("Connected to catalog and review stores".to_string()),
                    collections,
                }
            }
            Err(e) => HealthReport {
                status: HealthStatus::Error,
                message: Some(e.to_string()),
                collections: Vec::new(),
            },
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{DownCatalog, HangingReviews};
    use super::*;
    use crate::store::memory::{MemoryCatalog, MemoryReviewStore};

    fn healthy() -> EntityStore {
        EntityStore::new(
            Arc::new(MemoryCatalog::new(vec![Restaurant::new(1, "Joe's")], vec![])),
            Arc::new(MemoryReviewStore::new()),
        )
    }

    #[tokio::test]
    async fn test_health_lists_collections_of_both_stores() {
        let report = healthy().health().await;
        assert_eq!(report.status, HealthStatus::Ok);
        assert_eq!(report.collections, vec!["Restaurants", "Options", "Reviews"]);
    }

    #[tokio::test]
    async fn test_health_reports_a_down_store() {
        let store = EntityStore::new(Arc::new(DownCatalog), Arc::new(MemoryReviewStore::new()));
        let report = store.health().await;
        assert_eq!(report.status, HealthStatus::Error);
        assert!(report.message.unwrap().contains("connection refused"));
        assert!(report.collections.is_empty());
    }

    #[tokio::test]
    async fn test_store_errors_are_normalized() {
        let store = EntityStore::new(Arc::new(DownCatalog), Arc::new(MemoryReviewStore::new()));
        let err = store
            .find_restaurants(&RestaurantFilter::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SpiceError::StorageUnavailable {
                operation: "find_restaurants",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_hung_store_times_out() {
        let store = EntityStore::new(
            Arc::new(MemoryCatalog::new(vec![], vec![])),
            Arc::new(HangingReviews),
        )
        .with_timeout(Duration::from_millis(50));

        let err = store.user_names().await.unwrap_err();
        match err {
            SpiceError::StorageUnavailable { operation, reason } => {
                assert_eq!(operation, "user_names");
                assert!(reason.contains("timed out"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
