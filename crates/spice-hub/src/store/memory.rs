//! # In-Memory Stores
//!
//! [`MemoryCatalog`] serves the catalog loaded from the seed file. It keeps
//! the secondary indexes the lookups need: restaurants by id and by name,
//! options by restaurant.
//!
//! [`ReviewIndex`] is the in-memory view of the reviews, indexed by
//! restaurant. [`MemoryReviewStore`] is a review store with nothing behind
//! the index; the journal store rebuilds the same index on replay.

use std::collections::{BTreeSet, HashMap};

use tokio::sync::RwLock;

use spice_core::text::contains_ignore_case;
use spice_core::{DiningOption, Restaurant, RestaurantId, Review};
use spice_io::seed::Catalog;

use super::{
    CatalogFacets, CatalogStore, RestaurantFilter, ReviewStore, SlotFilter, StoreResult,
};

pub const RESTAURANTS: &str = "Restaurants";
pub const OPTIONS: &str = "Options";
pub const REVIEWS: &str = "Reviews";

// =============================================================================
// Catalog
// =============================================================================

pub struct MemoryCatalog {
    restaurants: Vec<Restaurant>,
    by_id: HashMap<RestaurantId, usize>,
    /// First restaurant carrying each exact name.
    by_name: HashMap<String, usize>,
    options: HashMap<RestaurantId, Vec<DiningOption>>,
}

impl MemoryCatalog {
    pub fn new(restaurants: Vec<Restaurant>, options: Vec<DiningOption>) -> Self {
        let mut by_id = HashMap::new();
        let mut by_name = HashMap::new();
        for (idx, restaurant) in restaurants.iter().enumerate() {
            if let Some(id) = restaurant.id {
                by_id.entry(id).or_insert(idx);
            }
            by_name.entry(restaurant.name.clone()).or_insert(idx);
        }

        let mut by_restaurant: HashMap<RestaurantId, Vec<DiningOption>> = HashMap::new();
        for option in options {
            by_restaurant
                .entry(option.restaurant_id)
                .or_default()
                .push(option);
        }

        Self {
            restaurants,
            by_id,
            by_name,
            options: by_restaurant,
        }
    }

    pub fn from_seed(catalog: Catalog) -> Self {
        Self::new(catalog.restaurants, catalog.options)
    }

    pub fn restaurant_count(&self) -> usize {
        self.restaurants.len()
    }

    pub fn option_count(&self) -> usize {
        self.options.values().map(Vec::len).sum()
    }
}

#[async_trait::async_trait]
impl CatalogStore for MemoryCatalog {
    fn collections(&self) -> Vec<String> {
        vec![RESTAURANTS.to_string(), OPTIONS.to_string()]
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn find_restaurants(&self, filter: &RestaurantFilter) -> StoreResult<Vec<Restaurant>> {
        Ok(self
            .restaurants
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn restaurant_by_name(&self, name: &str) -> StoreResult<Option<Restaurant>> {
        Ok(self
            .by_name
            .get(name)
            .map(|&idx| self.restaurants[idx].clone()))
    }

    async fn restaurant_by_id(&self, id: RestaurantId) -> StoreResult<Option<Restaurant>> {
        Ok(self
            .by_id
            .get(&id)
            .map(|&idx| self.restaurants[idx].clone()))
    }

    async fn restaurants_with_options(
        &self,
        candidates: &BTreeSet<RestaurantId>,
        slot: &SlotFilter,
    ) -> StoreResult<BTreeSet<RestaurantId>> {
        Ok(candidates
            .iter()
            .filter(|id| {
                self.options
                    .get(id)
                    .is_some_and(|options| options.iter().any(|o| slot.matches(o)))
            })
            .copied()
            .collect())
    }

    async fn options_for(
        &self,
        id: RestaurantId,
        slot: &SlotFilter,
    ) -> StoreResult<Vec<DiningOption>> {
        Ok(self
            .options
            .get(&id)
            .map(|options| options.iter().filter(|o| slot.matches(o)).cloned().collect())
            .unwrap_or_default())
    }

    async fn facets(&self) -> StoreResult<CatalogFacets> {
        let mut facets = CatalogFacets::default();
        for restaurant in &self.restaurants {
            facets.names.insert(restaurant.name.clone());
            if let Some(cuisine) = &restaurant.cuisine {
                facets.cuisines.insert(cuisine.clone());
            }
            if let Some(location) = &restaurant.location {
                facets.locations.insert(location.clone());
            }
        }
        for option in self.options.values().flatten() {
            facets.days.insert(option.day.clone());
            facets.times.insert(option.time.clone());
        }
        Ok(facets)
    }
}

// =============================================================================
// Reviews
// =============================================================================

/// Reviews in insertion order, indexed by restaurant.
#[derive(Default)]
pub struct ReviewIndex {
    reviews: Vec<Review>,
    by_restaurant: HashMap<RestaurantId, Vec<usize>>,
}

impl ReviewIndex {
    pub fn push(&mut self, review: Review) {
        self.by_restaurant
            .entry(review.restaurant_id)
            .or_default()
            .push(self.reviews.len());
        self.reviews.push(review);
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    pub fn for_restaurant(&self, id: RestaurantId) -> Vec<Review> {
        self.by_restaurant
            .get(&id)
            .map(|slots| slots.iter().map(|&i| self.reviews[i].clone()).collect())
            .unwrap_or_default()
    }

    pub fn by_user(&self, needle: &str) -> Vec<Review> {
        self.reviews
            .iter()
            .filter(|r| contains_ignore_case(&r.user_name, needle))
            .cloned()
            .collect()
    }

    pub fn reviewed_by(
        &self,
        candidates: &BTreeSet<RestaurantId>,
        needle: &str,
    ) -> BTreeSet<RestaurantId> {
        candidates
            .iter()
            .filter(|id| {
                self.by_restaurant.get(id).is_some_and(|slots| {
                    slots
                        .iter()
                        .any(|&i| contains_ignore_case(&self.reviews[i].user_name, needle))
                })
            })
            .copied()
            .collect()
    }

    pub fn user_names(&self) -> BTreeSet<String> {
        self.reviews
            .iter()
            .filter(|r| !r.user_name.is_empty())
            .map(|r| r.user_name.clone())
            .collect()
    }
}

impl FromIterator<Review> for ReviewIndex {
    fn from_iter<I: IntoIterator<Item = Review>>(iter: I) -> Self {
        let mut index = Self::default();
        for review in iter {
            index.push(review);
        }
        index
    }
}

#[derive(Default)]
pub struct MemoryReviewStore {
    index: RwLock<ReviewIndex>,
}

impl MemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reviews(reviews: impl IntoIterator<Item = Review>) -> Self {
        Self {
            index: RwLock::new(reviews.into_iter().collect()),
        }
    }
}

#[async_trait::async_trait]
impl ReviewStore for MemoryReviewStore {
    fn collections(&self) -> Vec<String> {
        vec![REVIEWS.to_string()]
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert(&self, review: Review) -> StoreResult<()> {
        self.index.write().await.push(review);
        Ok(())
    }

    async fn reviews_for(&self, id: RestaurantId) -> StoreResult<Vec<Review>> {
        Ok(self.index.read().await.for_restaurant(id))
    }

    async fn reviews_by_user(&self, needle: &str) -> StoreResult<Vec<Review>> {
        Ok(self.index.read().await.by_user(needle))
    }

    async fn reviewed_by(
        &self,
        candidates: &BTreeSet<RestaurantId>,
        needle: &str,
    ) -> StoreResult<BTreeSet<RestaurantId>> {
        Ok(self.index.read().await.reviewed_by(candidates, needle))
    }

    async fn user_names(&self) -> StoreResult<BTreeSet<String>> {
        Ok(self.index.read().await.user_names())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spice_core::{Day, MealTime};

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::new(
            vec![
                Restaurant::new(1, "Joe's").with_cuisine("Italian").with_location("Downtown"),
                Restaurant::new(2, "Zuma").with_cuisine("Japanese").with_location("Brickell"),
                Restaurant::new(3, "Joe's"),
            ],
            vec![
                DiningOption::new(1, Day::Friday, MealTime::Dinner, "$49"),
                DiningOption::new(2, Day::Monday, MealTime::Lunch, "$35"),
                DiningOption::new(99, Day::Sunday, MealTime::Brunch, "$28"),
            ],
        )
    }

    fn review(id: i64, user: &str) -> Review {
        Review {
            restaurant_id: RestaurantId(id),
            user_name: user.into(),
            rating: 8,
            comment: String::new(),
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_name_lookup_returns_first_match() {
        let c = catalog();
        let found = c.restaurant_by_name("Joe's").await.unwrap().unwrap();
        assert_eq!(found.id, Some(RestaurantId(1)));
        assert!(c.restaurant_by_name("joe's").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_options_join_is_restricted_to_candidates() {
        let c = catalog();
        let friday = SlotFilter {
            day: Some(Day::Friday),
            time: None,
        };
        let all: BTreeSet<RestaurantId> = [RestaurantId(1), RestaurantId(2)].into();
        assert_eq!(
            c.restaurants_with_options(&all, &friday).await.unwrap(),
            BTreeSet::from([RestaurantId(1)])
        );
        let only_zuma: BTreeSet<RestaurantId> = [RestaurantId(2)].into();
        assert!(c
            .restaurants_with_options(&only_zuma, &friday)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_facets_include_orphan_option_slots() {
        let facets = catalog().facets().await.unwrap();
        assert_eq!(facets.names.len(), 2);
        assert_eq!(facets.cuisines, BTreeSet::from(["Italian".to_string(), "Japanese".to_string()]));
        assert!(facets.days.contains(&Day::Sunday));
        assert_eq!(facets.times.len(), 3);
    }

    #[tokio::test]
    async fn test_review_index_lookups() {
        let store = MemoryReviewStore::with_reviews([
            review(1, "Ann"),
            review(2, "annette"),
            review(2, "Bo"),
            review(3, ""),
        ]);
        assert_eq!(store.reviews_for(RestaurantId(2)).await.unwrap().len(), 2);
        assert_eq!(store.reviews_by_user("ANN").await.unwrap().len(), 2);
        assert_eq!(store.reviews_by_user("").await.unwrap().len(), 4);

        let candidates: BTreeSet<RestaurantId> = [RestaurantId(1), RestaurantId(3)].into();
        assert_eq!(
            store.reviewed_by(&candidates, "ann").await.unwrap(),
            BTreeSet::from([RestaurantId(1)])
        );
        assert_eq!(
            store.user_names().await.unwrap(),
            BTreeSet::from(["Ann".to_string(), "Bo".to_string(), "annette".to_string()])
        );
    }
}
