//! # Entity Store Framework
//!
//! The catalog (restaurants and their dining options) and the reviews live
//! in two independent stores behind two traits. They share no transaction
//! and no query language; anything that spans both is done by intersecting
//! restaurant-id sets in application code (see [`crate::query`]).
//!
//! - [`CatalogStore`]: read-only restaurants and options.
//! - [`ReviewStore`]: append-only reviews.
//! - [`EntityStore`]: composes one of each and bounds every call with a
//!   timeout.

pub mod entity;
pub mod journal;
pub mod memory;

pub use entity::EntityStore;

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;

use spice_core::text::contains_ignore_case;
use spice_core::{Day, DiningOption, MealTime, Restaurant, RestaurantId, Review};

// =============================================================================
// Errors
// =============================================================================

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{store} store failed: {source}")]
    Engine {
        store: &'static str,
        #[source]
        source: spice_io::Error,
    },

    #[error("{store} store is unavailable: {reason}")]
    Unavailable { store: &'static str, reason: String },

    #[error("{operation} timed out after {timeout_ms} ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u128,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Predicates
// =============================================================================

/// Base predicate over restaurants. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestaurantFilter {
    /// Case-insensitive substring of the name.
    pub name_contains: Option<String>,
    /// Exact cuisine.
    pub cuisine: Option<String>,
    /// Location membership; empty means any location.
    pub locations: BTreeSet<String>,
}

impl RestaurantFilter {
    pub fn matches(&self, restaurant: &Restaurant) -> bool {
        if let Some(needle) = &self.name_contains {
            if !contains_ignore_case(&restaurant.name, needle) {
                return false;
            }
        }

        if let Some(cuisine) = &self.cuisine {
            if restaurant.cuisine.as_deref() != Some(cuisine.as_str()) {
                return false;
            }
        }

        if !self.locations.is_empty() {
            match &restaurant.location {
                Some(location) if self.locations.contains(location) => {}
                _ => return false,
            }
        }

        true
    }
}

/// Exact day/time predicate over dining options. Unset fields match
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotFilter {
    pub day: Option<Day>,
    pub time: Option<MealTime>,
}

impl SlotFilter {
    pub fn is_unconstrained(&self) -> bool {
        self.day.is_none() && self.time.is_none()
    }

    pub fn matches(&self, option: &DiningOption) -> bool {
        self.day.as_ref().map_or(true, |day| option.day == *day)
            && self.time.as_ref().map_or(true, |time| option.time == *time)
    }
}

// =============================================================================
// Facets
// =============================================================================

/// Distinct catalog values used to populate filter widgets.
///
/// Each list is deduplicated. Ordering is left to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogFacets {
    pub names: BTreeSet<String>,
    pub cuisines: BTreeSet<String>,
    pub locations: BTreeSet<String>,
    pub days: BTreeSet<Day>,
    pub times: BTreeSet<MealTime>,
}

// =============================================================================
// Core Traits
// =============================================================================

/// Read-only access to restaurants and their dining options.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// Names of the record sets this store holds.
    fn collections(&self) -> Vec<String>;

    /// Verify the store is reachable.
    async fn ping(&self) -> StoreResult<()>;

    /// Every restaurant matching `filter`, in no particular order.
    async fn find_restaurants(&self, filter: &RestaurantFilter) -> StoreResult<Vec<Restaurant>>;

    /// First restaurant whose name is exactly `name`.
    async fn restaurant_by_name(&self, name: &str) -> StoreResult<Option<Restaurant>>;

    async fn restaurant_by_id(&self, id: RestaurantId) -> StoreResult<Option<Restaurant>>;

    /// Ids from `candidates` that have at least one option matching `slot`.
    async fn restaurants_with_options(
        &self,
        candidates: &BTreeSet<RestaurantId>,
        slot: &SlotFilter,
    ) -> StoreResult<BTreeSet<RestaurantId>>;

    /// Options of one restaurant matching `slot`, in no particular order.
    async fn options_for(
        &self,
        id: RestaurantId,
        slot: &SlotFilter,
    ) -> StoreResult<Vec<DiningOption>>;

    async fn facets(&self) -> StoreResult<CatalogFacets>;
}

/// Append-only access to reviews.
#[async_trait::async_trait]
pub trait ReviewStore: Send + Sync {
    fn collections(&self) -> Vec<String>;

    async fn ping(&self) -> StoreResult<()>;

    /// Persist one review. Returns once it is durable.
    async fn insert(&self, review: Review) -> StoreResult<()>;

    /// Every review of one restaurant, in insertion order.
    async fn reviews_for(&self, id: RestaurantId) -> StoreResult<Vec<Review>>;

    /// Every review whose user name contains `needle`, ignoring case.
    async fn reviews_by_user(&self, needle: &str) -> StoreResult<Vec<Review>>;

    /// Ids from `candidates` reviewed by a user whose name contains
    /// `needle`, ignoring case.
    async fn reviewed_by(
        &self,
        candidates: &BTreeSet<RestaurantId>,
        needle: &str,
    ) -> StoreResult<BTreeSet<RestaurantId>>;

    /// Distinct non-empty user names.
    async fn user_names(&self) -> StoreResult<BTreeSet<String>>;
}
