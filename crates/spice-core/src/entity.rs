//! # Entities
//!
//! The three record kinds persisted by the stores. Restaurants and dining
//! options form the read-only catalog; reviews are append-only.

use core::cmp::Ordering;
use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schedule::{Day, MealTime};

/// Stable restaurant identity, assigned when the catalog is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestaurantId(pub i64);

impl fmt::Display for RestaurantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A catalog restaurant.
///
/// `id` is `None` only for legacy catalog rows imported without any
/// identifier. Such rows appear in listings but can never be joined to
/// options or reviews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: Option<RestaurantId>,
    pub name: String,
    pub cuisine: Option<String>,
    pub location: Option<String>,
    pub link: Option<String>,
}

impl Restaurant {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: Some(RestaurantId(id)),
            name: name.into(),
            cuisine: None,
            location: None,
            link: None,
        }
    }

    pub fn with_cuisine(mut self, cuisine: impl Into<String>) -> Self {
        self.cuisine = Some(cuisine.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Listing order: name ascending, then identity ascending.
    pub fn listing_cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name).then_with(|| self.id.cmp(&other.id))
    }
}

/// One day/time/price offering of a restaurant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiningOption {
    pub restaurant_id: RestaurantId,
    pub day: Day,
    pub time: MealTime,
    /// Display string, never parsed.
    pub price: String,
}

impl DiningOption {
    pub fn new(
        restaurant_id: i64,
        day: impl Into<Day>,
        time: impl Into<MealTime>,
        price: impl Into<String>,
    ) -> Self {
        Self {
            restaurant_id: RestaurantId(restaurant_id),
            day: day.into(),
            time: time.into(),
            price: price.into(),
        }
    }

    /// Canonical schedule order: day first, then meal time.
    pub fn schedule_cmp(&self, other: &Self) -> Ordering {
        self.day
            .cmp(&other.day)
            .then_with(|| self.time.cmp(&other.time))
    }
}

/// A user review of a restaurant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub restaurant_id: RestaurantId,
    pub user_name: String,
    pub rating: i32,
    pub comment: String,
    /// Server clock at insertion. Legacy rows may lack it.
    pub created_at: Option<DateTime<Utc>>,
}

impl Review {
    /// Newest first; a missing timestamp counts as the oldest possible.
    pub fn recency_cmp(&self, other: &Self) -> Ordering {
        other.created_at.cmp(&self.created_at)
    }
}
