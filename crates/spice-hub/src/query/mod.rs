//! # Restaurant Search
//!
//! A search is a [`FilterRequest`]: independent, optional predicates over
//! restaurants, their dining options and their reviews. The
//! [`executor`] evaluates each predicate against the store that owns the
//! entity and intersects the resulting restaurant-id sets.

pub mod executor;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use spice_core::text::{free_text, selection, ALL};
use spice_core::{Day, MealTime};

use crate::store::{RestaurantFilter, SlotFilter};

/// Search criteria. Every field is optional; an unset field does not
/// constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRequest {
    /// Case-insensitive substring of the restaurant name.
    pub name: Option<String>,
    /// Exact cuisine.
    pub cuisine: Option<String>,
    pub day: Option<Day>,
    pub time: Option<MealTime>,
    /// Any of these locations. Empty means any location.
    #[serde(default)]
    pub locations: BTreeSet<String>,
    /// Case-insensitive substring of a reviewer's user name.
    pub reviewer: Option<String>,
}

impl FilterRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name_text(Some(name));
        self
    }

    pub fn cuisine(mut self, cuisine: &str) -> Self {
        self.cuisine = selection(Some(cuisine)).map(str::to_string);
        self
    }

    pub fn day(mut self, day: &str) -> Self {
        self.day = selection(Some(day)).map(Day::parse);
        self
    }

    pub fn time(mut self, time: &str) -> Self {
        self.time = selection(Some(time)).map(MealTime::parse);
        self
    }

    pub fn location(mut self, location: &str) -> Self {
        if let Some(location) = selection(Some(location)) {
            self.locations.insert(location.to_string());
        }
        self
    }

    pub fn reviewer(mut self, reviewer: &str) -> Self {
        self.reviewer = free_text(Some(reviewer)).map(str::to_string);
        self
    }

    /// The same request with blank values and `All` sentinels removed.
    ///
    /// Requests built through the setters are already normalized; this is
    /// for requests deserialized straight off the wire.
    pub fn normalized(&self) -> Self {
        Self {
            name: name_text(self.name.as_deref()),
            cuisine: selection(self.cuisine.as_deref()).map(str::to_string),
            day: self
                .day
                .as_ref()
                .and_then(|day| selection(Some(day.as_str())).map(Day::parse)),
            time: self
                .time
                .as_ref()
                .and_then(|time| selection(Some(time.as_str())).map(MealTime::parse)),
            locations: self
                .locations
                .iter()
                .filter_map(|l| selection(Some(l)).map(str::to_string))
                .collect(),
            reviewer: free_text(self.reviewer.as_deref()).map(str::to_string),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.cuisine.is_none()
            && self.day.is_none()
            && self.time.is_none()
            && self.locations.is_empty()
            && self.reviewer.is_none()
    }

    pub fn restaurant_filter(&self) -> RestaurantFilter {
        RestaurantFilter {
            name_contains: self.name.clone(),
            cuisine: self.cuisine.clone(),
            locations: self.locations.clone(),
        }
    }

    pub fn slot_filter(&self) -> SlotFilter {
        SlotFilter {
            day: self.day.clone(),
            time: self.time.clone(),
        }
    }
}

/// The name box is typed text, but the exact dropdown value `All` still
/// means "any name".
fn name_text(raw: Option<&str>) -> Option<String> {
    free_text(raw)
        .filter(|value| *value != ALL)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setters_drop_all_sentinel() {
        let request = FilterRequest::new()
            .name("All")
            .cuisine(" ")
            .day("all")
            .time("ALL")
            .location("All")
            .reviewer("");
        assert!(request.is_empty());
    }

    #[test]
    fn test_setters_parse_schedule_values() {
        let request = FilterRequest::new().day(" friday ").time("Dinner");
        assert_eq!(request.day, Some(Day::Friday));
        assert_eq!(request.time, Some(MealTime::Dinner));
        assert!(request.slot_filter().day.is_some());
    }

    #[test]
    fn test_normalized_cleans_wire_requests() {
        let wire: FilterRequest = serde_json::from_str(
            r#"{"name":"  ","cuisine":"Italian","day":"All","time":null,
                "locations":["Downtown","all",""],"reviewer":"ann"}"#,
        )
        .unwrap();
        let request = wire.normalized();
        assert_eq!(request.name, None);
        assert_eq!(request.cuisine.as_deref(), Some("Italian"));
        assert_eq!(request.day, None);
        assert_eq!(request.locations, BTreeSet::from(["Downtown".to_string()]));
        assert_eq!(request.reviewer.as_deref(), Some("ann"));
    }

    #[test]
    fn test_typed_text_keeps_the_word_all() {
        let request = FilterRequest::new().name("all").reviewer("ALL");
        assert_eq!(request.name.as_deref(), Some("all"));
        assert_eq!(request.reviewer.as_deref(), Some("ALL"));

        let wire: FilterRequest =
            serde_json::from_str(r#"{"name":"All","reviewer":" all "}"#).unwrap();
        let request = wire.normalized();
        assert_eq!(request.name, None);
        assert_eq!(request.reviewer.as_deref(), Some("all"));
    }

    #[test]
    fn test_locations_accumulate() {
        let request = FilterRequest::new().location("Brickell").location("Downtown");
        assert_eq!(request.restaurant_filter().locations.len(), 2);
    }
}
