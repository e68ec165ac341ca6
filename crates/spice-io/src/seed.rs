//! # Catalog Seed
//!
//! The restaurant catalog is loaded once from a JSON document:
//!
//! ```json
//! {
//!   "restaurants": [{ "RestaurantId": 1, "Name": "Joe's", "Cuisine": "Italian",
//!                     "Location": "Downtown", "Link": "https://..." }],
//!   "options":     [{ "RestaurantId": 1, "Day": "Friday", "Time": "Dinner", "Price": "$49" }]
//! }
//! ```
//!
//! Older exports spell the restaurant key `restaurantId`, `restaurant_id`
//! or `Restaurant_ID`. All spellings are normalized here, once, so nothing
//! downstream ever guesses at field names.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use spice_core::{Day, DiningOption, MealTime, Restaurant, RestaurantId};

use crate::error::Result;

/// A loaded, normalized catalog.
#[derive(Debug, Default)]
pub struct Catalog {
    pub restaurants: Vec<Restaurant>,
    pub options: Vec<DiningOption>,
    /// Restaurant rows dropped for lacking a name.
    pub skipped_restaurants: usize,
    /// Option rows dropped for lacking a restaurant id.
    pub skipped_options: usize,
}

#[derive(Deserialize)]
struct SeedFile {
    #[serde(default, alias = "Restaurants")]
    restaurants: Vec<SeedRestaurant>,
    #[serde(default, alias = "Options")]
    options: Vec<SeedOption>,
}

#[derive(Deserialize)]
struct SeedRestaurant {
    #[serde(
        default,
        rename = "RestaurantId",
        alias = "restaurantId",
        alias = "restaurant_id",
        alias = "Restaurant_ID"
    )]
    id: Option<i64>,
    #[serde(default, rename = "Name", alias = "name")]
    name: Option<String>,
    #[serde(default, rename = "Cuisine", alias = "cuisine")]
    cuisine: Option<String>,
    #[serde(default, rename = "Location", alias = "location")]
    location: Option<String>,
    #[serde(default, rename = "Link", alias = "link")]
    link: Option<String>,
}

#[derive(Deserialize)]
struct SeedOption {
    #[serde(
        default,
        rename = "RestaurantId",
        alias = "restaurantId",
        alias = "restaurant_id",
        alias = "Restaurant_ID"
    )]
    restaurant_id: Option<i64>,
    #[serde(default, rename = "Day", alias = "day")]
    day: Option<String>,
    #[serde(default, rename = "Time", alias = "time")]
    time: Option<String>,
    #[serde(default, rename = "Price", alias = "price")]
    price: Option<Value>,
}

/// Read and normalize the seed file at `path`.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let raw = std::fs::read_to_string(path)?;
    parse_catalog(&raw)
}

/// Normalize a seed document.
pub fn parse_catalog(raw: &str) -> Result<Catalog> {
    let seed: SeedFile = serde_json::from_str(raw)?;
    let mut catalog = Catalog::default();

    for row in seed.restaurants {
        let Some(name) = non_blank(row.name) else {
            catalog.skipped_restaurants += 1;
            continue;
        };
        catalog.restaurants.push(Restaurant {
            id: row.id.map(RestaurantId),
            name,
            cuisine: non_blank(row.cuisine),
            location: non_blank(row.location),
            link: non_blank(row.link),
        });
    }

    for row in seed.options {
        let Some(id) = row.restaurant_id else {
            catalog.skipped_options += 1;
            continue;
        };
        catalog.options.push(DiningOption {
            restaurant_id: RestaurantId(id),
            day: Day::parse(row.day.as_deref().unwrap_or_default()),
            time: MealTime::parse(row.time.as_deref().unwrap_or_default()),
            price: render_price(row.price),
        });
    }

    Ok(catalog)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn render_price(price: Option<Value>) -> String {
    match price {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
