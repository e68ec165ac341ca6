//! # spice-core: the data atoms of Spice
//!
//! Defines the three persisted record kinds of the restaurant catalog and
//! the fixed, non-lexical ordering that every day/time listing follows.
//!
//! - [`Restaurant`] and [`DiningOption`] are loaded once and never mutated.
//! - [`Review`] is append-only. Its on-disk layout is [`ReviewRecord`], a
//!   zero-copy `rkyv` archive.
//! - [`Day`] and [`MealTime`] implement [`Ord`] by canonical position,
//!   never by spelling.

pub mod entity;
pub mod rating;
pub mod record;
pub mod schedule;
pub mod text;

pub use entity::{DiningOption, Restaurant, RestaurantId, Review};
pub use rating::{is_valid_rating, mean_rating, RATING_MAX, RATING_MIN};
pub use record::ReviewRecord;
pub use schedule::{Day, MealTime};
