//! # Review Record: the on-disk review atom
//!
//! [`ReviewRecord`] is the archived form of a [`Review`]. With rkyv's
//! `unaligned` feature the archive can be validated and read straight out
//! of a memory-mapped journal at any byte offset.
//!
//! Timestamps are stored as Unix milliseconds so the record carries no
//! dependency on a date-time library's layout.

use chrono::DateTime;

use crate::entity::{RestaurantId, Review};

#[derive(Debug, Clone, PartialEq, Eq, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
#[rkyv(derive(Debug))]
pub struct ReviewRecord {
    pub restaurant_id: i64,
    pub user_name: String,
    pub rating: i32,
    pub comment: String,
    /// Unix milliseconds; `None` for legacy rows without a timestamp.
    pub created_at_ms: Option<i64>,
}

impl From<&Review> for ReviewRecord {
    fn from(review: &Review) -> Self {
        Self {
            restaurant_id: review.restaurant_id.0,
            user_name: review.user_name.clone(),
            rating: review.rating,
            comment: review.comment.clone(),
            created_at_ms: review.created_at.map(|ts| ts.timestamp_millis()),
        }
    }
}

impl From<ReviewRecord> for Review {
    fn from(record: ReviewRecord) -> Self {
        Self {
            restaurant_id: RestaurantId(record.restaurant_id),
            user_name: record.user_name,
            rating: record.rating,
            comment: record.comment,
            created_at: record.created_at_ms.and_then(DateTime::from_timestamp_millis),
        }
    }
}
