//! # Search Executor
//!
//! Evaluates a [`FilterRequest`] against the [`EntityStore`]:
//!
//! 1. the restaurant predicate (name, cuisine, locations) gives the base
//!    candidates;
//! 2. a day/time constraint keeps candidates with a matching option;
//! 3. a reviewer constraint keeps candidates reviewed by a matching user.
//!
//! Each step only ever narrows the candidate set, and an empty set ends the
//! search without touching the remaining stores. Restaurants without an id
//! cannot be joined, so they drop out as soon as step 2 or 3 applies.

use std::collections::BTreeSet;

use spice_core::{Restaurant, RestaurantId};

use super::FilterRequest;
use crate::error::SpiceResult;
use crate::store::EntityStore;

/// Run a search. Results are ordered by name, ties broken by id.
pub async fn execute(request: &FilterRequest, store: &EntityStore) -> SpiceResult<Vec<Restaurant>> {
    let request = request.normalized();

    let mut base = store.find_restaurants(&request.restaurant_filter()).await?;
    if base.is_empty() {
        return Ok(base);
    }

    let slot = request.slot_filter();
    let needs_join = !slot.is_unconstrained() || request.reviewer.is_some();
    if !needs_join {
        base.sort_by(Restaurant::listing_cmp);
        return Ok(base);
    }

    let mut candidates: BTreeSet<RestaurantId> = base.iter().filter_map(|r| r.id).collect();

    if !slot.is_unconstrained() && !candidates.is_empty() {
        let scheduled = store.restaurants_with_options(&candidates, &slot).await?;
        candidates = candidates.intersection(&scheduled).copied().collect();
        tracing::debug!(remaining = candidates.len(), "Applied schedule filter");
    }

    if let Some(reviewer) = request.reviewer.as_deref() {
        if !candidates.is_empty() {
            let reviewed = store.reviewed_by(&candidates, reviewer).await?;
            candidates = candidates.intersection(&reviewed).copied().collect();
            tracing::debug!(remaining = candidates.len(), "Applied reviewer filter");
        }
    }

    let mut results: Vec<Restaurant> = base
        .into_iter()
        .filter(|r| r.id.is_some_and(|id| candidates.contains(&id)))
        .collect();
    results.sort_by(Restaurant::listing_cmp);
    Ok(results)
}

/// Every restaurant in the catalog, by name.
pub async fn list_all(store: &EntityStore) -> SpiceResult<Vec<Restaurant>> {
    execute(&FilterRequest::default(), store).await
}
