//! # Filter-Data Cache
//!
//! Holds the distinct values that populate the search widgets. An entry is
//! served until it is older than the configured freshness window or until
//! [`FilterDataCache::invalidate`] is called, whichever comes first.
//!
//! Invalidation bumps a generation counter instead of clearing the entry:
//! a refresh that started before the bump cannot install its result, and
//! the old value stays available as the fail-soft fallback.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::RwLock;

use spice_core::{Day, MealTime};

use crate::error::SpiceResult;
use crate::store::CatalogFacets;

/// Default freshness window.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Distinct values for each search criterion.
///
/// Text lists are sorted and deduplicated. Days and times list only the
/// canonical values present in the catalog, in canonical order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterData {
    pub restaurants: Vec<String>,
    pub cuisines: Vec<String>,
    pub locations: Vec<String>,
    pub days: Vec<Day>,
    pub times: Vec<MealTime>,
    pub users: Vec<String>,
}

impl FilterData {
    pub fn from_sources(facets: CatalogFacets, users: impl IntoIterator<Item = String>) -> Self {
        let mut users: Vec<String> = users.into_iter().filter(|u| !u.is_empty()).collect();
        users.sort();
        users.dedup();

        Self {
            restaurants: facets.names.into_iter().collect(),
            cuisines: facets.cuisines.into_iter().collect(),
            locations: facets.locations.into_iter().collect(),
            days: Day::canonical().filter(|d| facets.days.contains(d)).collect(),
            times: MealTime::canonical()
                .filter(|t| facets.times.contains(t))
                .collect(),
            users,
        }
    }
}

struct Entry {
    data: Arc<FilterData>,
    refreshed_at: Instant,
    generation: u64,
}

pub struct FilterDataCache {
    ttl: Duration,
    generation: AtomicU64,
    entry: RwLock<Option<Entry>>,
}

impl FilterDataCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            generation: AtomicU64::new(0),
            entry: RwLock::new(None),
        }
    }

    /// Mark the current entry stale. Takes effect for every read that
    /// starts after this returns.
    pub fn invalidate(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(generation, "Filter data invalidated");
    }

    /// Return the cached value if fresh, else run `load` and cache its
    /// result.
    ///
    /// If `load` fails and a previous value exists, that value is returned
    /// instead of the error.
    pub async fn get_or_refresh<F, Fut>(&self, load: F) -> SpiceResult<Arc<FilterData>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SpiceResult<FilterData>>,
    {
        let generation = self.generation.load(Ordering::SeqCst);

        if let Some(entry) = self.entry.read().await.as_ref() {
            if entry.generation == generation && entry.refreshed_at.elapsed() < self.ttl {
                tracing::debug!("Filter data cache hit");
                return Ok(entry.data.clone());
            }
        }

        match load().await {
            Ok(data) => {
                let data = Arc::new(data);
                let mut entry = self.entry.write().await;
                if self.generation.load(Ordering::SeqCst) == generation {
                    *entry = Some(Entry {
                        data: data.clone(),
                        refreshed_at: Instant::now(),
                        generation,
                    });
                    tracing::debug!(generation, "Filter data refreshed");
                }
                Ok(data)
            }
            Err(e) => match self.entry.read().await.as_ref() {
                Some(entry) => {
                    tracing::warn!(error = %e, "Filter data refresh failed; serving last good value");
                    Ok(entry.data.clone())
                }
                None => Err(e),
            },
        }
    }
}

impl Default for FilterDataCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
