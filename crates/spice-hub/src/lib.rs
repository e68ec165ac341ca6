//! # spice-hub: restaurant search and reviews
//!
//! The filtering and aggregation core plus the HTTP service around it.
//!
//! - [`store`]: the catalog and review stores and the [`EntityStore`] that
//!   composes them.
//! - [`query`]: search requests and their execution.
//! - [`reviews`]: review summaries, user history and submission.
//! - [`cache`]: the filter-data cache.
//! - [`service`]: [`SpiceService`], the one entry point for callers.
//! - [`api`]: axum handlers and router.
//!
//! [`EntityStore`]: store::EntityStore
//! [`SpiceService`]: service::SpiceService

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod monitor;
pub mod options;
pub mod query;
pub mod reviews;
pub mod service;
pub mod store;

use std::sync::Arc;

use thiserror::Error;

use crate::cache::FilterDataCache;
use crate::config::{Config, ConfigError};
use crate::monitor::QueryMonitor;
use crate::service::SpiceService;
use crate::store::journal::JournalReviewStore;
use crate::store::memory::MemoryCatalog;
use crate::store::{EntityStore, StoreError};

pub use error::{SpiceError, SpiceResult};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to load catalog: {0}")]
    Catalog(#[source] spice_io::Error),

    #[error("failed to open review journal: {0}")]
    Reviews(#[from] StoreError),
}

/// Open both stores named by `config` and assemble the service.
pub fn build_service(config: &Config) -> Result<SpiceService, StartupError> {
    let catalog =
        spice_io::seed::load_catalog(&config.storage.catalog_path).map_err(StartupError::Catalog)?;
    if catalog.skipped_restaurants > 0 || catalog.skipped_options > 0 {
        tracing::warn!(
            skipped_restaurants = catalog.skipped_restaurants,
            skipped_options = catalog.skipped_options,
            "Catalog rows dropped during load"
        );
    }
    let catalog = MemoryCatalog::from_seed(catalog);
    tracing::info!(
        path = %config.storage.catalog_path.display(),
        restaurants = catalog.restaurant_count(),
        options = catalog.option_count(),
        "Catalog loaded"
    );

    if let Some(parent) = config.storage.reviews_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StartupError::Reviews(StoreError::Unavailable {
                    store: "review journal",
                    reason: e.to_string(),
                })
            })?;
        }
    }
    let reviews = JournalReviewStore::open(&config.storage.reviews_path)?;

    let store = EntityStore::new(Arc::new(catalog), Arc::new(reviews))
        .with_timeout(config.storage.timeout());

    Ok(SpiceService::new(
        store,
        FilterDataCache::new(config.cache.ttl()),
        QueryMonitor::new(
            config.monitor.slow_threshold(),
            config.monitor.slow_query_capacity,
        ),
    ))
}
