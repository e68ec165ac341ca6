//! # Error Taxonomy
//!
//! The only errors that leave the core. Storage-engine failures are
//! rendered into [`SpiceError::StorageUnavailable`] at the store boundary,
//! so callers never see a journal or seed-file error type.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpiceError {
    /// The store could not be reached, failed the query, or timed out.
    #[error("storage unavailable during {operation}: {reason}")]
    StorageUnavailable {
        operation: &'static str,
        reason: String,
    },

    /// A named lookup matched nothing.
    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },
}

impl SpiceError {
    pub fn unavailable(operation: &'static str, err: StoreError) -> Self {
        Self::StorageUnavailable {
            operation,
            reason: err.to_string(),
        }
    }

    pub fn restaurant_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "restaurant",
            key: name.into(),
        }
    }
}

pub type SpiceResult<T> = Result<T, SpiceError>;
