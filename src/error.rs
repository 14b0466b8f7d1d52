//! Error types for the storage and service seams.

use thiserror::Error;

/// Failures reported by a [`CartRepository`](crate::storage::CartRepository).
///
/// `NotFound` is the expected "absent" result; every other variant is a
/// storage failure that callers surface or swallow, never retry.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("deadline exceeded before the storage call completed")]
    DeadlineExceeded,

    #[error("rejected by storage: {0}")]
    Rejected(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Database(other),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors produced by the cart service.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("invalid arguments")]
    InvalidArgument,

    #[error("invalid item name")]
    InvalidItem { product: String },

    #[error("invalid quantity")]
    InvalidQuantity { raw: String },

    #[error("not found")]
    NotFound,

    #[error("storage error: {0}")]
    Storage(#[source] StoreError),
}

impl CartError {
    /// True for errors caused by the caller's input, which the HTTP layer
    /// shows back to the user instead of failing the request.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            CartError::InvalidArgument | CartError::InvalidItem { .. } | CartError::InvalidQuantity { .. }
        )
    }
}

impl From<StoreError> for CartError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => CartError::NotFound,
            other => CartError::Storage(other),
        }
    }
}

/// Reasons a price catalog cannot be built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("price catalog is empty")]
    Empty,

    #[error("negative price for product '{0}'")]
    NegativePrice(String),

    #[error("invalid catalog entry '{0}' (expected product=price)")]
    InvalidEntry(String),
}

/// Configuration problems detected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("missing database settings: set DATABASE_URL or DB_HOST/DB_NAME/DB_USERNAME")]
    MissingDatabase,

    #[error("invalid PRICE_CATALOG: {0}")]
    Catalog(#[from] CatalogError),
}
