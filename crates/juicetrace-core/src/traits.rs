//! Collaborator traits.
//!
//! The engine reaches persistence only through these two traits, so any
//! backend (SQLite, a remote service, an in-memory fixture) can be swapped
//! in without touching trace logic. Implementations must be cheap to share:
//! the engine holds them behind `Arc` and calls them from many requests at
//! once.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::model::{BatchKey, Product, ProvenanceRecord};

/// Read access to the product collection.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Look a product up by exact, case-sensitive name.
    ///
    /// Returns `Ok(None)` when no product has this name.
    async fn find_product(&self, name: &str) -> StoreResult<Option<Product>>;

    /// All product names, sorted.
    async fn list_product_names(&self) -> StoreResult<Vec<String>>;

    /// Check that the backend is reachable.
    ///
    /// Backs the health check, so every implementation answers for itself.
    async fn ping(&self) -> StoreResult<()>;
}

/// Read access to batch and ingredient-input records.
#[async_trait]
pub trait ProvenanceSource: Send + Sync {
    /// Every ingredient input of the batch identified by `key`.
    ///
    /// An unmatched key yields an empty list. Order must be stable for a
    /// fixed data set; implementations use ingredient-input insertion order.
    async fn find_provenance(&self, key: &BatchKey) -> StoreResult<Vec<ProvenanceRecord>>;
}
