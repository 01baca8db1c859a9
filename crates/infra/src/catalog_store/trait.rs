use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use stockroom_products::Product;
use stockroom_stores::Store;

use crate::statistics::pipeline::{GroupPipeline, GroupRow, JoinPipeline, JoinedRow};

/// Catalog storage operation error.
///
/// These are **infrastructure errors** (storage, decoding) as opposed to domain
/// errors (validation). Duplicate names normally never reach the store because the
/// gateway checks first; `Duplicate` covers the unique index tripping anyway.
#[derive(Debug, Error)]
pub enum CatalogStoreError {
    #[error("duplicate {collection} name: {name}")]
    Duplicate {
        collection: &'static str,
        name: String,
    },

    #[error("{collection} record not found: {name}")]
    NotFound {
        collection: &'static str,
        name: String,
    },

    #[error("failed to decode {collection} record: {reason}")]
    Decode {
        collection: &'static str,
        reason: String,
    },

    #[error("database error during {operation}: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// The two catalog collections plus the aggregation primitives run over them.
///
/// ## Collections
///
/// - `stores`: unique `name`, ordered list of shelved product names
/// - `products`: unique `name`, non-negative `price`
///
/// ## Ordering
///
/// Listing methods return records in insertion order. Pipeline results are ordered by
/// store name (then product name for joined rows) so reports are deterministic.
///
/// ## Implementation Requirements
///
/// Implementations must:
/// - keep names unique per collection
/// - implement the join stage by name (dangling names produce no row, a product joins
///   at most once per store)
/// - omit stores with no rows from group results
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Remove every record from both collections.
    async fn clear(&self) -> Result<(), CatalogStoreError>;

    async fn find_store(&self, name: &str) -> Result<Option<Store>, CatalogStoreError>;

    async fn find_product(&self, name: &str) -> Result<Option<Product>, CatalogStoreError>;

    async fn insert_store(&self, store: &Store) -> Result<(), CatalogStoreError>;

    async fn insert_product(&self, product: &Product) -> Result<(), CatalogStoreError>;

    /// Overwrite the shelved product list of the store named `store_name`.
    async fn set_store_products(
        &self,
        store_name: &str,
        products: &[String],
    ) -> Result<(), CatalogStoreError>;

    async fn list_stores(&self) -> Result<Vec<Store>, CatalogStoreError>;

    async fn list_products(&self) -> Result<Vec<Product>, CatalogStoreError>;

    /// Run a join pipeline and return the matching rows.
    async fn joined_rows(
        &self,
        pipeline: &JoinPipeline,
    ) -> Result<Vec<JoinedRow>, CatalogStoreError>;

    /// Run a group pipeline and return one row per store.
    async fn aggregate(&self, pipeline: &GroupPipeline) -> Result<Vec<GroupRow>, CatalogStoreError>;

    /// Release the underlying connection. Further calls may fail.
    async fn close(&self);
}

#[async_trait]
impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    async fn clear(&self) -> Result<(), CatalogStoreError> {
        (**self).clear().await
    }

    async fn find_store(&self, name: &str) -> Result<Option<Store>, CatalogStoreError> {
        (**self).find_store(name).await
    }

    async fn find_product(&self, name: &str) -> Result<Option<Product>, CatalogStoreError> {
        (**self).find_product(name).await
    }

    async fn insert_store(&self, store: &Store) -> Result<(), CatalogStoreError> {
        (**self).insert_store(store).await
    }

    async fn insert_product(&self, product: &Product) -> Result<(), CatalogStoreError> {
        (**self).insert_product(product).await
    }

    async fn set_store_products(
        &self,
        store_name: &str,
        products: &[String],
    ) -> Result<(), CatalogStoreError> {
        (**self).set_store_products(store_name, products).await
    }

    async fn list_stores(&self) -> Result<Vec<Store>, CatalogStoreError> {
        (**self).list_stores().await
    }

    async fn list_products(&self) -> Result<Vec<Product>, CatalogStoreError> {
        (**self).list_products().await
    }

    async fn joined_rows(
        &self,
        pipeline: &JoinPipeline,
    ) -> Result<Vec<JoinedRow>, CatalogStoreError> {
        (**self).joined_rows(pipeline).await
    }

    async fn aggregate(
        &self,
        pipeline: &GroupPipeline,
    ) -> Result<Vec<GroupRow>, CatalogStoreError> {
        (**self).aggregate(pipeline).await
    }

    async fn close(&self) {
        (**self).close().await
    }
}
