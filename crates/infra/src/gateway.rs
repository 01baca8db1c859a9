//! Persistence gateway: the catalog operations the console dispatches to.
//!
//! The gateway owns the [`CatalogStore`] handle for the whole session. It checks names
//! before inserting, performs shelving as a read-modify-write of the store's list, and
//! hands statistics off to the [`StatisticsEngine`]. Rejections are returned as
//! [`GatewayError`]s whose `Display` text is what the operator sees.

use core::fmt;

use thiserror::Error;
use tracing::instrument;

use stockroom_core::{DomainError, Entity};
use stockroom_products::{Price, Product};
use stockroom_stores::Store;

use crate::catalog_store::{CatalogStore, CatalogStoreError, SqliteCatalogStore};
use crate::config::CatalogConfig;
use crate::statistics::{StatisticsEngine, StatisticsReport};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("store already exists: {0}")]
    StoreExists(String),

    #[error("product already exists: {0}")]
    ProductExists(String),

    #[error("store or product does not exist (product: {product}, store: {store})")]
    MissingReference { product: String, store: String },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage failure: {0}")]
    Storage(#[from] CatalogStoreError),
}

/// Snapshot of both collections, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogListing {
    pub stores: Vec<Store>,
    pub products: Vec<Product>,
}

impl fmt::Display for CatalogListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stores:")?;
        if self.stores.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for store in &self.stores {
            writeln!(f, "  {store}")?;
        }
        writeln!(f, "Products:")?;
        if self.products.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for product in &self.products {
            writeln!(f, "  {product}")?;
        }
        Ok(())
    }
}

/// Catalog operations over an owned [`CatalogStore`].
#[derive(Debug)]
pub struct CatalogGateway<S> {
    store: S,
}

impl CatalogGateway<SqliteCatalogStore> {
    /// Connect to the configured database and open the gateway over it.
    pub async fn connect(config: &CatalogConfig) -> Result<Self, GatewayError> {
        let store = SqliteCatalogStore::connect(&config.database_url).await?;
        Self::open(store, config.clear_on_start).await
    }
}

impl<S> CatalogGateway<S>
where
    S: CatalogStore,
{
    /// Wrap `store` without touching its contents.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Wrap `store`, wiping both collections first when `clear` is set.
    pub async fn open(store: S, clear: bool) -> Result<Self, GatewayError> {
        if clear {
            store.clear().await?;
            tracing::info!("catalog cleared for a fresh session");
        }
        Ok(Self::new(store))
    }

    /// Register a new store with an empty shelf.
    #[instrument(skip(self), err(level = "warn"))]
    pub async fn add_store(&self, name: &str) -> Result<Store, GatewayError> {
        let store = Store::new(name)?;
        if self.store.find_store(store.name()).await?.is_some() {
            return Err(GatewayError::StoreExists(store.name().to_string()));
        }

        self.store.insert_store(&store).await.map_err(|e| match e {
            CatalogStoreError::Duplicate { name, .. } => GatewayError::StoreExists(name),
            other => other.into(),
        })?;
        tracing::debug!(store_id = %store.id_typed(), "store added");
        Ok(store)
    }

    /// Register a new product.
    #[instrument(skip(self), err(level = "warn"))]
    pub async fn add_product(&self, name: &str, price: Price) -> Result<Product, GatewayError> {
        let product = Product::new(name, price)?;
        if self.store.find_product(product.name()).await?.is_some() {
            return Err(GatewayError::ProductExists(product.name().to_string()));
        }

        self.store.insert_product(&product).await.map_err(|e| match e {
            CatalogStoreError::Duplicate { name, .. } => GatewayError::ProductExists(name),
            other => other.into(),
        })?;
        tracing::debug!(product_id = %product.id_typed(), "product added");
        Ok(product)
    }

    /// Append `product_name` to the shelf of `store_name`.
    ///
    /// Both must exist; otherwise nothing is written. Returns the updated store.
    #[instrument(skip(self), err(level = "warn"))]
    pub async fn shelve_product(
        &self,
        product_name: &str,
        store_name: &str,
    ) -> Result<Store, GatewayError> {
        let product = self.store.find_product(product_name).await?;
        let store = self.store.find_store(store_name).await?;

        let (Some(product), Some(mut store)) = (product, store) else {
            return Err(GatewayError::MissingReference {
                product: product_name.to_string(),
                store: store_name.to_string(),
            });
        };

        store.shelve(&product);
        self.store
            .set_store_products(store.name(), store.products())
            .await?;
        tracing::debug!(
            shelved = store.shelved_count(product.name()),
            "product shelved"
        );
        Ok(store)
    }

    /// Both collections, in insertion order.
    pub async fn catalog(&self) -> Result<CatalogListing, GatewayError> {
        Ok(CatalogListing {
            stores: self.store.list_stores().await?,
            products: self.store.list_products().await?,
        })
    }

    /// Run the five statistics reports.
    pub async fn statistics(&self) -> Result<StatisticsReport, GatewayError> {
        Ok(StatisticsEngine::new(&self.store).run_all().await?)
    }

    /// Release the database handle. Consumes the gateway, so it runs once.
    pub async fn shutdown(self) {
        self.store.close().await;
        tracing::info!("catalog gateway shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::InMemoryCatalogStore;

    fn price(amount: i64) -> Price {
        Price::new(amount).unwrap()
    }

    async fn gateway() -> CatalogGateway<InMemoryCatalogStore> {
        CatalogGateway::open(InMemoryCatalogStore::new(), true)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn adding_a_store_twice_keeps_one_record() {
        let gw = gateway().await;
        gw.add_store("central").await.unwrap();

        let err = gw.add_store("central").await.unwrap_err();
        assert!(matches!(err, GatewayError::StoreExists(ref n) if n == "central"));
        assert_eq!(gw.catalog().await.unwrap().stores.len(), 1);
    }

    #[tokio::test]
    async fn adding_a_product_twice_keeps_one_record() {
        let gw = gateway().await;
        gw.add_product("milk", price(80)).await.unwrap();

        let err = gw.add_product("milk", price(95)).await.unwrap_err();
        assert!(matches!(err, GatewayError::ProductExists(_)));

        let products = gw.catalog().await.unwrap().products;
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].price().amount(), 80);
    }

    #[tokio::test]
    async fn shelving_into_missing_store_changes_nothing() {
        let gw = gateway().await;
        gw.add_product("milk", price(80)).await.unwrap();
        gw.add_store("central").await.unwrap();
        let before = gw.catalog().await.unwrap();

        let err = gw.shelve_product("milk", "nowhere").await.unwrap_err();
        assert!(matches!(err, GatewayError::MissingReference { .. }));
        let err = gw.shelve_product("ghost", "central").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "store or product does not exist (product: ghost, store: central)"
        );

        assert_eq!(gw.catalog().await.unwrap(), before);
    }

    #[tokio::test]
    async fn shelving_twice_records_the_name_twice() {
        let gw = gateway().await;
        gw.add_product("milk", price(80)).await.unwrap();
        gw.add_store("central").await.unwrap();

        gw.shelve_product("milk", "central").await.unwrap();
        let store = gw.shelve_product("milk", "central").await.unwrap();

        assert_eq!(store.products(), ["milk", "milk"]);
        let stored = gw.store.find_store("central").await.unwrap().unwrap();
        assert_eq!(stored.shelved_count("milk"), 2);
    }

    #[tokio::test]
    async fn invalid_name_is_a_domain_error() {
        let gw = gateway().await;
        let err = gw.add_store("").await.unwrap_err();
        assert!(matches!(err, GatewayError::Domain(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn open_with_clear_wipes_existing_records() {
        let store = InMemoryCatalogStore::new();
        store.insert_store(&Store::new("stale").unwrap()).await.unwrap();

        let gw = CatalogGateway::open(store, true).await.unwrap();
        assert!(gw.catalog().await.unwrap().stores.is_empty());
    }

    #[tokio::test]
    async fn open_without_clear_keeps_records() {
        let store = InMemoryCatalogStore::new();
        store.insert_store(&Store::new("kept").unwrap()).await.unwrap();

        let gw = CatalogGateway::open(store, false).await.unwrap();
        assert_eq!(gw.catalog().await.unwrap().stores.len(), 1);
    }

    #[tokio::test]
    async fn unshelved_product_appears_in_no_report() {
        let gw = gateway().await;
        gw.add_store("central").await.unwrap();
        gw.add_product("x", price(10)).await.unwrap();

        let report = gw.statistics().await.unwrap();
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn catalog_listing_renders_both_collections() {
        let gw = gateway().await;
        gw.add_store("central").await.unwrap();
        gw.add_product("milk", price(80)).await.unwrap();
        gw.shelve_product("milk", "central").await.unwrap();

        let text = gw.catalog().await.unwrap().to_string();
        assert_eq!(text, "Stores:\n  central: milk\nProducts:\n  milk (price 80)\n");
    }
}
