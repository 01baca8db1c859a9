use std::sync::RwLock;

use async_trait::async_trait;

use stockroom_core::Entity;
use stockroom_products::Product;
use stockroom_stores::Store;

use super::r#trait::{CatalogStore, CatalogStoreError};
use crate::statistics::pipeline::{GroupPipeline, GroupRow, JoinPipeline, JoinedRow};

/// In-memory catalog store.
///
/// Intended for tests/dev. Pipelines are evaluated in process.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    stores: RwLock<Vec<Store>>,
    products: RwLock<Vec<Product>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self) -> Result<(Vec<Store>, Vec<Product>), CatalogStoreError> {
        let stores = self.stores.read().map_err(|_| poisoned())?.clone();
        let products = self.products.read().map_err(|_| poisoned())?.clone();
        Ok((stores, products))
    }
}

fn poisoned() -> CatalogStoreError {
    CatalogStoreError::Unavailable("lock poisoned".to_string())
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn clear(&self) -> Result<(), CatalogStoreError> {
        self.stores.write().map_err(|_| poisoned())?.clear();
        self.products.write().map_err(|_| poisoned())?.clear();
        Ok(())
    }

    async fn find_store(&self, name: &str) -> Result<Option<Store>, CatalogStoreError> {
        let stores = self.stores.read().map_err(|_| poisoned())?;
        Ok(stores.iter().find(|s| s.name() == name).cloned())
    }

    async fn find_product(&self, name: &str) -> Result<Option<Product>, CatalogStoreError> {
        let products = self.products.read().map_err(|_| poisoned())?;
        Ok(products.iter().find(|p| p.name() == name).cloned())
    }

    async fn insert_store(&self, store: &Store) -> Result<(), CatalogStoreError> {
        let mut stores = self.stores.write().map_err(|_| poisoned())?;
        if stores.iter().any(|s| s.name() == store.name()) {
            return Err(CatalogStoreError::Duplicate {
                collection: "store",
                name: store.name().to_string(),
            });
        }
        stores.push(store.clone());
        Ok(())
    }

    async fn insert_product(&self, product: &Product) -> Result<(), CatalogStoreError> {
        let mut products = self.products.write().map_err(|_| poisoned())?;
        if products.iter().any(|p| p.name() == product.name()) {
            return Err(CatalogStoreError::Duplicate {
                collection: "product",
                name: product.name().to_string(),
            });
        }
        products.push(product.clone());
        Ok(())
    }

    async fn set_store_products(
        &self,
        store_name: &str,
        products: &[String],
    ) -> Result<(), CatalogStoreError> {
        let mut stores = self.stores.write().map_err(|_| poisoned())?;
        let slot = stores
            .iter_mut()
            .find(|s| s.name() == store_name)
            .ok_or_else(|| CatalogStoreError::NotFound {
                collection: "store",
                name: store_name.to_string(),
            })?;

        let updated =
            Store::restore(slot.id_typed(), store_name, products.to_vec()).map_err(|e| {
                CatalogStoreError::Decode {
                    collection: "store",
                    reason: e.to_string(),
                }
            })?;
        *slot = updated;
        Ok(())
    }

    async fn list_stores(&self) -> Result<Vec<Store>, CatalogStoreError> {
        Ok(self.stores.read().map_err(|_| poisoned())?.clone())
    }

    async fn list_products(&self) -> Result<Vec<Product>, CatalogStoreError> {
        Ok(self.products.read().map_err(|_| poisoned())?.clone())
    }

    async fn joined_rows(
        &self,
        pipeline: &JoinPipeline,
    ) -> Result<Vec<JoinedRow>, CatalogStoreError> {
        let (stores, products) = self.snapshot()?;
        Ok(pipeline.evaluate(&stores, &products))
    }

    async fn aggregate(
        &self,
        pipeline: &GroupPipeline,
    ) -> Result<Vec<GroupRow>, CatalogStoreError> {
        let (stores, products) = self.snapshot()?;
        let rows = pipeline.join().evaluate(&stores, &products);
        Ok(pipeline.fold(&rows))
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_products::Price;

    fn product(name: &str, amount: i64) -> Product {
        Product::new(name, Price::new(amount).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_names() {
        let store = InMemoryCatalogStore::new();
        store.insert_product(&product("milk", 80)).await.unwrap();

        let err = store.insert_product(&product("milk", 90)).await.unwrap_err();
        assert!(matches!(err, CatalogStoreError::Duplicate { collection: "product", .. }));
        assert_eq!(store.list_products().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn set_products_on_missing_store_is_not_found() {
        let store = InMemoryCatalogStore::new();
        let err = store
            .set_store_products("nowhere", &["milk".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogStoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn set_products_keeps_store_id() {
        let store = InMemoryCatalogStore::new();
        let central = Store::new("central").unwrap();
        store.insert_store(&central).await.unwrap();

        store
            .set_store_products("central", &["milk".to_string(), "milk".to_string()])
            .await
            .unwrap();

        let found = store.find_store("central").await.unwrap().unwrap();
        assert_eq!(found.id_typed(), central.id_typed());
        assert_eq!(found.products(), ["milk", "milk"]);
    }

    #[tokio::test]
    async fn clear_empties_both_collections() {
        let store = InMemoryCatalogStore::new();
        store.insert_store(&Store::new("central").unwrap()).await.unwrap();
        store.insert_product(&product("milk", 80)).await.unwrap();

        store.clear().await.unwrap();

        assert!(store.list_stores().await.unwrap().is_empty());
        assert!(store.list_products().await.unwrap().is_empty());
    }
}
