use serde::{Deserialize, Serialize};

use stockroom_core::{AggregateId, DomainResult, Entity, validate_name};
use stockroom_products::Product;

/// Store identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(pub AggregateId);

impl StoreId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for StoreId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A store and the names of the products shelved in it.
///
/// `products` references products by name, not by id. Names may repeat (shelving the
/// same product twice appends it twice) and may dangle if no such product exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    id: StoreId,
    name: String,
    products: Vec<String>,
}

impl Store {
    /// Create a new, empty store with a freshly generated id.
    pub fn new(name: &str) -> DomainResult<Self> {
        Self::restore(StoreId::new(AggregateId::new()), name, Vec::new())
    }

    /// Rebuild a store from persisted fields.
    pub fn restore(id: StoreId, name: &str, products: Vec<String>) -> DomainResult<Self> {
        let name = validate_name("store", name)?;
        Ok(Self { id, name, products })
    }

    pub fn id_typed(&self) -> StoreId {
        self.id
    }

    /// Shelved product names, in shelving order.
    pub fn products(&self) -> &[String] {
        &self.products
    }

    /// Append `product` to this store's shelf.
    ///
    /// No dedup: shelving twice records the name twice.
    pub fn shelve(&mut self, product: &Product) {
        self.products.push(product.name().to_string());
    }

    /// Number of times `product_name` has been shelved here.
    pub fn shelved_count(&self, product_name: &str) -> usize {
        self.products.iter().filter(|p| *p == product_name).count()
    }
}

impl Entity for Store {
    type Id = StoreId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl core::fmt::Display for Store {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.products.is_empty() {
            write!(f, "{} (no products)", self.name)
        } else {
            write!(f, "{}: {}", self.name, self.products.join(", "))
        }
    }
}
