//! Storage for the two catalog collections (`stores`, `products`).

pub mod in_memory;
pub mod sqlite;
pub mod r#trait;

pub use in_memory::InMemoryCatalogStore;
pub use r#trait::{CatalogStore, CatalogStoreError};
pub use sqlite::SqliteCatalogStore;
