//! Infrastructure layer: configuration, catalog storage, aggregation pipelines,
//! statistics, and the persistence gateway the console talks to.

pub mod catalog_store;
pub mod config;
pub mod gateway;
pub mod statistics;


pub use catalog_store::{CatalogStore, CatalogStoreError, InMemoryCatalogStore, SqliteCatalogStore};
pub use config::{CatalogConfig, ConfigError};
pub use gateway::{CatalogGateway, CatalogListing, GatewayError};
pub use statistics::{StatisticsEngine, StatisticsReport};
