//! SQLite-backed catalog store.
//!
//! Each collection is one table. A store's shelf lives in a JSON array column, so
//! the store → product relationship stays denormalized and name-based; the join stage
//! unnests it with `json_each` and matches product names.
//!
//! ## Connections
//!
//! The pool holds exactly one connection that never idles out. `sqlite::memory:`
//! databases live and die with their connection, and the console is sequential anyway.
//!
//! ## Error Mapping
//!
//! | SQLx error | CatalogStoreError |
//! |------------|-------------------|
//! | unique violation on insert | `Duplicate` |
//! | row decode / malformed column | `Decode` |
//! | anything else | `Database` |

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::instrument;

use stockroom_core::{AggregateId, Entity};
use stockroom_products::{Price, Product, ProductId};
use stockroom_stores::{Store, StoreId};

use super::r#trait::{CatalogStore, CatalogStoreError};
use crate::statistics::pipeline::{
    Accumulator, AggregateValue, GroupPipeline, GroupRow, JoinPipeline, JoinedRow, PriceFilter,
};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS stores (
        id       TEXT PRIMARY KEY,
        name     TEXT NOT NULL UNIQUE,
        products TEXT NOT NULL DEFAULT '[]'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id    TEXT PRIMARY KEY,
        name  TEXT NOT NULL UNIQUE,
        price INTEGER NOT NULL CHECK (price >= 0)
    )
    "#,
];

/// Join stage. Match filters are appended as `AND ...` clauses.
const JOIN_STAGE: &str = r#"
    SELECT DISTINCT
        s.name  AS store_name,
        p.name  AS product_name,
        p.price AS price
    FROM stores AS s
    JOIN json_each(s.products) AS shelf
    JOIN products AS p ON p.name = shelf.value
    WHERE 1 = 1"#;

/// SQLite-backed catalog store.
#[derive(Debug, Clone)]
pub struct SqliteCatalogStore {
    pool: SqlitePool,
}

impl SqliteCatalogStore {
    /// Open (or create) the database at `database_url` and ensure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, CatalogStoreError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| map_sqlx_error("connect", e))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        let store = Self::new(pool);
        store.migrate().await?;
        tracing::debug!(database_url, "catalog database ready");
        Ok(store)
    }

    /// Wrap an existing pool. Call [`migrate`](Self::migrate) before use.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the collection tables if they do not exist yet.
    pub async fn migrate(&self) -> Result<(), CatalogStoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        Ok(())
    }
}

fn map_sqlx_error(operation: &'static str, source: sqlx::Error) -> CatalogStoreError {
    CatalogStoreError::Database { operation, source }
}

fn map_insert_error(
    operation: &'static str,
    collection: &'static str,
    name: &str,
    source: sqlx::Error,
) -> CatalogStoreError {
    let unique = source
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());
    if unique {
        CatalogStoreError::Duplicate {
            collection,
            name: name.to_string(),
        }
    } else {
        map_sqlx_error(operation, source)
    }
}

fn decode_error(collection: &'static str, reason: impl ToString) -> CatalogStoreError {
    CatalogStoreError::Decode {
        collection,
        reason: reason.to_string(),
    }
}

fn store_from_row(row: &SqliteRow) -> Result<Store, CatalogStoreError> {
    let id: String = row.try_get("id").map_err(|e| decode_error("store", e))?;
    let name: String = row.try_get("name").map_err(|e| decode_error("store", e))?;
    let products: String = row.try_get("products").map_err(|e| decode_error("store", e))?;

    let id = AggregateId::from_str(&id).map_err(|e| decode_error("store", e))?;
    let products: Vec<String> =
        serde_json::from_str(&products).map_err(|e| decode_error("store", e))?;
    Store::restore(StoreId::new(id), &name, products).map_err(|e| decode_error("store", e))
}

fn product_from_row(row: &SqliteRow) -> Result<Product, CatalogStoreError> {
    let id: String = row.try_get("id").map_err(|e| decode_error("product", e))?;
    let name: String = row.try_get("name").map_err(|e| decode_error("product", e))?;
    let price: i64 = row.try_get("price").map_err(|e| decode_error("product", e))?;

    let id = AggregateId::from_str(&id).map_err(|e| decode_error("product", e))?;
    let price = Price::new(price).map_err(|e| decode_error("product", e))?;
    Product::restore(ProductId::new(id), &name, price).map_err(|e| decode_error("product", e))
}

fn encode_products(products: &[String]) -> Result<String, CatalogStoreError> {
    serde_json::to_string(products).map_err(|e| decode_error("store", e))
}

fn push_join_stage(builder: &mut QueryBuilder<'_, Sqlite>, pipeline: &JoinPipeline) {
    builder.push(JOIN_STAGE);
    if let Some(store_name) = pipeline.store() {
        builder.push(" AND s.name = ");
        builder.push_bind(store_name.to_string());
    }
    match pipeline.price() {
        Some(PriceFilter::AtMost(bound)) => {
            builder.push(" AND p.price <= ");
            builder.push_bind(bound);
        }
        Some(PriceFilter::Exactly(value)) => {
            builder.push(" AND p.price = ");
            builder.push_bind(value);
        }
        None => {}
    }
}

fn accumulator_sql(accumulator: Accumulator) -> &'static str {
    match accumulator {
        Accumulator::Count => "COUNT(*)",
        Accumulator::AvgPrice => "AVG(price)",
        Accumulator::MaxPrice => "MAX(price)",
        Accumulator::MinPrice => "MIN(price)",
    }
}

fn group_value(
    accumulator: Accumulator,
    row: &SqliteRow,
) -> Result<AggregateValue, CatalogStoreError> {
    let value = match accumulator {
        Accumulator::Count => {
            let count: i64 = row.try_get("value").map_err(|e| decode_error("group", e))?;
            AggregateValue::Count(u64::try_from(count).map_err(|e| decode_error("group", e))?)
        }
        Accumulator::AvgPrice => {
            AggregateValue::Average(row.try_get("value").map_err(|e| decode_error("group", e))?)
        }
        Accumulator::MaxPrice | Accumulator::MinPrice => {
            let amount: i64 = row.try_get("value").map_err(|e| decode_error("group", e))?;
            AggregateValue::Price(Price::new(amount).map_err(|e| decode_error("group", e))?)
        }
    };
    Ok(value)
}

#[async_trait]
impl CatalogStore for SqliteCatalogStore {
    #[instrument(skip(self), err)]
    async fn clear(&self) -> Result<(), CatalogStoreError> {
        for table in ["DELETE FROM stores", "DELETE FROM products"] {
            sqlx::query(table)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("clear", e))?;
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn find_store(&self, name: &str) -> Result<Option<Store>, CatalogStoreError> {
        let row = sqlx::query("SELECT id, name, products FROM stores WHERE name = ?1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_store", e))?;

        row.as_ref().map(store_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_product(&self, name: &str) -> Result<Option<Product>, CatalogStoreError> {
        let row = sqlx::query("SELECT id, name, price FROM products WHERE name = ?1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_product", e))?;

        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self, store), fields(store = %store.name()), err)]
    async fn insert_store(&self, store: &Store) -> Result<(), CatalogStoreError> {
        sqlx::query("INSERT INTO stores (id, name, products) VALUES (?1, ?2, ?3)")
            .bind(store.id().to_string())
            .bind(store.name())
            .bind(encode_products(store.products())?)
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error("insert_store", "store", store.name(), e))?;
        Ok(())
    }

    #[instrument(skip(self, product), fields(product = %product.name()), err)]
    async fn insert_product(&self, product: &Product) -> Result<(), CatalogStoreError> {
        sqlx::query("INSERT INTO products (id, name, price) VALUES (?1, ?2, ?3)")
            .bind(product.id().to_string())
            .bind(product.name())
            .bind(product.price().amount())
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error("insert_product", "product", product.name(), e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn set_store_products(
        &self,
        store_name: &str,
        products: &[String],
    ) -> Result<(), CatalogStoreError> {
        let result = sqlx::query("UPDATE stores SET products = ?1 WHERE name = ?2")
            .bind(encode_products(products)?)
            .bind(store_name)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_store_products", e))?;

        if result.rows_affected() == 0 {
            return Err(CatalogStoreError::NotFound {
                collection: "store",
                name: store_name.to_string(),
            });
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_stores(&self) -> Result<Vec<Store>, CatalogStoreError> {
        let rows = sqlx::query("SELECT id, name, products FROM stores ORDER BY rowid")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_stores", e))?;

        rows.iter().map(store_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn list_products(&self) -> Result<Vec<Product>, CatalogStoreError> {
        let rows = sqlx::query("SELECT id, name, price FROM products ORDER BY rowid")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;

        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn joined_rows(
        &self,
        pipeline: &JoinPipeline,
    ) -> Result<Vec<JoinedRow>, CatalogStoreError> {
        let mut builder =
            QueryBuilder::<Sqlite>::new("SELECT store_name, product_name, price FROM (");
        push_join_stage(&mut builder, pipeline);
        builder.push(") AS joined ORDER BY store_name, product_name");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("joined_rows", e))?;

        rows.iter()
            .map(|row| {
                let price: i64 = row.try_get("price").map_err(|e| decode_error("join", e))?;
                Ok(JoinedRow {
                    store_name: row.try_get("store_name").map_err(|e| decode_error("join", e))?,
                    product_name: row
                        .try_get("product_name")
                        .map_err(|e| decode_error("join", e))?,
                    price: Price::new(price).map_err(|e| decode_error("join", e))?,
                })
            })
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn aggregate(
        &self,
        pipeline: &GroupPipeline,
    ) -> Result<Vec<GroupRow>, CatalogStoreError> {
        let accumulator = pipeline.accumulator();

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT store_name, ");
        builder.push(accumulator_sql(accumulator));
        builder.push(" AS value FROM (");
        push_join_stage(&mut builder, pipeline.join());
        builder.push(") AS joined GROUP BY store_name ORDER BY store_name");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("aggregate", e))?;

        rows.iter()
            .map(|row| {
                Ok(GroupRow {
                    store_name: row.try_get("store_name").map_err(|e| decode_error("group", e))?,
                    value: group_value(accumulator, row)?,
                })
            })
            .collect()
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("catalog database closed");
    }
}
