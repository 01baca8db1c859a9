//! Statistics engine: the five per-store reports.
//!
//! Counts and averages are a single group pipeline each. The two extreme reports take
//! two passes: group to the extreme price per store, then re-run the join filtered to
//! that store and that exact price to collect every product sold at it. A group stage
//! collapses rows, so the names cannot come out of the first pass.

use tracing::instrument;

use stockroom_products::Price;

use crate::catalog_store::{CatalogStore, CatalogStoreError};

use super::pipeline::{Accumulator, GroupRow, JoinPipeline, PriceFilter};
use super::report::{Extreme, PriceExtreme, StatisticsReport, StoreAverage, StoreCount};

/// Inclusive upper bound of the "cheap products" report.
pub const UNDER_PRICE_THRESHOLD: i64 = 100;

/// Runs statistics pipelines against a borrowed [`CatalogStore`].
#[derive(Debug)]
pub struct StatisticsEngine<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> StatisticsEngine<'a, S>
where
    S: CatalogStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Run all five reports in print order.
    #[instrument(skip(self), err)]
    pub async fn run_all(&self) -> Result<StatisticsReport, CatalogStoreError> {
        Ok(StatisticsReport {
            product_counts: self.product_counts().await?,
            average_prices: self.average_prices().await?,
            most_expensive: self.most_expensive().await?,
            cheapest: self.cheapest().await?,
            under_threshold: self.counts_at_most(UNDER_PRICE_THRESHOLD).await?,
            threshold: UNDER_PRICE_THRESHOLD,
        })
    }

    pub async fn product_counts(&self) -> Result<Vec<StoreCount>, CatalogStoreError> {
        self.counts(JoinPipeline::new()).await
    }

    /// Count of products priced at or below `threshold`, per store.
    pub async fn counts_at_most(
        &self,
        threshold: i64,
    ) -> Result<Vec<StoreCount>, CatalogStoreError> {
        self.counts(JoinPipeline::new().with_price(PriceFilter::AtMost(threshold)))
            .await
    }

    pub async fn average_prices(&self) -> Result<Vec<StoreAverage>, CatalogStoreError> {
        let groups = self
            .store
            .aggregate(&JoinPipeline::new().group(Accumulator::AvgPrice))
            .await?;

        groups
            .into_iter()
            .map(|group| {
                let average = group
                    .value
                    .as_average()
                    .ok_or_else(|| unexpected_value("average", &group))?;
                Ok(StoreAverage {
                    store_name: group.store_name,
                    average,
                })
            })
            .collect()
    }

    pub async fn most_expensive(&self) -> Result<Vec<PriceExtreme>, CatalogStoreError> {
        self.extremes(Extreme::MostExpensive).await
    }

    pub async fn cheapest(&self) -> Result<Vec<PriceExtreme>, CatalogStoreError> {
        self.extremes(Extreme::Cheapest).await
    }

    /// Names of the products in `store_name` priced exactly `price`.
    pub async fn products_at(
        &self,
        store_name: &str,
        price: Price,
    ) -> Result<Vec<String>, CatalogStoreError> {
        let pipeline = JoinPipeline::new()
            .for_store(store_name)
            .with_price(PriceFilter::Exactly(price.amount()));
        let rows = self.store.joined_rows(&pipeline).await?;
        Ok(rows.into_iter().map(|row| row.product_name).collect())
    }

    async fn counts(&self, join: JoinPipeline) -> Result<Vec<StoreCount>, CatalogStoreError> {
        let groups = self.store.aggregate(&join.group(Accumulator::Count)).await?;

        groups
            .into_iter()
            .map(|group| {
                let count = group
                    .value
                    .as_count()
                    .ok_or_else(|| unexpected_value("count", &group))?;
                Ok(StoreCount {
                    store_name: group.store_name,
                    count,
                })
            })
            .collect()
    }

    async fn extremes(&self, extreme: Extreme) -> Result<Vec<PriceExtreme>, CatalogStoreError> {
        let accumulator = match extreme {
            Extreme::MostExpensive => Accumulator::MaxPrice,
            Extreme::Cheapest => Accumulator::MinPrice,
        };

        // Pass one: the extreme price per store.
        let groups = self
            .store
            .aggregate(&JoinPipeline::new().group(accumulator))
            .await?;

        // Pass two: everything in that store at that price.
        let mut extremes = Vec::with_capacity(groups.len());
        for group in groups {
            let price = group
                .value
                .as_price()
                .ok_or_else(|| unexpected_value("price", &group))?;
            let products = self.products_at(&group.store_name, price).await?;
            extremes.push(PriceExtreme {
                extreme,
                store_name: group.store_name,
                price,
                products,
            });
        }
        Ok(extremes)
    }
}

fn unexpected_value(expected: &str, group: &GroupRow) -> CatalogStoreError {
    CatalogStoreError::Decode {
        collection: "group",
        reason: format!(
            "expected a {expected} for store {}, got {:?}",
            group.store_name, group.value
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::{InMemoryCatalogStore, SqliteCatalogStore};
    use stockroom_core::Entity;
    use stockroom_products::Product;
    use stockroom_stores::Store;

    async fn add_product<S: CatalogStore>(store: &S, name: &str, amount: i64) {
        let product = Product::new(name, Price::new(amount).unwrap()).unwrap();
        store.insert_product(&product).await.unwrap();
    }

    async fn add_store<S: CatalogStore>(store: &S, name: &str, shelf: &[&str]) {
        let new_store = Store::new(name).unwrap();
        store.insert_store(&new_store).await.unwrap();
        let shelf: Vec<String> = shelf.iter().map(|n| n.to_string()).collect();
        store.set_store_products(new_store.name(), &shelf).await.unwrap();
    }

    /// north: 50 / 100 / 150, south: two products tied at 300 plus one at 101,
    /// idle: nothing shelved, ghost: only a dangling name.
    async fn seed<S: CatalogStore>(store: &S) {
        add_product(store, "bread", 50).await;
        add_product(store, "milk", 100).await;
        add_product(store, "cheese", 150).await;
        add_product(store, "caviar", 300).await;
        add_product(store, "truffle", 300).await;
        add_product(store, "wine", 101).await;
        add_product(store, "unshelved", 10).await;

        add_store(store, "north", &["cheese", "bread", "milk"]).await;
        add_store(store, "south", &["truffle", "wine", "caviar"]).await;
        add_store(store, "idle", &[]).await;
        add_store(store, "ghost", &["nothing-here"]).await;
    }

    async fn check_reports<S: CatalogStore>(store: S) {
        seed(&store).await;
        let engine = StatisticsEngine::new(&store);

        let counts = engine.product_counts().await.unwrap();
        assert_eq!(
            counts,
            [
                StoreCount {
                    store_name: "north".into(),
                    count: 3,
                },
                StoreCount {
                    store_name: "south".into(),
                    count: 3,
                },
            ]
        );

        let averages = engine.average_prices().await.unwrap();
        assert_eq!(averages.len(), 2);
        assert_eq!(averages[0].store_name, "north");
        assert!((averages[0].average - 100.0).abs() < f64::EPSILON);

        let most = engine.most_expensive().await.unwrap();
        assert_eq!(most[0].price.amount(), 150);
        assert_eq!(most[0].products, ["cheese"]);
        assert_eq!(most[1].price.amount(), 300);
        assert_eq!(most[1].products, ["caviar", "truffle"]);

        let cheapest = engine.cheapest().await.unwrap();
        assert_eq!(cheapest[0].price.amount(), 50);
        assert_eq!(cheapest[0].products, ["bread"]);
        assert_eq!(cheapest[1].price.amount(), 101);
        assert_eq!(cheapest[1].products, ["wine"]);

        // 100 is inside the bound, 101 is not; south has nothing under it.
        let cheap = engine.counts_at_most(UNDER_PRICE_THRESHOLD).await.unwrap();
        assert_eq!(
            cheap,
            [StoreCount {
                store_name: "north".into(),
                count: 2,
            }]
        );

        let report = engine.run_all().await.unwrap();
        let text = report.to_string();
        assert!(!text.contains("idle"));
        assert!(!text.contains("ghost"));
        assert!(!text.contains("unshelved"));
        assert!(
            text.contains("Most expensive products in store south: caviar, truffle (price 300)")
        );
    }

    #[tokio::test]
    async fn reports_over_in_memory_store() {
        check_reports(InMemoryCatalogStore::new()).await;
    }

    #[tokio::test]
    async fn reports_over_sqlite_store() {
        check_reports(SqliteCatalogStore::connect("sqlite::memory:").await.unwrap()).await;
    }

    #[tokio::test]
    async fn empty_catalog_yields_empty_report() {
        let store = InMemoryCatalogStore::new();
        let report = StatisticsEngine::new(&store).run_all().await.unwrap();
        assert!(report.is_empty());
        assert_eq!(report.threshold, UNDER_PRICE_THRESHOLD);
    }

    #[tokio::test]
    async fn extreme_lists_only_products_of_that_store() {
        let store = InMemoryCatalogStore::new();
        add_product(&store, "tea", 70).await;
        add_product(&store, "coffee", 70).await;
        add_store(&store, "left", &["tea"]).await;
        add_store(&store, "right", &["coffee"]).await;

        let most = StatisticsEngine::new(&store).most_expensive().await.unwrap();
        assert_eq!(most[0].products, ["tea"]);
        assert_eq!(most[1].products, ["coffee"]);
    }

    #[tokio::test]
    async fn shelving_twice_does_not_double_count() {
        let store = InMemoryCatalogStore::new();
        add_product(&store, "tea", 70).await;
        add_store(&store, "left", &["tea", "tea"]).await;

        let counts = StatisticsEngine::new(&store).product_counts().await.unwrap();
        assert_eq!(counts[0].count, 1);
    }
}
