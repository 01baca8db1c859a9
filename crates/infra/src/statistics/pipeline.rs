//! Aggregation pipelines over the store/product join.
//!
//! Every statistics query starts from the same join stage: each store's shelf is
//! expanded into `(store, product)` rows by matching shelved names against the product
//! collection. A name with no live product yields no row. A product shelved several
//! times in one store joins once, the way a document `$lookup` on an array field
//! matches each foreign document once.
//!
//! ```text
//! stores ──join(products by name)──▶ rows ──match(store?, price?)──▶ group(store, accumulator)
//! ```
//!
//! Backends either translate a pipeline into their own query language
//! ([`SqliteCatalogStore`](crate::catalog_store::SqliteCatalogStore)) or evaluate it in
//! process with [`JoinPipeline::evaluate`] and [`GroupPipeline::fold`].

use std::collections::{BTreeMap, HashMap, HashSet};

use stockroom_core::Entity;
use stockroom_products::{Price, Product};
use stockroom_stores::Store;

/// Price predicate applied after the join stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceFilter {
    /// `price <= bound` (inclusive).
    AtMost(i64),
    /// `price == value`.
    Exactly(i64),
}

impl PriceFilter {
    pub fn matches(&self, price: Price) -> bool {
        match *self {
            PriceFilter::AtMost(bound) => price.amount() <= bound,
            PriceFilter::Exactly(value) => price.amount() == value,
        }
    }
}

/// Join stage plus optional match filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinPipeline {
    store: Option<String>,
    price: Option<PriceFilter>,
}

impl JoinPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only rows of the named store.
    pub fn for_store(mut self, store_name: impl Into<String>) -> Self {
        self.store = Some(store_name.into());
        self
    }

    /// Keep only rows whose product price passes `filter`.
    pub fn with_price(mut self, filter: PriceFilter) -> Self {
        self.price = Some(filter);
        self
    }

    pub fn store(&self) -> Option<&str> {
        self.store.as_deref()
    }

    pub fn price(&self) -> Option<PriceFilter> {
        self.price
    }

    /// Finish the pipeline with a group-by-store stage.
    pub fn group(self, accumulator: Accumulator) -> GroupPipeline {
        GroupPipeline {
            join: self,
            accumulator,
        }
    }

    /// Evaluate the join and match stages in process.
    ///
    /// Rows come back ordered by store name, then product name.
    pub fn evaluate(&self, stores: &[Store], products: &[Product]) -> Vec<JoinedRow> {
        let by_name: HashMap<&str, &Product> = products.iter().map(|p| (p.name(), p)).collect();

        let mut rows = Vec::new();
        for store in stores {
            if self.store.as_deref().is_some_and(|wanted| wanted != store.name()) {
                continue;
            }

            let mut joined = HashSet::new();
            for shelved in store.products() {
                let Some(product) = by_name.get(shelved.as_str()) else {
                    continue;
                };
                if !joined.insert(shelved.as_str()) {
                    continue;
                }
                if self.price.is_some_and(|f| !f.matches(product.price())) {
                    continue;
                }
                rows.push(JoinedRow {
                    store_name: store.name().to_string(),
                    product_name: product.name().to_string(),
                    price: product.price(),
                });
            }
        }

        rows.sort_by(|a, b| {
            a.store_name
                .cmp(&b.store_name)
                .then_with(|| a.product_name.cmp(&b.product_name))
        });
        rows
    }
}

/// Per-store accumulator of a group stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulator {
    Count,
    AvgPrice,
    MaxPrice,
    MinPrice,
}

/// Join stage, match filters, then group by store name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPipeline {
    join: JoinPipeline,
    accumulator: Accumulator,
}

impl GroupPipeline {
    pub fn join(&self) -> &JoinPipeline {
        &self.join
    }

    pub fn accumulator(&self) -> Accumulator {
        self.accumulator
    }

    /// Group already-joined rows by store name.
    ///
    /// Stores without rows produce no group. Groups are ordered by store name.
    pub fn fold(&self, rows: &[JoinedRow]) -> Vec<GroupRow> {
        let mut groups: BTreeMap<&str, Vec<Price>> = BTreeMap::new();
        for row in rows {
            groups.entry(row.store_name.as_str()).or_default().push(row.price);
        }

        groups
            .into_iter()
            .filter_map(|(store_name, prices)| {
                let value = match self.accumulator {
                    Accumulator::Count => AggregateValue::Count(prices.len() as u64),
                    Accumulator::AvgPrice => {
                        // Widened: a handful of prices near i64::MAX already overflow i64.
                        let sum: i128 = prices.iter().map(|p| i128::from(p.amount())).sum();
                        AggregateValue::Average(sum as f64 / prices.len() as f64)
                    }
                    Accumulator::MaxPrice => AggregateValue::Price(*prices.iter().max()?),
                    Accumulator::MinPrice => AggregateValue::Price(*prices.iter().min()?),
                };
                Some(GroupRow {
                    store_name: store_name.to_string(),
                    value,
                })
            })
            .collect()
    }
}

/// One `(store, product)` row produced by the join stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRow {
    pub store_name: String,
    pub product_name: String,
    pub price: Price,
}

/// Result of a group stage accumulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggregateValue {
    Count(u64),
    Average(f64),
    Price(Price),
}

impl AggregateValue {
    pub fn as_count(&self) -> Option<u64> {
        match self {
            AggregateValue::Count(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_average(&self) -> Option<f64> {
        match self {
            AggregateValue::Average(avg) => Some(*avg),
            _ => None,
        }
    }

    pub fn as_price(&self) -> Option<Price> {
        match self {
            AggregateValue::Price(price) => Some(*price),
            _ => None,
        }
    }
}

/// One group emitted by a group stage.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    pub store_name: String,
    pub value: AggregateValue,
}
