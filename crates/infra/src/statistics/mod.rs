//! Read-only statistics over the store/product join.

pub mod engine;
pub mod pipeline;
pub mod report;

pub use engine::{StatisticsEngine, UNDER_PRICE_THRESHOLD};
pub use pipeline::{Accumulator, GroupPipeline, JoinPipeline, PriceFilter};
pub use report::{Extreme, PriceExtreme, StatisticsReport, StoreAverage, StoreCount};
