//! Products domain module.
//!
//! This crate contains the rules for catalog products, implemented purely as
//! deterministic domain logic (no IO, no storage).

pub mod product;

pub use product::{Price, Product, ProductId};
