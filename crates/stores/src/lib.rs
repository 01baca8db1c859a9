//! Stores domain module.
//!
//! A store holds a denormalized, ordered list of product *names*. The list is the
//! only thing that changes after a store is created.

pub mod store;

pub use store::{Store, StoreId};
