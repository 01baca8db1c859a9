//! `stockroom-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the catalog crates
//! (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod name;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::AggregateId;
pub use name::validate_name;
pub use value_object::ValueObject;
