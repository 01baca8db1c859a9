//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Catalog entities carry two identities: the system-generated id and a unique,
/// human-facing name. Lookups from the console go through the name.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Returns the unique name of the entity within its collection.
    fn name(&self) -> &str;
}
