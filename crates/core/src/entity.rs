//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Line items are entities: recomputing a total yields a new value of the same
/// line item, identified by the same id.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
