//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. `Money` and its
/// price components are value objects: scaling a price produces a new price,
/// the original unit price is never touched.
///
/// ```ignore
/// let a = Money::new(1000, "USD");
/// let b = Money::new(1000, "USD");
/// assert_eq!(a, b);
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
