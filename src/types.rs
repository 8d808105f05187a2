//! Common types and aliases used throughout storefront-recommendations

/// Common trait bounds for recommended items
///
/// Items are opaque to this crate. They are cloned out of the shared cache and
/// into per-instance state, so they must be cheap enough to clone and safe to
/// share between tasks.
pub trait ItemBounds: Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static {}
impl<T> ItemBounds for T where T: Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static {}

/// Common trait bounds for values held in an observable [`Store`](crate::store::Store)
pub trait StoreValueBounds: Clone + Send + Sync + 'static {}
impl<T> StoreValueBounds for T where T: Clone + Send + Sync + 'static {}
