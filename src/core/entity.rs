//! Entity trait for records listed in newest-first order

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A persisted record with a stable identity and creation time.
///
/// Listings page over entities in newest-first order, so these two fields are
/// all a store needs to order them.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Get the unique identifier for this entity instance
    fn id(&self) -> Uuid;

    /// Get the creation timestamp
    fn created_at(&self) -> DateTime<Utc>;
}

/// Sort newest first, ties broken by id so paging is stable
pub fn sort_newest_first<T: Entity>(items: &mut [T]) {
    items.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| a.id().cmp(&b.id()))
    });
}
