//! Geometry commit interface.
//!
//! Gesture controllers never write to the store directly; they hand a batch of
//! new geometries to a [`GeometryCommit`]. Hosts that want to batch or throttle
//! writes substitute their own implementation.

use crate::item::{Geometry, ItemId, ItemStore};

/// Sink for geometry produced by gestures.
pub trait GeometryCommit {
    /// Apply a batch of geometry updates. Returns the ids that actually changed.
    fn commit(&mut self, store: &mut ItemStore, batch: &[(ItemId, Geometry)]) -> Vec<ItemId>;
}

/// Writes every update to the store synchronously.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateCommit;

impl GeometryCommit for ImmediateCommit {
    fn commit(&mut self, store: &mut ItemStore, batch: &[(ItemId, Geometry)]) -> Vec<ItemId> {
        batch
            .iter()
            .filter(|(id, geometry)| {
                let unchanged = store.get(*id).is_some_and(|item| item.geometry() == *geometry);
                !unchanged && store.set_geometry(*id, *geometry)
            })
            .map(|(id, _)| *id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ContentRef, Item};
    use uuid::Uuid;

    #[test]
    fn test_immediate_commit_applies_and_reports() {
        let mut store = ItemStore::new();
        let (a, b) = (Uuid::from_u128(1), Uuid::from_u128(2));
        store.insert(Item::with_id(a, ContentRef::new("a"), 0.0, 0.0, 10.0, 10.0)).unwrap();
        store.insert(Item::with_id(b, ContentRef::new("b"), 0.0, 0.0, 10.0, 10.0)).unwrap();

        let batch = [
            (a, Geometry::new(5.0, 5.0, 10.0, 10.0)),
            // Unchanged
            (b, Geometry::new(0.0, 0.0, 10.0, 10.0)),
            // Removed item
            (Uuid::from_u128(3), Geometry::new(1.0, 1.0, 1.0, 1.0)),
        ];
        let changed = ImmediateCommit.commit(&mut store, &batch);
        assert_eq!(changed, vec![a]);
        assert!((store.get(a).unwrap().x - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejected_geometry_not_reported() {
        let mut store = ItemStore::new();
        let a = Uuid::from_u128(1);
        store.insert(Item::with_id(a, ContentRef::new("a"), 0.0, 0.0, 10.0, 10.0)).unwrap();
        let changed = ImmediateCommit.commit(&mut store, &[(a, Geometry::new(f64::NAN, 0.0, 10.0, 10.0))]);
        assert!(changed.is_empty());
        assert!((store.get(a).unwrap().x).abs() < f64::EPSILON);
    }
}
