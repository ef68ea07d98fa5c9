//! Proximity connections between items.

use crate::item::{Item, ItemId, ItemStore};
use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// Items whose rotated bounds are at most this far apart are connected (world units).
pub const CONNECTION_TOLERANCE: f64 = 2.0;

/// An unordered pair of touching items, stored with `a < b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub a: ItemId,
    pub b: ItemId,
}

impl Connection {
    pub fn new(first: ItemId, second: ItemId) -> Self {
        if first <= second {
            Self { a: first, b: second }
        } else {
            Self { a: second, b: first }
        }
    }

    pub fn involves(&self, id: ItemId) -> bool {
        self.a == id || self.b == id
    }
}

/// Gap between two intervals; negative when they overlap.
fn gap(a0: f64, a1: f64, b0: f64, b1: f64) -> f64 {
    (b0 - a1).max(a0 - b1)
}

fn near(a: &Rect, b: &Rect, tolerance: f64) -> bool {
    gap(a.x0, a.x1, b.x0, b.x1) <= tolerance && gap(a.y0, a.y1, b.y0, b.y1) <= tolerance
}

/// Every connected pair not involving an excluded id, ordered by `(a, b)`.
pub fn compute(store: &ItemStore, exclude: &[ItemId]) -> Vec<Connection> {
    let boxes: Vec<(ItemId, Rect)> = store
        .items()
        .filter(|item| !exclude.contains(&item.id) && !item.geometry().is_degenerate())
        .map(|item: &Item| (item.id, item.rotated_bounds()))
        .collect();

    let mut connections = Vec::new();
    for (i, (id_a, box_a)) in boxes.iter().enumerate() {
        for (id_b, box_b) in &boxes[i + 1..] {
            if near(box_a, box_b, CONNECTION_TOLERANCE) {
                connections.push(Connection::new(*id_a, *id_b));
            }
        }
    }
    connections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ContentRef, Geometry};
    use uuid::Uuid;

    fn id(n: u128) -> ItemId {
        Uuid::from_u128(n)
    }

    fn store_with(items: &[(u128, f64, f64, f64, f64)]) -> ItemStore {
        let mut store = ItemStore::new();
        for &(n, x, y, w, h) in items {
            store.insert(Item::with_id(id(n), ContentRef::new("media"), x, y, w, h)).unwrap();
        }
        store
    }

    #[test]
    fn test_connection_normalized() {
        let c = Connection::new(id(5), id(2));
        assert_eq!(c.a, id(2));
        assert_eq!(c.b, id(5));
        assert_eq!(c, Connection::new(id(2), id(5)));
        assert!(c.involves(id(5)));
    }

    #[test]
    fn test_touching_within_tolerance() {
        let store = store_with(&[
            (3, 0.0, 0.0, 100.0, 100.0),
            // 2 units to the right: connected
            (1, 102.0, 0.0, 100.0, 100.0),
            // 3 units below item 3: not connected
            (2, 0.0, 103.0, 100.0, 100.0),
        ]);
        let connections = compute(&store, &[]);
        assert_eq!(connections, vec![Connection::new(id(1), id(3))]);
    }

    #[test]
    fn test_sorted_and_deduplicated() {
        let store = store_with(&[
            (1, 0.0, 0.0, 100.0, 100.0),
            (2, 50.0, 50.0, 100.0, 100.0),
            (3, 100.0, 0.0, 100.0, 100.0),
        ]);
        let connections = compute(&store, &[]);
        assert_eq!(
            connections,
            vec![
                Connection::new(id(1), id(2)),
                Connection::new(id(1), id(3)),
                Connection::new(id(2), id(3)),
            ]
        );
        let mut sorted = connections.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted, connections);
    }

    #[test]
    fn test_excluded_ids_skipped() {
        let store = store_with(&[(1, 0.0, 0.0, 100.0, 100.0), (2, 100.0, 0.0, 100.0, 100.0)]);
        assert_eq!(compute(&store, &[]).len(), 1);
        assert!(compute(&store, &[id(2)]).is_empty());
    }

    #[test]
    fn test_rotation_extends_bounds() {
        let mut store = store_with(&[(1, 0.0, 0.0, 100.0, 100.0), (2, 115.0, 0.0, 100.0, 100.0)]);
        assert!(compute(&store, &[]).is_empty());
        // A 45 degree square reaches ~20.7 units past its unrotated edge
        store.set_geometry(id(1), Geometry { rotation: 45.0, ..Geometry::new(0.0, 0.0, 100.0, 100.0) });
        assert_eq!(compute(&store, &[]), vec![Connection::new(id(1), id(2))]);
    }
}
