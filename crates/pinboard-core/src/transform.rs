//! Resize and rotate sessions.
//!
//! Both sessions capture the start geometry of every target item plus the
//! pointer origin, and derive each frame from those snapshots rather than from
//! the previous frame, so rounding never accumulates.

use crate::item::{Geometry, ItemId, ItemStore, normalize_degrees};
use crate::selection::Corner;
use crate::snap::snap_angle_delta;
use kurbo::{Point, Vec2};
use std::collections::BTreeMap;

/// Minimum item width and height produced by a resize or by natural sizing (world units).
pub const MIN_ITEM_SIZE: f64 = 50.0;

fn capture(store: &ItemStore, targets: &[ItemId]) -> BTreeMap<ItemId, Geometry> {
    targets
        .iter()
        .filter_map(|id| store.get(*id).map(|item| (*id, item.geometry())))
        .collect()
}

/// Resize `start` by dragging `corner` by `delta` while the opposite corner stays put.
///
/// With `lock_aspect` the axis with the larger delta drives a uniform scale,
/// floored so neither side drops below [`MIN_ITEM_SIZE`].
pub fn resize_geometry(start: &Geometry, corner: Corner, delta: Vec2, lock_aspect: bool) -> Geometry {
    let (sx, sy) = corner.signs();
    let grown_w = start.width + sx * delta.x;
    let grown_h = start.height + sy * delta.y;

    let (width, height) = if lock_aspect {
        let scale = if delta.x.abs() >= delta.y.abs() {
            grown_w / start.width
        } else {
            grown_h / start.height
        };
        let scale = scale.max(MIN_ITEM_SIZE / start.width).max(MIN_ITEM_SIZE / start.height);
        (start.width * scale, start.height * scale)
    } else {
        (grown_w.max(MIN_ITEM_SIZE), grown_h.max(MIN_ITEM_SIZE))
    };

    // Left/top corners move the origin; right/bottom keep it.
    let x = if sx < 0.0 { start.x + start.width - width } else { start.x };
    let y = if sy < 0.0 { start.y + start.height - height } else { start.y };

    Geometry {
        x,
        y,
        width,
        height,
        rotation: start.rotation,
    }
}

/// An in-flight corner resize.
#[derive(Debug, Clone)]
pub struct ResizeSession {
    pub corner: Corner,
    /// Pointer position at session start (world coordinates).
    pub origin: Point,
    /// Aspect lock from config; Shift can also enable it per frame.
    pub lock_aspect: bool,
    start: BTreeMap<ItemId, Geometry>,
}

impl ResizeSession {
    /// Start resizing `targets`. Returns `None` if none of them exist.
    pub fn begin(store: &ItemStore, targets: &[ItemId], corner: Corner, origin: Point, lock_aspect: bool) -> Option<Self> {
        let start = capture(store, targets);
        if start.is_empty() {
            return None;
        }
        log::debug!("Resize started from {:?} for {} items", corner, start.len());
        Some(Self {
            corner,
            origin,
            lock_aspect,
            start,
        })
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.start.keys().copied().collect()
    }

    /// Geometry for the current pointer. Removed items are skipped.
    pub fn update(&self, store: &ItemStore, pointer: Point, shift: bool) -> Vec<(ItemId, Geometry)> {
        let delta = pointer - self.origin;
        let lock = self.lock_aspect || shift;
        self.start
            .iter()
            .filter(|(id, _)| store.contains(**id))
            .map(|(id, start)| (*id, resize_geometry(start, self.corner, delta, lock)))
            .collect()
    }

    /// Mark every surviving target as user-sized.
    pub fn finish(&self, store: &mut ItemStore) {
        for id in self.start.keys() {
            store.mark_custom_dimensions(*id);
        }
        log::debug!("Resize finished");
    }

    pub fn cancel(&self, store: &ItemStore) -> Vec<(ItemId, Geometry)> {
        log::debug!("Resize cancelled");
        restore(&self.start, store)
    }
}

/// An in-flight rotation around the grabbed item's center.
#[derive(Debug, Clone)]
pub struct RotateSession {
    /// Rotation origin (world coordinates).
    pub center: Point,
    /// Pointer angle at session start, degrees.
    pub start_angle: f64,
    /// Increment used while snapping.
    pub increment: f64,
    start: BTreeMap<ItemId, Geometry>,
}

fn pointer_angle(center: Point, pointer: Point) -> f64 {
    let d = pointer - center;
    d.y.atan2(d.x).to_degrees()
}

impl RotateSession {
    /// Start rotating `targets` around the center of `grabbed`.
    pub fn begin(store: &ItemStore, grabbed: ItemId, targets: &[ItemId], pointer: Point, increment: f64) -> Option<Self> {
        let center = store.get(grabbed)?.center();
        let start = capture(store, targets);
        if start.is_empty() {
            return None;
        }
        log::debug!("Rotate started for {} items", start.len());
        Some(Self {
            center,
            start_angle: pointer_angle(center, pointer),
            increment,
            start,
        })
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.start.keys().copied().collect()
    }

    /// Signed rotation since the session started, snapped when requested.
    pub fn angle_delta(&self, pointer: Point, snap: bool) -> f64 {
        let delta = pointer_angle(self.center, pointer) - self.start_angle;
        if snap && self.increment > 0.0 {
            snap_angle_delta(delta, self.increment)
        } else {
            delta
        }
    }

    /// Geometry for the current pointer. Each item turns around its own center.
    pub fn update(&self, store: &ItemStore, pointer: Point, snap: bool) -> Vec<(ItemId, Geometry)> {
        let delta = self.angle_delta(pointer, snap);
        self.start
            .iter()
            .filter(|(id, _)| store.contains(**id))
            .map(|(id, start)| {
                let geometry = Geometry {
                    rotation: normalize_degrees(start.rotation + delta),
                    ..*start
                };
                (*id, geometry)
            })
            .collect()
    }

    pub fn cancel(&self, store: &ItemStore) -> Vec<(ItemId, Geometry)> {
        log::debug!("Rotate cancelled");
        restore(&self.start, store)
    }
}

fn restore(start: &BTreeMap<ItemId, Geometry>, store: &ItemStore) -> Vec<(ItemId, Geometry)> {
    start
        .iter()
        .filter(|(id, _)| store.contains(**id))
        .map(|(id, geometry)| (*id, *geometry))
        .collect()
}

/// Quarter-turn every target clockwise around its own center.
pub fn rotate_90(store: &ItemStore, targets: &[ItemId]) -> Vec<(ItemId, Geometry)> {
    targets
        .iter()
        .filter_map(|id| {
            let item = store.get(*id)?;
            let mut geometry = item.geometry();
            geometry.rotation = normalize_degrees(geometry.rotation + 90.0);
            Some((*id, geometry))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::{GeometryCommit, ImmediateCommit};
    use crate::item::{ContentRef, Item};
    use uuid::Uuid;

    const EPS: f64 = 1e-6;

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
    fn test_bottom_right_resize_keeps_position() {
        let start = Geometry::new(0.0, 0.0, 100.0, 100.0);
        let resized = resize_geometry(&start, Corner::BottomRight, Vec2::new(200.0, 10.0), false);
        assert!((resized.x).abs() < EPS && (resized.y).abs() < EPS);
        assert!((resized.width - 300.0).abs() < EPS);
        assert!((resized.height - 110.0).abs() < EPS);
    }

    #[test]
    fn test_top_left_resize_keeps_bottom_right() {
        let start = Geometry::new(100.0, 100.0, 200.0, 100.0);
        let resized = resize_geometry(&start, Corner::TopLeft, Vec2::new(-20.0, 30.0), false);
        assert!((resized.width - 220.0).abs() < EPS);
        assert!((resized.height - 70.0).abs() < EPS);
        assert!((resized.x + resized.width - 300.0).abs() < EPS);
        assert!((resized.y + resized.height - 200.0).abs() < EPS);
    }

    #[test]
    fn test_top_right_and_bottom_left_anchor_opposite_corner() {
        let start = Geometry::new(0.0, 0.0, 100.0, 100.0);
        let tr = resize_geometry(&start, Corner::TopRight, Vec2::new(10.0, -10.0), false);
        assert!((tr.x).abs() < EPS);
        assert!((tr.y + tr.height - 100.0).abs() < EPS);
        assert!((tr.width - 110.0).abs() < EPS);

        let bl = resize_geometry(&start, Corner::BottomLeft, Vec2::new(-10.0, 10.0), false);
        assert!((bl.x + bl.width - 100.0).abs() < EPS);
        assert!((bl.y).abs() < EPS);
        assert!((bl.height - 110.0).abs() < EPS);
    }

    #[test]
    fn test_resize_clamps_inverting_drag() {
        let start = Geometry::new(0.0, 0.0, 100.0, 100.0);
        for corner in [Corner::TopLeft, Corner::TopRight, Corner::BottomLeft, Corner::BottomRight] {
            for lock in [false, true] {
                let resized = resize_geometry(&start, corner, Vec2::new(-500.0, 700.0), lock);
                assert!(resized.width >= MIN_ITEM_SIZE - EPS, "{corner:?} lock={lock}");
                assert!(resized.height >= MIN_ITEM_SIZE - EPS, "{corner:?} lock={lock}");
                let resized = resize_geometry(&start, corner, Vec2::new(900.0, -900.0), lock);
                assert!(resized.width >= MIN_ITEM_SIZE - EPS);
                assert!(resized.height >= MIN_ITEM_SIZE - EPS);
            }
        }
    }

    #[test]
    fn test_aspect_lock_preserves_ratio() {
        let start = Geometry::new(10.0, 20.0, 160.0, 90.0);
        let ratio = start.width / start.height;
        for delta in [
            Vec2::new(37.0, 5.0),
            Vec2::new(3.0, -41.0),
            Vec2::new(-400.0, -2.0),
            Vec2::new(0.5, 250.0),
        ] {
            let resized = resize_geometry(&start, Corner::BottomRight, delta, true);
            assert!((resized.width / resized.height - ratio).abs() < EPS);
            assert!(resized.height >= MIN_ITEM_SIZE - EPS);
        }

        // Top-left recomputes the anchor so the bottom-right stays fixed
        let resized = resize_geometry(&start, Corner::TopLeft, Vec2::new(-32.0, 0.0), true);
        assert!((resized.x + resized.width - 170.0).abs() < EPS);
        assert!((resized.y + resized.height - 110.0).abs() < EPS);
    }

    #[test]
    fn test_resize_session_applies_to_every_target() {
        let mut store = store_with(&[(1, 0.0, 0.0, 100.0, 100.0), (2, 300.0, 0.0, 200.0, 50.0)]);
        let session =
            ResizeSession::begin(&store, &[id(1), id(2)], Corner::BottomRight, Point::new(100.0, 100.0), false)
                .unwrap();
        let batch = session.update(&store, Point::new(150.0, 130.0), false);
        ImmediateCommit.commit(&mut store, &batch);
        session.finish(&mut store);

        let (a, b) = (store.get(id(1)).unwrap(), store.get(id(2)).unwrap());
        assert!((a.width - 150.0).abs() < EPS && (a.height - 130.0).abs() < EPS);
        assert!((b.width - 250.0).abs() < EPS && (b.height - 80.0).abs() < EPS);
        assert!(a.has_custom_dimensions && b.has_custom_dimensions);
    }

    #[test]
    fn test_shift_enables_aspect_lock() {
        let store = store_with(&[(1, 0.0, 0.0, 200.0, 100.0)]);
        let session = ResizeSession::begin(&store, &[id(1)], Corner::BottomRight, Point::ZERO, false).unwrap();
        let free = session.update(&store, Point::new(100.0, 10.0), false)[0].1;
        let locked = session.update(&store, Point::new(100.0, 10.0), true)[0].1;
        assert!((free.height - 110.0).abs() < EPS);
        assert!((locked.width - 300.0).abs() < EPS);
        assert!((locked.height - 150.0).abs() < EPS);
    }

    #[test]
    fn test_rotate_three_items_by_same_delta() {
        let mut store = store_with(&[(1, 0.0, 0.0, 100.0, 100.0), (2, 200.0, 0.0, 50.0, 50.0), (3, 400.0, 0.0, 80.0, 40.0)]);
        store.set_geometry(id(2), Geometry { rotation: 330.0, ..Geometry::new(200.0, 0.0, 50.0, 50.0) });
        let center = Point::new(50.0, 50.0);
        let session = RotateSession::begin(&store, id(1), &[id(1), id(2), id(3)], center + Vec2::new(100.0, 0.0), 15.0)
            .unwrap();

        let angle = 47f64.to_radians();
        let pointer = center + Vec2::new(100.0 * angle.cos(), 100.0 * angle.sin());
        let batch = session.update(&store, pointer, false);
        ImmediateCommit.commit(&mut store, &batch);

        assert!((store.get(id(1)).unwrap().rotation_degrees - 47.0).abs() < EPS);
        assert!((store.get(id(2)).unwrap().rotation_degrees - 17.0).abs() < EPS);
        assert!((store.get(id(3)).unwrap().rotation_degrees - 47.0).abs() < EPS);
        // Positions untouched: each item turns around its own center
        assert!((store.get(id(3)).unwrap().x - 400.0).abs() < EPS);
    }

    #[test]
    fn test_rotate_snaps_with_modifier() {
        let store = store_with(&[(1, 0.0, 0.0, 100.0, 100.0)]);
        let center = Point::new(50.0, 50.0);
        let session = RotateSession::begin(&store, id(1), &[id(1)], center + Vec2::new(0.0, -100.0), 15.0).unwrap();
        let angle = (-90.0f64 + 47.0).to_radians();
        let pointer = center + Vec2::new(100.0 * angle.cos(), 100.0 * angle.sin());
        assert!((session.angle_delta(pointer, true) - 45.0).abs() < EPS);
        assert!((session.update(&store, pointer, true)[0].1.rotation - 45.0).abs() < EPS);
    }

    #[test]
    fn test_rotation_stays_normalized() {
        let store = store_with(&[(1, 0.0, 0.0, 100.0, 100.0)]);
        let center = Point::new(50.0, 50.0);
        let session = RotateSession::begin(&store, id(1), &[id(1)], center + Vec2::new(10.0, 0.0), 15.0).unwrap();
        for step in 0..72 {
            let angle = (step as f64 * 37.0).to_radians();
            let pointer = center + Vec2::new(10.0 * angle.cos(), 10.0 * angle.sin());
            for snap in [false, true] {
                let rotation = session.update(&store, pointer, snap)[0].1.rotation;
                assert!((0.0..360.0).contains(&rotation), "{rotation}");
            }
        }
    }

    #[test]
    fn test_rotate_90_and_cancel() {
        let mut store = store_with(&[(1, 0.0, 0.0, 100.0, 100.0), (2, 200.0, 0.0, 50.0, 50.0)]);
        store.set_geometry(id(2), Geometry { rotation: 300.0, ..Geometry::new(200.0, 0.0, 50.0, 50.0) });
        let batch = rotate_90(&store, &[id(1), id(2), id(9)]);
        assert_eq!(batch.len(), 2);
        assert!((batch[0].1.rotation - 90.0).abs() < EPS);
        assert!((batch[1].1.rotation - 30.0).abs() < EPS);

        let session = ResizeSession::begin(&store, &[id(1)], Corner::BottomRight, Point::ZERO, false).unwrap();
        let grown = session.update(&store, Point::new(40.0, 40.0), false);
        ImmediateCommit.commit(&mut store, &grown);
        assert!((store.get(id(1)).unwrap().width - 140.0).abs() < EPS);
        let restore = session.cancel(&store);
        ImmediateCommit.commit(&mut store, &restore);
        assert!((store.get(id(1)).unwrap().width - 100.0).abs() < EPS);
    }
}
