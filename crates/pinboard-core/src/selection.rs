//! Selection set and manipulation handles.

use crate::item::{Item, ItemId, ItemStore};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Handle hit tolerance in screen pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 12.0;

/// Distance from the top edge to the rotation handle (in world units).
pub const ROTATE_HANDLE_OFFSET: f64 = 25.0;

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    /// Horizontal and vertical sign of the corner relative to the center.
    pub fn signs(self) -> (f64, f64) {
        match self {
            Corner::TopLeft => (-1.0, -1.0),
            Corner::TopRight => (1.0, -1.0),
            Corner::BottomLeft => (-1.0, 1.0),
            Corner::BottomRight => (1.0, 1.0),
        }
    }
}

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// Corner resize handle.
    Corner(Corner),
    /// Rotation handle (positioned above the item).
    Rotate,
}

/// A selection handle with its position and type.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    /// Position in world coordinates.
    pub position: Point,
    /// Handle type.
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a point (in world coordinates) hits this handle.
    /// `tolerance` should already be converted to world units.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

/// Corner handles plus a rotation handle, rotated with the item.
pub fn get_handles(item: &Item) -> Vec<Handle> {
    let center = item.center();
    let half_w = item.width / 2.0;
    let half_h = item.height / 2.0;
    let (sin_r, cos_r) = item.rotation_degrees.to_radians().sin_cos();

    let rotate_point = |dx: f64, dy: f64| -> Point {
        center + Vec2::new(dx * cos_r - dy * sin_r, dx * sin_r + dy * cos_r)
    };

    let corner = |corner: Corner| {
        let (sx, sy) = corner.signs();
        Handle::new(rotate_point(sx * half_w, sy * half_h), HandleKind::Corner(corner))
    };

    vec![
        corner(Corner::TopLeft),
        corner(Corner::TopRight),
        corner(Corner::BottomLeft),
        corner(Corner::BottomRight),
        Handle::new(rotate_point(0.0, -half_h - ROTATE_HANDLE_OFFSET), HandleKind::Rotate),
    ]
}

/// Find which handle (if any) of an item is hit at the given point.
pub fn hit_test_handles(item: &Item, point: Point, tolerance: f64) -> Option<HandleKind> {
    get_handles(item)
        .into_iter()
        .find(|handle| handle.hit_test(point, tolerance))
        .map(|handle| handle.kind)
}

/// The set of selected items. Iteration is in ascending id order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<ItemId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection with a single item. Returns `true` if it changed.
    pub fn select_only(&mut self, id: ItemId) -> bool {
        if self.ids.len() == 1 && self.ids.contains(&id) {
            return false;
        }
        self.ids.clear();
        self.ids.insert(id);
        true
    }

    pub fn add(&mut self, id: ItemId) -> bool {
        self.ids.insert(id)
    }

    pub fn remove(&mut self, id: ItemId) -> bool {
        self.ids.remove(&id)
    }

    /// Flip membership of an item.
    pub fn toggle(&mut self, id: ItemId) {
        if !self.ids.remove(&id) {
            self.ids.insert(id);
        }
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.ids.is_empty();
        self.ids.clear();
        changed
    }

    pub fn select_all(&mut self, store: &ItemStore) -> bool {
        let all: BTreeSet<ItemId> = store.ids().collect();
        let changed = all != self.ids;
        self.ids = all;
        changed
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// More than one item is selected.
    pub fn is_multi(&self) -> bool {
        self.ids.len() > 1
    }

    pub fn iter(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.ids.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<ItemId> {
        self.ids.iter().copied().collect()
    }

    /// Drop ids that no longer exist in the store. Returns `true` if any were dropped.
    pub fn prune(&mut self, store: &ItemStore) -> bool {
        let before = self.ids.len();
        self.ids.retain(|id| store.contains(*id));
        self.ids.len() != before
    }
}
