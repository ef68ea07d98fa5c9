//! Media card items and the authoritative item store.

use crate::transform::MIN_ITEM_SIZE;
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for items.
pub type ItemId = Uuid;

/// Current version of the serialized item snapshot.
pub const ITEM_SCHEMA_VERSION: u32 = 1;

/// Item errors.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("Item {id} has invalid size {width}x{height}")]
    InvalidGeometry { id: ItemId, width: f64, height: f64 },
    #[error("Item {0} has non-finite geometry")]
    NonFinite(ItemId),
    #[error("Unsupported item schema version {0}")]
    UnsupportedSchema(u32),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Opaque key into the host's media registry. Never interpreted here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentRef(pub String);

impl ContentRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize an angle in degrees to `[0, 360)`.
pub fn normalize_degrees(angle: f64) -> f64 {
    let normalized = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if normalized >= 360.0 { 0.0 } else { normalized }
}

/// The mutable placement of an item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Rotation in degrees around the center, `[0, 360)`.
    pub rotation: f64,
}

impl Geometry {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height, rotation: 0.0 }
    }

    /// Unrotated bounding box.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.rotation.is_finite()
    }

    /// Zero or negative sizes take no part in collision math.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Axis-aligned box around the item after rotating it about its center.
    pub fn rotated_bounds(&self) -> Rect {
        let bounds = self.bounds();
        if self.rotation == 0.0 {
            return bounds;
        }
        Affine::rotate_about(self.rotation.to_radians(), bounds.center()).transform_rect_bbox(bounds)
    }

    /// Check if a world point lies inside the rotated item.
    pub fn contains(&self, point: Point) -> bool {
        let local = Affine::rotate_about(-self.rotation.to_radians(), self.center()) * point;
        self.bounds().contains(local)
    }

    /// Move so the top-left corner sits at `origin`.
    pub fn with_origin(mut self, origin: Point) -> Self {
        self.x = origin.x;
        self.y = origin.y;
        self
    }

    pub fn translated(mut self, delta: Vec2) -> Self {
        self.x += delta.x;
        self.y += delta.y;
        self
    }
}

/// A media card placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Rotation in degrees around the center, `[0, 360)`.
    #[serde(default)]
    pub rotation_degrees: f64,
    #[serde(default)]
    pub z_index: i64,
    /// Set once the user resized the item; natural media size no longer applies.
    #[serde(default)]
    pub has_custom_dimensions: bool,
    pub content_ref: ContentRef,
}

impl Item {
    /// Create a new item with a fresh id.
    pub fn new(content_ref: ContentRef, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::with_id(Uuid::new_v4(), content_ref, x, y, width, height)
    }

    /// Create an item with a specific id.
    pub fn with_id(id: ItemId, content_ref: ContentRef, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height,
            rotation_degrees: 0.0,
            z_index: 0,
            has_custom_dimensions: false,
            content_ref,
        }
    }

    pub fn geometry(&self) -> Geometry {
        Geometry {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            rotation: self.rotation_degrees,
        }
    }

    fn set_geometry_unchecked(&mut self, geometry: Geometry) {
        self.x = geometry.x;
        self.y = geometry.y;
        self.width = geometry.width;
        self.height = geometry.height;
        self.rotation_degrees = normalize_degrees(geometry.rotation);
    }

    pub fn bounds(&self) -> Rect {
        self.geometry().bounds()
    }

    pub fn center(&self) -> Point {
        self.geometry().center()
    }

    pub fn rotated_bounds(&self) -> Rect {
        self.geometry().rotated_bounds()
    }

    /// Check the size and finiteness invariants.
    pub fn validate(&self) -> Result<(), ItemError> {
        if !self.geometry().is_finite() {
            return Err(ItemError::NonFinite(self.id));
        }
        if self.geometry().is_degenerate() {
            return Err(ItemError::InvalidGeometry {
                id: self.id,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Serialized form of the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub version: u32,
    pub items: Vec<Item>,
}

/// Authoritative id to item map. Iteration is in ascending id order.
#[derive(Debug, Clone, Default)]
pub struct ItemStore {
    items: BTreeMap<ItemId, Item>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every item. Nothing changes if any item is invalid.
    pub fn load(&mut self, items: Vec<Item>) -> Result<(), ItemError> {
        let mut loaded = BTreeMap::new();
        for mut item in items {
            item.validate()?;
            item.rotation_degrees = normalize_degrees(item.rotation_degrees);
            loaded.insert(item.id, item);
        }
        self.items = loaded;
        Ok(())
    }

    /// Insert or replace an item.
    pub fn insert(&mut self, mut item: Item) -> Result<(), ItemError> {
        item.validate()?;
        item.rotation_degrees = normalize_degrees(item.rotation_degrees);
        self.items.insert(item.id, item);
        Ok(())
    }

    pub fn remove(&mut self, id: ItemId) -> Option<Item> {
        self.items.remove(&id)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in ascending id order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.keys().copied()
    }

    /// Items back to front (z-index, then id).
    pub fn items_by_z(&self) -> Vec<&Item> {
        let mut items: Vec<&Item> = self.items.values().collect();
        items.sort_by(|a, b| a.z_index.cmp(&b.z_index).then(a.id.cmp(&b.id)));
        items
    }

    /// Apply new geometry. Returns `false` for unknown ids and for
    /// non-finite or degenerate geometry, which is never stored.
    pub fn set_geometry(&mut self, id: ItemId, geometry: Geometry) -> bool {
        let Some(item) = self.items.get_mut(&id) else {
            return false;
        };
        if !geometry.is_finite() || geometry.is_degenerate() {
            log::warn!("Rejected geometry for item {}: {:?}", id, geometry);
            return false;
        }
        item.set_geometry_unchecked(geometry);
        true
    }

    pub fn mark_custom_dimensions(&mut self, id: ItemId) {
        if let Some(item) = self.items.get_mut(&id) {
            item.has_custom_dimensions = true;
        }
    }

    /// Auto-size an item from its media's natural dimensions, keeping the width.
    /// The derived height never drops below [`MIN_ITEM_SIZE`]. Skipped when the
    /// user has already resized the item.
    pub fn apply_natural_size(&mut self, id: ItemId, natural_width: f64, natural_height: f64) -> bool {
        if !(natural_width > 0.0 && natural_height > 0.0)
            || !natural_width.is_finite()
            || !natural_height.is_finite()
        {
            return false;
        }
        let Some(item) = self.items.get(&id) else {
            return false;
        };
        if item.has_custom_dimensions {
            return false;
        }
        let mut geometry = item.geometry();
        geometry.height = (geometry.width * natural_height / natural_width).max(MIN_ITEM_SIZE);
        self.set_geometry(id, geometry)
    }

    /// Raise an item above every other item.
    pub fn bring_to_front(&mut self, id: ItemId) -> bool {
        let top = self.items.values().filter(|i| i.id != id).map(|i| i.z_index).max();
        match self.items.get_mut(&id) {
            Some(item) => {
                item.z_index = top.map_or(0, |z| z + 1).max(item.z_index);
                true
            }
            None => false,
        }
    }

    /// Lower an item below every other item.
    pub fn send_to_back(&mut self, id: ItemId) -> bool {
        let bottom = self.items.values().filter(|i| i.id != id).map(|i| i.z_index).min();
        match self.items.get_mut(&id) {
            Some(item) => {
                item.z_index = bottom.map_or(0, |z| z - 1).min(item.z_index);
                true
            }
            None => false,
        }
    }

    /// Items under a world point, front to back.
    pub fn items_at_point(&self, point: Point) -> Vec<ItemId> {
        self.items_by_z()
            .into_iter()
            .rev()
            .filter(|item| item.geometry().contains(point))
            .map(|item| item.id)
            .collect()
    }

    /// Union of all rotated item bounds.
    pub fn bounds(&self) -> Option<Rect> {
        self.items
            .values()
            .map(Item::rotated_bounds)
            .reduce(|acc, bounds| acc.union(bounds))
    }

    /// Owned copy of every item in ascending id order.
    pub fn to_vec(&self) -> Vec<Item> {
        self.items.values().cloned().collect()
    }

    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            version: ITEM_SCHEMA_VERSION,
            items: self.to_vec(),
        }
    }

    /// Serialize the store to a versioned JSON snapshot.
    pub fn to_json(&self) -> Result<String, ItemError> {
        serde_json::to_string_pretty(&self.snapshot()).map_err(|e| ItemError::Serialization(e.to_string()))
    }

    /// Deserialize a store from a versioned JSON snapshot.
    pub fn from_json(json: &str) -> Result<Self, ItemError> {
        let snapshot: ItemSnapshot =
            serde_json::from_str(json).map_err(|e| ItemError::Serialization(e.to_string()))?;
        if snapshot.version != ITEM_SCHEMA_VERSION {
            return Err(ItemError::UnsupportedSchema(snapshot.version));
        }
        let mut store = Self::new();
        store.load(snapshot.items)?;
        Ok(store)
    }
}
