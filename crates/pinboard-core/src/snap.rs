//! Snap functionality for aligning moving items to the grid and to other items.

use crate::config::CanvasConfig;
use crate::item::{ItemId, normalize_degrees};
use kurbo::{Point, Rect};

/// Grid size for snapping (matches the visual grid).
pub const GRID_SIZE: f64 = 20.0;

/// Angle snap increment in degrees.
pub const ANGLE_SNAP_INCREMENT: f64 = 15.0;

/// Options controlling a snap pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapOptions {
    pub snap_to_grid: bool,
    pub grid_size: f64,
    pub snap_to_items: bool,
    pub snap_distance: f64,
}

impl Default for SnapOptions {
    fn default() -> Self {
        Self::from(&CanvasConfig::default())
    }
}

impl From<&CanvasConfig> for SnapOptions {
    fn from(config: &CanvasConfig) -> Self {
        Self {
            snap_to_grid: config.snap_to_grid,
            grid_size: config.grid_size,
            snap_to_items: config.snap_to_items,
            snap_distance: config.snap_distance,
        }
    }
}

/// Result of a snap operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    /// The snapped top-left position.
    pub point: Point,
    /// Whether the X coordinate was snapped.
    pub snapped_x: bool,
    /// Whether the Y coordinate was snapped.
    pub snapped_y: bool,
    /// Item the X axis aligned to, for drawing guides.
    pub target_x: Option<ItemId>,
    /// Item the Y axis aligned to, for drawing guides.
    pub target_y: Option<ItemId>,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(point: Point) -> Self {
        Self {
            point,
            snapped_x: false,
            snapped_y: false,
            target_x: None,
            target_y: None,
        }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.snapped_x || self.snapped_y
    }
}

/// Snap an angle to the nearest increment.
/// Returns the snapped angle in degrees (0-360).
pub fn snap_angle(angle_degrees: f64, increment: f64) -> f64 {
    normalize_degrees((angle_degrees / increment).round() * increment)
}

/// Round a signed angle delta to the nearest increment without normalizing.
pub fn snap_angle_delta(delta_degrees: f64, increment: f64) -> f64 {
    (delta_degrees / increment).round() * increment
}

/// Snap a point to the nearest grid intersection.
pub fn snap_to_grid(point: Point, grid_size: f64) -> SnapResult {
    let snapped_x = (point.x / grid_size).round() * grid_size;
    let snapped_y = (point.y / grid_size).round() * grid_size;

    SnapResult {
        point: Point::new(snapped_x, snapped_y),
        snapped_x: true,
        snapped_y: true,
        target_x: None,
        target_y: None,
    }
}

/// Closest alignment found so far on one axis.
#[derive(Debug, Clone, Copy)]
struct AxisCandidate {
    value: f64,
    distance: f64,
    target: ItemId,
}

/// Pick the closest candidate on one axis. `current` is the moving box's
/// leading coordinate and `size` its extent along the axis; `(lo, hi)` is the
/// static box's extent. Only a strictly closer candidate replaces the best.
fn consider_axis(best: &mut Option<AxisCandidate>, current: f64, size: f64, lo: f64, hi: f64, target: ItemId) {
    let center = (lo + hi) / 2.0;
    let candidates = [
        hi,                  // leading edge against other's trailing edge
        lo - size,           // trailing edge against other's leading edge
        lo,                  // leading edges aligned
        hi - size,           // trailing edges aligned
        center - size / 2.0, // centers aligned
    ];
    for value in candidates {
        let distance = (value - current).abs();
        if best.is_none_or(|b| distance < b.distance) {
            *best = Some(AxisCandidate { value, distance, target });
        }
    }
}

/// Snap a moving box against other items.
///
/// `statics` must not contain the moving item(s). Boxes are visited in
/// ascending id order whatever order the caller passes, so ties between
/// equally close alignments always resolve to the lowest id.
pub fn snap_to_items(moving: Rect, statics: &[(ItemId, Rect)], snap_distance: f64) -> SnapResult {
    let origin = Point::new(moving.x0, moving.y0);
    if !(moving.width() > 0.0 && moving.height() > 0.0) {
        return SnapResult::none(origin);
    }

    let mut ordered: Vec<&(ItemId, Rect)> = statics
        .iter()
        .filter(|(_, r)| r.width() > 0.0 && r.height() > 0.0)
        .collect();
    ordered.sort_by_key(|(id, _)| *id);

    let mut best_x: Option<AxisCandidate> = None;
    let mut best_y: Option<AxisCandidate> = None;
    for &(id, other) in ordered {
        consider_axis(&mut best_x, moving.x0, moving.width(), other.x0, other.x1, id);
        consider_axis(&mut best_y, moving.y0, moving.height(), other.y0, other.y1, id);
    }

    let mut result = SnapResult::none(origin);
    if let Some(best) = best_x.filter(|b| b.distance < snap_distance) {
        result.point.x = best.value;
        result.snapped_x = true;
        result.target_x = Some(best.target);
    }
    if let Some(best) = best_y.filter(|b| b.distance < snap_distance) {
        result.point.y = best.value;
        result.snapped_y = true;
        result.target_y = Some(best.target);
    }
    result
}

/// Resolve the final top-left of a moving box: grid first, then items.
pub fn resolve(moving: Rect, statics: &[(ItemId, Rect)], options: &SnapOptions) -> SnapResult {
    let mut result = SnapResult::none(Point::new(moving.x0, moving.y0));

    if options.snap_to_grid && options.grid_size > 0.0 {
        result = snap_to_grid(result.point, options.grid_size);
    }

    if options.snap_to_items {
        let candidate = Rect::from_origin_size(result.point, moving.size());
        let item_snap = snap_to_items(candidate, statics, options.snap_distance);
        if item_snap.snapped_x {
            result.point.x = item_snap.point.x;
            result.snapped_x = true;
            result.target_x = item_snap.target_x;
        }
        if item_snap.snapped_y {
            result.point.y = item_snap.point.y;
            result.snapped_y = true;
            result.target_y = item_snap.target_y;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn id(n: u128) -> ItemId {
        Uuid::from_u128(n)
    }

    fn items_only(distance: f64) -> SnapOptions {
        SnapOptions {
            snap_to_grid: false,
            grid_size: GRID_SIZE,
            snap_to_items: true,
            snap_distance: distance,
        }
    }

    #[test]
    fn test_snap_to_grid() {
        let result = snap_to_grid(Point::new(23.0, 47.0), 20.0);
        assert_eq!(result.point, Point::new(20.0, 40.0));
        assert!(result.snapped_x);
        assert!(result.snapped_y);
    }

    #[test]
    fn test_snap_to_grid_round_up() {
        let result = snap_to_grid(Point::new(31.0, 51.0), 20.0);
        assert_eq!(result.point, Point::new(40.0, 60.0));
    }

    #[test]
    fn test_grid_snap_is_idempotent() {
        for &(x, y) in &[(23.0, 47.0), (-31.5, 9.99), (10.0, -10.0), (1234.567, -0.001)] {
            let once = snap_to_grid(Point::new(x, y), 20.0).point;
            let twice = snap_to_grid(once, 20.0).point;
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_snap_angle() {
        assert!((snap_angle(0.0, 15.0) - 0.0).abs() < 0.01);
        assert!((snap_angle(7.0, 15.0) - 0.0).abs() < 0.01);
        assert!((snap_angle(8.0, 15.0) - 15.0).abs() < 0.01);
        assert!((snap_angle(359.0, 15.0) - 0.0).abs() < 0.01);
        assert!((snap_angle(-20.0, 15.0) - 345.0).abs() < 0.01);
        assert!((snap_angle_delta(-20.0, 15.0) + 15.0).abs() < 0.01);
    }

    #[test]
    fn test_item_snap_left_to_right_edge() {
        // B dropped 2 units inside A's right edge snaps flush against it
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(98.0, 0.0, 198.0, 100.0);
        let result = resolve(b, &[(id(1), a)], &items_only(10.0));
        assert!((result.point.x - 100.0).abs() < f64::EPSILON);
        assert!((result.point.y - 0.0).abs() < f64::EPSILON);
        assert_eq!(result.target_x, Some(id(1)));
    }

    #[test]
    fn test_item_snap_boundary() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        // Nearest candidate is exactly 10 away: no snap
        let far = Rect::new(110.0, 500.0, 210.0, 600.0);
        let result = snap_to_items(far, &[(id(1), a)], 10.0);
        assert!(!result.snapped_x);
        assert!((result.point.x - 110.0).abs() < f64::EPSILON);

        // 9.5 away: snaps
        let near = Rect::new(109.5, 500.0, 209.5, 600.0);
        let result = snap_to_items(near, &[(id(1), a)], 10.0);
        assert!(result.snapped_x);
        assert!((result.point.x - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_axes_snap_to_different_items() {
        let left = Rect::new(0.0, 300.0, 100.0, 400.0);
        let above = Rect::new(500.0, 0.0, 600.0, 100.0);
        let moving = Rect::new(104.0, 107.0, 154.0, 157.0);
        let result = snap_to_items(moving, &[(id(1), left), (id(2), above)], 10.0);
        assert_eq!(result.point, Point::new(100.0, 100.0));
        assert_eq!(result.target_x, Some(id(1)));
        assert_eq!(result.target_y, Some(id(2)));
    }

    #[test]
    fn test_center_alignment() {
        let other = Rect::new(0.0, 0.0, 200.0, 100.0);
        // Center of a 50-wide box at 78 is 103 vs other center 100
        let moving = Rect::new(78.0, 400.0, 128.0, 450.0);
        let result = snap_to_items(moving, &[(id(1), other)], 5.0);
        assert!((result.point.x - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_tie_break_prefers_lowest_id() {
        // Two items whose right edges are both 3 units away on either side
        let low = Rect::new(0.0, 0.0, 97.0, 50.0);
        let high = Rect::new(0.0, 200.0, 103.0, 250.0);
        let moving = Rect::new(100.0, 600.0, 150.0, 650.0);

        let forward = snap_to_items(moving, &[(id(1), low), (id(2), high)], 10.0);
        let reversed = snap_to_items(moving, &[(id(2), high), (id(1), low)], 10.0);
        assert_eq!(forward.target_x, Some(id(1)));
        assert_eq!(reversed.target_x, Some(id(1)));
        assert!((forward.point.x - 97.0).abs() < f64::EPSILON);
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_degenerate_boxes_ignored() {
        let flat = Rect::new(100.0, 0.0, 100.0, 100.0);
        let moving = Rect::new(102.0, 0.0, 152.0, 50.0);
        let result = snap_to_items(moving, &[(id(1), flat)], 10.0);
        assert!(!result.is_snapped());

        let degenerate_mover = Rect::new(0.0, 0.0, 0.0, 10.0);
        let result = snap_to_items(degenerate_mover, &[(id(1), Rect::new(1.0, 1.0, 5.0, 5.0))], 10.0);
        assert!(!result.is_snapped());
    }

    #[test]
    fn test_grid_then_items() {
        let other = Rect::new(0.0, 0.0, 105.0, 105.0);
        let moving = Rect::new(93.0, 203.0, 143.0, 253.0);
        let options = SnapOptions::default();
        let result = resolve(moving, &[(id(1), other)], &options);
        // Grid puts x at 100, then the item edge at 105 is 5 away
        assert!((result.point.x - 105.0).abs() < f64::EPSILON);
        assert!((result.point.y - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_snapping_when_disabled() {
        let options = SnapOptions {
            snap_to_grid: false,
            grid_size: GRID_SIZE,
            snap_to_items: false,
            snap_distance: 10.0,
        };
        let moving = Rect::new(13.0, 17.0, 63.0, 67.0);
        let result = resolve(moving, &[(id(1), Rect::new(0.0, 0.0, 10.0, 10.0))], &options);
        assert_eq!(result, SnapResult::none(Point::new(13.0, 17.0)));
    }
}
