//! Viewport module for pan/zoom transforms.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Default minimum zoom level.
pub const MIN_ZOOM: f64 = 0.1;
/// Default maximum zoom level.
pub const MAX_ZOOM: f64 = 5.0;
/// Zoom change applied per wheel tick.
pub const ZOOM_STEP: f64 = 0.05;

/// Viewport maps between screen space and world (canvas) space.
///
/// A world point `w` is drawn at `(w + pan) * zoom + container_origin`, so the
/// pan offset is expressed in world units and survives zoom changes unscaled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    /// Screen position of the canvas container's top-left corner.
    pub container_origin: Point,
    /// Pan offset in world units.
    pub pan: Vec2,
    /// Current zoom level (1.0 = 100%).
    pub zoom: f64,
    /// Minimum allowed zoom level.
    pub min_zoom: f64,
    /// Maximum allowed zoom level.
    pub max_zoom: f64,
    /// Zoom delta per wheel tick.
    pub zoom_step: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            container_origin: Point::ZERO,
            pan: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            zoom_step: ZOOM_STEP,
        }
    }
}

impl Viewport {
    /// Create a viewport with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a viewport using the zoom limits and step from a config.
    pub fn with_limits(min_zoom: f64, max_zoom: f64, zoom_step: f64) -> Self {
        Self {
            min_zoom,
            max_zoom,
            zoom_step,
            ..Self::default()
        }
    }

    /// Get the affine transform for rendering (world to screen).
    pub fn transform(&self) -> Affine {
        Affine::translate(self.container_origin.to_vec2())
            * Affine::scale(self.zoom)
            * Affine::translate(self.pan)
    }

    /// Get the inverse transform for input handling (screen to world).
    pub fn inverse_transform(&self) -> Affine {
        Affine::translate(-self.pan)
            * Affine::scale(1.0 / self.zoom)
            * Affine::translate(-self.container_origin.to_vec2())
    }

    /// Convert a screen point to world coordinates.
    pub fn world_from_screen(&self, screen_point: Point) -> Point {
        let local = screen_point - self.container_origin;
        Point::new(local.x / self.zoom - self.pan.x, local.y / self.zoom - self.pan.y)
    }

    /// Convert a world point to screen coordinates.
    pub fn screen_from_world(&self, world_point: Point) -> Point {
        Point::new(
            (world_point.x + self.pan.x) * self.zoom + self.container_origin.x,
            (world_point.y + self.pan.y) * self.zoom + self.container_origin.y,
        )
    }

    /// Convert a length in screen pixels to world units.
    pub fn screen_to_world_len(&self, len: f64) -> f64 {
        len / self.zoom
    }

    /// Pan by a delta in screen coordinates.
    pub fn pan(&mut self, screen_delta: Vec2) {
        self.pan += screen_delta / self.zoom;
    }

    /// Set the zoom level, keeping the world point under `anchor` fixed on screen.
    ///
    /// Returns `true` if the zoom actually changed.
    pub fn set_zoom(&mut self, new_zoom: f64, anchor: Point) -> bool {
        if !new_zoom.is_finite() {
            return false;
        }
        let new_zoom = new_zoom.clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return false;
        }

        let world_anchor = self.world_from_screen(anchor);
        self.zoom = new_zoom;

        // Solve (anchor - origin) / zoom - pan = world_anchor for pan
        let local = anchor - self.container_origin;
        self.pan = Vec2::new(
            local.x / self.zoom - world_anchor.x,
            local.y / self.zoom - world_anchor.y,
        );
        true
    }

    /// Apply one wheel tick at `anchor`. Negative `delta_y` (scroll up) zooms in.
    pub fn wheel(&mut self, delta_y: f64, anchor: Point) -> bool {
        if delta_y == 0.0 {
            return false;
        }
        let step = if delta_y < 0.0 { self.zoom_step } else { -self.zoom_step };
        self.set_zoom(self.zoom + step, anchor)
    }

    /// Reset to zoom 1 with no pan.
    pub fn reset(&mut self) {
        self.pan = Vec2::ZERO;
        self.zoom = 1.0;
    }

    /// Fit the viewport to show the given world bounding box.
    pub fn fit_to_bounds(&mut self, bounds: Rect, viewport: Size, padding: f64) {
        if bounds.is_zero_area() {
            self.reset();
            return;
        }

        let padded_viewport = Size::new(
            (viewport.width - padding * 2.0).max(1.0),
            (viewport.height - padding * 2.0).max(1.0),
        );

        let scale_x = padded_viewport.width / bounds.width();
        let scale_y = padded_viewport.height / bounds.height();
        self.zoom = scale_x.min(scale_y).clamp(self.min_zoom, self.max_zoom);

        // Center the bounds in the viewport
        let bounds_center = bounds.center();
        self.pan = Vec2::new(
            viewport.width / 2.0 / self.zoom - bounds_center.x,
            viewport.height / 2.0 / self.zoom - bounds_center.y,
        );
    }
}
