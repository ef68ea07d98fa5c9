//! Pointer input types and click tracking.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Double-click detection constants.
pub const DOUBLE_CLICK_TIME_MS: u64 = 500;
pub const DOUBLE_CLICK_DISTANCE: f64 = 5.0;

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self { shift: true, ..Self::NONE }
    }

    pub fn ctrl() -> Self {
        Self { ctrl: true, ..Self::NONE }
    }

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A pointer sample delivered by the host, in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerInput {
    pub position: Point,
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Host timestamp in milliseconds; only differences matter.
    #[serde(default)]
    pub timestamp_ms: u64,
}

impl PointerInput {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            modifiers: Modifiers::NONE,
            timestamp_ms: 0,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn at(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }
}

/// Detects double-clicks for hosts that only deliver pointer-downs.
#[derive(Debug, Clone, Default)]
pub struct ClickTracker {
    last_click: Option<(u64, Point)>,
}

impl ClickTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a click. Returns `true` if it completes a double-click.
    pub fn register(&mut self, input: &PointerInput) -> bool {
        if let Some((last_time, last_pos)) = self.last_click {
            let elapsed = input.timestamp_ms.saturating_sub(last_time);
            let distance = input.position.distance(last_pos);
            if elapsed <= DOUBLE_CLICK_TIME_MS && distance <= DOUBLE_CLICK_DISTANCE {
                // Reset to prevent triple-click being detected as another double-click
                self.last_click = None;
                return true;
            }
        }
        self.last_click = Some((input.timestamp_ms, input.position));
        false
    }

    pub fn reset(&mut self) {
        self.last_click = None;
    }
}
