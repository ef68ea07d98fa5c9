//! Host-supplied canvas configuration.

use crate::camera::{MAX_ZOOM, MIN_ZOOM, ZOOM_STEP};
use crate::snap::{ANGLE_SNAP_INCREMENT, GRID_SIZE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest allowed item snap distance (world units).
pub const MIN_SNAP_DISTANCE: f64 = 1.0;
/// Largest allowed item snap distance (world units).
pub const MAX_SNAP_DISTANCE: f64 = 20.0;
/// Default item snap distance (world units).
pub const DEFAULT_SNAP_DISTANCE: f64 = 10.0;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Snap distance {0} outside [1, 20]")]
    SnapDistanceOutOfRange(f64),
    #[error("Grid size must be positive, got {0}")]
    InvalidGridSize(f64),
    #[error("Invalid zoom range [{min}, {max}]")]
    InvalidZoomRange { min: f64, max: f64 },
    #[error("Zoom step must be positive, got {0}")]
    InvalidZoomStep(f64),
    #[error("Rotation snap increment must be positive, got {0}")]
    InvalidRotationIncrement(f64),
}

/// How stationary items react when a moved item lands on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NudgeMode {
    /// Iteratively push overlapped items out of the way.
    #[default]
    Fluid,
}

/// Canvas behaviour settings. Every field is optional in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    /// Snap item positions to the grid.
    pub snap_to_grid: bool,
    /// Grid cell size in world units.
    pub grid_size: f64,
    /// Snap item edges/centers to other items.
    pub snap_to_items: bool,
    /// Maximum distance for item snapping (world units).
    pub snap_distance: f64,
    /// Push overlapped items away from moved items.
    pub nudging: bool,
    /// Nudge algorithm.
    pub nudge_mode: NudgeMode,
    /// Allowed zoom range `[min, max]`.
    pub zoom_range: [f64; 2],
    /// Zoom change per wheel tick.
    pub zoom_step: f64,
    /// Angle increment used while the rotation snap modifier is held (degrees).
    pub rotation_snap_increment: f64,
    /// Always preserve aspect ratio when resizing.
    pub lock_aspect_ratio: bool,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            snap_to_grid: true,
            grid_size: GRID_SIZE,
            snap_to_items: true,
            snap_distance: DEFAULT_SNAP_DISTANCE,
            nudging: false,
            nudge_mode: NudgeMode::Fluid,
            zoom_range: [MIN_ZOOM, MAX_ZOOM],
            zoom_step: ZOOM_STEP,
            rotation_snap_increment: ANGLE_SNAP_INCREMENT,
            lock_aspect_ratio: false,
        }
    }
}

impl CanvasConfig {
    /// Parse and validate a config from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the config to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_SNAP_DISTANCE..=MAX_SNAP_DISTANCE).contains(&self.snap_distance) {
            return Err(ConfigError::SnapDistanceOutOfRange(self.snap_distance));
        }
        if !(self.grid_size.is_finite() && self.grid_size > 0.0) {
            return Err(ConfigError::InvalidGridSize(self.grid_size));
        }
        let [min, max] = self.zoom_range;
        if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
            return Err(ConfigError::InvalidZoomRange { min, max });
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 0.0) {
            return Err(ConfigError::InvalidZoomStep(self.zoom_step));
        }
        if !(self.rotation_snap_increment.is_finite() && self.rotation_snap_increment > 0.0) {
            return Err(ConfigError::InvalidRotationIncrement(self.rotation_snap_increment));
        }
        Ok(())
    }

    /// Set the snap distance, clamped to the allowed range.
    pub fn set_snap_distance(&mut self, distance: f64) {
        if distance.is_finite() {
            self.snap_distance = distance.clamp(MIN_SNAP_DISTANCE, MAX_SNAP_DISTANCE);
        }
    }

    /// Whether fluid nudging should run after a move.
    pub fn fluid_nudging(&self) -> bool {
        self.nudging && self.nudge_mode == NudgeMode::Fluid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CanvasConfig::default();
        assert!(config.snap_to_grid);
        assert!(config.snap_to_items);
        assert!(!config.nudging);
        assert!((config.grid_size - 20.0).abs() < f64::EPSILON);
        assert!((config.snap_distance - 10.0).abs() < f64::EPSILON);
        assert_eq!(config.nudge_mode, NudgeMode::Fluid);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = CanvasConfig::from_json(r#"{"nudging": true, "snapDistance": 4}"#).unwrap();
        assert!(config.nudging);
        assert!(config.fluid_nudging());
        assert!((config.snap_distance - 4.0).abs() < f64::EPSILON);
        assert!(config.snap_to_grid);
        assert_eq!(config.zoom_range, [0.1, 5.0]);
    }

    #[test]
    fn test_nudge_mode_parses_lowercase() {
        let config = CanvasConfig::from_json(r#"{"nudgeMode": "fluid"}"#).unwrap();
        assert_eq!(config.nudge_mode, NudgeMode::Fluid);
        assert!(CanvasConfig::from_json(r#"{"nudgeMode": "rigid"}"#).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_snap_distance() {
        let err = CanvasConfig::from_json(r#"{"snapDistance": 25}"#).unwrap_err();
        assert!(matches!(err, ConfigError::SnapDistanceOutOfRange(_)));
    }

    #[test]
    fn test_rejects_bad_zoom_range() {
        let err = CanvasConfig::from_json(r#"{"zoomRange": [2.0, 1.0]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidZoomRange { .. }));
    }

    #[test]
    fn test_set_snap_distance_clamps() {
        let mut config = CanvasConfig::default();
        config.set_snap_distance(50.0);
        assert!((config.snap_distance - 20.0).abs() < f64::EPSILON);
        config.set_snap_distance(0.0);
        assert!((config.snap_distance - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_json_roundtrip_keeps_values() {
        let mut config = CanvasConfig::default();
        config.lock_aspect_ratio = true;
        let parsed = CanvasConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
}
