//! Pinboard Core Library
//!
//! Platform-agnostic geometry, gesture and annotation logic for the Pinboard
//! infinite media canvas.

pub mod annotation;
pub mod board;
pub mod cache;
pub mod camera;
pub mod commit;
pub mod config;
pub mod connection;
pub mod drag;
pub mod input;
pub mod item;
pub mod nudge;
pub mod selection;
pub mod snap;
pub mod transform;

pub use annotation::{Annotation, AnnotationLayer, AnnotationMode, EraserMode, SerializableColor};
pub use board::{Board, BoardEvent, Session};
pub use cache::AssetCache;
pub use camera::Viewport;
pub use commit::{GeometryCommit, ImmediateCommit};
pub use config::{CanvasConfig, ConfigError, NudgeMode};
pub use connection::Connection;
pub use drag::DragSession;
pub use input::{ClickTracker, Modifiers, PointerInput};
pub use item::{ContentRef, Geometry, Item, ItemError, ItemId, ItemStore};
pub use nudge::NudgeOutcome;
pub use selection::{Corner, Handle, HandleKind, Selection};
pub use snap::{SnapOptions, SnapResult, GRID_SIZE, snap_to_grid};
pub use transform::{ResizeSession, RotateSession};
