//! Freehand and text annotations drawn over the canvas.

use kurbo::{Point, Rect};
use peniko::Color;
use serde::{Deserialize, Serialize};

/// Pixel eraser reach around the pointer for path points (world units).
pub const ERASER_RADIUS: f64 = 20.0;
/// Font size for committed text annotations.
pub const TEXT_FONT_SIZE: f64 = 16.0;
/// Default stroke width for pencil paths.
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;

/// Serializable color (RGBA).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }
}

impl Default for SerializableColor {
    fn default() -> Self {
        Self::black()
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self::new(rgba.r, rgba.g, rgba.b, rgba.a)
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// A freehand stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathAnnotation {
    pub points: Vec<Point>,
    pub color: SerializableColor,
    pub width: f64,
}

/// A text label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAnnotation {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub color: SerializableColor,
    pub font_size: f64,
}

impl TextAnnotation {
    /// Fixed hit box used by the eraser, independent of the text's length.
    pub fn hit_box(&self) -> Rect {
        Rect::new(self.x - 10.0, self.y - 10.0, self.x + 150.0, self.y + 30.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Annotation {
    Path(PathAnnotation),
    Text(TextAnnotation),
}

impl Annotation {
    /// Whether the pixel eraser at `point` removes this annotation.
    pub fn erased_by(&self, point: Point) -> bool {
        match self {
            Annotation::Path(path) => path
                .points
                .iter()
                .any(|p| p.distance(point) <= ERASER_RADIUS),
            Annotation::Text(text) => text.hit_box().contains(point),
        }
    }
}

/// Eraser sub-mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EraserMode {
    /// Remove annotations under the pointer.
    Pixel,
    /// Double-click removes everything.
    ClearAll,
}

/// Active annotation tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnnotationMode {
    #[default]
    Off,
    Pencil,
    Text,
    Eraser(EraserMode),
}

impl AnnotationMode {
    /// Next mode in the eraser button cycle: Off, Pixel, ClearAll, Off.
    /// Any non-eraser mode starts the cycle at Pixel.
    pub fn next_eraser(self) -> Self {
        match self {
            AnnotationMode::Eraser(EraserMode::Pixel) => AnnotationMode::Eraser(EraserMode::ClearAll),
            AnnotationMode::Eraser(EraserMode::ClearAll) => AnnotationMode::Off,
            _ => AnnotationMode::Eraser(EraserMode::Pixel),
        }
    }

    pub fn is_active(self) -> bool {
        self != AnnotationMode::Off
    }
}

/// Text input waiting to be committed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingText {
    pub position: Point,
}

/// The annotation list plus the in-progress stroke or text input.
#[derive(Debug, Clone)]
pub struct AnnotationLayer {
    mode: AnnotationMode,
    annotations: Vec<Annotation>,
    stroke_color: SerializableColor,
    stroke_width: f64,
    drawing: Option<PathAnnotation>,
    pending_text: Option<PendingText>,
    /// Pointer is down in pixel-eraser mode.
    erasing: bool,
}

impl Default for AnnotationLayer {
    fn default() -> Self {
        Self {
            mode: AnnotationMode::Off,
            annotations: Vec::new(),
            stroke_color: SerializableColor::black(),
            stroke_width: DEFAULT_STROKE_WIDTH,
            drawing: None,
            pending_text: None,
            erasing: false,
        }
    }
}

impl AnnotationLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> AnnotationMode {
        self.mode
    }

    /// Switch tools, dropping any in-progress stroke or text input.
    pub fn set_mode(&mut self, mode: AnnotationMode) {
        self.mode = mode;
        self.drawing = None;
        self.pending_text = None;
        self.erasing = false;
    }

    pub fn cycle_eraser(&mut self) -> AnnotationMode {
        self.set_mode(self.mode.next_eraser());
        self.mode
    }

    pub fn set_stroke(&mut self, color: impl Into<SerializableColor>, width: f64) {
        self.stroke_color = color.into();
        if width.is_finite() && width > 0.0 {
            self.stroke_width = width;
        }
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Stroke currently being drawn, for live preview.
    pub fn drawing(&self) -> Option<&PathAnnotation> {
        self.drawing.as_ref()
    }

    pub fn pending_text(&self) -> Option<PendingText> {
        self.pending_text
    }

    pub fn load(&mut self, annotations: Vec<Annotation>) {
        self.annotations = annotations;
    }

    /// Handle pointer-down in world coordinates. Returns `true` if the annotation list changed.
    pub fn pointer_down(&mut self, point: Point) -> bool {
        match self.mode {
            AnnotationMode::Off => false,
            AnnotationMode::Pencil => {
                self.drawing = Some(PathAnnotation {
                    points: vec![point],
                    color: self.stroke_color,
                    width: self.stroke_width,
                });
                false
            }
            AnnotationMode::Text => {
                self.pending_text = Some(PendingText { position: point });
                false
            }
            AnnotationMode::Eraser(EraserMode::Pixel) => {
                self.erasing = true;
                self.erase_at(point)
            }
            // Single clicks do nothing; see `double_click`.
            AnnotationMode::Eraser(EraserMode::ClearAll) => false,
        }
    }

    /// Handle pointer-move. Returns `true` if the annotation list changed.
    pub fn pointer_move(&mut self, point: Point) -> bool {
        if let Some(path) = self.drawing.as_mut() {
            path.points.push(point);
            return false;
        }
        if self.erasing {
            return self.erase_at(point);
        }
        false
    }

    /// Handle pointer-up. A stroke is kept only if it has more than one point.
    pub fn pointer_up(&mut self) -> bool {
        self.erasing = false;
        match self.drawing.take() {
            Some(path) if path.points.len() > 1 => {
                self.annotations.push(Annotation::Path(path));
                true
            }
            _ => false,
        }
    }

    /// Clear every annotation when the clear-all eraser is active.
    pub fn double_click(&mut self) -> bool {
        if self.mode != AnnotationMode::Eraser(EraserMode::ClearAll) || self.annotations.is_empty() {
            return false;
        }
        log::debug!("Clearing {} annotations", self.annotations.len());
        self.annotations.clear();
        true
    }

    /// Commit the pending text input. Blank text cancels.
    pub fn commit_text(&mut self, text: &str) -> bool {
        let Some(pending) = self.pending_text.take() else {
            return false;
        };
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.annotations.push(Annotation::Text(TextAnnotation {
            x: pending.position.x,
            y: pending.position.y,
            text: text.to_string(),
            color: self.stroke_color,
            font_size: TEXT_FONT_SIZE,
        }));
        true
    }

    pub fn cancel_text(&mut self) {
        self.pending_text = None;
    }

    /// Drop the in-progress stroke and text input.
    pub fn cancel(&mut self) {
        self.drawing = None;
        self.pending_text = None;
        self.erasing = false;
    }

    fn erase_at(&mut self, point: Point) -> bool {
        let before = self.annotations.len();
        self.annotations.retain(|annotation| !annotation.erased_by(point));
        self.annotations.len() != before
    }
}
