//! Board: the canvas facade hosts talk to.
//!
//! A [`Board`] owns the item store, selection, viewport, annotations and the
//! single active gesture session. Every entry point takes screen-space input
//! and returns the notifications the host should react to.

use crate::annotation::{Annotation, AnnotationLayer, AnnotationMode, SerializableColor};
use crate::camera::Viewport;
use crate::commit::{GeometryCommit, ImmediateCommit};
use crate::config::{CanvasConfig, ConfigError};
use crate::connection::{self, Connection};
use crate::drag::DragSession;
use crate::input::{ClickTracker, PointerInput};
use crate::item::{Geometry, Item, ItemError, ItemId, ItemStore};
use crate::selection::{Corner, HANDLE_HIT_TOLERANCE, HandleKind, Selection, hit_test_handles};
use crate::snap::{SnapOptions, SnapResult};
use crate::transform::{self, ResizeSession, RotateSession};
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Notification for the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum BoardEvent {
    /// Items whose stored state changed.
    ItemsChanged(Vec<Item>),
    /// Items that left the board.
    ItemsRemoved(Vec<ItemId>),
    /// The full selection after a change.
    SelectionChanged(Vec<ItemId>),
    /// The full annotation list after a change.
    AnnotationsChanged(Vec<Annotation>),
}

/// The active gesture. At most one exists at a time.
#[derive(Debug, Clone, Default)]
pub enum Session {
    #[default]
    Idle,
    Drag(DragSession),
    Resize(ResizeSession),
    Rotate(RotateSession),
}

impl Session {
    pub fn is_idle(&self) -> bool {
        matches!(self, Session::Idle)
    }
}

pub struct Board {
    store: ItemStore,
    selection: Selection,
    viewport: Viewport,
    config: CanvasConfig,
    annotations: AnnotationLayer,
    session: Session,
    clicks: ClickTracker,
    committer: Box<dyn GeometryCommit>,
    /// Snap outcome of the last drag move, for alignment guides.
    last_snap: Option<SnapResult>,
}

impl Board {
    /// Create a board that commits geometry immediately.
    pub fn new(config: CanvasConfig) -> Result<Self, ConfigError> {
        Self::with_commit(config, Box::new(ImmediateCommit))
    }

    /// Create a board with a custom commit strategy.
    pub fn with_commit(config: CanvasConfig, committer: Box<dyn GeometryCommit>) -> Result<Self, ConfigError> {
        config.validate()?;
        let viewport = Viewport::with_limits(config.zoom_range[0], config.zoom_range[1], config.zoom_step);
        Ok(Self {
            store: ItemStore::new(),
            selection: Selection::new(),
            viewport,
            config,
            annotations: AnnotationLayer::new(),
            session: Session::Idle,
            clicks: ClickTracker::new(),
            committer,
            last_snap: None,
        })
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn annotations(&self) -> &AnnotationLayer {
        &self.annotations
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Snap outcome of the current drag, if any.
    pub fn snap_guides(&self) -> Option<&SnapResult> {
        self.last_snap.as_ref()
    }

    /// Replace the configuration. Zoom limits apply to the viewport right away.
    pub fn set_config(&mut self, config: CanvasConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let [min, max] = config.zoom_range;
        self.viewport.min_zoom = min;
        self.viewport.max_zoom = max;
        self.viewport.zoom_step = config.zoom_step;
        let zoom = self.viewport.zoom;
        self.viewport.set_zoom(zoom, self.viewport.container_origin);
        self.config = config;
        Ok(())
    }

    // --- Items ---

    /// Replace every item. Active gestures end and the selection is pruned.
    pub fn load_items(&mut self, items: Vec<Item>) -> Result<Vec<BoardEvent>, ItemError> {
        self.store.load(items)?;
        self.session = Session::Idle;
        self.last_snap = None;
        log::info!("Loaded {} items", self.store.len());

        let mut events = vec![BoardEvent::ItemsChanged(self.store.to_vec())];
        if self.selection.prune(&self.store) {
            events.push(self.selection_event());
        }
        Ok(events)
    }

    pub fn insert_item(&mut self, item: Item) -> Result<Vec<BoardEvent>, ItemError> {
        let id = item.id;
        self.store.insert(item)?;
        Ok(self.items_event(&[id]).into_iter().collect())
    }

    /// Remove an item. In-flight gestures skip it from now on.
    pub fn remove_item(&mut self, id: ItemId) -> Vec<BoardEvent> {
        if self.store.remove(id).is_none() {
            return Vec::new();
        }
        let mut events = vec![BoardEvent::ItemsRemoved(vec![id])];
        if self.selection.prune(&self.store) {
            events.push(self.selection_event());
        }
        events
    }

    /// Size an item from its media's natural dimensions.
    pub fn apply_natural_size(&mut self, id: ItemId, width: f64, height: f64) -> Vec<BoardEvent> {
        if self.store.apply_natural_size(id, width, height) {
            self.items_event(&[id]).into_iter().collect()
        } else {
            Vec::new()
        }
    }

    pub fn bring_to_front(&mut self, id: ItemId) -> Vec<BoardEvent> {
        if self.store.bring_to_front(id) {
            self.items_event(&[id]).into_iter().collect()
        } else {
            Vec::new()
        }
    }

    pub fn send_to_back(&mut self, id: ItemId) -> Vec<BoardEvent> {
        if self.store.send_to_back(id) {
            self.items_event(&[id]).into_iter().collect()
        } else {
            Vec::new()
        }
    }

    /// Touching item pairs, leaving out items being dragged.
    pub fn connections(&self) -> Vec<Connection> {
        let excluded = match &self.session {
            Session::Drag(drag) => drag.ids(),
            _ => Vec::new(),
        };
        connection::compute(&self.store, &excluded)
    }

    // --- Selection ---

    pub fn select_only(&mut self, id: ItemId) -> Vec<BoardEvent> {
        if self.store.contains(id) && self.selection.select_only(id) {
            vec![self.selection_event()]
        } else {
            Vec::new()
        }
    }

    pub fn toggle_selection(&mut self, id: ItemId) -> Vec<BoardEvent> {
        if !self.store.contains(id) {
            return Vec::new();
        }
        self.selection.toggle(id);
        vec![self.selection_event()]
    }

    pub fn select_all(&mut self) -> Vec<BoardEvent> {
        if self.selection.select_all(&self.store) {
            vec![self.selection_event()]
        } else {
            Vec::new()
        }
    }

    pub fn clear_selection(&mut self) -> Vec<BoardEvent> {
        if self.selection.clear() {
            vec![self.selection_event()]
        } else {
            Vec::new()
        }
    }

    // --- Viewport ---

    /// Zoom by one wheel tick around a screen point.
    pub fn wheel(&mut self, delta_y: f64, anchor: Point) -> bool {
        self.viewport.wheel(delta_y, anchor)
    }

    pub fn set_zoom(&mut self, zoom: f64, anchor: Point) -> bool {
        self.viewport.set_zoom(zoom, anchor)
    }

    pub fn pan(&mut self, screen_delta: Vec2) {
        self.viewport.pan(screen_delta);
    }

    pub fn set_container_origin(&mut self, origin: Point) {
        self.viewport.container_origin = origin;
    }

    /// Fit every item into a viewport of the given size.
    pub fn zoom_to_fit(&mut self, viewport_size: Size, padding: f64) {
        if let Some(bounds) = self.store.bounds() {
            self.viewport.fit_to_bounds(bounds, viewport_size, padding);
        }
    }

    /// World-space rectangle visible in a viewport of the given size.
    pub fn visible_world_rect(&self, viewport_size: Size) -> Rect {
        let origin = self.viewport.container_origin;
        let top_left = self.viewport.world_from_screen(origin);
        let bottom_right = self.viewport.world_from_screen(origin + viewport_size.to_vec2());
        Rect::from_points(top_left, bottom_right)
    }

    // --- Annotations ---

    /// Switch annotation tools. Turning a tool on ends any drag, resize or
    /// rotate in progress, keeping the geometry it reached.
    pub fn set_annotation_mode(&mut self, mode: AnnotationMode) -> Vec<BoardEvent> {
        let events = if mode.is_active() { self.end_session() } else { Vec::new() };
        self.annotations.set_mode(mode);
        events
    }

    /// Advance the eraser button cycle. Read the new mode from [`AnnotationLayer::mode`].
    pub fn cycle_eraser(&mut self) -> Vec<BoardEvent> {
        self.set_annotation_mode(self.annotations.mode().next_eraser())
    }

    pub fn set_stroke(&mut self, color: impl Into<SerializableColor>, width: f64) {
        self.annotations.set_stroke(color, width);
    }

    pub fn commit_text(&mut self, text: &str) -> Vec<BoardEvent> {
        let changed = self.annotations.commit_text(text);
        self.annotation_events(changed)
    }

    pub fn cancel_text(&mut self) {
        self.annotations.cancel_text();
    }

    pub fn load_annotations(&mut self, annotations: Vec<Annotation>) -> Vec<BoardEvent> {
        self.annotations.load(annotations);
        self.annotation_events(true)
    }

    // --- Gestures ---

    /// Pointer pressed. Annotation tools take precedence, then handles of
    /// selected items, then items front to back; empty canvas clears the selection.
    pub fn pointer_down(&mut self, input: &PointerInput) -> Vec<BoardEvent> {
        let mut events = Vec::new();
        if !self.session.is_idle() {
            events.extend(self.pointer_up(input));
        }

        let world = self.viewport.world_from_screen(input.position);
        let double = self.clicks.register(input);

        if self.annotations.mode().is_active() {
            if double {
                events.extend(self.double_click(input));
            }
            let changed = self.annotations.pointer_down(world);
            events.extend(self.annotation_events(changed));
            return events;
        }

        if let Some((id, handle)) = self.handle_at(world) {
            match handle {
                HandleKind::Corner(corner) => events.extend(self.begin_resize(id, corner, input)),
                HandleKind::Rotate => events.extend(self.begin_rotate(id, input)),
            }
            return events;
        }

        match self.store.items_at_point(world).first().copied() {
            Some(id) if input.modifiers.command() => {
                events.extend(self.toggle_selection(id));
            }
            Some(id) => events.extend(self.begin_drag(id, input)),
            None => events.extend(self.clear_selection()),
        }
        events
    }

    /// Pointer moved. Drives the active annotation tool or gesture session.
    pub fn pointer_move(&mut self, input: &PointerInput) -> Vec<BoardEvent> {
        let world = self.viewport.world_from_screen(input.position);

        if self.annotations.mode().is_active() {
            let changed = self.annotations.pointer_move(world);
            return self.annotation_events(changed);
        }

        let batch = match &mut self.session {
            Session::Idle => return Vec::new(),
            Session::Drag(drag) => {
                let options = SnapOptions::from(&self.config);
                let frame = drag.update(&self.store, world, &options, self.config.fluid_nudging());
                self.last_snap = frame.snap;
                frame.batch
            }
            Session::Resize(resize) => resize.update(&self.store, world, input.modifiers.shift),
            Session::Rotate(rotate) => rotate.update(&self.store, world, input.modifiers.shift),
        };
        self.commit(&batch)
    }

    /// Pointer released. Ends the active stroke or gesture session.
    pub fn pointer_up(&mut self, _input: &PointerInput) -> Vec<BoardEvent> {
        let changed = self.annotations.pointer_up();
        let mut events = self.annotation_events(changed);
        events.extend(self.end_session());
        events
    }

    /// Pointer left the canvas; same as releasing it.
    pub fn pointer_leave(&mut self, input: &PointerInput) -> Vec<BoardEvent> {
        self.pointer_up(input)
    }

    /// Explicit double-click. Clears every annotation in clear-all eraser mode.
    pub fn double_click(&mut self, _input: &PointerInput) -> Vec<BoardEvent> {
        let changed = self.annotations.double_click();
        self.annotation_events(changed)
    }

    /// Abort the active gesture, restoring the geometry it started from.
    pub fn cancel_gesture(&mut self) -> Vec<BoardEvent> {
        self.annotations.cancel();
        self.last_snap = None;
        let batch = match std::mem::take(&mut self.session) {
            Session::Idle => return Vec::new(),
            Session::Drag(drag) => drag.cancel(&self.store),
            Session::Resize(resize) => resize.cancel(&self.store),
            Session::Rotate(rotate) => rotate.cancel(&self.store),
        };
        self.commit(&batch)
    }

    /// Start dragging an item from a screen position.
    pub fn begin_drag(&mut self, id: ItemId, input: &PointerInput) -> Vec<BoardEvent> {
        let world = self.viewport.world_from_screen(input.position);
        let before = self.selection.clone();
        let Some(drag) = DragSession::begin(&self.store, &mut self.selection, id, world) else {
            log::trace!("Drag ignored for unknown item {}", id);
            return Vec::new();
        };
        self.session = Session::Drag(drag);
        self.selection_events_since(&before)
    }

    /// Start resizing from a corner. A multi-selection containing `id` resizes together.
    pub fn begin_resize(&mut self, id: ItemId, corner: Corner, input: &PointerInput) -> Vec<BoardEvent> {
        let world = self.viewport.world_from_screen(input.position);
        let (targets, events) = self.transform_targets(id);
        match ResizeSession::begin(&self.store, &targets, corner, world, self.config.lock_aspect_ratio) {
            Some(resize) => self.session = Session::Resize(resize),
            None => log::trace!("Resize ignored for unknown item {}", id),
        }
        events
    }

    /// Start rotating around the center of `id`. A multi-selection rotates together.
    pub fn begin_rotate(&mut self, id: ItemId, input: &PointerInput) -> Vec<BoardEvent> {
        let world = self.viewport.world_from_screen(input.position);
        let (targets, events) = self.transform_targets(id);
        let increment = self.config.rotation_snap_increment;
        match RotateSession::begin(&self.store, id, &targets, world, increment) {
            Some(rotate) => self.session = Session::Rotate(rotate),
            None => log::trace!("Rotate ignored for unknown item {}", id),
        }
        events
    }

    /// Turn every selected item a quarter turn around its own center.
    pub fn rotate_selected_90(&mut self) -> Vec<BoardEvent> {
        let batch = transform::rotate_90(&self.store, &self.selection.to_vec());
        self.commit(&batch)
    }

    // --- Internals ---

    /// Close the active gesture session, keeping its current geometry.
    fn end_session(&mut self) -> Vec<BoardEvent> {
        self.last_snap = None;
        match std::mem::take(&mut self.session) {
            Session::Idle => Vec::new(),
            Session::Drag(_) => {
                log::debug!("Drag ended");
                Vec::new()
            }
            Session::Rotate(_) => {
                log::debug!("Rotate ended");
                Vec::new()
            }
            Session::Resize(resize) => {
                resize.finish(&mut self.store);
                self.items_event(&resize.ids()).into_iter().collect()
            }
        }
    }

    fn commit(&mut self, batch: &[(ItemId, Geometry)]) -> Vec<BoardEvent> {
        if batch.is_empty() {
            return Vec::new();
        }
        let changed = self.committer.commit(&mut self.store, batch);
        self.items_event(&changed).into_iter().collect()
    }

    fn items_event(&self, ids: &[ItemId]) -> Option<BoardEvent> {
        let items: Vec<Item> = ids.iter().filter_map(|id| self.store.get(*id)).cloned().collect();
        (!items.is_empty()).then_some(BoardEvent::ItemsChanged(items))
    }

    fn selection_event(&self) -> BoardEvent {
        BoardEvent::SelectionChanged(self.selection.to_vec())
    }

    fn selection_events_since(&self, before: &Selection) -> Vec<BoardEvent> {
        if *before == self.selection {
            Vec::new()
        } else {
            vec![self.selection_event()]
        }
    }

    fn annotation_events(&self, changed: bool) -> Vec<BoardEvent> {
        if changed {
            vec![BoardEvent::AnnotationsChanged(self.annotations.annotations().to_vec())]
        } else {
            Vec::new()
        }
    }

    /// Select `id` if needed and return every item a transform on it applies to.
    fn transform_targets(&mut self, id: ItemId) -> (Vec<ItemId>, Vec<BoardEvent>) {
        let events = if self.store.contains(id) && !self.selection.contains(id) {
            self.selection.select_only(id);
            vec![self.selection_event()]
        } else {
            Vec::new()
        };
        let targets = if self.selection.is_multi() && self.selection.contains(id) {
            self.selection.to_vec()
        } else {
            vec![id]
        };
        (targets, events)
    }

    /// Topmost handle of a selected item under a world point.
    fn handle_at(&self, world: Point) -> Option<(ItemId, HandleKind)> {
        let tolerance = self.viewport.screen_to_world_len(HANDLE_HIT_TOLERANCE);
        self.store
            .items_by_z()
            .into_iter()
            .rev()
            .filter(|item| self.selection.contains(item.id))
            .find_map(|item| hit_test_handles(item, world, tolerance).map(|handle| (item.id, handle)))
    }
}
