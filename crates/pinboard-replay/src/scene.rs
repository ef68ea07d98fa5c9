//! Scripted scenes: a starting board plus a list of host calls to replay.

use kurbo::{Point, Vec2};
use pinboard_core::{
    Annotation, AnnotationMode, Board, BoardEvent, CanvasConfig, Connection, Item, ItemId, PointerInput,
    SerializableColor,
};
use serde::{Deserialize, Serialize};

/// One host call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Step {
    PointerDown(PointerInput),
    PointerMove(PointerInput),
    PointerUp(PointerInput),
    PointerLeave(PointerInput),
    DoubleClick(PointerInput),
    Cancel,
    #[serde(rename_all = "camelCase")]
    Wheel { delta_y: f64, anchor: Point },
    Pan { dx: f64, dy: f64 },
    SelectAll,
    ClearSelection,
    RotateSelected90,
    SetAnnotationMode { mode: AnnotationMode },
    CycleEraser,
    SetStroke { color: SerializableColor, width: f64 },
    CommitText { text: String },
    RemoveItem { id: ItemId },
    NaturalSize { id: ItemId, width: f64, height: f64 },
    BringToFront { id: ItemId },
    SendToBack { id: ItemId },
}

/// A scene file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub config: CanvasConfig,
    pub items: Vec<Item>,
    pub annotations: Vec<Annotation>,
    pub steps: Vec<Step>,
}

/// Board state after a replay.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub items: Vec<Item>,
    pub selection: Vec<ItemId>,
    pub annotations: Vec<Annotation>,
    pub connections: Vec<Connection>,
    pub zoom: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<BoardEvent>>,
}

/// Apply one step, returning the notifications it produced.
pub fn apply(board: &mut Board, step: &Step) -> Vec<BoardEvent> {
    match step {
        Step::PointerDown(input) => board.pointer_down(input),
        Step::PointerMove(input) => board.pointer_move(input),
        Step::PointerUp(input) => board.pointer_up(input),
        Step::PointerLeave(input) => board.pointer_leave(input),
        Step::DoubleClick(input) => board.double_click(input),
        Step::Cancel => board.cancel_gesture(),
        Step::Wheel { delta_y, anchor } => {
            board.wheel(*delta_y, *anchor);
            Vec::new()
        }
        Step::Pan { dx, dy } => {
            board.pan(Vec2::new(*dx, *dy));
            Vec::new()
        }
        Step::SelectAll => board.select_all(),
        Step::ClearSelection => board.clear_selection(),
        Step::RotateSelected90 => board.rotate_selected_90(),
        Step::SetAnnotationMode { mode } => board.set_annotation_mode(*mode),
        Step::CycleEraser => {
            let events = board.cycle_eraser();
            log::debug!("Eraser mode now {:?}", board.annotations().mode());
            events
        }
        Step::SetStroke { color, width } => {
            board.set_stroke(*color, *width);
            Vec::new()
        }
        Step::CommitText { text } => board.commit_text(text),
        Step::RemoveItem { id } => board.remove_item(*id),
        Step::NaturalSize { id, width, height } => board.apply_natural_size(*id, *width, *height),
        Step::BringToFront { id } => board.bring_to_front(*id),
        Step::SendToBack { id } => board.send_to_back(*id),
    }
}

/// Build a board from the scene and run every step.
pub fn replay(scene: Scene, keep_events: bool) -> Result<ReplayReport, crate::ReplayError> {
    let mut board = Board::new(scene.config)?;
    board.load_items(scene.items)?;
    if !scene.annotations.is_empty() {
        board.load_annotations(scene.annotations);
    }

    let mut events = Vec::new();
    for (index, step) in scene.steps.iter().enumerate() {
        let produced = apply(&mut board, step);
        log::debug!("Step {} ({:?}) produced {} events", index, step, produced.len());
        if keep_events {
            events.extend(produced);
        }
    }
    log::info!("Replayed {} steps", scene.steps.len());

    Ok(ReplayReport {
        items: board.store().to_vec(),
        selection: board.selection().to_vec(),
        annotations: board.annotations().annotations().to_vec(),
        connections: board.connections(),
        zoom: board.viewport().zoom,
        events: keep_events.then_some(events),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = include_str!("../scenes/snap-and-nudge.json");

    #[test]
    fn test_sample_scene_parses_and_replays() {
        let scene: Scene = serde_json::from_str(SAMPLE).unwrap();
        assert!(!scene.steps.is_empty());
        let report = replay(scene, true).unwrap();

        // The dragged card lands flush against the first card
        let dragged = report.items.iter().find(|item| item.content_ref.as_str() == "photo-b").unwrap();
        assert!((dragged.x - 100.0).abs() < 1e-9);
        assert!(report.connections.iter().any(|c| c.involves(dragged.id)));
        assert_eq!(report.annotations.len(), 1);
        assert!(report.events.is_some_and(|events| !events.is_empty()));
    }

    #[test]
    fn test_step_json_shape() {
        let step: Step = serde_json::from_str(
            r#"{"op": "pointerDown", "position": {"x": 1.0, "y": 2.0}, "modifiers": {"shift": true}}"#,
        )
        .unwrap();
        assert!(matches!(step, Step::PointerDown(input) if input.modifiers.shift));

        let step: Step = serde_json::from_str(r#"{"op": "wheel", "deltaY": -1, "anchor": {"x": 0, "y": 0}}"#).unwrap();
        assert!(matches!(step, Step::Wheel { delta_y, .. } if delta_y < 0.0));

        let step: Step = serde_json::from_str(r#"{"op": "setAnnotationMode", "mode": {"Eraser": "Pixel"}}"#).unwrap();
        assert!(matches!(step, Step::SetAnnotationMode { .. }));
    }

    #[test]
    fn test_invalid_config_fails() {
        let scene: Scene = serde_json::from_str(r#"{"config": {"snapDistance": 40}}"#).unwrap();
        assert!(matches!(replay(scene, false), Err(crate::ReplayError::Config(_))));
    }
}
