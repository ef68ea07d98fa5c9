//! Drag sessions for single items and multi-item groups.

use crate::item::{Geometry, ItemId, ItemStore};
use crate::nudge::{self, NudgeOutcome};
use crate::selection::Selection;
use crate::snap::{self, SnapOptions, SnapResult};
use kurbo::{Point, Rect, Size, Vec2};
use std::collections::BTreeMap;

/// What is being dragged.
#[derive(Debug, Clone, PartialEq)]
pub enum DragTarget {
    /// One item; the pointer offset is measured from its top-left.
    Single { id: ItemId },
    /// Several selected items moved as one box.
    Group {
        /// Size of the members' union box at drag start.
        size: Size,
        /// Each member's top-left relative to the group box origin.
        offsets: BTreeMap<ItemId, Vec2>,
    },
}

/// Output of one drag move.
#[derive(Debug, Clone, Default)]
pub struct DragFrame {
    /// Geometry to commit, movers first then displaced items.
    pub batch: Vec<(ItemId, Geometry)>,
    /// Snap outcome for the moving box, if anything moved.
    pub snap: Option<SnapResult>,
    /// Nudge outcome when nudging ran.
    pub nudge: Option<NudgeOutcome>,
}

/// An in-flight drag.
#[derive(Debug, Clone)]
pub struct DragSession {
    pub target: DragTarget,
    /// Pointer position relative to the dragged box origin (world units).
    pub pointer_offset: Vec2,
    /// Geometry of every item touched so far, as it was before the drag.
    original: BTreeMap<ItemId, Geometry>,
}

impl DragSession {
    /// Start dragging `id` from `pointer` (world coordinates).
    ///
    /// A multi-item selection containing `id` drags as a group. Otherwise the
    /// selection is replaced by `id` and the item drags alone. Returns `None`
    /// for unknown ids.
    pub fn begin(store: &ItemStore, selection: &mut Selection, id: ItemId, pointer: Point) -> Option<Self> {
        let item = store.get(id)?;

        if selection.is_multi() && selection.contains(id) {
            let members: Vec<(ItemId, Geometry)> = selection
                .iter()
                .filter_map(|member| store.get(member).map(|item| (member, item.geometry())))
                .collect();
            let bounds = members
                .iter()
                .map(|(_, geometry)| geometry.bounds())
                .reduce(|acc, bounds| acc.union(bounds))?;
            let origin = bounds.origin();
            let offsets = members
                .iter()
                .map(|(member, geometry)| (*member, Point::new(geometry.x, geometry.y) - origin))
                .collect();
            log::debug!("Group drag started with {} items", members.len());
            return Some(Self {
                target: DragTarget::Group { size: bounds.size(), offsets },
                pointer_offset: pointer - origin,
                original: members.into_iter().collect(),
            });
        }

        if !selection.contains(id) {
            selection.select_only(id);
        }
        let geometry = item.geometry();
        log::debug!("Drag started for item {}", id);
        Some(Self {
            target: DragTarget::Single { id },
            pointer_offset: pointer - Point::new(geometry.x, geometry.y),
            original: BTreeMap::from([(id, geometry)]),
        })
    }

    /// Ids moved directly by the pointer.
    pub fn ids(&self) -> Vec<ItemId> {
        match &self.target {
            DragTarget::Single { id } => vec![*id],
            DragTarget::Group { offsets, .. } => offsets.keys().copied().collect(),
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.target, DragTarget::Group { .. })
    }

    /// Compute the geometry for a pointer move: snap, then nudge when enabled.
    pub fn update(&mut self, store: &ItemStore, pointer: Point, options: &SnapOptions, nudging: bool) -> DragFrame {
        let movers: Vec<(ItemId, Geometry)> = match &self.target {
            DragTarget::Single { id } => match store.get(*id) {
                Some(item) => vec![(*id, item.geometry())],
                None => Vec::new(),
            },
            DragTarget::Group { offsets, .. } => offsets
                .keys()
                .filter_map(|member| store.get(*member).map(|item| (*member, item.geometry())))
                .collect(),
        };
        if movers.is_empty() {
            log::trace!("Drag move ignored: dragged items were removed");
            return DragFrame::default();
        }

        let moving_size = match &self.target {
            DragTarget::Single { .. } => Size::new(movers[0].1.width, movers[0].1.height),
            DragTarget::Group { size, .. } => *size,
        };
        let candidate = Rect::from_origin_size(pointer - self.pointer_offset, moving_size);
        let moving_ids = self.ids();
        let statics: Vec<(ItemId, Rect)> = store
            .items()
            .filter(|item| !moving_ids.contains(&item.id))
            .map(|item| (item.id, item.bounds()))
            .collect();
        let snapped = snap::resolve(candidate, &statics, options);

        let mut batch: Vec<(ItemId, Geometry)> = movers
            .into_iter()
            .map(|(id, geometry)| {
                let origin = match &self.target {
                    DragTarget::Single { .. } => snapped.point,
                    DragTarget::Group { offsets, .. } => {
                        snapped.point + offsets.get(&id).copied().unwrap_or_default()
                    }
                };
                (id, geometry.with_origin(origin))
            })
            .collect();

        let mut frame = DragFrame {
            snap: Some(snapped),
            ..DragFrame::default()
        };

        if nudging {
            let mover_boxes: Vec<Rect> = batch.iter().map(|(_, geometry)| geometry.bounds()).collect();
            let outcome = nudge::resolve(&mover_boxes, &statics);
            for (&id, rect) in &outcome.displaced {
                if let Some(item) = store.get(id) {
                    let geometry = item.geometry();
                    self.original.entry(id).or_insert(geometry);
                    batch.push((id, geometry.with_origin(rect.origin())));
                }
            }
            frame.nudge = Some(outcome);
        }

        frame.batch = batch;
        frame
    }

    /// Geometry that undoes every change made during the drag, for items still present.
    pub fn cancel(&self, store: &ItemStore) -> Vec<(ItemId, Geometry)> {
        log::debug!("Drag cancelled");
        self.original
            .iter()
            .filter(|(id, _)| store.contains(**id))
            .map(|(id, geometry)| (*id, *geometry))
            .collect()
    }
}
