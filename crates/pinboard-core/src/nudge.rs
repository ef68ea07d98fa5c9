//! Fluid nudging: pushes stationary items out from under moved items.
//!
//! Each pass checks every stationary item that has not moved yet against the
//! movers plus everything already pushed this frame, and pushes it along the
//! axis of least overlap. Pushed items become obstacles for the next pass, so
//! a push can ripple through a row of neighbours.

use crate::item::ItemId;
use kurbo::{Rect, Vec2};
use std::collections::BTreeMap;

/// Maximum number of passes per frame.
pub const MAX_NUDGE_ITERATIONS: usize = 5;

/// Result of a nudge pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NudgeOutcome {
    /// Final boxes of every displaced item, ascending id.
    pub displaced: BTreeMap<ItemId, Rect>,
    /// Number of passes that ran.
    pub iterations: usize,
    /// `false` when overlap remains between any pair of movers and stationary
    /// items once the passes stop, including pushed items landing on each other.
    pub settled: bool,
}

fn is_degenerate(rect: &Rect) -> bool {
    !(rect.width() > 0.0 && rect.height() > 0.0)
}

/// Overlap extents on both axes, if the boxes strictly overlap.
fn overlap(a: &Rect, b: &Rect) -> Option<(f64, f64)> {
    let ox = a.x1.min(b.x1) - a.x0.max(b.x0);
    let oy = a.y1.min(b.y1) - a.y0.max(b.y0);
    (ox > 0.0 && oy > 0.0).then_some((ox, oy))
}

/// Minimum translation that moves `item` off `obstacle`, and its length.
fn push_vector(item: &Rect, obstacle: &Rect) -> Option<(Vec2, f64)> {
    let (ox, oy) = overlap(item, obstacle)?;
    let away = |item_center: f64, obstacle_center: f64, amount: f64| {
        if item_center >= obstacle_center { amount } else { -amount }
    };
    let (ic, oc) = (item.center(), obstacle.center());
    if ox < oy {
        Some((Vec2::new(away(ic.x, oc.x, ox), 0.0), ox))
    } else {
        Some((Vec2::new(0.0, away(ic.y, oc.y, oy)), oy))
    }
}

/// Push `stationary` items off `movers`.
///
/// Degenerate boxes on either side are ignored. Residual overlap after
/// [`MAX_NUDGE_ITERATIONS`] passes is accepted.
pub fn resolve(movers: &[Rect], stationary: &[(ItemId, Rect)]) -> NudgeOutcome {
    let movers: Vec<Rect> = movers.iter().filter(|r| !is_degenerate(r)).copied().collect();
    let mut obstacles = movers.clone();
    let mut pending: BTreeMap<ItemId, Rect> = stationary
        .iter()
        .filter(|(_, r)| !is_degenerate(r))
        .copied()
        .collect();
    let mut outcome = NudgeOutcome::default();

    while outcome.iterations < MAX_NUDGE_ITERATIONS {
        outcome.iterations += 1;

        let mut pushes: Vec<(ItemId, Rect)> = Vec::new();
        for (&id, rect) in &pending {
            let mut best: Option<(Vec2, f64)> = None;
            for obstacle in &obstacles {
                if let Some((push, amount)) = push_vector(rect, obstacle) {
                    if best.is_none_or(|(_, best_amount)| amount < best_amount) {
                        best = Some((push, amount));
                    }
                }
            }
            if let Some((push, _)) = best {
                pushes.push((id, *rect + push));
            }
        }

        if pushes.is_empty() {
            break;
        }

        for (id, rect) in pushes {
            pending.remove(&id);
            obstacles.push(rect);
            outcome.displaced.insert(id, rect);
        }
    }

    let displaced = &outcome.displaced;
    let collides = |id: ItemId, rect: &Rect| {
        movers.iter().any(|mover| overlap(rect, mover).is_some())
            || displaced
                .iter()
                .any(|(&other, pushed)| other != id && overlap(rect, pushed).is_some())
    };
    let residual = pending
        .iter()
        .chain(displaced.iter())
        .any(|(&id, rect)| collides(id, rect));
    outcome.settled = !residual;
    if residual {
        log::debug!("Nudge stopped after {} passes with overlap remaining", outcome.iterations);
    }
    outcome
}
