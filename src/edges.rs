// SPDX-License-Identifier: GPL-2.0-only

//! The edge/snap engine (4.G): axis-aligned edge search across views and
//! outputs, resistance bands, snap-constraint memory, and placement
//! (least-overlap auto-placement).
//!
//! Grounded in `original_source/edges.h`/`edges.c`: `edge_get_best` and the
//! `decreasing` flag (10.6 supplement) are carried forward unchanged.

use smithay::utils::{Logical, Point, Rectangle, Size};

use crate::config::Edge;
use crate::view::ViewId;

/// A 1-D candidate snap line (spec.md §3 "Edge"). `None` encodes `±∞`
/// ("ignore").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeCandidate {
    pub offset: Option<i64>,
    pub min: i64,
    pub max: i64,
}

impl EdgeCandidate {
    pub fn unbounded() -> Self {
        Self {
            offset: None,
            min: i64::MIN,
            max: i64::MAX,
        }
    }

    pub fn bounded(offset: i64, min: i64, max: i64) -> Self {
        Self {
            offset: Some(offset),
            min,
            max,
        }
    }

    fn overlaps(&self, other_min: i64, other_max: i64) -> bool {
        self.min < other_max && other_min < self.max
    }
}

/// `edge_get_best` (original_source/edges.h, 10.6): prefers the tightest
/// bounded candidate; an unbounded `next` never replaces a bounded `best`.
/// `decreasing` flips which of two bounded candidates counts as "tighter"
/// (used when searching toward decreasing coordinates, e.g. the left/top
/// half-plane searches in `find_outputs`).
pub fn edge_get_best(best: Option<EdgeCandidate>, next: EdgeCandidate, decreasing: bool) -> Option<EdgeCandidate> {
    let next_offset = match next.offset {
        None => return best,
        Some(o) => o,
    };
    match best {
        None => Some(next),
        Some(current) => match current.offset {
            None => Some(next),
            Some(current_offset) => {
                let next_is_tighter = if decreasing {
                    next_offset > current_offset
                } else {
                    next_offset < current_offset
                };
                if next_is_tighter {
                    Some(next)
                } else {
                    Some(current)
                }
            }
        },
    }
}

/// A rectangle-as-4-edges view used by the neighbor/output searches.
#[derive(Debug, Clone, Copy)]
pub struct EdgeRect {
    pub left: i64,
    pub right: i64,
    pub top: i64,
    pub bottom: i64,
}

impl EdgeRect {
    pub fn from_rect(rect: Rectangle<i32, Logical>, margin: i32) -> Self {
        Self {
            left: (rect.loc.x - margin) as i64,
            right: (rect.loc.x + rect.size.w + margin) as i64,
            top: (rect.loc.y - margin) as i64,
            bottom: (rect.loc.y + rect.size.h + margin) as i64,
        }
    }
}

/// `find_neighbors` (4.G): the nearest edge among every other view on the
/// workspace, for the moving edge `side`, searching from `current` toward
/// `target`.
pub fn find_neighbors(
    side: Edge,
    current: i64,
    target: i64,
    neighbors: impl IntoIterator<Item = EdgeRect>,
) -> Option<EdgeCandidate> {
    let decreasing = target < current;
    let mut best = None;
    for rect in neighbors {
        let candidate = match side {
            Edge::Left | Edge::Right => {
                if !overlaps_axis(rect.top, rect.bottom, target.min(current), target.max(current)) {
                    continue;
                }
                EdgeCandidate::bounded(
                    if side == Edge::Left { rect.right } else { rect.left },
                    rect.top,
                    rect.bottom,
                )
            }
            Edge::Top | Edge::Bottom => {
                if !overlaps_axis(rect.left, rect.right, target.min(current), target.max(current)) {
                    continue;
                }
                EdgeCandidate::bounded(
                    if side == Edge::Top { rect.bottom } else { rect.top },
                    rect.left,
                    rect.right,
                )
            }
        };
        if between(candidate.offset.unwrap(), current, target) {
            best = edge_get_best(best, candidate, decreasing);
        }
    }
    best
}

fn overlaps_axis(a_min: i64, a_max: i64, b_min: i64, b_max: i64) -> bool {
    a_min < b_max && b_min < a_max
}

fn between(value: i64, a: i64, b: i64) -> bool {
    value >= a.min(b) && value <= a.max(b)
}

/// `find_outputs` (4.G): the four half-plane "don't leave the screen"
/// problems for one usable output rectangle.
pub fn find_outputs(usable: Rectangle<i32, Logical>) -> [EdgeCandidate; 4] {
    [
        EdgeCandidate::bounded(usable.loc.x as i64, i64::MIN, i64::MAX),
        EdgeCandidate::bounded((usable.loc.x + usable.size.w) as i64, i64::MIN, i64::MAX),
        EdgeCandidate::bounded(usable.loc.y as i64, i64::MIN, i64::MAX),
        EdgeCandidate::bounded((usable.loc.y + usable.size.h) as i64, i64::MIN, i64::MAX),
    ]
}

/// Clamp a proposed edge position against the resistance band around
/// `current_edge` (4.G "Resistance"): if the motion would cross the band
/// inward, the position is held at the band edge.
pub fn apply_resistance(current_edge: i64, proposed: i64, strength: i64) -> i64 {
    if strength <= 0 {
        return proposed;
    }
    let delta = proposed - current_edge;
    if delta.abs() < strength {
        current_edge
    } else {
        proposed
    }
}

/// Snap target chosen by the overlay (4.F "Snap overlay"/"Finish").
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnapTarget {
    Region(Rectangle<i32, Logical>),
    Edge(Edge),
}

/// Snap-constraint memory (spec.md §3 "Snap-constraint record").
#[derive(Debug, Clone)]
pub struct SnapConstraint {
    pub view: ViewId,
    pub direction: Edge,
    pub expected_geom: Rectangle<i32, Logical>,
    pub pending: bool,
}

#[derive(Debug, Default)]
pub struct SnapConstraintMemory {
    record: Option<SnapConstraint>,
}

impl SnapConstraintMemory {
    pub fn new() -> Self {
        Self { record: None }
    }

    pub fn record(&mut self, view: ViewId, direction: Edge, expected_geom: Rectangle<i32, Logical>) {
        self.record = Some(SnapConstraint {
            view,
            direction,
            expected_geom,
            pending: true,
        });
    }

    /// Called when the client's committed geometry differs from the last
    /// snap's `expected_geom`: updates the record once so it matches
    /// reality, per spec.md §4.G.
    pub fn reconcile_client_override(&mut self, view: ViewId, actual_geom: Rectangle<i32, Logical>) {
        if let Some(record) = &mut self.record {
            if record.view == view && record.pending && record.expected_geom != actual_geom {
                record.expected_geom = actual_geom;
                record.pending = false;
            }
        }
    }

    /// If a subsequent snap attempt in the same direction finds
    /// `view.pending == expected_geom`, override the effective geometry so
    /// sticky-edge progress can continue (spec.md §4.G).
    pub fn effective_target(&self, view: ViewId, direction: Edge, view_pending: Rectangle<i32, Logical>, unconstrained_target: Rectangle<i32, Logical>) -> Rectangle<i32, Logical> {
        match &self.record {
            Some(record) if record.view == view && record.direction == direction && record.expected_geom == view_pending => {
                unconstrained_target
            }
            _ => view_pending,
        }
    }

    pub fn clear_for(&mut self, view: ViewId) {
        if matches!(&self.record, Some(r) if r.view == view) {
            self.record = None;
        }
    }

    pub fn clear_on_direction_change(&mut self, view: ViewId, direction: Edge) {
        if matches!(&self.record, Some(r) if r.view == view && r.direction != direction) {
            self.record = None;
        }
    }
}

/// Input to `placement_find_best`: another view's occupied rectangle on
/// the same output.
#[derive(Debug, Clone, Copy)]
pub struct Occupant {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

/// `placement_find_best` (4.G "Placement"): build a non-uniform grid from
/// every occupant's edges plus the output bounds, score each interval ×
/// extension-direction combination by overlap, and return the
/// minimum-overlap top-left placement for a `width × height` window.
/// Ties are broken by search order (occupant-edge order, then direction
/// order `[right-down, right-up, left-down, left-up]`).
pub fn placement_find_best(
    usable: Rectangle<i32, Logical>,
    width: i32,
    height: i32,
    occupants: &[Occupant],
) -> Point<i32, Logical> {
    let mut x_lines: Vec<i32> = occupants
        .iter()
        .flat_map(|o| [o.left, o.right])
        .chain([usable.loc.x, usable.loc.x + usable.size.w])
        .collect();
    x_lines.sort_unstable();
    x_lines.dedup();

    let mut y_lines: Vec<i32> = occupants
        .iter()
        .flat_map(|o| [o.top, o.bottom])
        .chain([usable.loc.y, usable.loc.y + usable.size.h])
        .collect();
    y_lines.sort_unstable();
    y_lines.dedup();

    let directions: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

    let mut best_point = Point::from((usable.loc.x, usable.loc.y));
    let mut best_overlap = i64::MAX;

    for &x in &x_lines {
        for &y in &y_lines {
            for &(dx, dy) in &directions {
                let left = if dx > 0 { x } else { x - width };
                let top = if dy > 0 { y } else { y - height };
                let candidate = Rectangle::new(Point::from((left, top)), Size::from((width, height)));

                let leaves_output = left < usable.loc.x
                    || top < usable.loc.y
                    || left + width > usable.loc.x + usable.size.w
                    || top + height > usable.loc.y + usable.size.h;

                let overlap: i64 = if leaves_output {
                    i64::MAX
                } else {
                    occupants
                        .iter()
                        .map(|o| overlap_area(candidate, *o))
                        .sum()
                };

                if overlap < best_overlap {
                    best_overlap = overlap;
                    best_point = candidate.loc;
                }
                if best_overlap == 0 {
                    return best_point;
                }
            }
        }
    }

    best_point
}

fn overlap_area(rect: Rectangle<i32, Logical>, occupant: Occupant) -> i64 {
    let ox = (rect.loc.x.max(occupant.left)) as i64;
    let oy = (rect.loc.y.max(occupant.top)) as i64;
    let ex = ((rect.loc.x + rect.size.w).min(occupant.right)) as i64;
    let ey = ((rect.loc.y + rect.size.h).min(occupant.bottom)) as i64;
    if ex > ox && ey > oy {
        (ex - ox) * (ey - oy)
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: i32, y: i32, w: i32, h: i32) -> Rectangle<i32, Logical> {
        Rectangle::new(Point::from((x, y)), Size::from((w, h)))
    }

    #[test]
    fn edge_get_best_prefers_bounded_over_unbounded() {
        let bounded = EdgeCandidate::bounded(100, 0, 200);
        let result = edge_get_best(None, EdgeCandidate::unbounded(), false);
        assert_eq!(result, None);
        let result = edge_get_best(result, bounded, false);
        assert_eq!(result, Some(bounded));
    }

    #[test]
    fn edge_get_best_picks_tighter_candidate_increasing() {
        let a = EdgeCandidate::bounded(100, 0, 50);
        let b = EdgeCandidate::bounded(80, 0, 50);
        let result = edge_get_best(Some(a), b, false);
        assert_eq!(result, Some(b), "smaller offset is tighter when not decreasing");
    }

    #[test]
    fn edge_get_best_picks_tighter_candidate_decreasing() {
        let a = EdgeCandidate::bounded(100, 0, 50);
        let b = EdgeCandidate::bounded(120, 0, 50);
        let result = edge_get_best(Some(a), b, true);
        assert_eq!(result, Some(b), "larger offset is tighter when decreasing");
    }

    #[test]
    fn resistance_holds_position_within_band() {
        assert_eq!(apply_resistance(100, 105, 20), 100);
        assert_eq!(apply_resistance(100, 130, 20), 130);
    }

    #[test]
    fn snap_constraint_reconciles_once_then_stops() {
        let mut mem = SnapConstraintMemory::new();
        mem.record(ViewId(1), Edge::Left, rect(0, 0, 400, 300));
        mem.reconcile_client_override(ViewId(1), rect(10, 0, 390, 300));
        assert_eq!(mem.record.as_ref().unwrap().expected_geom, rect(10, 0, 390, 300));
        assert!(!mem.record.as_ref().unwrap().pending);
    }

    #[test]
    fn snap_constraint_allows_sticky_progress() {
        let mut mem = SnapConstraintMemory::new();
        mem.record(ViewId(1), Edge::Left, rect(0, 0, 400, 300));
        let unconstrained = rect(0, 0, 500, 300);
        let effective = mem.effective_target(ViewId(1), Edge::Left, rect(0, 0, 400, 300), unconstrained);
        assert_eq!(effective, unconstrained);
    }

    #[test]
    fn placement_picks_zero_overlap_interval() {
        let usable = rect(0, 0, 1000, 1000);
        let occupant = Occupant {
            left: 0,
            right: 500,
            top: 0,
            bottom: 1000,
        };
        let point = placement_find_best(usable, 400, 400, &[occupant]);
        assert!(point.x >= 500, "should place clear of the occupant: {point:?}");
    }

    #[test]
    fn placement_never_leaves_the_output() {
        let usable = rect(0, 0, 500, 500);
        let point = placement_find_best(usable, 400, 400, &[]);
        assert!(point.x >= 0 && point.x + 400 <= 500);
        assert!(point.y >= 0 && point.y + 400 <= 500);
    }
}
