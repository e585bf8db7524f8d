// SPDX-License-Identifier: GPL-2.0-only

//! The interactive move/resize state machine (4.F): grab-box anchoring,
//! snap-preview timing, and the untile-on-move-while-tiled rule.

use smithay::utils::{Logical, Point, Rectangle, Size};

use crate::config::{Edge, SnapConfig, LAB_MIN_VIEW_HEIGHT, LAB_MIN_VIEW_WIDTH};
use crate::edges::SnapTarget;
use crate::view::ViewId;

/// Input mode, mutually exclusive (4.E "Input mode").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Passthrough,
    Move,
    Resize,
    Menu,
}

/// Whether a view is eligible to begin a given grab (4.E "Input mode").
#[derive(Debug, Clone, Copy, Default)]
pub struct GrabEligibility {
    pub fullscreen: bool,
    pub shaded: bool,
    pub maximized_both: bool,
    pub fixed_position: bool,
}

impl GrabEligibility {
    pub fn can_move(&self) -> bool {
        !self.fullscreen && !self.fixed_position
    }

    pub fn can_resize(&self) -> bool {
        !(self.shaded || self.fullscreen || self.maximized_both) && !self.fixed_position
    }
}

/// A latched interactive grab (4.F "Move"/"Resize").
#[derive(Debug, Clone)]
pub struct Grab {
    pub view: ViewId,
    pub mode: InputMode,
    /// The view's geometry at grab begin.
    pub grab_box: Rectangle<i32, Logical>,
    /// Cursor position at grab begin, in the same coordinate space.
    pub grab_point: Point<f64, Logical>,
    /// Latched resize edges (empty for move grabs).
    pub resize_edges: std::collections::HashSet<Edge>,
    pub preview: Option<SnapTarget>,
    pending_preview_timer: Option<SnapTarget>,
}

impl Grab {
    pub fn begin_move(view: ViewId, grab_box: Rectangle<i32, Logical>, grab_point: Point<f64, Logical>) -> Self {
        Self {
            view,
            mode: InputMode::Move,
            grab_box,
            grab_point,
            resize_edges: std::collections::HashSet::new(),
            preview: None,
            pending_preview_timer: None,
        }
    }

    pub fn begin_resize(
        view: ViewId,
        grab_box: Rectangle<i32, Logical>,
        grab_point: Point<f64, Logical>,
        edges: std::collections::HashSet<Edge>,
    ) -> Self {
        Self {
            view,
            mode: InputMode::Resize,
            grab_box,
            grab_point,
            resize_edges: edges,
            preview: None,
            pending_preview_timer: None,
        }
    }

    /// New top-left position for a move grab given the current cursor
    /// position (4.F "Move": `new position = grab_box.(x,y) + cursor_delta`).
    pub fn move_target(&self, cursor: Point<f64, Logical>) -> Point<i32, Logical> {
        let dx = cursor.x - self.grab_point.x;
        let dy = cursor.y - self.grab_point.y;
        Point::from((
            (self.grab_box.loc.x as f64 + dx).round() as i32,
            (self.grab_box.loc.y as f64 + dy).round() as i32,
        ))
    }

    /// Rescale `grab_box`/`grab_point` so the cursor lands at the same
    /// fractional anchor within the new (smaller) geometry it had within
    /// the old one (4.F "Move", the untile rescale rule).
    ///
    /// `anchor_frac = (cursor − old_pos) / old_size`.
    pub fn rescale_after_untile(&mut self, cursor: Point<f64, Logical>, new_geometry: Rectangle<i32, Logical>) {
        let old = self.grab_box;
        let frac_x = if old.size.w != 0 {
            (cursor.x - old.loc.x as f64) / old.size.w as f64
        } else {
            0.5
        };
        let frac_y = if old.size.h != 0 {
            (cursor.y - old.loc.y as f64) / old.size.h as f64
        } else {
            0.5
        };
        self.grab_box = new_geometry;
        self.grab_point = Point::from((
            new_geometry.loc.x as f64 + frac_x * new_geometry.size.w as f64,
            new_geometry.loc.y as f64 + frac_y * new_geometry.size.h as f64,
        ));
    }

    /// Compute pending geometry for a resize grab (4.F "Resize"): delta
    /// applied to the latched edges, anchored to the non-moving edges,
    /// clamped to the configured minimum size.
    pub fn resize_target(&self, cursor: Point<f64, Logical>) -> Rectangle<i32, Logical> {
        let dx = (cursor.x - self.grab_point.x).round() as i32;
        let dy = (cursor.y - self.grab_point.y).round() as i32;

        let mut x = self.grab_box.loc.x;
        let mut y = self.grab_box.loc.y;
        let mut w = self.grab_box.size.w;
        let mut h = self.grab_box.size.h;

        if self.resize_edges.contains(&Edge::Left) {
            w -= dx;
            x += dx;
        } else if self.resize_edges.contains(&Edge::Right) {
            w += dx;
        }
        if self.resize_edges.contains(&Edge::Top) {
            h -= dy;
            y += dy;
        } else if self.resize_edges.contains(&Edge::Bottom) {
            h += dy;
        }

        if w < LAB_MIN_VIEW_WIDTH {
            if self.resize_edges.contains(&Edge::Left) {
                x -= LAB_MIN_VIEW_WIDTH - w;
            }
            w = LAB_MIN_VIEW_WIDTH;
        }
        if h < LAB_MIN_VIEW_HEIGHT {
            if self.resize_edges.contains(&Edge::Top) {
                y -= LAB_MIN_VIEW_HEIGHT - h;
            }
            h = LAB_MIN_VIEW_HEIGHT;
        }

        Rectangle::new(Point::from((x, y)), Size::from((w, h)))
    }

    /// Snap-preview delay for a candidate target, shorter for inner output
    /// boundaries than the outer screen edge (4.F "Snap overlay").
    pub fn preview_delay(config: &SnapConfig, crosses_outer_edge: bool) -> std::time::Duration {
        let ms = if crosses_outer_edge {
            config.snap_preview_delay_outer_ms
        } else {
            config.snap_preview_delay_inner_ms
        };
        std::time::Duration::from_millis(ms)
    }

    /// Arm the pending preview target; the caller is responsible for
    /// scheduling a one-shot timer of `preview_delay` that calls
    /// `commit_preview` if no newer target has been armed since.
    pub fn arm_preview(&mut self, target: SnapTarget) {
        self.pending_preview_timer = Some(target);
    }

    /// Fired by the delay timer: promote the armed target to `preview` iff
    /// it's still the most recently armed one.
    pub fn commit_preview(&mut self, target: SnapTarget) {
        if self.pending_preview_timer == Some(target) {
            self.preview = Some(target);
        }
    }

    pub fn clear_preview(&mut self) {
        self.preview = None;
        self.pending_preview_timer = None;
    }
}

/// Result of `finish` (4.F "Finish").
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FinishOutcome {
    SnapToRegion(Rectangle<i32, Logical>),
    MaximizeTop,
    SnapToEdge(Edge),
    NoSnap(Rectangle<i32, Logical>),
}

/// Decide the grab's outcome on button release (4.F "Finish").
pub fn finish(
    grab: &Grab,
    current_geometry: Rectangle<i32, Logical>,
    snap_top_maximize: bool,
) -> FinishOutcome {
    match &grab.preview {
        Some(SnapTarget::Region(rect)) => FinishOutcome::SnapToRegion(*rect),
        Some(SnapTarget::Edge(Edge::Top)) if snap_top_maximize => FinishOutcome::MaximizeTop,
        Some(SnapTarget::Edge(edge)) => FinishOutcome::SnapToEdge(*edge),
        None => FinishOutcome::NoSnap(current_geometry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: i32, y: i32, w: i32, h: i32) -> Rectangle<i32, Logical> {
        Rectangle::new(Point::from((x, y)), Size::from((w, h)))
    }

    #[test]
    fn move_target_tracks_cursor_delta() {
        let grab = Grab::begin_move(ViewId(1), rect(100, 100, 400, 300), Point::from((150.0, 150.0)));
        let target = grab.move_target(Point::from((170.0, 130.0)));
        assert_eq!(target, Point::from((120, 80)));
    }

    #[test]
    fn resize_right_edge_grows_width_only() {
        let mut edges = std::collections::HashSet::new();
        edges.insert(Edge::Right);
        let grab = Grab::begin_resize(
            ViewId(1),
            rect(100, 100, 400, 300),
            Point::from((500.0, 200.0)),
            edges,
        );
        let result = grab.resize_target(Point::from((540.0, 200.0)));
        assert_eq!(result, rect(100, 100, 440, 300));
    }

    #[test]
    fn resize_left_edge_moves_origin_and_shrinks_width() {
        let mut edges = std::collections::HashSet::new();
        edges.insert(Edge::Left);
        let grab = Grab::begin_resize(
            ViewId(1),
            rect(100, 100, 400, 300),
            Point::from((100.0, 200.0)),
            edges,
        );
        let result = grab.resize_target(Point::from((140.0, 200.0)));
        assert_eq!(result, rect(140, 100, 360, 300));
    }

    #[test]
    fn resize_clamped_to_minimum_width() {
        let mut edges = std::collections::HashSet::new();
        edges.insert(Edge::Right);
        let grab = Grab::begin_resize(
            ViewId(1),
            rect(100, 100, 150, 150),
            Point::from((250.0, 250.0)),
            edges,
        );
        let result = grab.resize_target(Point::from((100.0, 250.0)));
        assert_eq!(result.size.w, LAB_MIN_VIEW_WIDTH);
    }

    #[test]
    fn rescale_after_untile_preserves_fractional_anchor() {
        let mut grab = Grab::begin_move(ViewId(1), rect(0, 0, 1920, 1080), Point::from((960.0, 540.0)));
        // cursor at the exact center (frac 0.5, 0.5) of the maximized box.
        grab.rescale_after_untile(Point::from((960.0, 540.0)), rect(0, 0, 400, 300));
        assert_eq!(grab.grab_point, Point::from((200.0, 150.0)));
    }

    #[test]
    fn grab_eligibility_blocks_move_when_fullscreen() {
        let elig = GrabEligibility {
            fullscreen: true,
            ..Default::default()
        };
        assert!(!elig.can_move());
    }

    #[test]
    fn grab_eligibility_blocks_resize_when_maximized_both() {
        let elig = GrabEligibility {
            maximized_both: true,
            ..Default::default()
        };
        assert!(!elig.can_resize());
    }

    #[test]
    fn finish_prefers_region_over_edge_snap() {
        let mut grab = Grab::begin_move(ViewId(1), rect(0, 0, 100, 100), Point::from((0.0, 0.0)));
        grab.preview = Some(SnapTarget::Region(rect(0, 0, 960, 1080)));
        let outcome = finish(&grab, rect(0, 0, 960, 1080), true);
        assert_eq!(outcome, FinishOutcome::SnapToRegion(rect(0, 0, 960, 1080)));
    }

    #[test]
    fn finish_top_edge_maximizes_when_configured() {
        let mut grab = Grab::begin_move(ViewId(1), rect(0, 0, 100, 100), Point::from((0.0, 0.0)));
        grab.preview = Some(SnapTarget::Edge(Edge::Top));
        let outcome = finish(&grab, rect(0, 0, 100, 100), true);
        assert_eq!(outcome, FinishOutcome::MaximizeTop);
    }
}
