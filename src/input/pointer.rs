// SPDX-License-Identifier: GPL-2.0-only

//! Pointer motion/button dispatch across input modes (4.E "Pointer").

use smithay::utils::{Logical, Point};

use crate::interactive::InputMode;
use crate::ssd::Part;

/// What a motion event should do, given the current `InputMode` (spec.md
/// §4.E "Pointer"). The router calls the relevant arm and applies the
/// result; the snap/resistance engine and hit-testing themselves live in
/// `edges`/`ssd`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionAction {
    /// `PASSTHROUGH`: hit-test and emit `enter`/`motion` to whatever's under
    /// the cursor.
    HitTestAndForward,
    /// `MOVE`: reposition the grabbed view; geometry math lives in
    /// `interactive::Grab::move_target`.
    UpdateMoveGeometry,
    /// `RESIZE`: recompute pending geometry; lives in
    /// `interactive::Grab::resize_target`.
    UpdateResizeGeometry,
    /// `MENU`: pointer motion does not affect view geometry.
    MenuHoverOnly,
}

pub fn motion_action(mode: InputMode) -> MotionAction {
    match mode {
        InputMode::Passthrough => MotionAction::HitTestAndForward,
        InputMode::Move => MotionAction::UpdateMoveGeometry,
        InputMode::Resize => MotionAction::UpdateResizeGeometry,
        InputMode::Menu => MotionAction::MenuHoverOnly,
    }
}

/// Button release always ends an interactive grab, returning to
/// `PASSTHROUGH` (spec.md §4.E "Pointer").
pub fn button_release_mode(current: InputMode) -> InputMode {
    match current {
        InputMode::Move | InputMode::Resize => InputMode::Passthrough,
        other => other,
    }
}

/// Map a hit-tested SSD part to the cursor shape a theme would show,
/// consumed by the (external) cursor-image renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorShape {
    Default,
    Pointer,
    NResize,
    SResize,
    EResize,
    WResize,
    NwResize,
    NeResize,
    SwResize,
    SeResize,
}

pub fn cursor_shape_for_part(part: Part) -> CursorShape {
    match part {
        Part::Top => CursorShape::NResize,
        Part::Bottom => CursorShape::SResize,
        Part::Left => CursorShape::WResize,
        Part::Right => CursorShape::EResize,
        Part::CornerTl => CursorShape::NwResize,
        Part::CornerTr => CursorShape::NeResize,
        Part::CornerBl => CursorShape::SwResize,
        Part::CornerBr => CursorShape::SeResize,
        Part::Button(_) | Part::Title => CursorShape::Pointer,
        Part::Titlebar | Part::Client | Part::None => CursorShape::Default,
    }
}

/// A pointer position snapshot, used by the router to decide whether
/// motion actually crossed into a new hit-test target (avoids redundant
/// enter/leave churn).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSnapshot {
    pub location: Point<f64, Logical>,
    pub part: Part,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_hit_tests_and_forwards() {
        assert_eq!(motion_action(InputMode::Passthrough), MotionAction::HitTestAndForward);
    }

    #[test]
    fn move_and_resize_update_geometry() {
        assert_eq!(motion_action(InputMode::Move), MotionAction::UpdateMoveGeometry);
        assert_eq!(motion_action(InputMode::Resize), MotionAction::UpdateResizeGeometry);
    }

    #[test]
    fn button_release_always_returns_to_passthrough_from_a_grab() {
        assert_eq!(button_release_mode(InputMode::Move), InputMode::Passthrough);
        assert_eq!(button_release_mode(InputMode::Resize), InputMode::Passthrough);
        assert_eq!(button_release_mode(InputMode::Menu), InputMode::Menu);
    }

    #[test]
    fn corner_parts_map_to_diagonal_resize_cursors() {
        assert_eq!(cursor_shape_for_part(Part::CornerTl), CursorShape::NwResize);
        assert_eq!(cursor_shape_for_part(Part::CornerBr), CursorShape::SeResize);
    }
}
