// SPDX-License-Identifier: GPL-2.0-only

//! Pending→current geometry protocol (4.C).

use smithay::utils::{Logical, Rectangle};

/// Tracks the serial of the last configure sent for a geometry change.
/// `current` adopts `pending` only once the client acks that serial
/// (xdg); xwayland applies changes synchronously (spec.md §3 I6, §4.C).
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryState {
    pub current: Rectangle<i32, Logical>,
    pub pending: Rectangle<i32, Logical>,
    pub natural: Rectangle<i32, Logical>,
    pub configure_serial: u32,
}

impl GeometryState {
    pub fn new(initial: Rectangle<i32, Logical>) -> Self {
        Self {
            current: initial,
            pending: initial,
            natural: initial,
            configure_serial: 0,
        }
    }

    /// Stage a new geometry; bumps the monotonic configure serial (I6) and
    /// returns it so the caller can attach it to the outgoing configure.
    pub fn stage(&mut self, geometry: Rectangle<i32, Logical>) -> u32 {
        self.pending = geometry;
        self.configure_serial = self.configure_serial.wrapping_add(1);
        self.configure_serial
    }

    /// Adopt `pending` into `current` on xdg ack of `serial`, or
    /// unconditionally for xwayland's synchronous path.
    pub fn commit(&mut self, acked_serial: Option<u32>) -> bool {
        match acked_serial {
            Some(serial) if serial != self.configure_serial => false,
            _ => {
                self.current = self.pending;
                true
            }
        }
    }

    /// Copy `current` into `natural` iff the view is presently floating.
    /// Must be called before any state change that shrinks the floating
    /// area (maximize/tile/fullscreen) per spec.md §4.C "Natural geometry".
    pub fn remember_natural_if_floating(&mut self, is_floating: bool) {
        if is_floating {
            self.natural = self.current;
        }
    }

    /// Anchor rule for resize: which edges stay fixed while the opposite
    /// edge moves (spec.md §4.C "Pending→current protocol").
    pub fn anchored_resize(
        &self,
        moving_left: bool,
        moving_top: bool,
        new_size: smithay::utils::Size<i32, Logical>,
    ) -> Rectangle<i32, Logical> {
        let mut geo = self.current;
        if moving_left {
            let right = geo.loc.x + geo.size.w;
            geo.loc.x = right - new_size.w;
        }
        if moving_top {
            let bottom = geo.loc.y + geo.size.h;
            geo.loc.y = bottom - new_size.h;
        }
        geo.size = new_size;
        geo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smithay::utils::{Point, Size};

    fn rect(x: i32, y: i32, w: i32, h: i32) -> Rectangle<i32, Logical> {
        Rectangle::new(Point::from((x, y)), Size::from((w, h)))
    }

    #[test]
    fn commit_requires_matching_serial() {
        let mut geo = GeometryState::new(rect(0, 0, 100, 100));
        let serial = geo.stage(rect(10, 10, 200, 200));
        assert!(!geo.commit(Some(serial.wrapping_sub(1))));
        assert_eq!(geo.current, rect(0, 0, 100, 100));
        assert!(geo.commit(Some(serial)));
        assert_eq!(geo.current, rect(10, 10, 200, 200));
    }

    #[test]
    fn xwayland_path_commits_unconditionally() {
        let mut geo = GeometryState::new(rect(0, 0, 100, 100));
        geo.stage(rect(5, 5, 50, 50));
        assert!(geo.commit(None));
        assert_eq!(geo.current, rect(5, 5, 50, 50));
    }

    #[test]
    fn natural_only_remembered_while_floating() {
        let mut geo = GeometryState::new(rect(100, 100, 400, 300));
        geo.remember_natural_if_floating(false);
        assert_eq!(geo.natural, rect(100, 100, 400, 300));
        geo.current = rect(0, 0, 1920, 1080);
        geo.remember_natural_if_floating(false);
        assert_eq!(geo.natural, rect(100, 100, 400, 300));
        geo.remember_natural_if_floating(true);
        assert_eq!(geo.natural, rect(0, 0, 1920, 1080));
    }

    #[test]
    fn resize_left_anchors_right_edge() {
        let geo = GeometryState::new(rect(100, 100, 400, 300));
        let result = geo.anchored_resize(true, false, Size::from((200, 300)));
        // right edge (100+400=500) stays fixed: new x = 500 - 200 = 300
        assert_eq!(result, rect(300, 100, 200, 300));
    }

    #[test]
    fn resize_top_anchors_bottom_edge() {
        let geo = GeometryState::new(rect(100, 100, 400, 300));
        let result = geo.anchored_resize(false, true, Size::from((400, 150)));
        // bottom edge (100+300=400) stays fixed: new y = 400 - 150 = 250
        assert_eq!(result, rect(100, 250, 400, 150));
    }
}
