// SPDX-License-Identifier: GPL-2.0-only

//! The output entity (spec.md §3): a physical/virtual display with a
//! usable area (after layer-shell exclusive zones). Views follow output
//! destruction by migrating to the nearest surviving output.

use smithay::output::Output;
use smithay::utils::{Logical, Point, Rectangle};

/// Tracks the usable area (full output geometry minus layer-shell
/// exclusive zones) for one physical output, alongside the smithay handle.
#[derive(Debug, Clone)]
pub struct OutputState {
    pub output: Output,
    pub full_area: Rectangle<i32, Logical>,
    pub usable_area: Rectangle<i32, Logical>,
}

impl OutputState {
    pub fn new(output: Output, full_area: Rectangle<i32, Logical>) -> Self {
        Self {
            output,
            full_area,
            usable_area: full_area,
        }
    }

    /// Recompute `usable_area` from the four exclusive-zone insets a
    /// layer-shell arrangement pass reports (top, right, bottom, left),
    /// consistent with `smithay::desktop::layer_map_for_output`'s
    /// `LayerUsableArea`/exclusive-zone semantics.
    pub fn apply_exclusive_zones(&mut self, top: i32, right: i32, bottom: i32, left: i32) {
        let loc = Point::from((self.full_area.loc.x + left, self.full_area.loc.y + top));
        let size = smithay::utils::Size::from((
            (self.full_area.size.w - left - right).max(0),
            (self.full_area.size.h - top - bottom).max(0),
        ));
        self.usable_area = Rectangle::new(loc, size);
    }

    /// Adopt a layer-shell `non_exclusive_zone` (output-local coordinates)
    /// as the usable area, translating into global space.
    pub fn apply_non_exclusive_zone(&mut self, zone: Rectangle<i32, Logical>) {
        let loc = Point::from((
            self.full_area.loc.x + zone.loc.x,
            self.full_area.loc.y + zone.loc.y,
        ));
        self.usable_area = Rectangle::new(loc, zone.size);
    }

    pub fn center(&self) -> Point<i32, Logical> {
        Point::from((
            self.full_area.loc.x + self.full_area.size.w / 2,
            self.full_area.loc.y + self.full_area.size.h / 2,
        ))
    }
}

/// Finds the surviving output whose center is nearest to `removed`'s
/// center, for migrating a destroyed output's views (spec.md §3, "Output").
pub fn nearest_surviving<'a>(
    removed: &OutputState,
    survivors: impl IntoIterator<Item = &'a OutputState>,
) -> Option<&'a OutputState> {
    let removed_center = removed.center();
    survivors.into_iter().min_by_key(|candidate| {
        let c = candidate.center();
        let dx = (c.x - removed_center.x) as i64;
        let dy = (c.y - removed_center.y) as i64;
        dx * dx + dy * dy
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use smithay::output::{Mode, PhysicalProperties, Subpixel};
    use smithay::utils::Size;

    fn make_output(name: &str) -> Output {
        Output::new(
            name.to_string(),
            PhysicalProperties {
                size: (0, 0).into(),
                subpixel: Subpixel::Unknown,
                make: "test".into(),
                model: "test".into(),
            },
        )
    }

    fn state_at(name: &str, x: i32, y: i32, w: i32, h: i32) -> OutputState {
        let output = make_output(name);
        output.change_current_state(
            Some(Mode {
                size: Size::from((w, h)),
                refresh: 60_000,
            }),
            None,
            None,
            Some(Point::from((x, y))),
        );
        OutputState::new(output, Rectangle::new(Point::from((x, y)), Size::from((w, h))))
    }

    #[test]
    fn exclusive_zones_shrink_usable_area() {
        let mut output = state_at("eDP-1", 0, 0, 1920, 1080);
        output.apply_exclusive_zones(30, 0, 0, 0);
        assert_eq!(output.usable_area, Rectangle::new(Point::from((0, 30)), Size::from((1920, 1050))));
    }

    #[test]
    fn non_exclusive_zone_translates_output_local_to_global() {
        let mut output = state_at("eDP-1", 100, 0, 1920, 1080);
        output.apply_non_exclusive_zone(Rectangle::new(Point::from((0, 30)), Size::from((1920, 1050))));
        assert_eq!(output.usable_area, Rectangle::new(Point::from((100, 30)), Size::from((1920, 1050))));
    }

    #[test]
    fn nearest_surviving_picks_closest_center() {
        let removed = state_at("DP-1", 0, 0, 1920, 1080);
        let near = state_at("DP-2", 1920, 0, 1920, 1080);
        let far = state_at("DP-3", 10_000, 10_000, 1920, 1080);
        let survivors = vec![far.clone(), near.clone()];
        let chosen = nearest_surviving(&removed, survivors.iter()).unwrap();
        assert_eq!(chosen.output.name(), near.output.name());
    }
}
