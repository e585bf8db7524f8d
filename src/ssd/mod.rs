// SPDX-License-Identifier: GPL-2.0-only

//! The SSD (server-side decoration) engine (4.D): per-view decoration tree
//! state, hit-testing, and the squared/hidden-subtree state machine.

pub mod buffer;
pub mod buffer_cache;
pub mod button;
pub mod image;
pub mod title;

use smithay::utils::{Logical, Point, Rectangle};

use crate::config::ThemeMetrics;
pub use button::{Button, ButtonKind, ButtonPointerState, IconVariant};
pub use title::Justify;

use buffer::RectBuffer;
use buffer_cache::{scale_key, ScaledBuffer};

/// The closed set of hit-testable SSD regions (4.D "Hit-testing").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
    Titlebar,
    Title,
    Button(ButtonKind),
    Top,
    Left,
    Right,
    Bottom,
    CornerTl,
    CornerTr,
    CornerBl,
    CornerBr,
    Client,
    None,
}

/// `(maximized_both, shaded, omnipresent, tiled-or-narrow)` input to the
/// subtree-visibility state machine (4.D "State machine").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SsdStateInput {
    pub maximized_both: bool,
    pub shaded: bool,
    pub omnipresent: bool,
    pub tiled_or_narrow: bool,
    pub fullscreen: bool,
}

/// Which subtrees should be rendered/visible after applying `SsdStateInput`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SsdVisibility {
    pub squared: bool,
    pub border_visible: bool,
    pub extents_visible: bool,
    pub shadow_visible: bool,
}

/// Decide subtree visibility per the 5-rule state machine (4.D).
pub fn resolve_visibility(input: SsdStateInput, shadows_on_tiled: bool) -> SsdVisibility {
    let squared = input.maximized_both || input.tiled_or_narrow;
    let border_visible = !input.maximized_both;
    let extents_visible = !(input.maximized_both || input.fullscreen);
    let shadow_visible =
        !(input.maximized_both || (input.tiled_or_narrow && !shadows_on_tiled));
    SsdVisibility {
        squared,
        border_visible,
        extents_visible,
        shadow_visible,
    }
}

/// Cached last-applied state, used to skip redundant rebuilds (3. "SSD"
/// entity, `state` cache).
#[derive(Debug, Clone, Default)]
pub struct SsdCache {
    pub last_geometry: Option<Rectangle<i32, Logical>>,
    pub was_maximized: bool,
    pub was_squared: bool,
    pub was_shaded: bool,
    pub was_omnipresent: bool,
    pub title: String,
    pub title_truncated: bool,
}

/// A view's decoration tree: layout metrics, buttons, and cached state.
pub struct Ssd {
    pub theme: ThemeMetrics,
    pub buttons: Vec<Button>,
    pub cache: SsdCache,
    pub hovered: Option<ButtonKind>,
    pub justify: Justify,
    /// The border segment's scaled-buffer cache (4.A), keyed on content
    /// size so a resize forces a re-render.
    pub border_buffer: ScaledBuffer<RectBuffer>,
}

impl Ssd {
    pub fn new(theme: ThemeMetrics, theme_dir: std::path::PathBuf) -> Self {
        let buttons = vec![
            Button::new(ButtonKind::WindowIcon, theme_dir.clone()),
            Button::new(ButtonKind::Shade, theme_dir.clone()),
            Button::new(ButtonKind::Iconify, theme_dir.clone()),
            Button::new(ButtonKind::Maximize, theme_dir.clone()),
            Button::new(ButtonKind::Close, theme_dir),
        ];
        let border_buffer = ScaledBuffer::new(RectBuffer {
            width: 0,
            height: 0,
            border_width: theme.border_width,
            corner_radius: theme.corner_radius,
            rounded_corners: 0b1111,
            stroked_edges: 0b1111,
            fill_color: [0, 0, 0, 255],
            border_color: [0, 0, 0, 255],
        });
        Self {
            theme,
            buttons,
            cache: SsdCache::default(),
            hovered: None,
            justify: Justify::Center,
            border_buffer,
        }
    }

    /// Re-renders the border buffer if `content_size` changed since the
    /// last call, then ensures it's cached at `scale` (4.A "Policy").
    /// Dedup against sibling views' border buffers is left to the renderer,
    /// which holds every view's `Ssd` at once; this only drives one view's
    /// own cache entry.
    pub fn ensure_border_buffer(&mut self, content_size: (i32, i32), scale: f64) {
        let owner = &mut self.border_buffer.owner;
        if owner.width != content_size.0 || owner.height != content_size.1 {
            owner.width = content_size.0;
            owner.height = content_size.1;
            self.border_buffer.invalidate();
        }
        self.border_buffer.enter_scale(scale_key(scale), std::iter::empty());
    }

    /// Border inset rectangle (4.D "Layout"): the view's content box grown
    /// by the border width on all four sides.
    pub fn border_box(&self, content: Rectangle<i32, Logical>) -> Rectangle<i32, Logical> {
        grow(content, self.theme.border_width)
    }

    /// The titlebar strip, sitting above the content box at `y = -TB`.
    pub fn titlebar_box(&self, content: Rectangle<i32, Logical>) -> Rectangle<i32, Logical> {
        Rectangle::new(
            Point::from((content.loc.x, content.loc.y - self.theme.titlebar_height)),
            smithay::utils::Size::from((content.size.w, self.theme.titlebar_height)),
        )
    }

    /// Resize-halo extents, extending past the border by
    /// `max(resize_minimum_area − border_width, 0)` (4.D "Layout").
    pub fn extents_box(&self, content: Rectangle<i32, Logical>) -> Rectangle<i32, Logical> {
        let halo = (self.theme.resize_minimum_area - self.theme.border_width).max(0);
        grow(self.border_box(content), halo)
    }

    /// Outer bounding box = titlebar ∪ border, used for corner detection.
    pub fn outer_box(&self, content: Rectangle<i32, Logical>) -> Rectangle<i32, Logical> {
        let border = self.border_box(content);
        let titlebar = self.titlebar_box(content);
        border.merge(titlebar)
    }

    /// `part_at` (4.D "Hit-testing"). `content` is the view's current
    /// content-geometry box; `cursor` is in the same (output-local)
    /// coordinate space.
    pub fn part_at(&self, content: Rectangle<i32, Logical>, cursor: Point<i32, Logical>) -> Part {
        let outer = self.outer_box(content);
        if !outer.contains(cursor) {
            return Part::None;
        }

        let corner_range = self
            .theme
            .resize_corner_range
            .min(content.size.w.min(content.size.h) / 2);
        if corner_range > 0 {
            if let Some(corner) = corner_at(outer, cursor, corner_range) {
                return corner;
            }
        }

        if content.contains(cursor) {
            return Part::Client;
        }

        let titlebar = self.titlebar_box(content);
        if titlebar.contains(cursor) {
            if let Some(kind) = self.button_at(titlebar, cursor) {
                return Part::Button(kind);
            }
            return Part::Title;
        }

        let border = self.border_box(content);
        if border.contains(cursor) {
            return part_from_border(content, cursor);
        }

        Part::None
    }

    /// Very small hitbox model: each button occupies an equal-width slot in
    /// its group (leading group on the left, the rest on the right),
    /// `theme.titlebar_height` wide.
    fn button_at(&self, titlebar: Rectangle<i32, Logical>, cursor: Point<i32, Logical>) -> Option<ButtonKind> {
        let slot = self.theme.titlebar_height;
        let (leading, trailing): (Vec<_>, Vec<_>) =
            self.buttons.iter().partition(|b| b.kind.is_leading());

        let rel_x = cursor.x - titlebar.loc.x;
        if rel_x < leading.len() as i32 * slot {
            let idx = (rel_x / slot).max(0) as usize;
            return leading.get(idx).map(|b| b.kind);
        }

        let from_right = titlebar.size.w - rel_x;
        if from_right > 0 && from_right < trailing.len() as i32 * slot {
            let idx = (from_right / slot).max(0) as usize;
            // trailing buttons are laid right-to-left: reverse to index
            // from the titlebar's right edge inward.
            return trailing.iter().rev().nth(idx).map(|b| b.kind);
        }

        None
    }

    /// Update `hovered`, flipping icon variants; returns true if it changed
    /// (4.D "Button hover": exactly one hovered button per seat).
    pub fn set_hovered(&mut self, kind: Option<ButtonKind>) -> bool {
        if self.hovered == kind {
            return false;
        }
        self.hovered = kind;
        true
    }

    pub fn apply_cache_update(&mut self, geometry: Rectangle<i32, Logical>, visibility: SsdVisibility) -> bool {
        let changed = self.cache.last_geometry != Some(geometry)
            || self.cache.was_squared != visibility.squared;
        self.cache.last_geometry = Some(geometry);
        self.cache.was_squared = visibility.squared;
        changed
    }
}

fn grow(rect: Rectangle<i32, Logical>, amount: i32) -> Rectangle<i32, Logical> {
    Rectangle::new(
        Point::from((rect.loc.x - amount, rect.loc.y - amount)),
        smithay::utils::Size::from((rect.size.w + 2 * amount, rect.size.h + 2 * amount)),
    )
}

fn corner_at(outer: Rectangle<i32, Logical>, cursor: Point<i32, Logical>, range: i32) -> Option<Part> {
    let near_left = cursor.x - outer.loc.x < range;
    let near_right = outer.loc.x + outer.size.w - cursor.x < range;
    let near_top = cursor.y - outer.loc.y < range;
    let near_bottom = outer.loc.y + outer.size.h - cursor.y < range;

    match (near_left, near_right, near_top, near_bottom) {
        (true, _, true, _) => Some(Part::CornerTl),
        (_, true, true, _) => Some(Part::CornerTr),
        (true, _, _, true) => Some(Part::CornerBl),
        (_, true, _, true) => Some(Part::CornerBr),
        _ => None,
    }
}

fn part_from_border(content: Rectangle<i32, Logical>, cursor: Point<i32, Logical>) -> Part {
    let dl = cursor.x - content.loc.x;
    let dr = content.loc.x + content.size.w - cursor.x;
    let dt = cursor.y - content.loc.y;
    let db = content.loc.y + content.size.h - cursor.y;
    let min = dl.min(dr).min(dt).min(db);
    if min == dt {
        Part::Top
    } else if min == db {
        Part::Bottom
    } else if min == dl {
        Part::Left
    } else {
        Part::Right
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content() -> Rectangle<i32, Logical> {
        Rectangle::new(Point::from((100, 100)), smithay::utils::Size::from((400, 300)))
    }

    fn ssd() -> Ssd {
        Ssd::new(ThemeMetrics::default(), std::path::PathBuf::from("/theme"))
    }

    #[test]
    fn maximized_both_hides_border_extents_and_shadow() {
        let vis = resolve_visibility(
            SsdStateInput {
                maximized_both: true,
                ..Default::default()
            },
            false,
        );
        assert!(vis.squared);
        assert!(!vis.border_visible);
        assert!(!vis.extents_visible);
        assert!(!vis.shadow_visible);
    }

    #[test]
    fn tiled_without_shadows_on_tiled_hides_shadow_but_keeps_border() {
        let vis = resolve_visibility(
            SsdStateInput {
                tiled_or_narrow: true,
                ..Default::default()
            },
            false,
        );
        assert!(vis.squared);
        assert!(vis.border_visible);
        assert!(!vis.shadow_visible);
    }

    #[test]
    fn tiled_with_shadows_on_tiled_keeps_shadow() {
        let vis = resolve_visibility(
            SsdStateInput {
                tiled_or_narrow: true,
                ..Default::default()
            },
            true,
        );
        assert!(vis.shadow_visible);
    }

    #[test]
    fn fullscreen_hides_extents_only() {
        let vis = resolve_visibility(
            SsdStateInput {
                fullscreen: true,
                ..Default::default()
            },
            false,
        );
        assert!(!vis.extents_visible);
        assert!(vis.border_visible);
        assert!(vis.shadow_visible);
    }

    #[test]
    fn part_at_client_inside_content_box() {
        let s = ssd();
        let cursor = Point::from((300, 250));
        assert_eq!(s.part_at(content(), cursor), Part::Client);
    }

    #[test]
    fn part_at_titlebar_between_button_groups() {
        let s = ssd();
        let cursor = Point::from((300, 90));
        assert_eq!(s.part_at(content(), cursor), Part::Title);
    }

    #[test]
    fn part_at_close_button_in_trailing_group() {
        let s = ssd();
        // titlebar right edge is x = 500; close is the rightmost button.
        let cursor = Point::from((495, 90));
        assert_eq!(s.part_at(content(), cursor), Part::Button(ButtonKind::Close));
    }

    #[test]
    fn part_at_outside_outer_box_is_none() {
        let s = ssd();
        assert_eq!(s.part_at(content(), Point::from((0, 0))), Part::None);
    }

    #[test]
    fn part_at_corner_takes_priority_over_border_side() {
        let s = ssd();
        // just inside the top-left corner of the outer box.
        let cursor = Point::from((98, 76));
        assert_eq!(s.part_at(content(), cursor), Part::CornerTl);
    }

    #[test]
    fn part_at_left_border_outside_corner_range() {
        let s = ssd();
        let cursor = Point::from((99, 250));
        assert_eq!(s.part_at(content(), cursor), Part::Left);
    }

    #[test]
    fn hover_changes_are_reported_once() {
        let mut s = ssd();
        assert!(s.set_hovered(Some(ButtonKind::Close)));
        assert!(!s.set_hovered(Some(ButtonKind::Close)));
        assert!(s.set_hovered(None));
    }
}
