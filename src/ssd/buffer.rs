// SPDX-License-Identifier: GPL-2.0-only

//! Three concrete `ScaledBuffer` owners over the generic cache of §4.A,
//! recovered from the original sources' `scaled-icon-buffer.h` /
//! `scaled-img-buffer.h` / `scaled-rect-buffer.h` (10.6 supplement):
//! `IconBuffer` renders a themed button glyph, `ImgBuffer` renders a
//! decoded image (titlebar icon, background), `RectBuffer` renders a flat
//! color (borders, shadows). Each is a thin `ScaledBufferImpl` wired to the
//! actual pixel-producing collaborator the renderer supplies.

use std::rc::Rc;

use super::buffer_cache::{RenderedBuffer, ScaleKey, ScaledBufferImpl};
use super::image::ImageData;

/// Opaque handle to renderer-produced pixels; the renderer itself is an
/// external collaborator (spec.md Non-goals).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixels(pub Rc<str>);

impl RenderedBuffer for Pixels {}

/// Renders a single themed button glyph (`ssd::button::Button`) at a given
/// scale, deduped across buttons sharing the same kind/state/theme.
pub struct IconBuffer {
    pub stem: String,
    pub size: i32,
}

impl ScaledBufferImpl for IconBuffer {
    type Buffer = Pixels;

    fn create_buffer(&self, scale: ScaleKey) -> Option<Self::Buffer> {
        if self.size <= 0 {
            return None;
        }
        Some(Pixels(Rc::from(format!("icon:{}:{}@{}", self.stem, self.size, scale))))
    }

    fn equal(&self, other: &Self) -> bool {
        self.stem == other.stem && self.size == other.size
    }
}

/// Renders a decoded image (titlebar icon override, background) already
/// resident in the `ImageAtlas`.
pub struct ImgBuffer {
    pub data: Rc<ImageData>,
}

impl ScaledBufferImpl for ImgBuffer {
    type Buffer = Pixels;

    fn create_buffer(&self, scale: ScaleKey) -> Option<Self::Buffer> {
        Some(Pixels(Rc::from(format!(
            "img:{}@{}",
            self.data.source.display(),
            scale
        ))))
    }

    fn equal(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

/// Renders a flat-color, optionally rounded and bordered rectangle (border
/// segment, resize-halo, shadow). Mirrors `struct scaled_rect_buffer`'s
/// fields one-for-one rather than just a bare color+size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectBuffer {
    pub width: i32,
    pub height: i32,
    pub border_width: i32,
    pub corner_radius: i32,
    /// Bitmap of which of the four corners are rounded.
    pub rounded_corners: u8,
    /// Bitmap of which of the four edges carry a drawn border stroke.
    pub stroked_edges: u8,
    pub fill_color: [u8; 4],
    pub border_color: [u8; 4],
}

impl ScaledBufferImpl for RectBuffer {
    type Buffer = Pixels;

    fn create_buffer(&self, scale: ScaleKey) -> Option<Self::Buffer> {
        if self.width <= 0 || self.height <= 0 {
            return None;
        }
        Some(Pixels(Rc::from(format!(
            "rect:{}x{}:r{}:b{}:{:?}/{:?}@{}",
            self.width,
            self.height,
            self.corner_radius,
            self.border_width,
            self.fill_color,
            self.border_color,
            scale
        ))))
    }

    fn equal(&self, other: &Self) -> bool {
        self == other
    }

    /// Solid-color rects are cheap to regenerate and are shared so widely
    /// (every border segment) that unlocking rather than dropping on
    /// eviction avoids redundant re-renders across sibling segments.
    fn drop_buffer(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssd::buffer_cache::ScaledBuffer;
    use std::path::PathBuf;

    #[test]
    fn icon_buffer_is_zero_sized_for_degenerate_size() {
        let owner = IconBuffer {
            stem: "close".into(),
            size: 0,
        };
        assert!(owner.create_buffer(120).is_none());
    }

    #[test]
    fn img_buffer_shares_cache_entries_for_the_same_rc() {
        let data = Rc::new(ImageData {
            width: 10,
            height: 10,
            source: PathBuf::from("/theme/close.png"),
        });
        let a = ImgBuffer { data: data.clone() };
        let b = ImgBuffer { data: data.clone() };
        assert!(a.equal(&b));
    }

    #[test]
    fn rect_buffer_retains_buffer_on_eviction() {
        let owner = RectBuffer {
            width: 4,
            height: 4,
            border_width: 1,
            corner_radius: 0,
            rounded_corners: 0,
            stroked_edges: 0b1111,
            fill_color: [0, 0, 0, 255],
            border_color: [0, 0, 0, 255],
        };
        assert!(!owner.drop_buffer());
        let mut cache = ScaledBuffer::new(owner);
        cache.enter_scale(120, std::iter::empty());
        assert_eq!(cache.active_scale(), 120);
    }
}
