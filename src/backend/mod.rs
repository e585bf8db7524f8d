// SPDX-License-Identifier: GPL-2.0-only

//! The renderer/DRM backend boundary.
//!
//! The GPU renderer and the DRM/headless backend are explicit Non-goals
//! (spec.md §1 "Deliberately out of scope"): this module defines only the
//! narrow interface the core needs from them, grounded in the teacher's
//! `backend::init_backend` entry point and `KmsState::schedule_render`
//! call sites (seen throughout the teacher's `input`/`wayland` modules)
//! generalized into a trait so the core doesn't depend on a concrete GPU
//! stack.

use smithay::output::Output;
use smithay::utils::{Logical, Point};

/// What the core asks of its host renderer/backend. A real implementation
/// wraps DRM/KMS + a GPU renderer; tests and headless embeddings can
/// provide a no-op implementation.
pub trait Backend {
    /// Request a redraw of `output` at the next frame callback. Must not
    /// block (spec.md §5 "Scheduling model").
    fn schedule_render(&mut self, output: &Output);

    /// Update the visible cursor image/shape for `seat_name`.
    fn set_cursor(&mut self, seat_name: &str, shape: CursorImage);

    /// Session activation toggling (VT switch): pause/resume input and
    /// rendering without tearing down compositor state.
    fn set_session_active(&mut self, active: bool);
}

/// The handful of cursor representations the core can ask a backend to
/// display; themed pixel data itself comes from `ssd::image` when the
/// shape is `Themed`.
#[derive(Debug, Clone)]
pub enum CursorImage {
    Hidden,
    Named(&'static str),
    Themed {
        data: std::rc::Rc<crate::ssd::image::ImageData>,
        hotspot: Point<i32, Logical>,
    },
}

/// A backend that does nothing, for headless embeddings and tests.
#[derive(Debug, Default)]
pub struct NullBackend;

impl Backend for NullBackend {
    fn schedule_render(&mut self, _output: &Output) {}
    fn set_cursor(&mut self, _seat_name: &str, _shape: CursorImage) {}
    fn set_session_active(&mut self, _active: bool) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_backend_accepts_every_call_without_panicking() {
        let mut backend = NullBackend;
        backend.set_cursor("seat0", CursorImage::Hidden);
        backend.set_session_active(true);
    }
}
