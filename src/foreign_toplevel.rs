// SPDX-License-Identifier: GPL-2.0-only

//! Foreign-toplevel dual-protocol fanout (4.H): one aggregator per view,
//! unifying `wlr-foreign-toplevel-v1` and `ext-foreign-toplevel-list-v1`
//! into six internal entry points (10.6 supplement, grounded in
//! `original_source/foreign-toplevel-internal.h`).

use crate::view::ViewId;

/// One bound bookkeeping handle on either protocol. The protocol-specific
/// marshalling (`set_title`, `state` bitfield, etc.) is the wayland
/// integration layer's job; this module only decides *when* to fan a
/// change out and unifies the six request entry points.
pub trait ToplevelHandle {
    fn set_title(&mut self, title: &str);
    fn set_app_id(&mut self, app_id: &str);
    fn set_outputs(&mut self, outputs: &[String]);
    fn set_maximized(&mut self, maximized: bool);
    fn set_minimized(&mut self, minimized: bool);
    fn set_fullscreen(&mut self, fullscreen: bool);
    fn set_activated(&mut self, activated: bool);
}

/// The unified client request surface (spec.md §4.H): "unified into six
/// internal functions that the view implements".
pub trait ToplevelRequests {
    fn request_maximize(&mut self, view: ViewId, maximized: bool);
    fn request_minimize(&mut self, view: ViewId, minimized: bool);
    fn request_fullscreen(&mut self, view: ViewId, fullscreen: bool);
    fn request_activate(&mut self, view: ViewId);
    fn request_close(&mut self, view: ViewId);
}

/// A snapshot of the per-view state the aggregator mirrors outward.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToplevelState {
    pub title: String,
    pub app_id: String,
    pub outputs: Vec<String>,
    pub maximized: bool,
    pub minimized: bool,
    pub fullscreen: bool,
    pub activated: bool,
}

/// Owns one view's `wlr` and `ext` handles and fans `ToplevelState`
/// changes out to both in the same dispatch (E5, property 5).
pub struct Aggregator<W: ToplevelHandle, E: ToplevelHandle> {
    pub view: ViewId,
    pub wlr: W,
    pub ext: E,
    pub state: ToplevelState,
    /// While true (the window switcher is cycling), client requests are
    /// no-ops (spec.md §4.H).
    pub requests_suppressed: bool,
}

impl<W: ToplevelHandle, E: ToplevelHandle> Aggregator<W, E> {
    pub fn new(view: ViewId, wlr: W, ext: E) -> Self {
        Self {
            view,
            wlr,
            ext,
            state: ToplevelState::default(),
            requests_suppressed: false,
        }
    }

    fn fanout(&mut self, apply: impl Fn(&mut dyn ToplevelHandle)) {
        apply(&mut self.wlr);
        apply(&mut self.ext);
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        self.state.title = title.clone();
        self.fanout(|h| h.set_title(&title));
    }

    pub fn set_app_id(&mut self, app_id: impl Into<String>) {
        let app_id = app_id.into();
        self.state.app_id = app_id.clone();
        self.fanout(|h| h.set_app_id(&app_id));
    }

    pub fn set_outputs(&mut self, outputs: Vec<String>) {
        self.state.outputs = outputs.clone();
        self.fanout(|h| h.set_outputs(&outputs));
    }

    pub fn set_maximized(&mut self, maximized: bool) {
        self.state.maximized = maximized;
        self.fanout(|h| h.set_maximized(maximized));
    }

    pub fn set_minimized(&mut self, minimized: bool) {
        self.state.minimized = minimized;
        self.fanout(|h| h.set_minimized(minimized));
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        self.state.fullscreen = fullscreen;
        self.fanout(|h| h.set_fullscreen(fullscreen));
    }

    pub fn set_activated(&mut self, activated: bool) {
        self.state.activated = activated;
        self.fanout(|h| h.set_activated(activated));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingHandle {
        log: Vec<String>,
    }

    impl ToplevelHandle for RecordingHandle {
        fn set_title(&mut self, title: &str) {
            self.log.push(format!("title={title}"));
        }
        fn set_app_id(&mut self, app_id: &str) {
            self.log.push(format!("app_id={app_id}"));
        }
        fn set_outputs(&mut self, outputs: &[String]) {
            self.log.push(format!("outputs={outputs:?}"));
        }
        fn set_maximized(&mut self, maximized: bool) {
            self.log.push(format!("maximized={maximized}"));
        }
        fn set_minimized(&mut self, minimized: bool) {
            self.log.push(format!("minimized={minimized}"));
        }
        fn set_fullscreen(&mut self, fullscreen: bool) {
            self.log.push(format!("fullscreen={fullscreen}"));
        }
        fn set_activated(&mut self, activated: bool) {
            self.log.push(format!("activated={activated}"));
        }
    }

    #[test]
    fn title_change_reaches_both_handles_in_one_call() {
        let mut agg = Aggregator::new(ViewId(1), RecordingHandle::default(), RecordingHandle::default());
        agg.set_title("B");
        assert_eq!(agg.wlr.log, vec!["title=B".to_string()]);
        assert_eq!(agg.ext.log, vec!["title=B".to_string()]);
        assert_eq!(agg.state.title, "B");
    }

    #[test]
    fn state_mirrors_every_field_independently() {
        let mut agg = Aggregator::new(ViewId(1), RecordingHandle::default(), RecordingHandle::default());
        agg.set_maximized(true);
        agg.set_minimized(false);
        agg.set_fullscreen(true);
        agg.set_activated(true);
        assert_eq!(agg.state.maximized, true);
        assert_eq!(agg.state.fullscreen, true);
        assert_eq!(agg.wlr.log.len(), 3);
        assert_eq!(agg.ext.log.len(), 3);
    }
}
