// SPDX-License-Identifier: GPL-2.0-only

//! The server root: ties together the view/workspace/output model, the
//! SSD engine, the input router, and the foreign-toplevel/workspace
//! protocol glue.
//!
//! Grounded in the teacher's `State`/`Shell` split (`state.rs`,
//! `shell/mod.rs`): the global-mutable-state fields spec.md §9 calls out
//! (snap-constraint record, last-cycled view, key-repeat tracker) are
//! threaded explicitly as fields here rather than process-wide statics.

use std::collections::HashMap;
use std::process::Command;

use anyhow::Context;
use indexmap::IndexMap;
use smithay::desktop::PopupManager;
use smithay::input::keyboard::XkbConfig;
use smithay::input::pointer::CursorImageStatus;
use smithay::input::{Seat, SeatHandler, SeatState};
use smithay::reexports::calloop::{LoopHandle, LoopSignal};
use smithay::reexports::wayland_server::protocol::wl_surface::WlSurface;
use smithay::reexports::wayland_server::{Display, DisplayHandle};
use smithay::wayland::compositor::CompositorState;
use smithay::wayland::selection::data_device::DataDeviceState;
use smithay::wayland::selection::primary_selection::PrimarySelectionState;
use smithay::wayland::shell::wlr_layer::WlrLayerShellState;
use smithay::wayland::shell::xdg::XdgShellState;
use smithay::wayland::shm::ShmState;
use tracing::{info, warn};

use crate::backend::Backend;
use crate::config::Config;
use crate::edges::SnapConstraintMemory;
use crate::foreign_toplevel::{Aggregator, ToplevelHandle};
use crate::input::keyboard::{ChordMatcher, Keybinding};
use crate::input::InputRouter;
use crate::output::OutputState;
use crate::rules::RuleSet;
use crate::view::{View, ViewId};
use crate::workspace::WorkspaceManager;
use crate::workspace_protocol::{DoneBatcher, OutputTracker, TransactionQueue};

/// Placeholder [`ToplevelHandle`] used until the wlr/ext foreign-toplevel
/// wire objects are wired in by the protocol glue layer (see DESIGN.md).
#[derive(Default)]
pub struct NullToplevelHandle;

impl ToplevelHandle for NullToplevelHandle {
    fn set_title(&mut self, _title: &str) {}
    fn set_app_id(&mut self, _app_id: &str) {}
    fn set_outputs(&mut self, _outputs: &[String]) {}
    fn set_maximized(&mut self, _maximized: bool) {}
    fn set_minimized(&mut self, _minimized: bool) {}
    fn set_fullscreen(&mut self, _fullscreen: bool) {}
    fn set_activated(&mut self, _activated: bool) {}
}

/// Actions a keybind chord or a menu item can fire (spec.md §4.E, §9
/// "String-keyed dispatch": kept as a closed enum rather than a
/// string-keyed table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    FocusNext,
    FocusPrev,
    CloseWindow,
    ToggleMaximize,
    ToggleFullscreen,
    SnapToEdge(crate::config::Edge),
    ToggleAlwaysOnTop,
    Spawn(String),
    Quit,
}

/// The compositor's root state, analogous to the teacher's `State`.
pub struct Server {
    pub display_handle: DisplayHandle,
    pub loop_handle: LoopHandle<'static, Server>,
    pub loop_signal: LoopSignal,
    pub should_stop: bool,
    pub socket_name: String,

    pub config: Config,
    pub backend: Box<dyn Backend>,

    pub outputs: Vec<OutputState>,
    pub workspaces: WorkspaceManager,
    /// Insertion-ordered so the foreign-toplevel listing and the window
    /// switcher enumerate views in a stable, creation-time order (the
    /// teacher uses `IndexMap` the same way for its virtual-output table).
    pub views: IndexMap<ViewId, View>,
    next_view_id: u64,
    /// Toplevels that have received an initial configure but not yet
    /// committed a buffer (spec.md §4.C "map"): held here until then.
    pub pending_toplevels: Vec<(smithay::wayland::shell::xdg::ToplevelSurface, ViewId)>,

    pub rules: RuleSet,
    pub input: InputRouter<Action>,
    pub snap_constraints: SnapConstraintMemory,
    /// `handle_cycle`'s "last toplevel" heuristic (spec.md §9 open
    /// question): falls back to the topmost focusable view on the current
    /// workspace if the last-cycled view's output was destroyed.
    pub last_cycled_view: Option<ViewId>,
    pub needs_focus_refresh: bool,

    /// Per-view foreign-toplevel dual-protocol fanout (4.H). The concrete
    /// `wlr`/`ext` handle types are filled in by the protocol glue layer
    /// (DESIGN.md); `NullToplevelHandle` is the no-op placeholder used
    /// until that wire-level binding lands.
    pub toplevels: HashMap<ViewId, Aggregator<NullToplevelHandle, NullToplevelHandle>>,
    pub workspace_transactions: TransactionQueue,
    pub workspace_done_batcher: DoneBatcher,
    pub workspace_output_tracker: OutputTracker,

    pub seat_state: SeatState<Server>,
    pub seat: Seat<Server>,

    pub compositor_state: CompositorState,
    pub xdg_shell_state: XdgShellState,
    pub shm_state: ShmState,
    pub data_device_state: DataDeviceState,
    pub primary_selection_state: PrimarySelectionState,
    pub layer_shell_state: WlrLayerShellState,
    pub popups: PopupManager,
}

impl Server {
    pub fn new(
        display: &Display<Server>,
        socket_name: String,
        loop_handle: LoopHandle<'static, Server>,
        loop_signal: LoopSignal,
        config: Config,
        backend: Box<dyn Backend>,
    ) -> anyhow::Result<Self> {
        let display_handle = display.handle();
        let mut seat_state = SeatState::new();
        let mut seat = seat_state.new_wl_seat(&display_handle, "seat0");
        seat.add_keyboard(
            XkbConfig::default(),
            config.repeat.delay_ms as i32,
            config.repeat.rate_hz as i32,
        )
        .context("failed to add keyboard capability to seat0")?;
        seat.add_pointer();
        let rules = RuleSet::new(config.rules.clone());

        Ok(Self {
            display_handle: display_handle.clone(),
            loop_handle,
            loop_signal,
            should_stop: false,
            socket_name,
            config,
            backend,
            outputs: Vec::new(),
            workspaces: WorkspaceManager::new(),
            views: IndexMap::new(),
            next_view_id: 1,
            pending_toplevels: Vec::new(),
            rules,
            input: InputRouter::new(ChordMatcher::new(default_keybindings())),
            snap_constraints: SnapConstraintMemory::new(),
            last_cycled_view: None,
            needs_focus_refresh: false,
            toplevels: HashMap::new(),
            workspace_transactions: TransactionQueue::new(),
            workspace_done_batcher: DoneBatcher::new(),
            workspace_output_tracker: OutputTracker::new(),
            seat_state,
            seat,
            compositor_state: CompositorState::new::<Server>(&display_handle),
            xdg_shell_state: XdgShellState::new::<Server>(&display_handle),
            shm_state: ShmState::new::<Server>(&display_handle, Vec::new()),
            data_device_state: DataDeviceState::new::<Server>(&display_handle),
            primary_selection_state: PrimarySelectionState::new::<Server>(&display_handle),
            layer_shell_state: WlrLayerShellState::new::<Server>(&display_handle),
            popups: PopupManager::default(),
        })
    }

    pub fn allocate_view_id(&mut self) -> ViewId {
        let id = ViewId(self.next_view_id);
        self.next_view_id += 1;
        id
    }

    /// `handle_action` (teacher's `input/mod.rs`): dispatch a resolved
    /// keybind action.
    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::FocusNext => self.focus_cycle(1),
            Action::FocusPrev => self.focus_cycle(-1),
            Action::CloseWindow => self.close_focused(),
            Action::ToggleMaximize => self.toggle_maximize_focused(),
            Action::ToggleFullscreen => self.toggle_fullscreen_focused(),
            Action::SnapToEdge(edge) => self.snap_focused_to_edge(edge),
            Action::ToggleAlwaysOnTop => {
                if let Some(view) = self.focused_view_mut() {
                    view.toggle_always_on_top();
                }
            }
            Action::Spawn(command) => spawn_detached(&command),
            Action::Quit => {
                info!("quit requested via keybinding");
                self.should_stop = true;
                self.loop_signal.stop();
            }
        }
    }

    pub(crate) fn active_workspace_id(&self) -> Option<crate::workspace::WorkspaceId> {
        self.workspaces.active
    }

    pub(crate) fn focused_view_id(&self) -> Option<ViewId> {
        let workspace = self.workspaces.get(self.active_workspace_id()?)?;
        workspace.topmost_focusable()
    }

    pub(crate) fn focused_view_mut(&mut self) -> Option<&mut View> {
        let id = self.focused_view_id()?;
        self.views.get_mut(&id)
    }

    pub(crate) fn focus_cycle(&mut self, step: i64) {
        let Some(ws_id) = self.active_workspace_id() else {
            return;
        };
        let Some(workspace) = self.workspaces.get(ws_id) else {
            return;
        };
        let Some(current) = workspace.topmost_focusable() else {
            return;
        };
        let next = if step >= 0 {
            workspace.focus_next(current)
        } else {
            workspace.focus_prev(current)
        };
        if let (Some(ws), Some(next)) = (self.workspaces.get_mut(ws_id), next) {
            ws.append_focus(next);
            self.last_cycled_view = Some(next);
            if let Some(keyboard) = self.seat.get_keyboard() {
                let surface = self
                    .views
                    .get(&next)
                    .and_then(|v| v.window.toplevel())
                    .map(|t| t.wl_surface().clone());
                keyboard.set_focus(self, surface, smithay::utils::SERIAL_COUNTER.next_serial());
            }
            self.sync_toplevel(current);
            self.sync_toplevel(next);
        }
    }

    pub(crate) fn close_focused(&mut self) {
        let Some(id) = self.focused_view_id() else {
            return;
        };
        let Some(view) = self.views.get(&id) else {
            return;
        };
        if let Some(toplevel) = view.window.toplevel() {
            info!(view = id.0, "close requested");
            toplevel.send_close();
        }
    }

    pub(crate) fn toggle_maximize_focused(&mut self) {
        let Some(id) = self.focused_view_id() else {
            return;
        };
        if let Some(view) = self.views.get_mut(&id) {
            let target = if view.state.maximized.is_any() {
                crate::view::Maximized::None
            } else {
                crate::view::Maximized::Both
            };
            view.set_maximized(target, true);
            if target == crate::view::Maximized::Both {
                let usable = view
                    .output
                    .as_ref()
                    .map(|o| o.name())
                    .and_then(|name| self.outputs.iter().find(|o| o.output.name() == name))
                    .map(|o| o.usable_area);
                if let (Some(view), Some(usable)) = (self.views.get_mut(&id), usable) {
                    view.move_resize(usable);
                }
            } else if let Some(view) = self.views.get_mut(&id) {
                let natural = view.geometry.natural;
                view.move_resize(natural);
            }
        }
        self.sync_toplevel(id);
        self.refresh_ssd(id);
    }

    pub(crate) fn toggle_fullscreen_focused(&mut self) {
        let Some(id) = self.focused_view_id() else {
            return;
        };
        if let Some(view) = self.views.get_mut(&id) {
            let fullscreen = !view.state.fullscreen;
            let output = view.output.clone();
            view.set_fullscreen(fullscreen, output);
        }
        self.sync_toplevel(id);
        self.refresh_ssd(id);
    }

    pub(crate) fn snap_focused_to_edge(&mut self, edge: crate::config::Edge) {
        let Some(id) = self.focused_view_id() else {
            return;
        };
        let Some(output) = self
            .views
            .get(&id)
            .and_then(|v| v.output.as_ref().map(|o| o.name()))
            .and_then(|name| self.outputs.iter().find(|o| o.output.name() == name).cloned())
            .or_else(|| self.outputs.first().cloned())
        else {
            return;
        };
        let usable = output.usable_area;
        let half = half_for_edge(usable, edge);
        if let Some(view) = self.views.get_mut(&id) {
            view.set_tiled(crate::view::TiledEdges::single(edge), true);
            view.move_resize(half);
        }
        self.snap_constraints.record(id, edge, half);
        self.sync_toplevel(id);
        self.refresh_ssd(id);
    }

    /// Recomputes SSD subtree visibility/cache state for one view and
    /// schedules a render if anything changed (4.D "State machine").
    pub(crate) fn refresh_ssd(&mut self, view_id: ViewId) {
        let Some(view) = self.views.get_mut(&view_id) else {
            return;
        };
        let input = crate::ssd::SsdStateInput {
            maximized_both: view.state.maximized == crate::view::Maximized::Both,
            shaded: view.state.shaded,
            omnipresent: view.state.visible_on_all_workspaces,
            tiled_or_narrow: view.is_tiled_or_narrow(),
            fullscreen: view.state.fullscreen,
        };
        let visibility = crate::ssd::resolve_visibility(input, view.ssd.theme.shadows_on_tiled);
        let changed = view.ssd.apply_cache_update(view.geometry.current, visibility);
        if visibility.border_visible {
            let size = view.geometry.current.size;
            view.ssd.ensure_border_buffer((size.w, size.h), 1.0);
        }
        let output = view.output.clone();
        if changed {
            if let Some(output) = output {
                self.backend.schedule_render(&output);
            }
        }
    }

    /// Output destroyed: migrate its views to the nearest survivor
    /// (spec.md §3 "Output").
    pub fn handle_output_removed(&mut self, name: &str) {
        let Some(idx) = self.outputs.iter().position(|o| o.output.name() == name) else {
            return;
        };
        let removed = self.outputs.remove(idx);
        let target = crate::output::nearest_surviving(&removed, self.outputs.iter()).cloned();
        for view in self.views.values_mut() {
            if view.output.as_ref().map(|o| o.name()) == Some(name.to_string()) {
                view.output = target.as_ref().map(|t| t.output.clone());
            }
        }
        if target.is_none() {
            warn!("last output removed; views have no home output");
        }
    }
}

pub(crate) fn half_for_edge(usable: smithay::utils::Rectangle<i32, smithay::utils::Logical>, edge: crate::config::Edge) -> smithay::utils::Rectangle<i32, smithay::utils::Logical> {
    use smithay::utils::{Point, Size};
    let (x, y, w, h) = match edge {
        crate::config::Edge::Left => (usable.loc.x, usable.loc.y, usable.size.w / 2, usable.size.h),
        crate::config::Edge::Right => (
            usable.loc.x + usable.size.w / 2,
            usable.loc.y,
            usable.size.w / 2,
            usable.size.h,
        ),
        crate::config::Edge::Top => (usable.loc.x, usable.loc.y, usable.size.w, usable.size.h / 2),
        crate::config::Edge::Bottom => (
            usable.loc.x,
            usable.loc.y + usable.size.h / 2,
            usable.size.w,
            usable.size.h / 2,
        ),
    };
    smithay::utils::Rectangle::new(Point::from((x, y)), Size::from((w, h)))
}

fn spawn_detached(command: &str) {
    let mut parts = command.split_whitespace();
    let Some(program) = parts.next() else {
        return;
    };
    if let Err(err) = Command::new(program).args(parts).spawn() {
        warn!(command, "failed to spawn: {}", err);
    }
}

/// Default keybindings; `Mod4` (logo/super) is the default modifier,
/// matching the teacher's `SWL_MODKEY` default (now `LABWC_MODKEY`).
fn default_keybindings() -> Vec<Keybinding<Action>> {
    use crate::input::keyboard::{ChordKey, Modifiers};

    let modkey = Modifiers {
        logo: true,
        ..Default::default()
    };
    let chord = |keysym: u32| ChordKey {
        modifiers: modkey,
        keysym,
    };

    vec![
        Keybinding {
            chord: vec![chord(xkb_keysym::J)],
            action: Action::FocusNext,
            repeats: false,
        },
        Keybinding {
            chord: vec![chord(xkb_keysym::K)],
            action: Action::FocusPrev,
            repeats: false,
        },
        Keybinding {
            chord: vec![chord(xkb_keysym::Q)],
            action: Action::CloseWindow,
            repeats: false,
        },
        Keybinding {
            chord: vec![chord(xkb_keysym::RETURN)],
            action: Action::Spawn("foot".to_string()),
            repeats: false,
        },
        Keybinding {
            chord: vec![chord(xkb_keysym::F)],
            action: Action::ToggleFullscreen,
            repeats: false,
        },
    ]
}

/// XKB legacy keysym numbers for the handful of keys the default bindings
/// reference (`xkbcommon/xkbcommon-keysyms.h`).
mod xkb_keysym {
    pub const J: u32 = 0x006a;
    pub const K: u32 = 0x006b;
    pub const Q: u32 = 0x0071;
    pub const F: u32 = 0x0066;
    pub const RETURN: u32 = 0xff0d;
}

impl SeatHandler for Server {
    type KeyboardFocus = WlSurface;
    type PointerFocus = WlSurface;
    type TouchFocus = WlSurface;

    fn seat_state(&mut self) -> &mut SeatState<Server> {
        &mut self.seat_state
    }

    fn cursor_image(&mut self, seat: &Seat<Server>, image: CursorImageStatus) {
        let cursor = match image {
            CursorImageStatus::Hidden => crate::backend::CursorImage::Hidden,
            CursorImageStatus::Named(shape) => crate::backend::CursorImage::Named(shape.name()),
            CursorImageStatus::Surface(_) => crate::backend::CursorImage::Named("default"),
        };
        self.backend.set_cursor(seat.name(), cursor);
    }

    fn focus_changed(&mut self, _seat: &Seat<Server>, _focused: Option<&Self::KeyboardFocus>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_for_edge_left_is_the_left_half() {
        let usable = smithay::utils::Rectangle::new(
            smithay::utils::Point::from((0, 0)),
            smithay::utils::Size::from((1920, 1080)),
        );
        let half = half_for_edge(usable, crate::config::Edge::Left);
        assert_eq!(half.size.w, 960);
        assert_eq!(half.loc.x, 0);
    }

    #[test]
    fn half_for_edge_right_starts_at_midpoint() {
        let usable = smithay::utils::Rectangle::new(
            smithay::utils::Point::from((0, 0)),
            smithay::utils::Size::from((1920, 1080)),
        );
        let half = half_for_edge(usable, crate::config::Edge::Right);
        assert_eq!(half.loc.x, 960);
        assert_eq!(half.size.w, 960);
    }
}
