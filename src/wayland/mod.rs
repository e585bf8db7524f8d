// SPDX-License-Identifier: GPL-2.0-only

//! Wayland protocol glue: wires the teacher's `CompositorHandler`,
//! `XdgShellHandler` and `XdgDecorationHandler` implementations (grounded
//! in `examples/wegel-swl/src/wayland/mod.rs`) to the `View`/`Workspace`/
//! `Output` model instead of the teacher's `Shell`/`Window` space.

pub mod handlers;
pub mod layer_shell;

use smithay::{
    delegate_compositor, delegate_data_device, delegate_output, delegate_primary_selection,
    delegate_seat, delegate_shm, delegate_xdg_decoration, delegate_xdg_shell,
    desktop::{
        find_popup_root_surface, PopupKeyboardGrab, PopupKind, PopupPointerGrab,
        PopupUngrabStrategy, Window, WindowSurfaceType,
    },
    input::{pointer::Focus, Seat},
    output::Output,
    reexports::wayland_protocols::xdg::decoration::zv1::server::zxdg_toplevel_decoration_v1::Mode,
    reexports::wayland_protocols::xdg::shell::server::xdg_toplevel,
    reexports::wayland_server::{
        protocol::{wl_buffer::WlBuffer, wl_output::WlOutput, wl_seat::WlSeat, wl_surface::WlSurface},
        Client,
    },
    utils::{Serial, Size},
    wayland::{
        buffer::BufferHandler,
        compositor::{with_states, CompositorClientState, CompositorHandler, CompositorState},
        output::OutputHandler,
        selection::{
            data_device::{
                ClientDndGrabHandler, DataDeviceHandler, DataDeviceState, ServerDndGrabHandler,
            },
            primary_selection::{PrimarySelectionHandler, PrimarySelectionState},
            SelectionHandler,
        },
        shell::xdg::{
            decoration::XdgDecorationHandler, PopupSurface, PositionerState, ToplevelSurface,
            XdgShellHandler, XdgShellState, XdgToplevelSurfaceData,
        },
        shm::{ShmHandler, ShmState},
    },
};
use tracing::{debug, info, warn};

use self::handlers::ClientState;
use crate::foreign_toplevel::Aggregator;
use crate::rules::{Action as RuleAction, MatchQuery, Property, PropertyValue};
use crate::server::{NullToplevelHandle, Server};
use crate::view::{View, ViewKind};

impl CompositorHandler for Server {
    fn compositor_state(&mut self) -> &mut CompositorState {
        &mut self.compositor_state
    }

    fn client_compositor_state<'a>(&self, client: &'a Client) -> &'a CompositorClientState {
        &client.get_data::<ClientState>().unwrap().compositor_state
    }

    fn commit(&mut self, surface: &WlSurface) {
        let outputs = self.outputs.clone();
        for output_state in &outputs {
            let output = &output_state.output;
            let layer_map = smithay::desktop::layer_map_for_output(output);
            if layer_map
                .layer_for_surface(surface, WindowSurfaceType::TOPLEVEL)
                .is_some()
            {
                drop(layer_map);
                let changed = {
                    let mut layer_map = smithay::desktop::layer_map_for_output(output);
                    layer_map.arrange()
                };
                if changed {
                    debug!(output = %output.name(), "layer arrangement changed");
                    self.backend.schedule_render(output);
                }
                return;
            }
        }

        if let Some(index) = self
            .pending_toplevels
            .iter()
            .position(|(toplevel, _)| toplevel.wl_surface() == surface)
        {
            let has_buffer = smithay::wayland::compositor::with_states(surface, |states| {
                states
                    .cached_state
                    .get::<smithay::wayland::compositor::SurfaceAttributes>()
                    .current()
                    .buffer
                    .is_some()
            });
            if has_buffer {
                let (toplevel, view_id) = self.pending_toplevels.remove(index);
                if let Some(view) = self.views.get_mut(&view_id) {
                    view.window.on_commit();
                    view.map();
                }
                self.place_new_view(view_id, &toplevel);
            } else {
                debug!("pending toplevel committed but has no buffer yet");
            }
            return;
        }

        if let Some(view) = self.views.values_mut().find(|v| {
            v.window
                .toplevel()
                .map(|t| t.wl_surface() == surface)
                .unwrap_or(false)
        }) {
            view.window.on_commit();
            if let Some(output) = view.output.clone() {
                self.backend.schedule_render(&output);
            }
        }
    }
}

impl Server {
    /// Places a freshly-mapped toplevel onto the active workspace of the
    /// output under the pointer, falling back to the first output
    /// (spec.md §3 "Output", §4.C "map").
    fn place_new_view(&mut self, view_id: crate::view::ViewId, toplevel: &ToplevelSurface) {
        let cursor_location = self
            .seat
            .get_pointer()
            .map(|p| p.current_location())
            .unwrap_or_default();

        let output = self
            .outputs
            .iter()
            .find(|o| o.full_area.contains(cursor_location.to_i32_round()))
            .or_else(|| self.outputs.first())
            .cloned();

        let Some(output) = output else {
            warn!("no outputs available; view stays unplaced");
            return;
        };

        let workspace_id = self.workspaces.active.unwrap_or_else(|| {
            let id = self.workspaces.create("1");
            self.workspaces.activate(id);
            id
        });

        if let Some(view) = self.views.get_mut(&view_id) {
            view.output = Some(output.output.clone());
            view.move_to_workspace(workspace_id);
        }
        if let Some(ws) = self.workspaces.get_mut(workspace_id) {
            ws.add_view(view_id);
            ws.append_focus(view_id);
        }
        self.last_cycled_view = Some(view_id);
        self.resolve_decoration(view_id, toplevel);

        let is_fullscreen = toplevel
            .with_pending_state(|state| state.states.contains(xdg_toplevel::State::Fullscreen));
        if is_fullscreen {
            if let Some(view) = self.views.get_mut(&view_id) {
                view.set_fullscreen(true, Some(output.output.clone()));
            }
        }

        if let Some(keyboard) = self.seat.get_keyboard() {
            keyboard.set_focus(
                self,
                Some(toplevel.wl_surface().clone()),
                smithay::utils::SERIAL_COUNTER.next_serial(),
            );
        }

        self.sync_toplevel(view_id);
        self.refresh_ssd(view_id);
        self.backend.schedule_render(&output.output);
    }

    /// Mirrors a view's title/app_id/output/state flags into its
    /// foreign-toplevel aggregator, constructing one on first sync (4.H).
    pub(crate) fn sync_toplevel(&mut self, view_id: crate::view::ViewId) {
        let Some(view) = self.views.get(&view_id) else {
            return;
        };
        let Some(toplevel) = view.window.toplevel() else {
            return;
        };
        let (app_id, title) = with_states(toplevel.wl_surface(), |states| {
            let data = states
                .data_map
                .get::<XdgToplevelSurfaceData>()
                .unwrap()
                .lock()
                .unwrap();
            (
                data.app_id.clone().unwrap_or_default(),
                data.title.clone().unwrap_or_default(),
            )
        });
        let outputs = view
            .output
            .as_ref()
            .map(|o| vec![o.name()])
            .unwrap_or_default();
        let maximized = view.state.maximized.is_any();
        let minimized = view.state.minimized;
        let fullscreen = view.state.fullscreen;
        let activated = self.focused_view_id() == Some(view_id);

        let aggregator = self.toplevels.entry(view_id).or_insert_with(|| {
            Aggregator::new(view_id, NullToplevelHandle::default(), NullToplevelHandle::default())
        });
        aggregator.set_title(title);
        aggregator.set_app_id(app_id);
        aggregator.set_outputs(outputs);
        aggregator.set_maximized(maximized);
        aggregator.set_minimized(minimized);
        aggregator.set_fullscreen(fullscreen);
        aggregator.set_activated(activated);
    }

    /// Translates a matched window rule's on-first-map actions (4.I) into
    /// the corresponding view mutations.
    fn apply_first_map_action(&mut self, view_id: crate::view::ViewId, action: RuleAction, toplevel: &ToplevelSurface) {
        match action {
            RuleAction::Maximize => {
                let usable = self
                    .views
                    .get(&view_id)
                    .and_then(|v| v.output.as_ref().map(|o| o.name()))
                    .and_then(|name| self.outputs.iter().find(|o| o.output.name() == name))
                    .map(|o| o.usable_area);
                if let Some(view) = self.views.get_mut(&view_id) {
                    view.set_maximized(crate::view::Maximized::Both, true);
                    if let Some(usable) = usable {
                        view.move_resize(usable);
                    }
                }
            }
            RuleAction::Minimize => {
                if let Some(view) = self.views.get_mut(&view_id) {
                    view.set_minimized(true);
                }
            }
            RuleAction::Fullscreen => {
                let output = self.views.get(&view_id).and_then(|v| v.output.clone());
                if let Some(view) = self.views.get_mut(&view_id) {
                    view.set_fullscreen(true, output);
                }
                toplevel.with_pending_state(|state| {
                    state.states.set(xdg_toplevel::State::Fullscreen);
                });
            }
            RuleAction::Close => {
                toplevel.send_close();
            }
            RuleAction::Center => {
                let geom_size = self.views.get(&view_id).map(|v| v.geometry.current.size);
                let usable = self
                    .views
                    .get(&view_id)
                    .and_then(|v| v.output.as_ref().map(|o| o.name()))
                    .and_then(|name| self.outputs.iter().find(|o| o.output.name() == name))
                    .map(|o| o.usable_area);
                if let (Some(size), Some(usable)) = (geom_size, usable) {
                    let x = usable.loc.x + (usable.size.w - size.w) / 2;
                    let y = usable.loc.y + (usable.size.h - size.h) / 2;
                    let target = smithay::utils::Rectangle::new(smithay::utils::Point::from((x, y)), size);
                    if let Some(view) = self.views.get_mut(&view_id) {
                        view.move_resize(target);
                    }
                }
            }
        }
        self.sync_toplevel(view_id);
    }

    fn view_id_for_toplevel(&self, surface: &ToplevelSurface) -> Option<crate::view::ViewId> {
        self.views
            .values()
            .find(|v| v.window.toplevel().map(|t| t == surface).unwrap_or(false))
            .map(|v| v.id)
    }

    /// Resolves `window_rule.serverDecoration` (spec.md §4.I, recovered
    /// `decorations.h`/`deco.c` supplement) against the toplevel's app_id
    /// and title, by which point the client has usually issued
    /// `set_app_id`/`set_title`. Falls back to the server-always-SSD
    /// default (spec.md §4.D) when no rule overrides it.
    fn resolve_decoration(&mut self, view_id: crate::view::ViewId, toplevel: &ToplevelSurface) {
        let (app_id, title) = with_states(toplevel.wl_surface(), |states| {
            let data = states
                .data_map
                .get::<XdgToplevelSurfaceData>()
                .unwrap()
                .lock()
                .unwrap();
            (
                data.app_id.clone().unwrap_or_default(),
                data.title.clone().unwrap_or_default(),
            )
        });

        let query = MatchQuery {
            identifier: &app_id,
            title: &title,
            window_type: None,
            sandbox_engine: None,
            sandbox_app_id: None,
        };
        let ssd_enabled =
            self.rules.resolve_property(&query, Property::ServerDecoration) != PropertyValue::No;

        if let Some(view) = self.views.get_mut(&view_id) {
            view.set_decorations(ssd_enabled);
        }
        toplevel.with_pending_state(|state| {
            state.decoration_mode = Some(if ssd_enabled {
                Mode::ServerSide
            } else {
                Mode::ClientSide
            });
        });
        if toplevel.is_initial_configure_sent() {
            toplevel.send_configure();
        }

        let actions = self.rules.on_first_map_actions(&query);
        for action in actions {
            self.apply_first_map_action(view_id, action, toplevel);
        }
    }
}

impl BufferHandler for Server {
    fn buffer_destroyed(&mut self, _buffer: &WlBuffer) {}
}

impl ShmHandler for Server {
    fn shm_state(&self) -> &ShmState {
        &self.shm_state
    }
}

impl OutputHandler for Server {}

impl SelectionHandler for Server {
    type SelectionUserData = ();
}

impl ClientDndGrabHandler for Server {}
impl ServerDndGrabHandler for Server {}
impl DataDeviceHandler for Server {
    fn data_device_state(&mut self) -> &mut DataDeviceState {
        &mut self.data_device_state
    }
}

impl PrimarySelectionHandler for Server {
    fn primary_selection_state(&mut self) -> &mut PrimarySelectionState {
        &mut self.primary_selection_state
    }
}

impl XdgShellHandler for Server {
    fn xdg_shell_state(&mut self) -> &mut XdgShellState {
        &mut self.xdg_shell_state
    }

    fn new_toplevel(&mut self, surface: ToplevelSurface) {
        let window = Window::new_wayland_window(surface.clone());
        let is_fullscreen = surface
            .with_pending_state(|state| state.states.contains(xdg_toplevel::State::Fullscreen));

        let initial_size = Size::from((800, 600));
        surface.with_pending_state(|state| {
            state.states.set(xdg_toplevel::State::Activated);
            if !is_fullscreen {
                state.size = Some(initial_size);
            }
            state.decoration_mode = Some(Mode::ServerSide);
        });
        surface.send_configure();

        let view_id = self.allocate_view_id();
        let theme = self.config.theme;
        let view = View::new(
            view_id,
            ViewKind::Xdg,
            window,
            smithay::utils::Rectangle::new(smithay::utils::Point::from((0, 0)), initial_size),
            theme,
            std::path::PathBuf::new(),
        );
        self.views.insert(view_id, view);
        self.pending_toplevels.push((surface, view_id));
        info!(view = view_id.0, "new toplevel");
    }

    fn new_popup(&mut self, surface: PopupSurface, positioner: PositionerState) {
        surface.with_pending_state(|state| {
            state.geometry = positioner.get_geometry();
            state.positioner = positioner;
        });

        if let Err(err) = surface.send_configure() {
            warn!("failed to configure popup: {:?}", err);
        } else if let Err(err) = self.popups.track_popup(PopupKind::from(surface)) {
            warn!("failed to track popup: {:?}", err);
        }
    }

    fn move_request(&mut self, surface: ToplevelSurface, _seat: WlSeat, _serial: Serial) {
        let Some(view_id) = self.view_id_for_toplevel(&surface) else {
            return;
        };
        let Some(view) = self.views.get(&view_id) else {
            return;
        };
        let eligibility = crate::interactive::GrabEligibility {
            fullscreen: view.state.fullscreen,
            shaded: view.state.shaded,
            maximized_both: view.state.maximized == crate::view::Maximized::Both,
            fixed_position: false,
        };
        let geometry = view.geometry.current;
        let grab_point = self
            .seat
            .get_pointer()
            .map(|p| p.current_location())
            .unwrap_or_default();
        self.input
            .interactive_begin_move(view_id, geometry, grab_point, eligibility);
    }

    fn resize_request(
        &mut self,
        surface: ToplevelSurface,
        _seat: WlSeat,
        _serial: Serial,
        edges: xdg_toplevel::ResizeEdge,
    ) {
        let Some(view_id) = self.view_id_for_toplevel(&surface) else {
            return;
        };
        let Some(view) = self.views.get(&view_id) else {
            return;
        };
        let eligibility = crate::interactive::GrabEligibility {
            fullscreen: view.state.fullscreen,
            shaded: view.state.shaded,
            maximized_both: view.state.maximized == crate::view::Maximized::Both,
            fixed_position: false,
        };
        let geometry = view.geometry.current;
        let grab_point = self
            .seat
            .get_pointer()
            .map(|p| p.current_location())
            .unwrap_or_default();
        let edge_set = resize_edge_set(edges);
        self.input
            .interactive_begin_resize(view_id, geometry, grab_point, edge_set, eligibility);
    }

    fn toplevel_destroyed(&mut self, surface: ToplevelSurface) {
        let Some(view_id) = self.view_id_for_toplevel(&surface) else {
            return;
        };
        info!(view = view_id.0, "toplevel destroyed");

        let was_focused = self.focused_view_id() == Some(view_id);
        let output = self.views.get(&view_id).and_then(|v| v.output.clone());
        if let Some(ws_id) = self.views.get(&view_id).and_then(|v| v.workspace) {
            if let Some(ws) = self.workspaces.get_mut(ws_id) {
                ws.remove_view(view_id);
            }
        }
        self.views.shift_remove(&view_id);
        self.toplevels.remove(&view_id);
        if self.last_cycled_view == Some(view_id) {
            self.last_cycled_view = None;
        }

        if was_focused {
            if let Some(keyboard) = self.seat.get_keyboard() {
                keyboard.set_focus(
                    self,
                    Option::<WlSurface>::None,
                    smithay::utils::SERIAL_COUNTER.next_serial(),
                );
            }
            self.needs_focus_refresh = true;
        }

        if let Some(output) = output {
            self.backend.schedule_render(&output);
        }
    }

    fn fullscreen_request(&mut self, surface: ToplevelSurface, wl_output: Option<WlOutput>) {
        let output = wl_output
            .as_ref()
            .and_then(Output::from_resource)
            .or_else(|| self.outputs.first().map(|o| o.output.clone()));

        let Some(output) = output else {
            debug!("no output found for fullscreen request");
            return;
        };

        surface.with_pending_state(|state| {
            state.states.set(xdg_toplevel::State::Fullscreen);
            state.fullscreen_output = wl_output;
            let mode = output.current_mode().unwrap();
            let scale = output.current_scale().fractional_scale();
            state.size = Some(mode.size.to_f64().to_logical(scale).to_i32_round());
        });
        surface.send_configure();

        if let Some(view_id) = self.view_id_for_toplevel(&surface) {
            if let Some(view) = self.views.get_mut(&view_id) {
                view.set_fullscreen(true, Some(output));
            }
            self.sync_toplevel(view_id);
            self.refresh_ssd(view_id);
        }
    }

    fn unfullscreen_request(&mut self, surface: ToplevelSurface) {
        surface.with_pending_state(|state| {
            state.states.unset(xdg_toplevel::State::Fullscreen);
            state.fullscreen_output = None;
            state.size = Some(Size::from((800, 600)));
        });
        surface.send_configure();

        if let Some(view_id) = self.view_id_for_toplevel(&surface) {
            if let Some(view) = self.views.get_mut(&view_id) {
                view.set_fullscreen(false, None);
            }
            self.sync_toplevel(view_id);
            self.refresh_ssd(view_id);
        }
    }

    fn grab(&mut self, surface: PopupSurface, seat: WlSeat, serial: Serial) {
        let seat = Seat::from_resource(&seat).unwrap();
        let kind = PopupKind::Xdg(surface);

        let Ok(root_surface) = find_popup_root_surface(&kind) else {
            warn!("no root surface found for popup grab");
            return;
        };

        match self.popups.grab_popup(root_surface, kind, &seat, serial) {
            Ok(mut grab) => {
                if let Some(keyboard) = seat.get_keyboard() {
                    if keyboard.is_grabbed()
                        && !(keyboard.has_grab(serial)
                            || keyboard.has_grab(grab.previous_serial().unwrap_or(serial)))
                    {
                        grab.ungrab(PopupUngrabStrategy::All);
                        return;
                    }
                    keyboard.set_grab(self, PopupKeyboardGrab::new(&grab), serial);
                }
                if let Some(pointer) = seat.get_pointer() {
                    if pointer.is_grabbed()
                        && !(pointer.has_grab(serial)
                            || pointer.has_grab(grab.previous_serial().unwrap_or(serial)))
                    {
                        grab.ungrab(PopupUngrabStrategy::All);
                        return;
                    }
                    pointer.set_grab(self, PopupPointerGrab::new(&grab), serial, Focus::Keep);
                }
            }
            Err(err) => warn!("failed to grab popup: {:?}", err),
        }
    }

    fn reposition_request(&mut self, _surface: PopupSurface, _positioner: PositionerState, _token: u32) {}
}

fn resize_edge_set(edges: xdg_toplevel::ResizeEdge) -> std::collections::HashSet<crate::config::Edge> {
    use crate::config::Edge;
    let mut set = std::collections::HashSet::new();
    match edges {
        xdg_toplevel::ResizeEdge::Top => {
            set.insert(Edge::Top);
        }
        xdg_toplevel::ResizeEdge::Bottom => {
            set.insert(Edge::Bottom);
        }
        xdg_toplevel::ResizeEdge::Left => {
            set.insert(Edge::Left);
        }
        xdg_toplevel::ResizeEdge::Right => {
            set.insert(Edge::Right);
        }
        xdg_toplevel::ResizeEdge::TopLeft => {
            set.insert(Edge::Top);
            set.insert(Edge::Left);
        }
        xdg_toplevel::ResizeEdge::TopRight => {
            set.insert(Edge::Top);
            set.insert(Edge::Right);
        }
        xdg_toplevel::ResizeEdge::BottomLeft => {
            set.insert(Edge::Bottom);
            set.insert(Edge::Left);
        }
        xdg_toplevel::ResizeEdge::BottomRight => {
            set.insert(Edge::Bottom);
            set.insert(Edge::Right);
        }
        _ => {}
    }
    set
}

impl XdgDecorationHandler for Server {
    fn new_decoration(&mut self, toplevel: ToplevelSurface) {
        // Default to SSD (spec.md §4.D); `resolve_decoration` overrides
        // this once the view is placed and a window rule can be matched.
        toplevel.with_pending_state(|state| {
            state.decoration_mode = Some(Mode::ServerSide);
        });
        if toplevel.is_initial_configure_sent() {
            toplevel.send_configure();
        }
    }

    fn request_mode(&mut self, _toplevel: ToplevelSurface, _mode: Mode) {}
    fn unset_mode(&mut self, _toplevel: ToplevelSurface) {}
}

delegate_compositor!(Server);
delegate_xdg_decoration!(Server);
delegate_data_device!(Server);
delegate_primary_selection!(Server);
delegate_output!(Server);
delegate_shm!(Server);
delegate_seat!(Server);
delegate_xdg_shell!(Server);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_edge_set_combines_corner_edges() {
        let set = resize_edge_set(xdg_toplevel::ResizeEdge::TopLeft);
        assert!(set.contains(&crate::config::Edge::Top));
        assert!(set.contains(&crate::config::Edge::Left));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn resize_edge_set_none_is_empty() {
        assert!(resize_edge_set(xdg_toplevel::ResizeEdge::None).is_empty());
    }
}
