// SPDX-License-Identifier: GPL-2.0-only

//! The input router (4.E): single-threaded, cooperative; every handler is
//! a short non-blocking callback dispatched from the display event loop
//! (spec.md §5 "Scheduling model").

pub mod keyboard;
pub mod pointer;
pub mod tablet;

use std::collections::HashSet;

use smithay::backend::input::{
    AbsolutePositionEvent, Axis, AxisSource, ButtonState, Device, Event, InputBackend, InputEvent,
    KeyboardKeyEvent, PointerAxisEvent, PointerButtonEvent, PointerMotionEvent,
};
use smithay::desktop::WindowSurfaceType;
use smithay::input::keyboard::FilterResult;
use smithay::input::pointer::{AxisFrame, ButtonEvent, MotionEvent};
use smithay::reexports::wayland_server::protocol::wl_surface::WlSurface;
use smithay::utils::{Logical, Point, Rectangle, SERIAL_COUNTER};
use tracing::{info, trace};

use crate::config::Edge;
use crate::interactive::{finish, FinishOutcome, Grab, GrabEligibility, InputMode};
use crate::server::{Action, Server};
use crate::ssd::{ButtonKind, Part};
use crate::view::{Maximized, ViewId};

use keyboard::{ChordKey, ChordMatcher, Modifiers, RepeatTimer};
use pointer::{button_release_mode, motion_action, MotionAction};

/// Owns the seat-wide input-mode state machine and its associated grab.
/// Transitions per spec.md §4.E "Input mode".
pub struct InputRouter<A: Clone> {
    pub mode: InputMode,
    pub grab: Option<Grab>,
    pub chords: ChordMatcher<A>,
    pub repeat: Option<RepeatTimer>,
    /// Set while an input-method holds a keyboard grab (4.E "IME grab
    /// forwarding").
    pub ime_grab_active: bool,
}

impl<A: Clone> InputRouter<A> {
    pub fn new(chords: ChordMatcher<A>) -> Self {
        Self {
            mode: InputMode::Passthrough,
            grab: None,
            chords,
            repeat: None,
            ime_grab_active: false,
        }
    }

    /// `PASSTHROUGH → MOVE`, only if currently passthrough and the view is
    /// eligible (spec.md §4.E).
    pub fn interactive_begin_move(
        &mut self,
        view: ViewId,
        current_geometry: Rectangle<i32, Logical>,
        grab_point: Point<f64, Logical>,
        eligibility: GrabEligibility,
    ) -> bool {
        if self.mode != InputMode::Passthrough || !eligibility.can_move() {
            return false;
        }
        self.grab = Some(Grab::begin_move(view, current_geometry, grab_point));
        self.mode = InputMode::Move;
        true
    }

    /// `PASSTHROUGH → RESIZE`.
    pub fn interactive_begin_resize(
        &mut self,
        view: ViewId,
        current_geometry: Rectangle<i32, Logical>,
        grab_point: Point<f64, Logical>,
        edges: HashSet<Edge>,
        eligibility: GrabEligibility,
    ) -> bool {
        if self.mode != InputMode::Passthrough || !eligibility.can_resize() {
            return false;
        }
        self.grab = Some(Grab::begin_resize(view, current_geometry, grab_point, edges));
        self.mode = InputMode::Resize;
        true
    }

    /// `MOVE/RESIZE → PASSTHROUGH` with snap applied (spec.md §4.E
    /// "Input mode").
    pub fn interactive_finish(&mut self) -> Option<Grab> {
        self.mode = InputMode::Passthrough;
        self.grab.take()
    }

    /// `MOVE/RESIZE → PASSTHROUGH`, no snap applied (e.g. Escape).
    pub fn interactive_cancel(&mut self) -> Option<Grab> {
        self.mode = InputMode::Passthrough;
        self.grab.take()
    }

    pub fn enter_menu(&mut self) -> bool {
        if self.mode != InputMode::Passthrough {
            return false;
        }
        self.mode = InputMode::Menu;
        true
    }

    pub fn leave_menu(&mut self) {
        if self.mode == InputMode::Menu {
            self.mode = InputMode::Passthrough;
        }
    }
}

fn modifiers_from_smithay(m: &smithay::input::keyboard::ModifiersState) -> Modifiers {
    Modifiers {
        shift: m.shift,
        ctrl: m.ctrl,
        alt: m.alt,
        logo: m.logo,
        mod5: false,
        mod3: false,
    }
}

/// `Part` → resize edge set, for beginning a resize grab from a border/
/// corner hit (4.D "Hit-testing").
fn edges_for_part(part: Part) -> HashSet<Edge> {
    let mut edges = HashSet::new();
    match part {
        Part::Top => {
            edges.insert(Edge::Top);
        }
        Part::Bottom => {
            edges.insert(Edge::Bottom);
        }
        Part::Left => {
            edges.insert(Edge::Left);
        }
        Part::Right => {
            edges.insert(Edge::Right);
        }
        Part::CornerTl => {
            edges.insert(Edge::Top);
            edges.insert(Edge::Left);
        }
        Part::CornerTr => {
            edges.insert(Edge::Top);
            edges.insert(Edge::Right);
        }
        Part::CornerBl => {
            edges.insert(Edge::Bottom);
            edges.insert(Edge::Left);
        }
        Part::CornerBr => {
            edges.insert(Edge::Bottom);
            edges.insert(Edge::Right);
        }
        Part::Titlebar | Part::Title | Part::Button(_) | Part::Client | Part::None => {}
    }
    edges
}

impl Server {
    /// Process one backend input event (teacher's `process_input_event_impl`,
    /// generalized from direct forwarding to routing through `InputRouter`'s
    /// mode state machine).
    pub fn process_input_event<B: InputBackend>(&mut self, event: InputEvent<B>)
    where
        <B as InputBackend>::Device: 'static,
    {
        match event {
            InputEvent::DeviceAdded { device } => {
                info!(device = %device.name(), "input device added");
            }
            InputEvent::DeviceRemoved { device } => {
                info!(device = %device.name(), "input device removed");
            }
            InputEvent::Keyboard { event, .. } => self.on_keyboard_key(event),
            InputEvent::PointerMotion { event, .. } => self.on_pointer_motion_relative(event),
            InputEvent::PointerMotionAbsolute { event, .. } => self.on_pointer_motion_absolute(event),
            InputEvent::PointerButton { event, .. } => self.on_pointer_button(event),
            InputEvent::PointerAxis { event, .. } => self.on_pointer_axis(event),
            _ => trace!("unhandled input event"),
        }
    }

    fn on_keyboard_key<B: InputBackend>(&mut self, event: B::KeyboardKeyEvent) {
        let keycode = event.key_code();
        let key_state = event.state();
        let serial = SERIAL_COUNTER.next_serial();
        let time = event.time_msec();

        let Some(keyboard) = self.seat.get_keyboard() else {
            return;
        };
        keyboard.input(
            self,
            keycode,
            key_state,
            serial,
            time,
            |server, modifiers, keysym| {
                if server.input.ime_grab_active {
                    return FilterResult::Forward;
                }
                let chord_key = ChordKey {
                    modifiers: modifiers_from_smithay(modifiers),
                    keysym: keysym.modified_sym().raw(),
                };
                let fires_on_press = !keyboard::is_modifier_only_keysym(chord_key.keysym);
                let pressed = key_state == smithay::backend::input::KeyState::Pressed;
                if pressed && fires_on_press {
                    if let Some(action) = server.input.chords.feed(chord_key) {
                        server.handle_action(action);
                        return FilterResult::Intercept(());
                    }
                } else if !pressed && !fires_on_press {
                    if let Some(action) = server.input.chords.feed(chord_key) {
                        server.handle_action(action);
                        return FilterResult::Intercept(());
                    }
                }
                FilterResult::Forward
            },
        );
    }

    fn surface_under(&self, location: Point<f64, Logical>) -> Option<(WlSurface, Point<i32, Logical>)> {
        let (_, view) = self
            .views
            .iter()
            .rev()
            .find(|(_, view)| {
                if !view.state.mapped || view.state.minimized {
                    return false;
                }
                let outer = view.ssd.outer_box(view.effective_geometry());
                outer.contains(Point::from((location.x.round() as i32, location.y.round() as i32)))
            })?;
        let view_loc = view.effective_geometry().loc;
        view.window
            .surface_under(location - view_loc.to_f64(), WindowSurfaceType::ALL)
            .map(|(surface, offset)| (surface, offset + view_loc))
    }

    /// Hit-test a view plus its SSD part at `location` (4.D "Hit-testing").
    fn view_and_part_at(&self, location: Point<f64, Logical>) -> Option<(ViewId, Part)> {
        let point = Point::from((location.x.round() as i32, location.y.round() as i32));
        self.views.iter().rev().find_map(|(id, view)| {
            if !view.state.mapped || view.state.minimized {
                return None;
            }
            let content = view.effective_geometry();
            let part = view.ssd.part_at(content, point);
            if part == Part::None {
                None
            } else {
                Some((*id, part))
            }
        })
    }

    fn on_pointer_motion_relative<B: InputBackend>(&mut self, event: B::PointerMotionEvent) {
        let Some(pointer) = self.seat.get_pointer() else {
            return;
        };
        let mut location = pointer.current_location();
        location += event.delta();
        self.dispatch_pointer_motion(location, event.time_msec());
    }

    fn on_pointer_motion_absolute<B: InputBackend>(&mut self, event: B::PointerMotionAbsoluteEvent) {
        let Some(output) = self.outputs.first() else {
            return;
        };
        let location = output.full_area.loc.to_f64() + event.position_transformed(output.full_area.size);
        self.dispatch_pointer_motion(location, event.time_msec());
    }

    fn dispatch_pointer_motion(&mut self, location: Point<f64, Logical>, time: u32) {
        let Some(pointer) = self.seat.get_pointer() else {
            return;
        };
        let serial = SERIAL_COUNTER.next_serial();

        match motion_action(self.input.mode) {
            MotionAction::HitTestAndForward => {
                let focus = self.surface_under(location);
                pointer.motion(self, focus, &MotionEvent { location, serial, time });
            }
            MotionAction::UpdateMoveGeometry => self.drive_move(location),
            MotionAction::UpdateResizeGeometry => self.drive_resize(location),
            MotionAction::MenuHoverOnly => {}
        }

        if let Some(output) = self.outputs.first() {
            self.backend.schedule_render(&output.output);
        }
    }

    /// Advance an armed move grab: resist the cursor near output/screen
    /// edges (4.G "Resistance") and arm the snap-overlay preview when the
    /// resisted position is sitting in an edge band, so `finish_grab` can
    /// apply it on release (4.F "Snap overlay"/"Finish"). The preview is
    /// decided immediately rather than through a delay timer.
    fn drive_move(&mut self, cursor: Point<f64, Logical>) {
        let Some(grab) = self.input.grab.clone() else {
            return;
        };
        let view_id = grab.view;
        let mut target_loc = grab.move_target(cursor);
        let size = grab.grab_box.size;
        let mut preview = None;

        if let Some(usable) = self.view_output_usable(view_id) {
            let strength = self.config.snap.screen_edge_strength as i64;
            let left = usable.loc.x as i64;
            let top = usable.loc.y as i64;
            let right = (usable.loc.x + usable.size.w - size.w) as i64;
            let bottom = (usable.loc.y + usable.size.h - size.h) as i64;

            target_loc.x = crate::edges::apply_resistance(left, target_loc.x as i64, strength) as i32;
            target_loc.x = crate::edges::apply_resistance(right, target_loc.x as i64, strength) as i32;
            target_loc.y = crate::edges::apply_resistance(top, target_loc.y as i64, strength) as i32;
            target_loc.y = crate::edges::apply_resistance(bottom, target_loc.y as i64, strength) as i32;

            if (target_loc.y as i64) <= top {
                preview = Some(crate::edges::SnapTarget::Edge(Edge::Top));
            } else if (target_loc.x as i64) <= left {
                preview = Some(crate::edges::SnapTarget::Edge(Edge::Left));
            } else if (target_loc.x as i64) >= right {
                preview = Some(crate::edges::SnapTarget::Edge(Edge::Right));
            }
        }

        if let Some(grab) = self.input.grab.as_mut() {
            grab.preview = preview;
        }

        let target = Rectangle::new(target_loc, size);
        if let Some(view) = self.views.get_mut(&view_id) {
            view.move_resize(target);
        }
        self.refresh_ssd(view_id);
    }

    fn drive_resize(&mut self, cursor: Point<f64, Logical>) {
        let Some(grab) = self.input.grab.clone() else {
            return;
        };
        let target = grab.resize_target(cursor);
        if let Some(view) = self.views.get_mut(&grab.view) {
            view.move_resize(target);
        }
        self.refresh_ssd(grab.view);
    }

    fn view_output_usable(&self, view_id: ViewId) -> Option<Rectangle<i32, Logical>> {
        let name = self.views.get(&view_id)?.output.as_ref()?.name();
        self.outputs
            .iter()
            .find(|o| o.output.name() == name)
            .map(|o| o.usable_area)
            .or_else(|| self.outputs.first().map(|o| o.usable_area))
    }

    fn on_pointer_button<B: InputBackend>(&mut self, event: B::PointerButtonEvent) {
        let Some(pointer) = self.seat.get_pointer() else {
            return;
        };
        let location = pointer.current_location();
        let button_state = event.state();
        let button = event.button_code();
        let serial = SERIAL_COUNTER.next_serial();
        let time = event.time_msec();

        if button_state == ButtonState::Pressed {
            match self.input.mode {
                InputMode::Passthrough => {
                    if let Some((view_id, part)) = self.view_and_part_at(location) {
                        self.focus_view(view_id);
                        match part {
                            Part::Titlebar | Part::Title => self.begin_move_from_button(view_id, location),
                            Part::Button(kind) => self.activate_ssd_button(view_id, kind),
                            Part::Top | Part::Bottom | Part::Left | Part::Right
                            | Part::CornerTl | Part::CornerTr | Part::CornerBl | Part::CornerBr => {
                                self.begin_resize_from_part(view_id, part, location);
                            }
                            Part::Client | Part::None => {}
                        }
                    }
                }
                InputMode::Menu => self.input.leave_menu(),
                InputMode::Move | InputMode::Resize => {}
            }
        } else if matches!(self.input.mode, InputMode::Move | InputMode::Resize) {
            self.finish_grab(location);
        }
        self.input.mode = button_release_mode(self.input.mode);

        let Some(pointer) = self.seat.get_pointer() else {
            return;
        };
        pointer.button(
            self,
            &ButtonEvent {
                button,
                state: button_state.into(),
                serial,
                time,
            },
        );
    }

    fn focus_view(&mut self, view_id: ViewId) {
        let ws_id = self
            .views
            .get(&view_id)
            .and_then(|v| v.workspace)
            .or_else(|| self.active_workspace_id());
        if let Some(ws_id) = ws_id {
            if let Some(ws) = self.workspaces.get_mut(ws_id) {
                ws.append_focus(view_id);
            }
        }
        if let Some(keyboard) = self.seat.get_keyboard() {
            let surface = self
                .views
                .get(&view_id)
                .and_then(|v| v.window.toplevel())
                .map(|t| t.wl_surface().clone());
            keyboard.set_focus(self, surface, SERIAL_COUNTER.next_serial());
        }
        self.sync_toplevel(view_id);
    }

    fn begin_move_from_button(&mut self, view_id: ViewId, cursor: Point<f64, Logical>) {
        let Some(view) = self.views.get(&view_id) else {
            return;
        };
        let eligibility = GrabEligibility {
            fullscreen: view.state.fullscreen,
            shaded: view.state.shaded,
            maximized_both: view.state.maximized == Maximized::Both,
            fixed_position: false,
        };
        let geometry = view.effective_geometry();
        self.input.interactive_begin_move(view_id, geometry, cursor, eligibility);
    }

    fn begin_resize_from_part(&mut self, view_id: ViewId, part: Part, cursor: Point<f64, Logical>) {
        let Some(view) = self.views.get(&view_id) else {
            return;
        };
        let eligibility = GrabEligibility {
            fullscreen: view.state.fullscreen,
            shaded: view.state.shaded,
            maximized_both: view.state.maximized == Maximized::Both,
            fixed_position: false,
        };
        let geometry = view.effective_geometry();
        let edges = edges_for_part(part);
        self.input.interactive_begin_resize(view_id, geometry, cursor, edges, eligibility);
    }

    fn activate_ssd_button(&mut self, view_id: ViewId, kind: ButtonKind) {
        self.focus_view(view_id);
        match kind {
            ButtonKind::Close => {
                if let Some(toplevel) = self.views.get(&view_id).and_then(|v| v.window.toplevel()) {
                    toplevel.send_close();
                }
            }
            ButtonKind::Maximize => self.toggle_maximize_focused(),
            ButtonKind::Iconify => {
                if let Some(view) = self.views.get_mut(&view_id) {
                    view.set_minimized(true);
                }
                self.sync_toplevel(view_id);
                self.refresh_ssd(view_id);
            }
            ButtonKind::Shade => {
                if let Some(view) = self.views.get_mut(&view_id) {
                    let shaded = !view.state.shaded;
                    view.set_shaded(shaded);
                }
                self.refresh_ssd(view_id);
            }
            ButtonKind::WindowIcon => {}
        }
    }

    fn finish_grab(&mut self, cursor: Point<f64, Logical>) {
        let Some(grab) = self.input.interactive_finish() else {
            return;
        };
        let Some(view) = self.views.get(&grab.view) else {
            return;
        };
        let current = view.geometry.current;
        let outcome = finish(&grab, current, self.config.snap.snap_top_maximize);

        match outcome {
            FinishOutcome::NoSnap(rect) => {
                if let Some(view) = self.views.get_mut(&grab.view) {
                    if grab.mode == InputMode::Move {
                        view.move_to(rect.loc.x, rect.loc.y);
                    } else {
                        view.move_resize(rect);
                    }
                }
                self.snap_constraints.clear_for(grab.view);
            }
            FinishOutcome::SnapToRegion(rect) => {
                if let Some(view) = self.views.get_mut(&grab.view) {
                    view.move_resize(rect);
                }
            }
            FinishOutcome::MaximizeTop => {
                if let Some(usable) = self.view_output_usable(grab.view) {
                    if let Some(view) = self.views.get_mut(&grab.view) {
                        view.set_maximized(Maximized::Both, true);
                        view.move_resize(usable);
                    }
                }
            }
            FinishOutcome::SnapToEdge(edge) => {
                if let Some(usable) = self.view_output_usable(grab.view) {
                    let half = crate::server::half_for_edge(usable, edge);
                    if let Some(view) = self.views.get_mut(&grab.view) {
                        view.set_tiled(crate::view::TiledEdges::single(edge), true);
                        view.move_resize(half);
                    }
                    self.snap_constraints.record(grab.view, edge, half);
                }
            }
        }
        let _ = cursor;
        self.sync_toplevel(grab.view);
        self.refresh_ssd(grab.view);
    }

    fn on_pointer_axis<B: InputBackend>(&mut self, event: B::PointerAxisEvent) {
        let Some(pointer) = self.seat.get_pointer() else {
            return;
        };
        let source = event.source();
        let mut frame = AxisFrame::new(event.time_msec()).source(source);

        if let Some(horizontal) = event.amount(Axis::Horizontal) {
            frame = frame.value(Axis::Horizontal, horizontal);
            if let Some(discrete) = event.amount_v120(Axis::Horizontal) {
                frame = frame.v120(Axis::Horizontal, discrete as i32);
            }
        }
        if let Some(vertical) = event.amount(Axis::Vertical) {
            frame = frame.value(Axis::Vertical, vertical);
            if let Some(discrete) = event.amount_v120(Axis::Vertical) {
                frame = frame.v120(Axis::Vertical, discrete as i32);
            }
        }
        if source == AxisSource::Finger
            && event.amount(Axis::Horizontal) == Some(0.0)
            && event.amount(Axis::Vertical) == Some(0.0)
        {
            frame = frame.stop(Axis::Horizontal).stop(Axis::Vertical);
        }

        pointer.axis(self, frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyboard::Keybinding;
    use smithay::utils::Size;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Action {
        Quit,
    }

    fn router() -> InputRouter<Action> {
        InputRouter::new(ChordMatcher::new(vec![Keybinding {
            chord: vec![ChordKey {
                modifiers: Modifiers::default(),
                keysym: 1,
            }],
            action: Action::Quit,
            repeats: false,
        }]))
    }

    fn rect() -> Rectangle<i32, Logical> {
        Rectangle::new(Point::from((0, 0)), Size::from((100, 100)))
    }

    #[test]
    fn begin_move_only_succeeds_from_passthrough() {
        let mut router = router();
        assert!(router.interactive_begin_move(ViewId(1), rect(), Point::from((0.0, 0.0)), GrabEligibility::default()));
        assert_eq!(router.mode, InputMode::Move);
        assert!(!router.interactive_begin_move(ViewId(1), rect(), Point::from((0.0, 0.0)), GrabEligibility::default()));
    }

    #[test]
    fn begin_move_rejected_when_fullscreen() {
        let mut router = router();
        let elig = GrabEligibility {
            fullscreen: true,
            ..Default::default()
        };
        assert!(!router.interactive_begin_move(ViewId(1), rect(), Point::from((0.0, 0.0)), elig));
        assert_eq!(router.mode, InputMode::Passthrough);
    }

    #[test]
    fn finish_returns_to_passthrough_and_yields_the_grab() {
        let mut router = router();
        router.interactive_begin_move(ViewId(1), rect(), Point::from((0.0, 0.0)), GrabEligibility::default());
        let grab = router.interactive_finish();
        assert!(grab.is_some());
        assert_eq!(router.mode, InputMode::Passthrough);
    }

    #[test]
    fn menu_mode_round_trips() {
        let mut router = router();
        assert!(router.enter_menu());
        assert_eq!(router.mode, InputMode::Menu);
        router.leave_menu();
        assert_eq!(router.mode, InputMode::Passthrough);
    }
}
