// SPDX-License-Identifier: GPL-2.0-only

//! Touch and drawing-tablet emulation (4.E "Touch/tablet"): stylus buttons
//! map to pointer buttons via a user-configurable table, unless a
//! tablet-pad is linked to its tablet by libinput device group, in which
//! case native tablet-v2 events are delivered instead of emulated clicks.

use crate::config::TabletButtonMap;

/// The stylus button identifiers the table remaps (spec.md §4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StylusButton {
    Tip,
    Stylus,
    Stylus2,
}

/// Resolve a stylus button press to the emulated pointer button code
/// (`linux/input-event-codes.h` `BTN_*` values) per the configured map.
pub fn emulated_pointer_button(map: &TabletButtonMap, button: StylusButton) -> u32 {
    match button {
        StylusButton::Tip => map.tip,
        StylusButton::Stylus => map.stylus,
        StylusButton::Stylus2 => map.stylus2,
    }
}

/// Touch points are emulated as absolute-pointer motion + pointer-button
/// events (spec.md §4.E): a touch-down is a motion to that point followed
/// by a button press; touch-up is a button release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchEmulation {
    MotionThenPress,
    Release,
}

pub fn emulate_touch_down() -> TouchEmulation {
    TouchEmulation::MotionThenPress
}

pub fn emulate_touch_up() -> TouchEmulation {
    TouchEmulation::Release
}

/// libinput device-group identity; two devices sharing one are considered
/// a linked tablet+pad pair (spec.md §4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceGroupId(pub u64);

/// Whether `pad_group` is linked to `tablet_group` — if so, the pad's
/// button/ring/strip events should be delivered via the native
/// `tablet-v2` protocol instead of emulated as pointer clicks.
pub fn pad_is_linked_to_tablet(pad_group: DeviceGroupId, tablet_group: DeviceGroupId) -> bool {
    pad_group == tablet_group
}

/// Decide how to route a pad event given the linkage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadRouting {
    Native,
    Emulated,
}

pub fn route_pad_event(pad_group: DeviceGroupId, linked_tablet_group: Option<DeviceGroupId>) -> PadRouting {
    match linked_tablet_group {
        Some(tablet_group) if pad_is_linked_to_tablet(pad_group, tablet_group) => PadRouting::Native,
        _ => PadRouting::Emulated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_map_uses_standard_btn_codes() {
        let map = TabletButtonMap::default();
        assert_eq!(emulated_pointer_button(&map, StylusButton::Tip), 0x110);
        assert_eq!(emulated_pointer_button(&map, StylusButton::Stylus), 0x111);
        assert_eq!(emulated_pointer_button(&map, StylusButton::Stylus2), 0x112);
    }

    #[test]
    fn linked_pad_routes_natively() {
        let group = DeviceGroupId(7);
        assert_eq!(route_pad_event(group, Some(group)), PadRouting::Native);
    }

    #[test]
    fn unlinked_pad_falls_back_to_emulation() {
        let pad = DeviceGroupId(1);
        let tablet = DeviceGroupId(2);
        assert_eq!(route_pad_event(pad, Some(tablet)), PadRouting::Emulated);
        assert_eq!(route_pad_event(pad, None), PadRouting::Emulated);
    }
}
