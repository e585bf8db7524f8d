// SPDX-License-Identifier: GPL-2.0-only

//! Keyboard chords, repeat, and IME grab forwarding (4.E "Keyboard").
//!
//! Grounded in the teacher's `Keybindings`/`Keybinding` (modifier-token
//! matching), generalized from single-keystroke bindings to chords with
//! longest-prefix matching, per-binding repeat, and the fire-on-release
//! rule for modifier-only bindings.

use std::time::Duration;

/// Modifier tokens (spec.md §4.E): `S=Shift, C=Ctrl, A/Mod1=Alt,
/// W/Mod4=Logo, M/Mod5, H/Mod3`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub logo: bool,
    pub mod5: bool,
    pub mod3: bool,
}

/// One key in a chord: a modifier snapshot plus a keysym. `keysym` uses the
/// XKB keysym numeric space; unknown single-character keysyms are resolved
/// by the caller to their Unicode codepoint before constructing this
/// (spec.md §4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChordKey {
    pub modifiers: Modifiers,
    pub keysym: u32,
}

/// Whether `keysym` is one of the modifier keysyms on its own (used to
/// decide fire-on-press vs fire-on-release, spec.md §4.E).
pub fn is_modifier_only_keysym(keysym: u32) -> bool {
    // XKB_KEY_Shift_L/R, Control_L/R, Alt_L/R, Super_L/R, ISO_Level3_Shift,
    // Hyper_L/R (linux/xkbcommon-keysyms.h numeric ranges).
    matches!(
        keysym,
        0xffe1 | 0xffe2 | 0xffe3 | 0xffe4 | 0xffe9 | 0xffea | 0xffeb | 0xffec | 0xfe03 | 0xffed | 0xffee
    )
}

#[derive(Debug, Clone)]
pub struct Keybinding<A> {
    pub chord: Vec<ChordKey>,
    pub action: A,
    pub repeats: bool,
}

/// Whether a configured binding fires on the key's press or release
/// (spec.md §4.E: "on release if every keysym in it is a modifier-only
/// key").
pub fn fires_on_release<A>(binding: &Keybinding<A>) -> bool {
    !binding.chord.is_empty() && binding.chord.iter().all(|k| is_modifier_only_keysym(k.keysym))
}

/// Longest-prefix chord matcher (spec.md §4.E "Keyboard"): accumulates
/// pressed keys into `progress`; on each new key, keeps any configured
/// bindings whose chord still matches the accumulated prefix, firing the
/// longest exact match found so far.
pub struct ChordMatcher<A: Clone> {
    bindings: Vec<Keybinding<A>>,
    progress: Vec<ChordKey>,
}

impl<A: Clone> ChordMatcher<A> {
    pub fn new(bindings: Vec<Keybinding<A>>) -> Self {
        Self {
            bindings,
            progress: Vec::new(),
        }
    }

    fn candidates(&self) -> Vec<&Keybinding<A>> {
        self.bindings
            .iter()
            .filter(|b| b.chord.len() >= self.progress.len() && b.chord[..self.progress.len()] == self.progress[..])
            .collect()
    }

    /// Feed one more pressed key. Returns `Some(action)` if a binding's
    /// full chord is now matched exactly (longest prefix), resetting
    /// progress; returns `None` and keeps accumulating otherwise. If no
    /// configured binding has `progress` as a viable prefix, resets and
    /// retries with just this key (so a failed chord doesn't eat the next
    /// binding attempt).
    pub fn feed(&mut self, key: ChordKey) -> Option<A> {
        self.progress.push(key);
        let mut candidates = self.candidates();

        if candidates.is_empty() {
            self.progress.clear();
            self.progress.push(key);
            candidates = self.candidates();
            if candidates.is_empty() {
                self.progress.clear();
                return None;
            }
        }

        if let Some(exact) = candidates.iter().find(|b| b.chord.len() == self.progress.len()) {
            let action = exact.action.clone();
            self.progress.clear();
            return Some(action);
        }

        None
    }

    pub fn reset(&mut self) {
        self.progress.clear();
    }
}

/// Per-binding repeat timer state (spec.md §4.E "Per-binding repeat").
#[derive(Debug, Clone, Copy)]
pub struct RepeatTimer {
    pub delay: Duration,
    pub rate_hz: u32,
    armed_at_delay: bool,
}

impl RepeatTimer {
    pub fn new(delay: Duration, rate_hz: u32) -> Self {
        Self {
            delay,
            rate_hz,
            armed_at_delay: true,
        }
    }

    /// Duration until the next synthetic repeat fire: `delay` for the
    /// first repeat after the initial press, `1/rate_hz` thereafter.
    pub fn next_interval(&mut self) -> Duration {
        if self.armed_at_delay {
            self.armed_at_delay = false;
            self.delay
        } else {
            Duration::from_secs_f64(1.0 / self.rate_hz.max(1) as f64)
        }
    }
}

/// Whether a key/modifier event from `device` should be forwarded to the
/// input-method's active keyboard grab (spec.md §4.E "IME grab
/// forwarding", E4): non-virtual keyboards are always forwarded while a
/// grab is held; virtual keyboards created by the grab-holding IME client
/// itself are never forwarded (loop prevention).
pub fn should_forward_to_ime_grab(is_virtual_keyboard: bool, virtual_keyboard_client_is_ime_client: bool) -> bool {
    !is_virtual_keyboard || !virtual_keyboard_client_is_ime_client
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(logo: bool, keysym: u32) -> ChordKey {
        ChordKey {
            modifiers: Modifiers {
                logo,
                ..Default::default()
            },
            keysym,
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Action {
        FocusNext,
        Quit,
    }

    #[test]
    fn single_key_chord_fires_immediately() {
        let mut matcher = ChordMatcher::new(vec![Keybinding {
            chord: vec![key(true, b'j' as u32)],
            action: Action::FocusNext,
            repeats: false,
        }]);
        assert_eq!(matcher.feed(key(true, b'j' as u32)), Some(Action::FocusNext));
    }

    #[test]
    fn longest_prefix_requires_full_chord() {
        let mut matcher = ChordMatcher::new(vec![Keybinding {
            chord: vec![key(true, b'a' as u32), key(true, b'b' as u32)],
            action: Action::Quit,
            repeats: false,
        }]);
        assert_eq!(matcher.feed(key(true, b'a' as u32)), None);
        assert_eq!(matcher.feed(key(true, b'b' as u32)), Some(Action::Quit));
    }

    #[test]
    fn mismatched_prefix_resets_and_retries_with_latest_key() {
        let mut matcher = ChordMatcher::new(vec![
            Keybinding {
                chord: vec![key(true, b'a' as u32), key(true, b'b' as u32)],
                action: Action::Quit,
                repeats: false,
            },
            Keybinding {
                chord: vec![key(true, b'c' as u32)],
                action: Action::FocusNext,
                repeats: false,
            },
        ]);
        assert_eq!(matcher.feed(key(true, b'a' as u32)), None);
        // second key doesn't continue any chord; it's retried alone and
        // matches the single-key binding.
        assert_eq!(matcher.feed(key(true, b'c' as u32)), Some(Action::FocusNext));
    }

    #[test]
    fn modifier_only_chord_fires_on_release() {
        let binding = Keybinding {
            chord: vec![key(true, 0xffeb)], // Super_L
            action: Action::FocusNext,
            repeats: false,
        };
        assert!(fires_on_release(&binding));
    }

    #[test]
    fn repeat_timer_uses_delay_then_rate() {
        let mut timer = RepeatTimer::new(Duration::from_millis(600), 25);
        assert_eq!(timer.next_interval(), Duration::from_millis(600));
        assert_eq!(timer.next_interval(), Duration::from_secs_f64(1.0 / 25.0));
    }

    #[test]
    fn ime_forwarding_excludes_only_virtual_keyboards_from_the_ime_client() {
        assert!(should_forward_to_ime_grab(false, false));
        assert!(should_forward_to_ime_grab(true, false));
        assert!(!should_forward_to_ime_grab(true, true));
    }
}
