// SPDX-License-Identifier: GPL-2.0-only

//! The configuration boundary the core consumes.
//!
//! `rc.xml`/`themerc` parsing is out of scope (spec.md §6, Non-goals):
//! this module owns the *search-path* algorithm and the already-parsed
//! shape of the values the rest of the crate reads. A caller that wants
//! real XML config support constructs a [`Config`] from a parser and
//! passes it to `Server::new`; absent that, [`Config::load`] falls back to
//! defaults overridden by a handful of environment variables, the same
//! granularity of "config" the teacher compositor itself exposes.

use std::env;
use std::path::PathBuf;

use thiserror::Error;

use crate::rules::WindowRule;

/// Edges a view can be tiled or snapped to (spec.md §3, `tiled` flag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom];
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid color value: {0}")]
    InvalidColor(String),
    #[error("unknown action: {0}")]
    UnknownAction(String),
    #[error("unparsable binding: {0}")]
    UnparsableBinding(String),
}

/// Theme dimensions consumed by the SSD engine (4.D).
#[derive(Debug, Clone, Copy)]
pub struct ThemeMetrics {
    pub titlebar_height: i32,
    pub border_width: i32,
    pub corner_radius: i32,
    pub resize_minimum_area: i32,
    pub resize_corner_range: i32,
    pub shadows_on_tiled: bool,
}

impl Default for ThemeMetrics {
    fn default() -> Self {
        Self {
            titlebar_height: 24,
            border_width: 1,
            corner_radius: 6,
            resize_minimum_area: 8,
            resize_corner_range: 20,
            shadows_on_tiled: false,
        }
    }
}

/// Snapping/resistance/placement tunables (4.F, 4.G).
#[derive(Debug, Clone, Copy)]
pub struct SnapConfig {
    pub gap: i32,
    pub screen_edge_strength: i32,
    pub window_edge_strength: i32,
    pub snap_preview_delay_inner_ms: u64,
    pub snap_preview_delay_outer_ms: u64,
    pub snap_top_maximize: bool,
    pub unsnap_threshold: i32,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            gap: 0,
            screen_edge_strength: 20,
            window_edge_strength: 10,
            snap_preview_delay_inner_ms: 150,
            snap_preview_delay_outer_ms: 500,
            snap_top_maximize: true,
            unsnap_threshold: 0,
        }
    }
}

/// Minimum view dimensions (`LAB_MIN_VIEW_WIDTH/HEIGHT`, 4.F).
pub const LAB_MIN_VIEW_WIDTH: i32 = 100;
pub const LAB_MIN_VIEW_HEIGHT: i32 = 60;

/// `LAB_SCALED_BUFFER_MAX_CACHE` (4.A, §3).
pub const LAB_SCALED_BUFFER_MAX_CACHE: usize = 2;

/// Keyboard-repeat tunables (4.E).
#[derive(Debug, Clone, Copy)]
pub struct RepeatConfig {
    pub rate_hz: u32,
    pub delay_ms: u64,
}

impl Default for RepeatConfig {
    fn default() -> Self {
        Self {
            rate_hz: 25,
            delay_ms: 600,
        }
    }
}

/// Stylus-button remapping table (4.E, "Touch/tablet").
#[derive(Debug, Clone, Copy)]
pub struct TabletButtonMap {
    pub tip: u32,
    pub stylus: u32,
    pub stylus2: u32,
}

impl Default for TabletButtonMap {
    fn default() -> Self {
        // BTN_LEFT, BTN_RIGHT, BTN_MIDDLE (linux/input-event-codes.h)
        Self {
            tip: 0x110,
            stylus: 0x111,
            stylus2: 0x112,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TearingPolicy {
    Never,
    FullscreenOnly,
    Always,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: ThemeMetrics,
    pub snap: SnapConfig,
    pub repeat: RepeatConfig,
    pub tablet_buttons: TabletButtonMap,
    pub rules: Vec<WindowRule>,
    pub tearing: TearingPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: ThemeMetrics::default(),
            snap: SnapConfig::default(),
            repeat: RepeatConfig::default(),
            tablet_buttons: TabletButtonMap::default(),
            rules: Vec::new(),
            tearing: TearingPolicy::FullscreenOnly,
        }
    }
}

impl Config {
    /// Load a default configuration overridden by a few environment
    /// variables (no file parsing; see module docs).
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(gap) = env_i32("LABWC_GAP") {
            config.snap.gap = gap;
        }
        if let Some(strength) = env_i32("LABWC_SCREEN_EDGE_STRENGTH") {
            config.snap.screen_edge_strength = strength;
        }
        if let Some(strength) = env_i32("LABWC_WINDOW_EDGE_STRENGTH") {
            config.snap.window_edge_strength = strength;
        }
        if let Ok(val) = env::var("LABWC_SNAP_TOP_MAXIMIZE") {
            config.snap.snap_top_maximize = val != "0" && val.to_lowercase() != "no";
        }

        config
    }

    /// XDG-base-dir search order for `rc.xml`/`themerc` (spec.md §6).
    pub fn xdg_config_dirs() -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        if let Ok(xdg_home) = env::var("XDG_CONFIG_HOME") {
            dirs.push(PathBuf::from(xdg_home).join("labwc"));
        } else if let Ok(home) = env::var("HOME") {
            dirs.push(PathBuf::from(home).join(".config").join("labwc"));
        }
        if let Ok(xdg_dirs) = env::var("XDG_CONFIG_DIRS") {
            for dir in xdg_dirs.split(':').filter(|s| !s.is_empty()) {
                dirs.push(PathBuf::from(dir).join("labwc"));
            }
        } else {
            dirs.push(PathBuf::from("/etc/xdg/labwc"));
        }
        dirs
    }

    /// Theme search order (spec.md §6): `<base>/themes/<theme>/openbox-3/<file>`.
    pub fn theme_search_dirs() -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        if let Ok(xdg_data_home) = env::var("XDG_DATA_HOME") {
            dirs.push(PathBuf::from(xdg_data_home).join("themes"));
        }
        if let Ok(home) = env::var("HOME") {
            dirs.push(PathBuf::from(&home).join(".themes"));
            dirs.push(PathBuf::from(home).join(".local/share/themes"));
        }
        if let Ok(xdg_data_dirs) = env::var("XDG_DATA_DIRS") {
            for dir in xdg_data_dirs.split(':').filter(|s| !s.is_empty()) {
                dirs.push(PathBuf::from(dir).join("themes"));
            }
        } else {
            dirs.push(PathBuf::from("/usr/local/share/themes"));
            dirs.push(PathBuf::from("/usr/share/themes"));
        }
        dirs
    }

    pub fn theme_file_path(theme: &str, file: &str) -> Vec<PathBuf> {
        Self::theme_search_dirs()
            .into_iter()
            .map(|dir| dir.join(theme).join("openbox-3").join(file))
            .collect()
    }
}

fn env_i32(name: &str) -> Option<i32> {
    env::var(name).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_theme_metrics_are_sane() {
        let theme = ThemeMetrics::default();
        assert!(theme.titlebar_height > 0);
        assert!(theme.border_width >= 0);
    }

    #[test]
    fn xdg_config_dirs_includes_etc_xdg_fallback() {
        // SAFETY: test runs single-threaded within this process's env mutation.
        unsafe {
            env::remove_var("XDG_CONFIG_DIRS");
        }
        let dirs = Config::xdg_config_dirs();
        assert!(dirs.iter().any(|d| d == std::path::Path::new("/etc/xdg/labwc")));
    }

    #[test]
    fn theme_file_path_appends_openbox3_subdir() {
        let paths = Config::theme_file_path("Clearlooks", "themerc");
        assert!(paths
            .iter()
            .all(|p| p.ends_with("Clearlooks/openbox-3/themerc")));
    }
}
