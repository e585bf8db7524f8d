// SPDX-License-Identifier: GPL-2.0-only

//! Titlebar buttons (4.D): the fixed set of clickable titlebar elements,
//! their hover/pressed state, and the icon each one shows.

use std::path::PathBuf;
use std::rc::Rc;

use super::image::ImageData;

/// The closed set of titlebar buttons labwc themes support (`openbox-3`
/// button ordering: icon on the left, `iconify`/`maximize`/`close` on the
/// right, `shade` optional).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonKind {
    WindowIcon,
    Iconify,
    Maximize,
    Close,
    Shade,
}

impl ButtonKind {
    /// Whether this button sits left of the title text (only the window
    /// icon does; the rest are right-aligned per the default theme).
    pub fn is_leading(self) -> bool {
        matches!(self, ButtonKind::WindowIcon)
    }
}

/// Pointer interaction state for one button, distinct from the view's own
/// `hover`/`active` so multiple buttons on one titlebar track independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonPointerState {
    pub hovered: bool,
    pub pressed: bool,
}

/// Which themed icon variant a button shows, resolved from view state
/// (e.g. `maximize.xbm` vs `maximize_toggled.xbm` when already maximized).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconVariant {
    Normal,
    Hover,
    Toggled,
    ToggledHover,
}

impl IconVariant {
    pub fn resolve(toggled: bool, hovered: bool) -> Self {
        match (toggled, hovered) {
            (true, true) => IconVariant::ToggledHover,
            (true, false) => IconVariant::Toggled,
            (false, true) => IconVariant::Hover,
            (false, false) => IconVariant::Normal,
        }
    }

    /// Themed filename suffix, matching the teacher's on-disk naming
    /// (`close.png`, `close_hover.png`, `maximize_toggled.png`, ...).
    pub fn suffix(self) -> &'static str {
        match self {
            IconVariant::Normal => "",
            IconVariant::Hover => "_hover",
            IconVariant::Toggled => "_toggled",
            IconVariant::ToggledHover => "_toggled_hover",
        }
    }
}

pub struct Button {
    pub kind: ButtonKind,
    pub pointer: ButtonPointerState,
    /// The themed icon directory, e.g. `.../Clearlooks/openbox-3`.
    pub theme_dir: PathBuf,
    pub icon: Option<Rc<ImageData>>,
}

impl Button {
    pub fn new(kind: ButtonKind, theme_dir: PathBuf) -> Self {
        Self {
            kind,
            pointer: ButtonPointerState::default(),
            theme_dir,
            icon: None,
        }
    }

    fn stem(self_kind: ButtonKind) -> &'static str {
        match self_kind {
            ButtonKind::WindowIcon => "window-icon",
            ButtonKind::Iconify => "iconify",
            ButtonKind::Maximize => "maximize",
            ButtonKind::Close => "close",
            ButtonKind::Shade => "shade",
        }
    }

    /// Path of the icon file for `variant`, following the theme directory
    /// layout (4.B / 4.D).
    pub fn icon_path(&self, variant: IconVariant) -> PathBuf {
        self.theme_dir
            .join(format!("{}{}.xbm", Self::stem(self.kind), variant.suffix()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_icon_is_leading_others_are_not() {
        assert!(ButtonKind::WindowIcon.is_leading());
        assert!(!ButtonKind::Close.is_leading());
        assert!(!ButtonKind::Maximize.is_leading());
    }

    #[test]
    fn icon_variant_resolves_toggled_and_hover_independently() {
        assert_eq!(IconVariant::resolve(false, false), IconVariant::Normal);
        assert_eq!(IconVariant::resolve(true, false), IconVariant::Toggled);
        assert_eq!(IconVariant::resolve(false, true), IconVariant::Hover);
        assert_eq!(IconVariant::resolve(true, true), IconVariant::ToggledHover);
    }

    #[test]
    fn icon_path_appends_stem_and_suffix() {
        let button = Button::new(ButtonKind::Maximize, PathBuf::from("/themes/Foo/openbox-3"));
        let path = button.icon_path(IconVariant::Toggled);
        assert_eq!(
            path,
            PathBuf::from("/themes/Foo/openbox-3/maximize_toggled.xbm")
        );
    }
}
