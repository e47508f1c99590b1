//! Key input types.
//!
//! Platform-agnostic key representation. Platform-specific code converts
//! native key events (DOM `KeyboardEvent.key`, terminal key codes, ...) into
//! `KeyEvent` before handing them to the combobox or the expander.

use smol_str::SmolStr;

/// Key values for keyboard input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key.
    Character(SmolStr),

    /// Unknown/unidentified key.
    Unidentified,

    // === Whitespace / editing ===
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,
    Space,

    // === Navigation ===
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,

    // === Modifiers ===
    Alt,
    Control,
    Meta,
    Shift,
}

impl Key {
    /// Create a character key.
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }

    /// Parse a DOM `KeyboardEvent.key` value.
    pub fn from_key_name(name: &str) -> Self {
        match name {
            "Backspace" => Self::Backspace,
            "Delete" => Self::Delete,
            "Enter" => Self::Enter,
            "Tab" => Self::Tab,
            "Escape" | "Esc" => Self::Escape,
            " " => Self::Space,
            "ArrowLeft" => Self::ArrowLeft,
            "ArrowRight" => Self::ArrowRight,
            "ArrowUp" => Self::ArrowUp,
            "ArrowDown" => Self::ArrowDown,
            "Home" => Self::Home,
            "End" => Self::End,
            "PageUp" => Self::PageUp,
            "PageDown" => Self::PageDown,
            "Alt" => Self::Alt,
            "Control" => Self::Control,
            "Meta" => Self::Meta,
            "Shift" => Self::Shift,
            other if other.chars().count() == 1 => Self::Character(other.into()),
            _ => Self::Unidentified,
        }
    }

    /// Check if this is a modifier key.
    pub fn is_modifier(&self) -> bool {
        matches!(self, Self::Alt | Self::Control | Self::Meta | Self::Shift)
    }
}

/// Modifier key state for a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const ALT: Self = Self {
        ctrl: false,
        alt: true,
        shift: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        ctrl: false,
        alt: false,
        shift: true,
        meta: false,
    };

    pub const META: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: true,
    };

    /// Whether any modifier other than Ctrl is held.
    pub fn has_non_ctrl(&self) -> bool {
        self.alt || self.shift || self.meta
    }
}

/// A key press with its modifier state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn ctrl(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::CTRL,
        }
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Event was not consumed, let the platform handle it.
    NotHandled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_key_name() {
        assert_eq!(Key::from_key_name("Enter"), Key::Enter);
        assert_eq!(Key::from_key_name("Esc"), Key::Escape);
        assert_eq!(Key::from_key_name("ArrowDown"), Key::ArrowDown);
        assert_eq!(Key::from_key_name("n"), Key::character("n"));
        assert_eq!(Key::from_key_name("@"), Key::character("@"));
        assert_eq!(Key::from_key_name("ö"), Key::character("ö"));
        assert_eq!(Key::from_key_name("F13"), Key::Unidentified);
    }

    #[test]
    fn test_key_classes() {
        assert!(Key::Shift.is_modifier());
        assert!(!Key::character("a").is_modifier());
    }

    #[test]
    fn test_non_ctrl_modifiers() {
        assert!(!Modifiers::CTRL.has_non_ctrl());
        assert!(Modifiers::SHIFT.has_non_ctrl());
        assert!(Modifiers::META.has_non_ctrl());
        assert!(!Modifiers::NONE.has_non_ctrl());
    }
}
