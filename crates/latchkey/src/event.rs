//! Key event vocabulary.
//!
//! This module defines the in-process abstraction of a raw key-down: the
//! logical [`Key`], the [`KeyboardModifiers`] held with it, and the
//! [`KeyEvent`] the host's input layer builds for every physical key press.
//!
//! The engine never touches a real event source. Whatever delivers input
//! (a DOM bridge, winit, a terminal backend) translates its native events
//! into [`KeyEvent`]s and feeds them to the router, which answers with a
//! propagation verdict.

/// Keyboard modifiers that may be held during a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct KeyboardModifiers {
    /// The Shift key is held.
    pub shift: bool,
    /// The Control key is held.
    pub control: bool,
    /// The Alt key is held (Option on macOS).
    pub alt: bool,
    /// The Meta/Super key is held (Windows key, Cmd on macOS).
    pub meta: bool,
}

impl KeyboardModifiers {
    /// No modifiers pressed.
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: false,
    };

    /// Shift modifier only.
    pub const SHIFT: Self = Self {
        shift: true,
        control: false,
        alt: false,
        meta: false,
    };

    /// Control modifier only.
    pub const CTRL: Self = Self {
        shift: false,
        control: true,
        alt: false,
        meta: false,
    };

    /// Alt modifier only.
    pub const ALT: Self = Self {
        shift: false,
        control: false,
        alt: true,
        meta: false,
    };

    /// Meta modifier only.
    pub const META: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: true,
    };

    /// Control + Shift modifiers.
    pub const CTRL_SHIFT: Self = Self {
        shift: true,
        control: true,
        alt: false,
        meta: false,
    };

    /// Check if any modifier is pressed.
    pub fn any(&self) -> bool {
        self.shift || self.control || self.alt || self.meta
    }

    /// Check if no modifiers are pressed.
    pub fn none(&self) -> bool {
        !self.any()
    }

    /// Check if a non-Shift modifier is pressed.
    ///
    /// Shift alone does not make a chord: it produces a different printable
    /// character instead. Tab handling and the text-input gate both care only
    /// about Control/Alt/Meta.
    pub fn any_non_shift(&self) -> bool {
        self.control || self.alt || self.meta
    }
}

/// Logical key codes.
///
/// This covers the keys a shortcut map can meaningfully name: letters,
/// digits, function keys, navigation and editing keys, modifiers, and the
/// main-row punctuation. Anything else arrives as [`Key::Unknown`] with the
/// host's native code and will simply never match a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    // Digits (main keyboard)
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    // Function keys
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,

    // Navigation
    ArrowUp, ArrowDown, ArrowLeft, ArrowRight,
    Home, End, PageUp, PageDown,

    // Editing
    Backspace, Delete, Insert,
    Enter, Tab,

    // Whitespace
    Space,

    // Modifiers
    Shift, Control, Alt, Meta,

    // Punctuation and symbols
    Minus, Equal,
    BracketLeft, BracketRight, Backslash,
    Semicolon, Quote,
    Comma, Period, Slash,
    Grave,

    // Control
    Escape,

    // Unknown/unmapped key with the host's native code.
    Unknown(u16),
}

impl Key {
    /// Check if this is a modifier key.
    ///
    /// A bare modifier press is never a chord of its own; the router filters
    /// these out before sequence accumulation.
    pub fn is_modifier(&self) -> bool {
        matches!(self, Key::Shift | Key::Control | Key::Alt | Key::Meta)
    }

    /// Check if this is a navigation key (arrows, Home/End, paging).
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Key::ArrowUp
                | Key::ArrowDown
                | Key::ArrowLeft
                | Key::ArrowRight
                | Key::Home
                | Key::End
                | Key::PageUp
                | Key::PageDown
        )
    }

    /// Convert a character to the corresponding key.
    ///
    /// Handles letters (case-insensitive), digits, main-row punctuation, and
    /// space. Returns `None` for anything else.
    pub fn from_char(ch: char) -> Option<Self> {
        let key = match ch.to_ascii_lowercase() {
            'a' => Key::A,
            'b' => Key::B,
            'c' => Key::C,
            'd' => Key::D,
            'e' => Key::E,
            'f' => Key::F,
            'g' => Key::G,
            'h' => Key::H,
            'i' => Key::I,
            'j' => Key::J,
            'k' => Key::K,
            'l' => Key::L,
            'm' => Key::M,
            'n' => Key::N,
            'o' => Key::O,
            'p' => Key::P,
            'q' => Key::Q,
            'r' => Key::R,
            's' => Key::S,
            't' => Key::T,
            'u' => Key::U,
            'v' => Key::V,
            'w' => Key::W,
            'x' => Key::X,
            'y' => Key::Y,
            'z' => Key::Z,
            '0' => Key::Digit0,
            '1' => Key::Digit1,
            '2' => Key::Digit2,
            '3' => Key::Digit3,
            '4' => Key::Digit4,
            '5' => Key::Digit5,
            '6' => Key::Digit6,
            '7' => Key::Digit7,
            '8' => Key::Digit8,
            '9' => Key::Digit9,
            '-' => Key::Minus,
            '=' => Key::Equal,
            '[' => Key::BracketLeft,
            ']' => Key::BracketRight,
            '\\' => Key::Backslash,
            ';' => Key::Semicolon,
            '\'' => Key::Quote,
            ',' => Key::Comma,
            '.' => Key::Period,
            '/' => Key::Slash,
            '`' => Key::Grave,
            ' ' => Key::Space,
            _ => return None,
        };
        Some(key)
    }
}

/// A key-down event, as delivered by the host's input layer.
///
/// Carries everything the router needs to decide between focus navigation,
/// shortcut dispatch, and propagation: the logical key, the modifier state,
/// and whether the event originated inside a text-entry element (the stand-in
/// for the host's "is the target an input field" query).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key that was pressed.
    pub key: Key,
    /// Keyboard modifiers held during the event.
    pub modifiers: KeyboardModifiers,
    /// Whether input focus is inside a text-entry element.
    ///
    /// Printable keys from a text field must echo as text; the router only
    /// offers such events to the shortcut resolver when they carry a
    /// non-Shift modifier or are on the small navigation allow-list.
    pub from_text_input: bool,
    /// Whether this is an auto-repeat event (key held down).
    pub is_repeat: bool,
}

impl KeyEvent {
    /// Create a key event outside any text-entry element.
    pub fn new(key: Key, modifiers: KeyboardModifiers) -> Self {
        Self {
            key,
            modifiers,
            from_text_input: false,
            is_repeat: false,
        }
    }

    /// Mark this event as originating inside a text-entry element.
    pub fn in_text_input(mut self) -> Self {
        self.from_text_input = true;
        self
    }

    /// Mark this event as an auto-repeat.
    pub fn repeated(mut self) -> Self {
        self.is_repeat = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_char() {
        assert_eq!(Key::from_char('a'), Some(Key::A));
        assert_eq!(Key::from_char('A'), Some(Key::A));
        assert_eq!(Key::from_char('9'), Some(Key::Digit9));
        assert_eq!(Key::from_char(';'), Some(Key::Semicolon));
        assert_eq!(Key::from_char(' '), Some(Key::Space));
        assert_eq!(Key::from_char('é'), None);
    }

    #[test]
    fn test_modifier_predicates() {
        assert!(Key::Shift.is_modifier());
        assert!(Key::Meta.is_modifier());
        assert!(!Key::A.is_modifier());
        assert!(Key::ArrowLeft.is_navigation());
        assert!(!Key::Enter.is_navigation());
    }

    #[test]
    fn test_modifiers_any_non_shift() {
        assert!(!KeyboardModifiers::NONE.any_non_shift());
        assert!(!KeyboardModifiers::SHIFT.any_non_shift());
        assert!(KeyboardModifiers::CTRL.any_non_shift());
        assert!(KeyboardModifiers::ALT.any_non_shift());
        assert!(KeyboardModifiers::CTRL_SHIFT.any());
    }

    #[test]
    fn test_event_builders() {
        let ev = KeyEvent::new(Key::A, KeyboardModifiers::NONE).in_text_input();
        assert!(ev.from_text_input);
        assert!(!ev.is_repeat);
        assert!(ev.repeated().is_repeat);
    }
}
