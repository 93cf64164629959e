//! Key chords and chord sequences.
//!
//! A [`KeyChord`] is the normalized form of one physical key press: the
//! modifier flags plus the key, ordered Alt, Ctrl, Meta, Shift in the string
//! form. A [`ChordSequence`] is an ordered list of chords, which is what key
//! maps bind to actions — a single chord like `Ctrl+S`, or a multi-chord
//! sequence like `G, I` (press `g`, then `i`).
//!
//! Both parse from and render to human-readable strings:
//!
//! ```
//! use latchkey::{ChordSequence, KeyChord, Key};
//!
//! let seq: ChordSequence = "Ctrl+K, Ctrl+C".parse().unwrap();
//! assert_eq!(seq.len(), 2);
//! assert_eq!(seq.to_string(), "Ctrl+K, Ctrl+C");
//!
//! let chord: ChordSequence = "g".parse().unwrap();
//! assert_eq!(chord.chords()[0], KeyChord::key_only(Key::G));
//! ```

use std::fmt;
use std::str::FromStr;

use crate::event::{Key, KeyEvent, KeyboardModifiers};

/// A single normalized chord: one key with modifier flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyChord {
    /// The primary key.
    pub key: Key,
    /// The modifier keys held with it.
    pub modifiers: KeyboardModifiers,
}

impl KeyChord {
    /// Create a new chord from a key and modifiers.
    pub fn new(key: Key, modifiers: KeyboardModifiers) -> Self {
        Self { key, modifiers }
    }

    /// Create a chord with no modifiers.
    pub fn key_only(key: Key) -> Self {
        Self {
            key,
            modifiers: KeyboardModifiers::NONE,
        }
    }

    /// Create a Ctrl+key chord.
    pub fn ctrl(key: Key) -> Self {
        Self {
            key,
            modifiers: KeyboardModifiers::CTRL,
        }
    }

    /// Create an Alt+key chord.
    pub fn alt(key: Key) -> Self {
        Self {
            key,
            modifiers: KeyboardModifiers::ALT,
        }
    }

    /// Create a Shift+key chord.
    pub fn shift(key: Key) -> Self {
        Self {
            key,
            modifiers: KeyboardModifiers::SHIFT,
        }
    }

    /// Create a Ctrl+Shift+key chord.
    pub fn ctrl_shift(key: Key) -> Self {
        Self {
            key,
            modifiers: KeyboardModifiers::CTRL_SHIFT,
        }
    }

    /// Build the normalized chord for a key event.
    ///
    /// This is the per-keystroke normalization the router performs before
    /// appending to the pending sequence.
    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            key: event.key,
            modifiers: event.modifiers,
        }
    }
}

impl fmt::Display for KeyChord {
    /// Renders with modifier prefixes in Alt, Ctrl, Meta, Shift order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.alt {
            write!(f, "Alt+")?;
        }
        if self.modifiers.control {
            write!(f, "Ctrl+")?;
        }
        if self.modifiers.meta {
            write!(f, "Meta+")?;
        }
        if self.modifiers.shift {
            write!(f, "Shift+")?;
        }
        write!(f, "{}", key_name(self.key))
    }
}

impl FromStr for KeyChord {
    type Err = ChordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_chord(s)
    }
}

/// An ordered sequence of chords bound (or being matched) as a shortcut.
///
/// Sequences have at least one chord and no upper length limit.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChordSequence {
    chords: Vec<KeyChord>,
}

impl ChordSequence {
    /// Create a sequence from a single chord.
    pub fn single(chord: KeyChord) -> Self {
        Self {
            chords: vec![chord],
        }
    }

    /// Create a sequence from multiple chords.
    ///
    /// # Panics
    ///
    /// Panics if `chords` is empty.
    pub fn from_chords(chords: Vec<KeyChord>) -> Self {
        assert!(!chords.is_empty(), "a chord sequence must have at least one chord");
        Self { chords }
    }

    /// Get the number of chords in this sequence.
    pub fn len(&self) -> usize {
        self.chords.len()
    }

    /// Check if this is a single-chord sequence.
    pub fn is_single(&self) -> bool {
        self.chords.len() == 1
    }

    /// Get the chords in this sequence.
    pub fn chords(&self) -> &[KeyChord] {
        &self.chords
    }
}

impl fmt::Display for ChordSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chord) in self.chords.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{chord}")?;
        }
        Ok(())
    }
}

impl FromStr for ChordSequence {
    type Err = ChordParseError;

    /// Parse a chord sequence from a string.
    ///
    /// Chords are comma-separated; within a chord, modifiers and the key are
    /// joined with `+`. Modifier names are case-insensitive.
    ///
    /// # Examples
    ///
    /// - `"Ctrl+S"` — single chord
    /// - `"Ctrl+K, Ctrl+C"` — two-chord sequence
    /// - `"g, i"` — unmodified multi-chord sequence
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ChordParseError::Empty);
        }

        let mut chords = Vec::new();
        for part in s.split(',') {
            chords.push(parse_chord(part)?);
        }
        Ok(Self { chords })
    }
}

impl From<KeyChord> for ChordSequence {
    fn from(chord: KeyChord) -> Self {
        Self::single(chord)
    }
}

/// Error type for parsing chords and chord sequences.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChordParseError {
    /// The string is empty.
    #[error("empty chord")]
    Empty,
    /// Only modifiers were given, no key.
    #[error("no key specified (only modifiers)")]
    NoKey,
    /// Unknown key name.
    #[error("unknown key: {0}")]
    UnknownKey(String),
}

/// Parse a single chord from a string like `"Ctrl+S"`.
fn parse_chord(s: &str) -> Result<KeyChord, ChordParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ChordParseError::Empty);
    }

    let mut modifiers = KeyboardModifiers::NONE;
    let mut key: Option<Key> = None;

    for part in s.split('+') {
        let part = part.trim();
        match part.to_lowercase().as_str() {
            "alt" | "option" => modifiers.alt = true,
            "ctrl" | "control" => modifiers.control = true,
            "meta" | "cmd" | "command" | "super" | "win" => modifiers.meta = true,
            "shift" => modifiers.shift = true,
            _ => key = Some(parse_key(part)?),
        }
    }

    match key {
        Some(key) => Ok(KeyChord::new(key, modifiers)),
        None => Err(ChordParseError::NoKey),
    }
}

/// Parse a key name.
fn parse_key(s: &str) -> Result<Key, ChordParseError> {
    // Single characters cover letters, digits, and punctuation.
    let mut chars = s.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        return Key::from_char(ch).ok_or_else(|| ChordParseError::UnknownKey(s.to_string()));
    }

    let key = match s.to_lowercase().as_str() {
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,

        "up" | "arrowup" => Key::ArrowUp,
        "down" | "arrowdown" => Key::ArrowDown,
        "left" | "arrowleft" => Key::ArrowLeft,
        "right" | "arrowright" => Key::ArrowRight,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" | "pgup" => Key::PageUp,
        "pagedown" | "pgdn" => Key::PageDown,

        "backspace" => Key::Backspace,
        "delete" | "del" => Key::Delete,
        "insert" | "ins" => Key::Insert,
        "enter" | "return" => Key::Enter,
        "tab" => Key::Tab,
        "space" | "spacebar" => Key::Space,
        "escape" | "esc" => Key::Escape,

        _ => return Err(ChordParseError::UnknownKey(s.to_string())),
    };
    Ok(key)
}

/// The canonical name of a key, as used in chord strings.
fn key_name(key: Key) -> &'static str {
    match key {
        Key::A => "A",
        Key::B => "B",
        Key::C => "C",
        Key::D => "D",
        Key::E => "E",
        Key::F => "F",
        Key::G => "G",
        Key::H => "H",
        Key::I => "I",
        Key::J => "J",
        Key::K => "K",
        Key::L => "L",
        Key::M => "M",
        Key::N => "N",
        Key::O => "O",
        Key::P => "P",
        Key::Q => "Q",
        Key::R => "R",
        Key::S => "S",
        Key::T => "T",
        Key::U => "U",
        Key::V => "V",
        Key::W => "W",
        Key::X => "X",
        Key::Y => "Y",
        Key::Z => "Z",
        Key::Digit0 => "0",
        Key::Digit1 => "1",
        Key::Digit2 => "2",
        Key::Digit3 => "3",
        Key::Digit4 => "4",
        Key::Digit5 => "5",
        Key::Digit6 => "6",
        Key::Digit7 => "7",
        Key::Digit8 => "8",
        Key::Digit9 => "9",
        Key::F1 => "F1",
        Key::F2 => "F2",
        Key::F3 => "F3",
        Key::F4 => "F4",
        Key::F5 => "F5",
        Key::F6 => "F6",
        Key::F7 => "F7",
        Key::F8 => "F8",
        Key::F9 => "F9",
        Key::F10 => "F10",
        Key::F11 => "F11",
        Key::F12 => "F12",
        Key::ArrowUp => "Up",
        Key::ArrowDown => "Down",
        Key::ArrowLeft => "Left",
        Key::ArrowRight => "Right",
        Key::Home => "Home",
        Key::End => "End",
        Key::PageUp => "PageUp",
        Key::PageDown => "PageDown",
        Key::Backspace => "Backspace",
        Key::Delete => "Delete",
        Key::Insert => "Insert",
        Key::Enter => "Enter",
        Key::Tab => "Tab",
        Key::Space => "Space",
        Key::Escape => "Escape",
        Key::Shift => "Shift",
        Key::Control => "Ctrl",
        Key::Alt => "Alt",
        Key::Meta => "Meta",
        Key::Minus => "-",
        Key::Equal => "=",
        Key::BracketLeft => "[",
        Key::BracketRight => "]",
        Key::Backslash => "\\",
        Key::Semicolon => ";",
        Key::Quote => "'",
        Key::Comma => ",",
        Key::Period => ".",
        Key::Slash => "/",
        Key::Grave => "`",
        Key::Unknown(_) => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_key() {
        let chord: KeyChord = "g".parse().unwrap();
        assert_eq!(chord, KeyChord::key_only(Key::G));
    }

    #[test]
    fn test_parse_ctrl_key() {
        let chord: KeyChord = "Ctrl+S".parse().unwrap();
        assert_eq!(chord.key, Key::S);
        assert!(chord.modifiers.control);
        assert!(!chord.modifiers.shift);
    }

    #[test]
    fn test_parse_multiple_modifiers() {
        let chord: KeyChord = "Ctrl+Shift+N".parse().unwrap();
        assert!(chord.modifiers.control);
        assert!(chord.modifiers.shift);
        assert_eq!(chord.key, Key::N);
    }

    #[test]
    fn test_parse_case_insensitive() {
        let a: KeyChord = "ctrl+s".parse().unwrap();
        let b: KeyChord = "CTRL+S".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_named_keys() {
        assert_eq!("Enter".parse::<KeyChord>().unwrap().key, Key::Enter);
        assert_eq!("return".parse::<KeyChord>().unwrap().key, Key::Enter);
        assert_eq!("Esc".parse::<KeyChord>().unwrap().key, Key::Escape);
        assert_eq!("F5".parse::<KeyChord>().unwrap().key, Key::F5);
        assert_eq!("Up".parse::<KeyChord>().unwrap().key, Key::ArrowUp);
    }

    #[test]
    fn test_parse_sequence() {
        let seq: ChordSequence = "Ctrl+K, Ctrl+C".parse().unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.chords()[0], KeyChord::ctrl(Key::K));
        assert_eq!(seq.chords()[1], KeyChord::ctrl(Key::C));
    }

    #[test]
    fn test_parse_unmodified_sequence() {
        let seq: ChordSequence = "g, i".parse().unwrap();
        assert_eq!(seq.len(), 2);
        assert!(seq.chords()[0].modifiers.none());
    }

    #[test]
    fn test_parse_long_sequence() {
        // No length cap on sequences.
        let seq: ChordSequence = "a, b, c, d, e, f".parse().unwrap();
        assert_eq!(seq.len(), 6);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<ChordSequence>(), Err(ChordParseError::Empty));
        assert_eq!("Ctrl+Alt".parse::<KeyChord>(), Err(ChordParseError::NoKey));
        assert!(matches!(
            "Ctrl+Bogus".parse::<KeyChord>(),
            Err(ChordParseError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_display_modifier_order() {
        // Modifier prefixes render in Alt, Ctrl, Meta, Shift order.
        let chord = KeyChord::new(
            Key::S,
            KeyboardModifiers {
                shift: true,
                control: true,
                alt: true,
                meta: true,
            },
        );
        assert_eq!(chord.to_string(), "Alt+Ctrl+Meta+Shift+S");
    }

    #[test]
    fn test_display_round_trip() {
        let seq: ChordSequence = "Ctrl+K, Ctrl+C".parse().unwrap();
        assert_eq!(seq.to_string(), "Ctrl+K, Ctrl+C");
        let back: ChordSequence = seq.to_string().parse().unwrap();
        assert_eq!(back, seq);
    }

    #[test]
    fn test_from_event_normalization() {
        let ev = KeyEvent::new(Key::G, KeyboardModifiers::NONE);
        assert_eq!(KeyChord::from_event(&ev), KeyChord::key_only(Key::G));
    }
}
