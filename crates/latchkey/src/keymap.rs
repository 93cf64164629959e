//! Key maps: chord-sequence to action-code tables.
//!
//! A [`KeyMap`] stores an application's bindings for one handler as a trie
//! keyed by [`KeyChord`]. Resolving the accumulated sequence against the trie
//! yields one of three outcomes, which is what drives the router's pending
//! state machine:
//!
//! - [`Lookup::NoMatch`] — nothing bound starts with this sequence
//! - [`Lookup::Terminal`] — the sequence is a complete binding
//! - [`Lookup::Prefix`] — the sequence could extend to a longer binding
//!
//! A `Prefix` node may carry an action of its own (e.g. `"g"` bound alongside
//! `"g, i"`); that action is only picked up by the *forced* resolution that
//! runs when the sequence timeout expires.
//!
//! ```
//! use latchkey::{ActionCode, KeyMap, Lookup, KeyChord, Key};
//!
//! let mut map = KeyMap::new();
//! map.bind("g".parse().unwrap(), "GoToFolder");
//! map.bind("g, i".parse().unwrap(), "GoToInbox");
//!
//! let g = [KeyChord::key_only(Key::G)];
//! assert_eq!(map.lookup(&g), Lookup::Prefix);
//! assert_eq!(map.resolve_forced(&g), Some(ActionCode::from("GoToFolder")));
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::chord::{ChordSequence, KeyChord};

/// An opaque application-defined action identifier.
///
/// Key maps bind chord sequences to action codes; handlers receive the code
/// and decide what it means.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionCode(String);

impl ActionCode {
    /// Create an action code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Get the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActionCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl From<String> for ActionCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl fmt::Display for ActionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of resolving a partial sequence against a key map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// No binding starts with the given sequence; the sequence is dead.
    NoMatch,
    /// The sequence is a complete, unambiguous binding.
    Terminal(ActionCode),
    /// The sequence is a proper prefix of at least one longer binding.
    ///
    /// The router must wait: either the next chord extends the sequence, or
    /// the timeout forces resolution via [`KeyMap::resolve_forced`].
    Prefix,
}

/// A trie node: an optional action plus continuations.
#[derive(Debug, Default)]
struct TrieNode {
    action: Option<ActionCode>,
    children: HashMap<KeyChord, TrieNode>,
}

/// The bindings for one handler: a map from chord sequences to action codes.
#[derive(Debug, Default)]
pub struct KeyMap {
    root: TrieNode,
    bindings: usize,
}

impl KeyMap {
    /// Create an empty key map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a chord sequence to an action code.
    ///
    /// Rebinding an existing sequence replaces its action.
    pub fn bind(&mut self, sequence: ChordSequence, action: impl Into<ActionCode>) {
        let mut node = &mut self.root;
        for chord in sequence.chords() {
            node = node.children.entry(*chord).or_default();
        }
        if node.action.replace(action.into()).is_none() {
            self.bindings += 1;
        }
    }

    /// Get the number of bound sequences.
    pub fn len(&self) -> usize {
        self.bindings
    }

    /// Check if no sequences are bound.
    pub fn is_empty(&self) -> bool {
        self.bindings == 0
    }

    /// Resolve an accumulated sequence.
    ///
    /// A node with continuations reports [`Lookup::Prefix`] even when it
    /// carries its own action; only the timeout path may claim the prefix
    /// action, otherwise a binding like `"g, i"` could never be typed.
    pub fn lookup(&self, sequence: &[KeyChord]) -> Lookup {
        let Some(node) = self.find(sequence) else {
            return Lookup::NoMatch;
        };

        if !node.children.is_empty() {
            return Lookup::Prefix;
        }
        match &node.action {
            Some(action) => Lookup::Terminal(action.clone()),
            None => Lookup::NoMatch,
        }
    }

    /// Forcibly resolve a sequence, treating it as terminal.
    ///
    /// Used when the sequence timeout expires: picks up the action bound to
    /// the prefix itself, if any.
    pub fn resolve_forced(&self, sequence: &[KeyChord]) -> Option<ActionCode> {
        self.find(sequence).and_then(|node| node.action.clone())
    }

    fn find(&self, sequence: &[KeyChord]) -> Option<&TrieNode> {
        if sequence.is_empty() {
            return None;
        }
        let mut node = &self.root;
        for chord in sequence {
            node = node.children.get(chord)?;
        }
        Some(node)
    }
}

/// Per-handler-name table of key maps.
///
/// Handlers declare a key-map name; the router looks the map up here when
/// resolving a sequence for that handler.
#[derive(Debug, Default)]
pub struct KeyMapRegistry {
    maps: HashMap<String, KeyMap>,
}

impl KeyMapRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the key map for a handler name.
    pub fn register(&mut self, name: impl Into<String>, map: KeyMap) {
        let name = name.into();
        tracing::debug!(target: "latchkey::keymap", %name, bindings = map.len(), "key map registered");
        self.maps.insert(name, map);
    }

    /// Get the key map registered under a handler name.
    pub fn get(&self, name: &str) -> Option<&KeyMap> {
        self.maps.get(name)
    }

    /// Check whether a handler name has a registered map.
    pub fn contains(&self, name: &str) -> bool {
        self.maps.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Key;

    fn seq(s: &str) -> ChordSequence {
        s.parse().unwrap()
    }

    #[test]
    fn test_terminal_match() {
        let mut map = KeyMap::new();
        map.bind(seq("Ctrl+S"), "Save");

        let pressed = [KeyChord::ctrl(Key::S)];
        assert_eq!(map.lookup(&pressed), Lookup::Terminal(ActionCode::from("Save")));
    }

    #[test]
    fn test_no_match() {
        let mut map = KeyMap::new();
        map.bind(seq("Ctrl+S"), "Save");

        let pressed = [KeyChord::ctrl(Key::X)];
        assert_eq!(map.lookup(&pressed), Lookup::NoMatch);
        assert_eq!(map.lookup(&[]), Lookup::NoMatch);
    }

    #[test]
    fn test_prefix_match() {
        let mut map = KeyMap::new();
        map.bind(seq("g, i"), "GoToInbox");

        let g = [KeyChord::key_only(Key::G)];
        assert_eq!(map.lookup(&g), Lookup::Prefix);

        let gi = [KeyChord::key_only(Key::G), KeyChord::key_only(Key::I)];
        assert_eq!(map.lookup(&gi), Lookup::Terminal(ActionCode::from("GoToInbox")));
    }

    #[test]
    fn test_prefix_with_own_action_stays_prefix() {
        let mut map = KeyMap::new();
        map.bind(seq("g"), "GoToFolder");
        map.bind(seq("g, i"), "GoToInbox");

        let g = [KeyChord::key_only(Key::G)];
        // "g" alone is ambiguous until the timeout forces it.
        assert_eq!(map.lookup(&g), Lookup::Prefix);
        assert_eq!(map.resolve_forced(&g), Some(ActionCode::from("GoToFolder")));
    }

    #[test]
    fn test_forced_resolution_without_prefix_action() {
        let mut map = KeyMap::new();
        map.bind(seq("g, i"), "GoToInbox");

        let g = [KeyChord::key_only(Key::G)];
        assert_eq!(map.resolve_forced(&g), None);
    }

    #[test]
    fn test_overlong_sequence_no_match() {
        let mut map = KeyMap::new();
        map.bind(seq("Ctrl+S"), "Save");

        let pressed = [KeyChord::ctrl(Key::S), KeyChord::key_only(Key::X)];
        assert_eq!(map.lookup(&pressed), Lookup::NoMatch);
    }

    #[test]
    fn test_rebind_replaces() {
        let mut map = KeyMap::new();
        map.bind(seq("Ctrl+S"), "Save");
        map.bind(seq("Ctrl+S"), "SaveAll");

        assert_eq!(map.len(), 1);
        let pressed = [KeyChord::ctrl(Key::S)];
        assert_eq!(map.lookup(&pressed), Lookup::Terminal(ActionCode::from("SaveAll")));
    }

    #[test]
    fn test_registry() {
        let mut registry = KeyMapRegistry::new();
        let mut map = KeyMap::new();
        map.bind(seq("Ctrl+Z"), "Undo");
        registry.register("editor", map);

        assert!(registry.contains("editor"));
        assert!(!registry.contains("list"));
        let pressed = [KeyChord::ctrl(Key::Z)];
        assert_eq!(
            registry.get("editor").unwrap().lookup(&pressed),
            Lookup::Terminal(ActionCode::from("Undo"))
        );
    }
}
