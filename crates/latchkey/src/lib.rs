//! Latchkey — keyboard focus management and shortcut dispatch for Rust UI
//! toolkits.
//!
//! Latchkey decides, for every keystroke a host delivers, whether it moves
//! focus, is consumed as an application shortcut, or should be left to the
//! host's native handling. It is the keyboard engine of a widget toolkit,
//! with the toolkit abstracted away: widgets participate through two small
//! traits, and the host's input layer feeds plain [`KeyEvent`]s.
//!
//! Two components, consumed together:
//!
//! - [`FocusTree`]: a tree of focusable members (leaf widgets or nested
//!   sub-trees) that determines Tab order and tracks the focused member.
//! - [`ShortcutRouter`]: intercepts key-downs, manages stacks of focus trees
//!   and default handlers, resolves multi-chord sequences against registered
//!   [`KeyMap`]s, and dispatches resolved [`ActionCode`]s.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use latchkey::{
//!     ActionCode, Key, KeyEvent, KeyHandler, KeyMap, KeyboardModifiers, ShortcutRouter,
//! };
//!
//! struct MailApp;
//!
//! impl KeyHandler for MailApp {
//!     fn key_map_name(&self) -> Option<&str> {
//!         Some("mail")
//!     }
//!     fn handle_key_action(&self, action: &ActionCode, _event: &KeyEvent) -> bool {
//!         println!("running {action}");
//!         true
//!     }
//! }
//!
//! let mut router = ShortcutRouter::new();
//! let mut map = KeyMap::new();
//! map.bind("g, i".parse().unwrap(), "GoToInbox");
//! map.bind("Ctrl+Z".parse().unwrap(), "Undo");
//! router.register_key_map("mail", map);
//! router.push_default_handler(Arc::new(MailApp));
//!
//! // "g" opens a pending sequence, "i" completes it.
//! let g = KeyEvent::new(Key::G, KeyboardModifiers::NONE);
//! let i = KeyEvent::new(Key::I, KeyboardModifiers::NONE);
//! assert!(!router.handle_key_down(&g).should_propagate());
//! assert!(!router.handle_key_down(&i).should_propagate());
//!
//! // Unbound keys propagate to the host.
//! let x = KeyEvent::new(Key::X, KeyboardModifiers::NONE);
//! assert!(router.handle_key_down(&x).should_propagate());
//! ```
//!
//! # Event-loop integration
//!
//! The only asynchrony in the engine is the multi-chord sequence timeout.
//! Nothing runs on its own thread: the host pumps
//! [`ShortcutRouter::process_timeout`] from its event loop (bounded by
//! [`ShortcutRouter::time_until_timeout`]), which keeps all dispatch on the
//! thread that delivers input events.

mod chord;
mod event;
mod focus_tree;
mod handler;
mod keymap;
mod router;


pub use chord::{ChordParseError, ChordSequence, KeyChord};
pub use event::{Key, KeyEvent, KeyboardModifiers};
pub use focus_tree::{FocusChangeEvent, FocusTree, FocusTreeError, Member};
pub use handler::{FocusTarget, KeyHandler, TargetId};
pub use keymap::{ActionCode, KeyMap, KeyMapRegistry, Lookup};
pub use router::{
    DEFAULT_SEQUENCE_TIMEOUT, DispatchStatus, KeyDisposition, RouterError, ShortcutRouter,
};

// Re-export the core services that surface in this crate's API.
pub use latchkey_core::{ConnectionId, Signal, TimerId, TimerManager};
