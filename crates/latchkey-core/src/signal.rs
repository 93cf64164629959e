//! Signal/slot notification.
//!
//! A minimal, direct-invocation observer mechanism. Objects that change state
//! (the focus tree, the shortcut router) expose a [`Signal`]; interested
//! parties connect closures and are invoked synchronously on every emit.
//!
//! The keyboard subsystem is single-threaded by design: all emission happens
//! on the thread that delivers input events, so every connection is direct.
//! `Signal` is still `Send + Sync` so it can live inside shared state guarded
//! by the caller.
//!
//! # Example
//!
//! ```
//! use latchkey_core::Signal;
//!
//! let changed = Signal::<String>::new();
//!
//! let id = changed.connect(|name| {
//!     println!("focus moved to {name}");
//! });
//!
//! changed.emit("inbox-list".to_string());
//! changed.disconnect(id);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Returned by [`Signal::connect`]; pass it to [`Signal::disconnect`] to
    /// remove the slot.
    pub struct ConnectionId;
}

/// Internal storage for a single connection.
struct Connection<Args> {
    slot: Arc<dyn Fn(&Args) + Send + Sync>,
}

/// A signal with zero or more connected slots.
///
/// Emitting invokes every connected slot, in connection order, with a shared
/// reference to the arguments. Slots may connect or disconnect other slots
/// from within an emit; changes take effect on the next emit.
pub struct Signal<Args> {
    /// All active connections.
    connections: Mutex<SlotMap<ConnectionId, Connection<Args>>>,
    /// Whether emission is temporarily suppressed.
    blocked: AtomicBool,
}

impl<Args> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a [`ConnectionId`] that can be used to disconnect the slot
    /// later.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connections.lock().insert(Connection {
            slot: Arc::new(slot),
        })
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Temporarily block or unblock emission.
    ///
    /// While blocked, [`emit`](Self::emit) is a no-op. Returns the previous
    /// blocked state.
    pub fn set_blocked(&self, blocked: bool) -> bool {
        self.blocked.swap(blocked, Ordering::AcqRel)
    }

    /// Check whether emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::Acquire)
    }

    /// Invoke every connected slot with the given arguments.
    ///
    /// Slots run synchronously on the calling thread. The connection list is
    /// snapshotted before invocation, so a slot that mutates connections does
    /// not affect the current emission round.
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            return;
        }

        // Snapshot outside the lock so slots can reconnect/disconnect freely.
        let slots: Vec<Arc<dyn Fn(&Args) + Send + Sync>> = self
            .connections
            .lock()
            .values()
            .map(|conn| Arc::clone(&conn.slot))
            .collect();

        for slot in slots {
            slot(&args);
        }
    }
}

impl<Args> std::fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connection_count())
            .field("blocked", &self.is_blocked())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_connect_and_emit() {
        let signal = Signal::<i32>::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count2 = Arc::clone(&count);
        signal.connect(move |n| {
            assert_eq!(*n, 7);
            count2.fetch_add(1, Ordering::SeqCst);
        });

        signal.emit(7);
        signal.emit(7);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_disconnect() {
        let signal = Signal::<()>::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count2 = Arc::clone(&count);
        let id = signal.connect(move |()| {
            count2.fetch_add(1, Ordering::SeqCst);
        });

        signal.emit(());
        assert!(signal.disconnect(id));
        assert!(!signal.disconnect(id));
        signal.emit(());

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_blocked_emission() {
        let signal = Signal::<()>::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count2 = Arc::clone(&count);
        signal.connect(move |()| {
            count2.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!signal.set_blocked(true));
        signal.emit(());
        assert!(signal.set_blocked(false));
        signal.emit(());

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_slot_can_disconnect_during_emit() {
        let signal = Arc::new(Signal::<()>::new());
        let count = Arc::new(AtomicUsize::new(0));

        let signal2 = Arc::clone(&signal);
        let count2 = Arc::clone(&count);
        let id = Arc::new(Mutex::new(None));
        let id2 = Arc::clone(&id);
        let conn = signal.connect(move |()| {
            count2.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = *id2.lock() {
                signal2.disconnect(id);
            }
        });
        *id.lock() = Some(conn);

        // The slot removes itself mid-emit; the snapshot keeps this round safe.
        signal.emit(());
        signal.emit(());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
