//! Handler and focus-target contracts.
//!
//! Widgets participate in the keyboard subsystem through two capabilities:
//!
//! - [`KeyHandler`]: "I can resolve and run shortcut actions." Implemented by
//!   widgets that respond to shortcuts and by application-level default
//!   handlers.
//! - [`FocusTarget`]: "I can hold input focus." Implemented by anything that
//!   appears as a leaf in a focus tree.
//!
//! Capabilities are explicit: a widget opts in by implementing the trait,
//! and a capability it lacks is expressed through the `Option`-returning
//! accessors rather than by probing for methods at runtime.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::event::KeyEvent;
use crate::keymap::ActionCode;

/// A stable identity for a focus target.
///
/// Leaf membership, focus bookkeeping, and removal all compare targets by
/// this ID, so two `Arc`s to the same widget (or a widget and its wrapper)
/// must report the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(u64);

impl TargetId {
    /// Allocate a fresh, process-unique target ID.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap an existing host-side identifier.
    ///
    /// Hosts with their own widget IDs can reuse them; IDs from
    /// [`next`](Self::next) and from this constructor must not collide.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw numeric value.
    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

/// Capability to resolve and execute shortcut actions.
///
/// The router resolves the accumulated chord sequence against the key map
/// registered under [`key_map_name`](Self::key_map_name) and, on a terminal
/// match, invokes [`handle_key_action`](Self::handle_key_action).
pub trait KeyHandler: Send + Sync {
    /// The name of the key map that defines this handler's shortcuts.
    ///
    /// Returning `None` takes the handler out of map-based resolution; only
    /// a [`handle_key_event`](Self::handle_key_event) override can consume
    /// events then.
    fn key_map_name(&self) -> Option<&str>;

    /// Perform the action bound to a resolved shortcut.
    ///
    /// Returns `true` if the action was handled. A `false` return sends the
    /// router on to the next candidate handler; it is normal for a handler
    /// to decline actions that do not apply in its current state.
    fn handle_key_action(&self, action: &ActionCode, event: &KeyEvent) -> bool;

    /// Optional bypass: handle the raw event without key-map resolution.
    ///
    /// Returning `Some(handled)` makes this handler solely responsible for
    /// the event; the key map is not consulted. The default returns `None`,
    /// which means "resolve through my key map as usual".
    fn handle_key_event(&self, event: &KeyEvent) -> Option<bool> {
        let _ = event;
        None
    }
}

/// A widget-side participant in focus management.
///
/// Focus trees hold leaves as `Arc<dyn FocusTarget>`. The tree consults
/// [`is_focusable`](Self::is_focusable) when traversing with the enabled
/// check on, and the router calls [`on_focus`](Self::on_focus)/
/// [`on_blur`](Self::on_blur) when it actually moves input focus.
pub trait FocusTarget: Send + Sync {
    /// Stable identity used for membership and focus comparisons.
    fn target_id(&self) -> TargetId;

    /// Whether this target can currently accept focus.
    ///
    /// Implementations should reject targets that are invisible, disabled,
    /// zero-sized, or explicitly opted out of tab navigation. Traversals run
    /// with the enabled check off skip this predicate entirely.
    fn is_focusable(&self) -> bool;

    /// Whether this target currently holds input focus.
    ///
    /// The router only offers shortcuts to the focus object while it still
    /// reports focus; a widget that lost focus out-of-band silently drops
    /// out of the dispatch chain.
    fn has_focus(&self) -> bool;

    /// Input focus arrived. Typically flips the widget's focus flag and
    /// updates its visuals.
    fn on_focus(&self) {}

    /// Input focus left.
    fn on_blur(&self) {}

    /// This target's shortcut handler, if it has one.
    ///
    /// Widgets that respond to shortcuts return a handle to their
    /// [`KeyHandler`] implementation (commonly a clone of their own `Arc`).
    fn key_handler(&self) -> Option<Arc<dyn KeyHandler>> {
        None
    }

    /// The logical ancestor for dispatch-chain walking.
    ///
    /// This is the widget/composite ownership chain, which is distinct from
    /// any visual or layout parent. The router walks it when the focused
    /// widget declines a shortcut.
    fn parent_target(&self) -> Option<Arc<dyn FocusTarget>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_ids_unique() {
        let a = TargetId::next();
        let b = TargetId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_target_id_raw_round_trip() {
        let id = TargetId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
        assert_eq!(id, TargetId::from_raw(42));
    }
}
