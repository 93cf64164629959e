//! The shortcut router: key-down dispatch, focus-tree and handler stacks.
//!
//! [`ShortcutRouter`] is the heart of the keyboard subsystem. For every raw
//! key-down the host feeds it, the router decides among three fates:
//!
//! 1. **Focus navigation** — plain Tab / Shift+Tab move focus through the
//!    active [`FocusTree`], before and independent of shortcut handling.
//! 2. **Shortcut dispatch** — the chord joins the pending sequence, which is
//!    resolved against the key maps of the focused widget, its logical
//!    ancestors, and finally the current default handler.
//! 3. **Propagation** — nothing claimed the chord; the host lets its native
//!    handling run.
//!
//! Multi-chord sequences ("g" then "i") are disambiguated from single-chord
//! prefixes ("g" alone) by a timeout: a prefix match parks the sequence as
//! pending, and if no further chord arrives before
//! [`sequence_timeout`](ShortcutRouter::sequence_timeout) elapses, the
//! sequence is force-resolved with the prefix's own action, if any. The host
//! pumps [`process_timeout`](ShortcutRouter::process_timeout) from its event
//! loop; between key-downs at most one timeout is outstanding.
//!
//! The router is an explicitly constructed value: create one per window (or
//! application) and hand it to whatever delivers input events. Nothing here
//! is a global.

use std::sync::Arc;
use std::time::{Duration, Instant};

use latchkey_core::{Signal, TimerId, TimerManager};

use crate::chord::KeyChord;
use crate::event::{Key, KeyEvent};
use crate::focus_tree::{FocusTree, Member};
use crate::handler::{FocusTarget, KeyHandler};
use crate::keymap::{KeyMap, KeyMapRegistry, Lookup};

/// Default timeout between chords of a multi-chord sequence.
pub const DEFAULT_SEQUENCE_TIMEOUT: Duration = Duration::from_millis(750);

/// Outcome of resolving a key sequence, as tracked across dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchStatus {
    /// A handler consumed the sequence.
    Handled,
    /// No handler claimed the sequence.
    #[default]
    NotHandled,
    /// A prefix matched; the sequence awaits its next chord or the timeout.
    Pending,
}

/// The router's verdict on a key-down, for the host to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// A handler (or Tab navigation) consumed the key; suppress native
    /// handling.
    Handled,
    /// The key opened or extended a pending sequence; suppress native
    /// handling while the sequence is in flight.
    Pending,
    /// Nothing claimed the key; let native handling run.
    Propagate,
    /// Input is globally blocked; swallow the event entirely.
    Blocked,
}

impl KeyDisposition {
    /// Whether the host should let its native/default key handling run.
    pub fn should_propagate(&self) -> bool {
        matches!(self, Self::Propagate)
    }
}

/// Errors from router preconditions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
    /// Only root trees participate in the focus stack.
    #[error("cannot push nested focus tree '{name}'; push its root instead")]
    NestedTree {
        /// Name of the offending tree.
        name: String,
    },
}

/// A sequence parked on a prefix match, waiting for more input or the
/// timeout.
struct PendingSequence {
    timer: TimerId,
    handler: Arc<dyn KeyHandler>,
    event: KeyEvent,
}

/// Keyboard focus and shortcut dispatch for one window.
///
/// See the [module docs](self) for the dispatch model. Construction is
/// explicit; wire the router into the host's input delivery and event loop:
///
/// ```
/// use latchkey::{Key, KeyEvent, KeyboardModifiers, ShortcutRouter};
///
/// let mut router = ShortcutRouter::new();
///
/// // From the host's key-down hook:
/// let event = KeyEvent::new(Key::A, KeyboardModifiers::CTRL);
/// let verdict = router.handle_key_down(&event);
/// if !verdict.should_propagate() {
///     // suppress the host's native handling
/// }
///
/// // From the host's event loop, regularly:
/// router.process_timeout();
/// ```
pub struct ShortcutRouter {
    /// Stack of focus trees; the top is the active tree.
    tree_stack: Vec<Arc<FocusTree>>,
    /// Stack of fallback handlers; the top is the current default handler.
    handler_stack: Vec<Arc<dyn KeyHandler>>,
    /// Registered key maps, by handler name.
    key_maps: KeyMapRegistry,
    /// The object that currently holds input focus.
    focus_target: Option<Arc<dyn FocusTarget>>,
    /// Chords accumulated since the last resolved sequence.
    sequence: Vec<KeyChord>,
    /// Prefix-match state awaiting the next chord or the timeout.
    pending: Option<PendingSequence>,
    timers: TimerManager,
    timeout: Duration,
    enabled: bool,
    input_blocked: bool,
    last_status: DispatchStatus,
    /// Observer hook fired for every key-down before any routing decision.
    pub key_pressed: Signal<KeyEvent>,
}

impl Default for ShortcutRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ShortcutRouter {
    /// Create a router with shortcuts enabled and the default sequence
    /// timeout.
    pub fn new() -> Self {
        Self {
            tree_stack: Vec::new(),
            handler_stack: Vec::new(),
            key_maps: KeyMapRegistry::new(),
            focus_target: None,
            sequence: Vec::new(),
            pending: None,
            timers: TimerManager::new(),
            timeout: DEFAULT_SEQUENCE_TIMEOUT,
            enabled: true,
            input_blocked: false,
            last_status: DispatchStatus::NotHandled,
            key_pressed: Signal::new(),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Enable or disable shortcut dispatch.
    ///
    /// Tab navigation keeps working while shortcuts are disabled; everything
    /// else propagates untouched.
    pub fn enable(&mut self, enabled: bool) {
        tracing::debug!(target: "latchkey::router", enabled, "shortcuts toggled");
        self.enabled = enabled;
    }

    /// Check if shortcut dispatch is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Set the timeout between chords of a multi-chord sequence.
    pub fn set_sequence_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Get the timeout between chords of a multi-chord sequence.
    pub fn sequence_timeout(&self) -> Duration {
        self.timeout
    }

    /// Block or unblock all keyboard input (modal busy state).
    ///
    /// While blocked, key-downs are swallowed: not dispatched and not
    /// propagated.
    pub fn set_input_blocked(&mut self, blocked: bool) {
        self.input_blocked = blocked;
    }

    /// Check if keyboard input is globally blocked.
    pub fn is_input_blocked(&self) -> bool {
        self.input_blocked
    }

    /// Register (or replace) the key map for a handler name.
    pub fn register_key_map(&mut self, name: impl Into<String>, map: KeyMap) {
        self.key_maps.register(name, map);
    }

    /// Get the registered key maps.
    pub fn key_maps(&self) -> &KeyMapRegistry {
        &self.key_maps
    }

    // =========================================================================
    // Focus tree stack
    // =========================================================================

    /// Push a tree onto the focus stack and make it active.
    ///
    /// Input focus is grabbed on the tree's current (or first focusable)
    /// member unless `prevent_focus` is set. A tree with no focusable member
    /// still becomes active. Only root trees are accepted.
    pub fn push_focus_tree(
        &mut self,
        tree: Arc<FocusTree>,
        prevent_focus: bool,
    ) -> Result<(), RouterError> {
        if !tree.is_root() {
            tracing::error!(
                target: "latchkey::router",
                tree = %tree.name(),
                "refusing to push nested focus tree"
            );
            return Err(RouterError::NestedTree {
                name: tree.name().to_string(),
            });
        }

        tracing::debug!(target: "latchkey::router", tree = %tree.name(), "push focus tree");
        self.tree_stack.push(Arc::clone(&tree));

        let member = tree
            .get_focus_member()
            .ok()
            .flatten()
            .or_else(|| tree.reset_focus_member(true).ok().flatten());
        let Some(member) = member else {
            tracing::debug!(
                target: "latchkey::router",
                tree = %tree.name(),
                "pushed tree has no focusable members"
            );
            return Ok(());
        };
        if !prevent_focus {
            self.grab_focus(&member);
        }
        Ok(())
    }

    /// Pop a tree from the focus stack.
    ///
    /// With `None`, pops the active tree and re-grabs input focus on the
    /// newly exposed one. With a specific tree that is not on top, the tree
    /// is removed in place and the active tree is untouched. The bottom tree
    /// is never popped; the call returns `None` then.
    pub fn pop_focus_tree(&mut self, tree: Option<&Arc<FocusTree>>) -> Option<Arc<FocusTree>> {
        if self.tree_stack.len() <= 1 {
            return None;
        }

        if let Some(tree) = tree {
            let index = self.tree_stack.iter().rposition(|t| Arc::ptr_eq(t, tree))?;
            if index != self.tree_stack.len() - 1 {
                tracing::debug!(
                    target: "latchkey::router",
                    tree = %tree.name(),
                    "removing non-top focus tree in place"
                );
                return Some(self.tree_stack.remove(index));
            }
        }

        let popped = self.tree_stack.pop()?;
        tracing::debug!(target: "latchkey::router", tree = %popped.name(), "pop focus tree");

        if let Some(top) = self.tree_stack.last().cloned() {
            let member = top
                .get_focus_member()
                .ok()
                .flatten()
                .or_else(|| top.reset_focus_member(true).ok().flatten());
            if let Some(member) = member {
                self.grab_focus(&member);
            }
        }

        Some(popped)
    }

    /// Replace the active focus tree: pop the top, push `tree`.
    ///
    /// Returns the replaced tree, if the stack held more than its bottom
    /// entry.
    pub fn replace_focus_tree(
        &mut self,
        tree: Arc<FocusTree>,
    ) -> Result<Option<Arc<FocusTree>>, RouterError> {
        let old = self.pop_focus_tree(None);
        self.push_focus_tree(tree, false)?;
        Ok(old)
    }

    /// Get the active focus tree.
    pub fn current_focus_tree(&self) -> Option<&Arc<FocusTree>> {
        self.tree_stack.last()
    }

    // =========================================================================
    // Default handler stack
    // =========================================================================

    /// Push a fallback handler; it becomes the current default handler.
    pub fn push_default_handler(&mut self, handler: Arc<dyn KeyHandler>) {
        tracing::debug!(
            target: "latchkey::router",
            map = handler.key_map_name().unwrap_or("<none>"),
            "push default handler"
        );
        self.handler_stack.push(handler);
    }

    /// Pop the current default handler; the previous one takes over.
    ///
    /// The bottom handler is never popped; the call returns `None` then.
    pub fn pop_default_handler(&mut self) -> Option<Arc<dyn KeyHandler>> {
        if self.handler_stack.len() <= 1 {
            return None;
        }
        let handler = self.handler_stack.pop();
        tracing::debug!(
            target: "latchkey::router",
            depth = self.handler_stack.len(),
            "pop default handler"
        );
        handler
    }

    /// Get the current default handler.
    pub fn current_default_handler(&self) -> Option<&Arc<dyn KeyHandler>> {
        self.handler_stack.last()
    }

    // =========================================================================
    // Input focus
    // =========================================================================

    /// Move input focus to a member of the active tree.
    ///
    /// Resolves a group to its recorded (or first) member, records the member
    /// on the active tree without re-notifying, blurs the previous holder,
    /// and focuses the new one.
    pub fn grab_focus(&mut self, member: &Member) {
        let target = match member {
            Member::Leaf(target) => Arc::clone(target),
            Member::Group(group) => {
                let resolved = group
                    .get_focus_member()
                    .ok()
                    .flatten()
                    .or_else(|| group.get_first_member(false));
                match resolved.as_ref().and_then(Member::as_leaf) {
                    Some(target) => Arc::clone(target),
                    None => return,
                }
            }
        };

        // Keep the active tree's bookkeeping in sync. A target outside the
        // tree hierarchy is fine; the record just doesn't change.
        if let Some(tree) = self.tree_stack.last() {
            let _ = tree.sync_focus_member(&Member::Leaf(Arc::clone(&target)));
        }

        self.move_input_focus(target);
    }

    /// Tell the router that `target` now holds input focus.
    ///
    /// For focus changes the router did not initiate (mouse clicks, host-side
    /// focus moves): records the new holder for shortcut dispatch and syncs
    /// the active tree, without calling [`FocusTarget::on_focus`].
    pub fn update_focus(&mut self, target: Arc<dyn FocusTarget>) {
        if let Some(tree) = self.tree_stack.last() {
            let _ = tree.sync_focus_member(&Member::Leaf(Arc::clone(&target)));
        }
        tracing::debug!(
            target: "latchkey::router",
            id = target.target_id().as_raw(),
            "focus holder updated"
        );
        self.focus_target = Some(target);
    }

    /// Get the object that currently holds input focus.
    pub fn focus_target(&self) -> Option<&Arc<dyn FocusTarget>> {
        self.focus_target.as_ref()
    }

    fn move_input_focus(&mut self, target: Arc<dyn FocusTarget>) {
        if let Some(previous) = &self.focus_target {
            if previous.target_id() != target.target_id() {
                previous.on_blur();
            }
        }
        tracing::debug!(
            target: "latchkey::router",
            id = target.target_id().as_raw(),
            "input focus moved"
        );
        target.on_focus();
        self.focus_target = Some(target);
    }

    // =========================================================================
    // Key-down dispatch
    // =========================================================================

    /// Route one physical key-down.
    ///
    /// This is the central dispatch described in the module docs. The
    /// returned [`KeyDisposition`] tells the host whether to suppress its
    /// native handling of the event.
    pub fn handle_key_down(&mut self, event: &KeyEvent) -> KeyDisposition {
        if self.input_blocked {
            tracing::trace!(target: "latchkey::router", "input blocked; swallowing key-down");
            return KeyDisposition::Blocked;
        }

        self.key_pressed.emit(event.clone());

        // Tab navigation comes first and works even with shortcuts disabled.
        if event.key == Key::Tab && !event.modifiers.any_non_shift() {
            return self.handle_tab(event);
        }

        if !self.enabled {
            return KeyDisposition::Propagate;
        }

        // A bare modifier press is never a chord.
        if event.key.is_modifier() {
            self.last_status = DispatchStatus::NotHandled;
            return KeyDisposition::Propagate;
        }

        // Text entry must keep receiving printable keys. The gate is skipped
        // while a sequence is pending: those chords are already spoken for.
        if self.pending.is_none() && event.from_text_input && !is_possible_input_shortcut(event) {
            self.last_status = DispatchStatus::NotHandled;
            return KeyDisposition::Propagate;
        }

        // A new chord is about to extend or restart the sequence; the old
        // timeout race is over either way.
        self.cancel_timeout();

        self.sequence.push(KeyChord::from_event(event));
        tracing::trace!(
            target: "latchkey::router",
            sequence = %self.sequence_string(),
            "chord accumulated"
        );

        let mut status = self.dispatch_guarded(|router| router.dispatch_current_sequence(event));

        // An extended sequence that died takes the old chords with it; the
        // new chord gets a fresh start as a sequence of its own.
        if status == DispatchStatus::NotHandled && self.sequence.len() > 1 {
            let latest = *self.sequence.last().expect("sequence is non-empty");
            self.sequence.clear();
            self.sequence.push(latest);
            tracing::trace!(
                target: "latchkey::router",
                sequence = %self.sequence_string(),
                "sequence restarted from latest chord"
            );
            status = self.dispatch_guarded(|router| router.dispatch_current_sequence(event));
        }

        self.last_status = status;
        if status != DispatchStatus::Pending {
            self.sequence.clear();
        }

        match status {
            DispatchStatus::Handled => KeyDisposition::Handled,
            DispatchStatus::Pending => KeyDisposition::Pending,
            DispatchStatus::NotHandled => KeyDisposition::Propagate,
        }
    }

    /// The status of the most recently routed key-down.
    ///
    /// Hosts that also see key-up/key-press events for the same physical
    /// stroke can replay this verdict to keep suppressing them.
    pub fn last_status(&self) -> DispatchStatus {
        self.last_status
    }

    /// The chords accumulated in the sequence currently being matched.
    pub fn pending_sequence(&self) -> &[KeyChord] {
        &self.sequence
    }

    /// Check whether a prefix match is waiting on more input or the timeout.
    pub fn has_pending_sequence(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending sequence and cancel its timeout. The next key-down
    /// starts a fresh sequence.
    pub fn clear_key_sequence(&mut self) {
        self.cancel_timeout();
        self.sequence.clear();
    }

    // =========================================================================
    // Timeout pump
    // =========================================================================

    /// Duration until the pending sequence times out, if one is in flight.
    ///
    /// Hosts use this to bound their event-loop wait.
    pub fn time_until_timeout(&mut self) -> Option<Duration> {
        self.timers.time_until_next()
    }

    /// Force-resolve the pending sequence if its timeout has expired.
    ///
    /// Call this from the host event loop. Returns `true` if a pending
    /// sequence was resolved (whether or not an action was bound to it).
    pub fn process_timeout(&mut self) -> bool {
        self.process_timeout_at(Instant::now())
    }

    /// Like [`process_timeout`](Self::process_timeout) with an explicit clock
    /// reading, so tests can drive time without sleeping.
    pub fn process_timeout_at(&mut self, now: Instant) -> bool {
        let fired = self.timers.process_expired_at(now);
        if fired.is_empty() {
            return false;
        }
        let Some(pending) = self.pending.take() else {
            return false;
        };
        debug_assert!(fired.contains(&pending.timer), "stray timer fired");

        tracing::debug!(
            target: "latchkey::router",
            sequence = %self.sequence_string(),
            "sequence timed out; forcing resolution"
        );

        let status =
            self.dispatch_guarded(|router| router.dispatch_to(&pending.handler, &pending.event, true));
        self.last_status = status;
        self.sequence.clear();
        true
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn handle_tab(&mut self, event: &KeyEvent) -> KeyDisposition {
        let Some(tree) = self.tree_stack.last().cloned() else {
            self.last_status = DispatchStatus::NotHandled;
            return KeyDisposition::Propagate;
        };

        let member = if tree.get_focus_member().ok().flatten().is_some() {
            if event.modifiers.shift {
                tree.get_prev_focus_member(true)
            } else {
                tree.get_next_focus_member(true)
            }
        } else {
            tracing::debug!(
                target: "latchkey::router",
                tree = %tree.name(),
                "no current focus member; resetting to first"
            );
            tree.reset_focus_member(true)
        };

        match member {
            Ok(Some(member)) => {
                self.grab_focus(&member);
                self.last_status = DispatchStatus::Handled;
                KeyDisposition::Handled
            }
            _ => {
                self.last_status = DispatchStatus::NotHandled;
                KeyDisposition::Propagate
            }
        }
    }

    /// Try the focused widget, then its logical ancestors, then the default
    /// handler, stopping at the first that handles or parks the sequence.
    fn dispatch_current_sequence(&mut self, event: &KeyEvent) -> DispatchStatus {
        let mut status = DispatchStatus::NotHandled;

        if let Some(focus) = self.focus_target.clone() {
            if focus.has_focus() {
                if let Some(handler) = focus.key_handler() {
                    status = self.dispatch_to(&handler, event, false);

                    let mut link = focus;
                    while status == DispatchStatus::NotHandled {
                        let Some(ancestor) = link.parent_target() else {
                            break;
                        };
                        if let Some(handler) = ancestor.key_handler() {
                            if handler.key_map_name().is_some() {
                                status = self.dispatch_to(&handler, event, false);
                            }
                        }
                        link = ancestor;
                    }
                }
            }
        }

        if status == DispatchStatus::NotHandled {
            if let Some(handler) = self.handler_stack.last().cloned() {
                status = self.dispatch_to(&handler, event, false);
            }
        }

        status
    }

    /// Resolve the accumulated sequence against one handler's key map.
    ///
    /// With `force` set, a prefix node is treated as terminal (the timeout
    /// path); otherwise a prefix parks the sequence and schedules the
    /// timeout.
    fn dispatch_to(
        &mut self,
        handler: &Arc<dyn KeyHandler>,
        event: &KeyEvent,
        force: bool,
    ) -> DispatchStatus {
        // A raw-event override makes the handler solely responsible.
        if let Some(handled) = handler.handle_key_event(event) {
            return if handled {
                DispatchStatus::Handled
            } else {
                DispatchStatus::NotHandled
            };
        }

        let Some(map_name) = handler.key_map_name() else {
            return DispatchStatus::NotHandled;
        };
        let Some(map) = self.key_maps.get(map_name) else {
            tracing::warn!(
                target: "latchkey::router",
                map = map_name,
                "handler names an unregistered key map"
            );
            return DispatchStatus::NotHandled;
        };

        if force {
            return match map.resolve_forced(&self.sequence) {
                Some(action) => {
                    tracing::debug!(
                        target: "latchkey::router",
                        %action,
                        "forced action resolved"
                    );
                    if handler.handle_key_action(&action, event) {
                        DispatchStatus::Handled
                    } else {
                        DispatchStatus::NotHandled
                    }
                }
                None => DispatchStatus::NotHandled,
            };
        }

        match map.lookup(&self.sequence) {
            Lookup::NoMatch => DispatchStatus::NotHandled,
            Lookup::Terminal(action) => {
                tracing::debug!(target: "latchkey::router", %action, "action resolved");
                // A handler may decline a valid action; the next candidate
                // gets its turn then.
                if handler.handle_key_action(&action, event) {
                    DispatchStatus::Handled
                } else {
                    DispatchStatus::NotHandled
                }
            }
            Lookup::Prefix => {
                let timer = self.timers.start_one_shot(self.timeout);
                self.pending = Some(PendingSequence {
                    timer,
                    handler: Arc::clone(handler),
                    event: event.clone(),
                });
                tracing::debug!(
                    target: "latchkey::router",
                    sequence = %self.sequence_string(),
                    "prefix matched; sequence pending"
                );
                DispatchStatus::Pending
            }
        }
    }

    /// Run a dispatch closure with guaranteed sequence cleanup.
    ///
    /// A panicking handler must not leave a half-open sequence or a live
    /// timeout behind; the panic itself propagates to the host's reporter.
    fn dispatch_guarded<F>(&mut self, dispatch: F) -> DispatchStatus
    where
        F: FnOnce(&mut Self) -> DispatchStatus,
    {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| dispatch(self))) {
            Ok(status) => status,
            Err(payload) => {
                self.clear_key_sequence();
                std::panic::resume_unwind(payload);
            }
        }
    }

    /// Cancel the pending timeout, keeping the accumulated chords.
    fn cancel_timeout(&mut self) {
        if let Some(pending) = self.pending.take() {
            let _ = self.timers.stop(pending.timer);
        }
    }

    fn sequence_string(&self) -> String {
        self.sequence
            .iter()
            .map(|chord| chord.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Debug for ShortcutRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShortcutRouter")
            .field("trees", &self.tree_stack.len())
            .field("handlers", &self.handler_stack.len())
            .field("sequence", &self.sequence)
            .field("pending", &self.pending.is_some())
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Whether a chord typed inside a text-entry element may still be a
/// shortcut.
///
/// Printable keys must echo as text, so only chords with a non-Shift
/// modifier, Escape, and a small navigation allow-list (Enter and the
/// arrows) qualify.
fn is_possible_input_shortcut(event: &KeyEvent) -> bool {
    event.key == Key::Escape
        || event.modifiers.any_non_shift()
        || matches!(
            event.key,
            Key::Enter | Key::ArrowUp | Key::ArrowDown | Key::ArrowLeft | Key::ArrowRight
        )
}
