//! Focus trees: ordered, nestable groups of focusable members.
//!
//! A [`FocusTree`] manages keyboard focus among a group of related widgets.
//! It is a tree: each member is either a leaf (a focusable widget handle) or
//! a nested `FocusTree`. Tab order is the depth-first, left-to-right
//! traversal of the tree in member insertion order.
//!
//! The root tree — the only one without a parent — is the one the
//! application interacts with: it records the current focus member, accepts
//! focus-change listeners, and answers next/previous queries. Calling a
//! root-only operation on a nested tree is a programming error and is
//! rejected with [`FocusTreeError::NotRoot`].
//!
//! Focus-change notifications report that the *recorded* focus member moved;
//! real input focus has not been touched. It is up to the listener (normally
//! the shortcut router) to move input focus if that is wanted.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use latchkey::{FocusTree, Member};
//! # use latchkey::{FocusTarget, TargetId};
//! # struct Btn(TargetId);
//! # impl FocusTarget for Btn {
//! #     fn target_id(&self) -> TargetId { self.0 }
//! #     fn is_focusable(&self) -> bool { true }
//! #     fn has_focus(&self) -> bool { false }
//! # }
//! # fn widget() -> Arc<dyn latchkey::FocusTarget> { Arc::new(Btn(TargetId::next())) }
//!
//! let toolbar = FocusTree::new("toolbar");
//! toolbar.add_member(widget());
//! toolbar.add_member(widget());
//!
//! let first = toolbar.reset_focus_member(true).unwrap().unwrap();
//! let second = toolbar.get_next_focus_member(true).unwrap().unwrap();
//! assert!(!second.same(&first));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::RwLock;

use latchkey_core::{ConnectionId, Signal};

use crate::handler::FocusTarget;

/// A member of a focus tree: a focusable leaf or a nested group.
#[derive(Clone)]
pub enum Member {
    /// A focusable widget handle.
    Leaf(Arc<dyn FocusTarget>),
    /// A nested focus tree.
    Group(Arc<FocusTree>),
}

impl Member {
    /// Check if this member is a nested group.
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }

    /// Get the leaf target, if this member is a leaf.
    pub fn as_leaf(&self) -> Option<&Arc<dyn FocusTarget>> {
        match self {
            Self::Leaf(target) => Some(target),
            Self::Group(_) => None,
        }
    }

    /// Get the nested tree, if this member is a group.
    pub fn as_group(&self) -> Option<&Arc<FocusTree>> {
        match self {
            Self::Group(tree) => Some(tree),
            Self::Leaf(_) => None,
        }
    }

    /// Identity comparison: leaves by [`TargetId`](crate::TargetId), groups
    /// by allocation.
    pub fn same(&self, other: &Member) -> bool {
        match (self, other) {
            (Self::Leaf(a), Self::Leaf(b)) => a.target_id() == b.target_id(),
            (Self::Group(a), Self::Group(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(target) => write!(f, "Leaf(#{})", target.target_id().as_raw()),
            Self::Group(tree) => write!(f, "Group({:?})", tree.name()),
        }
    }
}

impl From<Arc<dyn FocusTarget>> for Member {
    fn from(target: Arc<dyn FocusTarget>) -> Self {
        Self::Leaf(target)
    }
}

impl From<Arc<FocusTree>> for Member {
    fn from(tree: Arc<FocusTree>) -> Self {
        Self::Group(tree)
    }
}

/// Payload of a focus-change notification.
///
/// Reports the newly recorded focus member (`None` when focus failed over to
/// nothing). `tree` names the tree the change originated in, which may be a
/// nested group rather than the root that emitted the event.
#[derive(Clone, Debug)]
pub struct FocusChangeEvent {
    /// Name of the tree where the change originated.
    pub tree: String,
    /// The newly recorded focus member.
    pub new_focus: Option<Member>,
}

/// Errors from focus tree operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FocusTreeError {
    /// A root-only operation was called on a nested tree.
    #[error("operation requires the root focus tree (called on nested tree '{name}')")]
    NotRoot {
        /// Name of the offending tree.
        name: String,
    },
}

#[derive(Default)]
struct TreeState {
    /// Back-reference to the containing tree; dead for the root.
    parent: Weak<FocusTree>,
    /// Ordered members; insertion order is tab order.
    members: Vec<Member>,
    /// The recorded focus member; meaningful on the root only.
    current_focus: Option<Member>,
}

/// A tree of focusable members that determines tab order and tracks focus.
///
/// See the [module docs](self) for an overview. Trees are handled as
/// `Arc<FocusTree>`; nested groups hold weak back-references to their
/// containing tree, so the containing UI region stays the sole owner.
pub struct FocusTree {
    name: String,
    /// Self-reference for building parent links and [`Member::Group`]s.
    this: Weak<FocusTree>,
    state: RwLock<TreeState>,
    /// Focus-change notifications. Emitted by the root; registration is
    /// root-only through [`add_focus_change_listener`](Self::add_focus_change_listener).
    focus_changed: Signal<FocusChangeEvent>,
}

static BY_NAME: OnceLock<RwLock<HashMap<String, Weak<FocusTree>>>> = OnceLock::new();

fn name_registry() -> &'static RwLock<HashMap<String, Weak<FocusTree>>> {
    BY_NAME.get_or_init(|| RwLock::new(HashMap::new()))
}

impl FocusTree {
    /// Create an empty tree and register it under `name`.
    ///
    /// The registration is weak; once every strong handle is dropped,
    /// [`by_name`](Self::by_name) stops resolving the name.
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        let name = name.into();
        let tree = Arc::new_cyclic(|this| Self {
            name: name.clone(),
            this: this.clone(),
            state: RwLock::new(TreeState::default()),
            focus_changed: Signal::new(),
        });

        let mut registry = name_registry().write();
        registry.retain(|_, weak| weak.strong_count() > 0);
        registry.insert(name, Arc::downgrade(&tree));

        tree
    }

    /// Look up a live tree by its registered name.
    pub fn by_name(name: &str) -> Option<Arc<Self>> {
        name_registry().read().get(name).and_then(Weak::upgrade)
    }

    /// Get the name of this tree.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the containing tree, if this tree is nested.
    pub fn parent(&self) -> Option<Arc<FocusTree>> {
        self.state.read().parent.upgrade()
    }

    /// Check if this tree is a root (has no containing tree).
    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    /// Walk parent links up to the root tree.
    pub fn root(&self) -> Arc<FocusTree> {
        let mut root = self.arc();
        while let Some(parent) = root.parent() {
            root = parent;
        }
        root
    }

    /// Get the number of direct members.
    pub fn size(&self) -> usize {
        self.state.read().members.len()
    }

    // =========================================================================
    // Membership
    // =========================================================================

    /// Append a member to the tree.
    ///
    /// If `member` is a group, this tree becomes its parent.
    pub fn add_member(&self, member: impl Into<Member>) {
        let member = member.into();
        let index = self.size();
        self.add_member_at(index, member);
    }

    /// Insert a member at `index` (clamped to the member count).
    pub fn add_member_at(&self, index: usize, member: Member) {
        if let Member::Group(group) = &member {
            group.set_parent(Some(&self.arc()));
        }
        let mut state = self.state.write();
        let index = index.min(state.members.len());
        state.members.insert(index, member);
    }

    /// Insert a member positioned after `anchor` (appends if `anchor` is not
    /// a direct member).
    pub fn add_member_after(&self, member: Member, anchor: &Member) {
        let index = self.index_of(anchor).map_or(self.size(), |i| i + 1);
        self.add_member_at(index, member);
    }

    /// Insert a member positioned before `anchor` (appends if `anchor` is
    /// not a direct member).
    pub fn add_member_before(&self, member: Member, anchor: &Member) {
        let index = self.index_of(anchor).unwrap_or(self.size());
        self.add_member_at(index, member);
    }

    /// Replace all members of the tree.
    pub fn set_members(&self, members: Vec<Member>) {
        self.remove_all_members();
        for member in members {
            self.add_member(member);
        }
    }

    /// Remove every member. Detached groups become roots again.
    pub fn remove_all_members(&self) {
        let members = std::mem::take(&mut self.state.write().members);
        for member in &members {
            if let Member::Group(group) = member {
                group.set_parent(None);
            }
        }
    }

    /// Remove a member from anywhere in this tree's hierarchy.
    ///
    /// If the removed member was (or contained) the root's focus member,
    /// focus fails over: the previous sibling chain is searched first, then
    /// the next sibling chain; if neither yields a focusable member the
    /// recorded focus becomes `None`. Failover fires the focus-change
    /// notification but does not move real input focus.
    ///
    /// Returns the removed member, or `None` if it was not in the hierarchy.
    pub fn remove_member(&self, member: &Member, check_enabled: bool) -> Option<Member> {
        self.replace_member(member, None, check_enabled)
    }

    /// Replace `old` with `new` anywhere in this tree's hierarchy, or remove
    /// `old` when `new` is `None`.
    ///
    /// When the replaced member held focus, focus moves to the replacement
    /// (a group's first member if the replacement is a group); with no
    /// replacement, removal failover applies as in
    /// [`remove_member`](Self::remove_member).
    ///
    /// If `old` is not in the hierarchy, `new` is appended to this tree and
    /// `None` is returned.
    pub fn replace_member(
        &self,
        old: &Member,
        new: Option<Member>,
        check_enabled: bool,
    ) -> Option<Member> {
        let Some(owner) = self.tree_for_member(old) else {
            if let Some(new) = new {
                self.add_member(new);
            }
            return None;
        };

        let root = self.root();
        let current = root.state.read().current_focus.clone();
        let holds_focus = current.as_ref().is_some_and(|focus| {
            old.same(focus) || matches!(old, Member::Group(group) if group.contains(focus))
        });

        if holds_focus {
            let new_focus = match &new {
                Some(Member::Group(group)) => group.get_first_member(check_enabled),
                Some(leaf) => Some(leaf.clone()),
                None => owner
                    .prev_member_from(old, check_enabled)
                    .or_else(|| owner.next_member_from(old, check_enabled)),
            };
            tracing::debug!(
                target: "latchkey::focus",
                tree = %root.name,
                ?new_focus,
                "focus failover after member removal"
            );
            root.state.write().current_focus = new_focus.clone();
            root.emit_change(&owner.name, new_focus);
        }

        let removed = {
            let mut state = owner.state.write();
            let index = state.members.iter().position(|m| m.same(old))?;
            match new.clone() {
                Some(replacement) => {
                    Some(std::mem::replace(&mut state.members[index], replacement))
                }
                None => Some(state.members.remove(index)),
            }
        };

        if let Some(Member::Group(group)) = &removed {
            group.set_parent(None);
        }
        if let Some(Member::Group(group)) = &new {
            group.set_parent(Some(&owner));
        }

        removed
    }

    /// Check whether `member` is reachable from this tree.
    pub fn contains(&self, member: &Member) -> bool {
        self.tree_for_member(member).is_some()
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Get the first (leftmost) focusable leaf of this tree.
    ///
    /// With `check_enabled` set, leaves whose target rejects focus are
    /// skipped; otherwise every leaf qualifies.
    pub fn get_first_member(&self, check_enabled: bool) -> Option<Member> {
        self.leftmost(check_enabled)
    }

    /// Get the last (rightmost) focusable leaf of this tree.
    pub fn get_last_member(&self, check_enabled: bool) -> Option<Member> {
        self.rightmost(check_enabled)
    }

    // =========================================================================
    // Focus state (root only)
    // =========================================================================

    /// Get the current focus member.
    ///
    /// Root-only.
    pub fn get_focus_member(&self) -> Result<Option<Member>, FocusTreeError> {
        self.check_root()?;
        Ok(self.state.read().current_focus.clone())
    }

    /// Set the focus member directly.
    ///
    /// A group resolves to its first member. Returns `true` if the member is
    /// contained in this tree, passes the enabled check, and was recorded;
    /// fires the focus-change notification on success.
    ///
    /// Root-only.
    pub fn set_focus_member(
        &self,
        member: &Member,
        check_enabled: bool,
    ) -> Result<bool, FocusTreeError> {
        self.check_root()?;
        Ok(self.record_focus_member(member, check_enabled, true))
    }

    /// Record the focus member without firing notifications.
    ///
    /// Used to resync the tree after input focus moved by other means (a
    /// mouse click, or the router moving real focus itself). Same containment
    /// rules as [`set_focus_member`](Self::set_focus_member), no enabled
    /// check.
    ///
    /// Root-only.
    pub fn sync_focus_member(&self, member: &Member) -> Result<bool, FocusTreeError> {
        self.check_root()?;
        Ok(self.record_focus_member(member, false, false))
    }

    /// Advance focus to the next member in tab order, wrapping at the end.
    ///
    /// With no current focus member, resets to the first member instead.
    /// Returns the new focus member, or `None` if the tree has no focusable
    /// member. A tree with exactly one focusable member is a no-op that
    /// returns that member without notifying.
    ///
    /// Root-only.
    pub fn get_next_focus_member(
        &self,
        check_enabled: bool,
    ) -> Result<Option<Member>, FocusTreeError> {
        self.check_root()?;
        Ok(self.advance_focus_member(true, check_enabled))
    }

    /// Retreat focus to the previous member in tab order, wrapping at the
    /// start.
    ///
    /// With no current focus member, resets to the last member instead.
    ///
    /// Root-only.
    pub fn get_prev_focus_member(
        &self,
        check_enabled: bool,
    ) -> Result<Option<Member>, FocusTreeError> {
        self.check_root()?;
        Ok(self.advance_focus_member(false, check_enabled))
    }

    /// Reset the focus member to the first focusable leaf.
    ///
    /// Fires the focus-change notification only if the member actually
    /// changed. Returns the new focus member.
    ///
    /// Root-only.
    pub fn reset_focus_member(
        &self,
        check_enabled: bool,
    ) -> Result<Option<Member>, FocusTreeError> {
        self.check_root()?;
        Ok(self.reset_focus_to(true, check_enabled))
    }

    // =========================================================================
    // Listeners (root only)
    // =========================================================================

    /// Add a focus-change listener.
    ///
    /// The listener is called whenever the recorded focus member changes.
    /// Note that the member has not actually received input focus; acting on
    /// that is the listener's decision.
    ///
    /// Root-only.
    pub fn add_focus_change_listener<F>(&self, listener: F) -> Result<ConnectionId, FocusTreeError>
    where
        F: Fn(&FocusChangeEvent) + Send + Sync + 'static,
    {
        self.check_root()?;
        Ok(self.focus_changed.connect(listener))
    }

    /// Remove a focus-change listener.
    ///
    /// Root-only.
    pub fn remove_focus_change_listener(&self, id: ConnectionId) -> Result<bool, FocusTreeError> {
        self.check_root()?;
        Ok(self.focus_changed.disconnect(id))
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Render the tree's structure as an indented listing.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        self.describe_into(&mut out, 0);
        out
    }

    /// Log the tree's structure at debug level.
    pub fn dump(&self) {
        for line in self.describe().lines() {
            tracing::debug!(target: "latchkey::focus", "{line}");
        }
    }

    fn describe_into(&self, out: &mut String, depth: usize) {
        use std::fmt::Write;

        let indent = "  ".repeat(depth);
        let _ = writeln!(out, "{indent}[{}]", self.name);
        for member in self.members_snapshot() {
            match member {
                Member::Group(group) => group.describe_into(out, depth + 1),
                Member::Leaf(target) => {
                    let _ = writeln!(out, "{indent}  leaf #{}", target.target_id().as_raw());
                }
            }
        }
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// A strong handle to this tree, from the self-reference set at
    /// construction.
    fn arc(&self) -> Arc<FocusTree> {
        self.this.upgrade().expect("focus tree accessed during teardown")
    }

    fn check_root(&self) -> Result<(), FocusTreeError> {
        if self.is_root() {
            Ok(())
        } else {
            tracing::error!(
                target: "latchkey::focus",
                tree = %self.name,
                "root-only operation called on nested tree"
            );
            Err(FocusTreeError::NotRoot {
                name: self.name.clone(),
            })
        }
    }

    fn set_parent(&self, parent: Option<&Arc<FocusTree>>) {
        self.state.write().parent = parent.map(Arc::downgrade).unwrap_or_default();
    }

    /// Snapshot the member list so traversal never holds a lock across
    /// recursion or callbacks.
    fn members_snapshot(&self) -> Vec<Member> {
        self.state.read().members.clone()
    }

    fn index_of(&self, member: &Member) -> Option<usize> {
        self.state.read().members.iter().position(|m| m.same(member))
    }

    /// The tree within this hierarchy that directly contains `member`
    /// (top-down search).
    fn tree_for_member(&self, member: &Member) -> Option<Arc<FocusTree>> {
        for m in self.members_snapshot() {
            if m.same(member) {
                return Some(self.arc());
            }
            if let Member::Group(group) = &m {
                if let Some(found) = group.tree_for_member(member) {
                    return Some(found);
                }
            }
        }
        None
    }

    fn leaf_accepts(target: &Arc<dyn FocusTarget>, check_enabled: bool) -> bool {
        !check_enabled || target.is_focusable()
    }

    /// Leftmost focusable leaf, recursing into groups in order.
    fn leftmost(&self, check_enabled: bool) -> Option<Member> {
        for member in self.members_snapshot() {
            match &member {
                Member::Leaf(target) => {
                    if Self::leaf_accepts(target, check_enabled) {
                        return Some(member);
                    }
                }
                Member::Group(group) => {
                    if let Some(found) = group.leftmost(check_enabled) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }

    /// Rightmost focusable leaf, recursing into groups in reverse order.
    fn rightmost(&self, check_enabled: bool) -> Option<Member> {
        for member in self.members_snapshot().into_iter().rev() {
            match &member {
                Member::Leaf(target) => {
                    if Self::leaf_accepts(target, check_enabled) {
                        return Some(member);
                    }
                }
                Member::Group(group) => {
                    if let Some(found) = group.rightmost(check_enabled) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }

    /// The focusable leaf after `member` among this tree's members, rolling
    /// up to the parent at the right boundary.
    fn next_member_from(&self, member: &Member, check_enabled: bool) -> Option<Member> {
        let members = self.members_snapshot();
        let start = members
            .iter()
            .position(|m| m.same(member))
            .map_or(0, |i| i + 1);

        for candidate in &members[start..] {
            match candidate {
                Member::Leaf(target) => {
                    if Self::leaf_accepts(target, check_enabled) {
                        return Some(candidate.clone());
                    }
                }
                Member::Group(group) => {
                    if let Some(found) = group.leftmost(check_enabled) {
                        return Some(found);
                    }
                }
            }
        }

        // Right boundary of this group: continue after it in the parent.
        let parent = self.parent()?;
        parent.next_member_from(&Member::Group(self.arc()), check_enabled)
    }

    /// The focusable leaf before `member` among this tree's members, rolling
    /// up to the parent at the left boundary.
    fn prev_member_from(&self, member: &Member, check_enabled: bool) -> Option<Member> {
        let members = self.members_snapshot();
        let end = members.iter().rposition(|m| m.same(member)).unwrap_or(0);

        for candidate in members[..end].iter().rev() {
            match candidate {
                Member::Leaf(target) => {
                    if Self::leaf_accepts(target, check_enabled) {
                        return Some(candidate.clone());
                    }
                }
                Member::Group(group) => {
                    if let Some(found) = group.rightmost(check_enabled) {
                        return Some(found);
                    }
                }
            }
        }

        let parent = self.parent()?;
        parent.prev_member_from(&Member::Group(self.arc()), check_enabled)
    }

    fn record_focus_member(&self, member: &Member, check_enabled: bool, notify: bool) -> bool {
        let resolved = match member {
            Member::Group(group) => {
                tracing::debug!(
                    target: "latchkey::focus",
                    group = %group.name,
                    "resolving group to its first member for focus"
                );
                match group.get_first_member(check_enabled) {
                    Some(first) => first,
                    None => return false,
                }
            }
            leaf => leaf.clone(),
        };

        if let Member::Leaf(target) = &resolved {
            if !Self::leaf_accepts(target, check_enabled) {
                return false;
            }
        }
        if !self.contains(&resolved) {
            return false;
        }

        tracing::trace!(
            target: "latchkey::focus",
            tree = %self.name,
            member = ?resolved,
            "focus member set"
        );
        self.state.write().current_focus = Some(resolved.clone());
        if notify {
            self.emit_change(&self.name, Some(resolved));
        }
        true
    }

    fn advance_focus_member(&self, forward: bool, check_enabled: bool) -> Option<Member> {
        let Some(current) = self.state.read().current_focus.clone() else {
            return self.reset_focus_to(forward, check_enabled);
        };

        let Some(owner) = self.tree_for_member(&current) else {
            tracing::warn!(
                target: "latchkey::focus",
                tree = %self.name,
                member = ?current,
                "focus member is no longer in the tree"
            );
            return None;
        };

        let stepped = if forward {
            owner.next_member_from(&current, check_enabled)
        } else {
            owner.prev_member_from(&current, check_enabled)
        };

        let landed = match stepped {
            Some(member) => member,
            None => {
                // Boundary reached: wrap around to the other end.
                let wrapped = if forward {
                    self.leftmost(check_enabled)
                } else {
                    self.rightmost(check_enabled)
                };
                match wrapped {
                    // Only one focusable member; stay put without notifying.
                    Some(member) if member.same(&current) => return Some(member),
                    Some(member) => member,
                    None => {
                        self.state.write().current_focus = None;
                        self.emit_change(&self.name, None);
                        return None;
                    }
                }
            }
        };

        tracing::trace!(
            target: "latchkey::focus",
            tree = %self.name,
            member = ?landed,
            forward,
            "focus member advanced"
        );
        self.state.write().current_focus = Some(landed.clone());
        self.emit_change(&self.name, Some(landed.clone()));
        Some(landed)
    }

    fn reset_focus_to(&self, first: bool, check_enabled: bool) -> Option<Member> {
        let member = if first {
            self.leftmost(check_enabled)
        } else {
            self.rightmost(check_enabled)
        };

        let changed = {
            let mut state = self.state.write();
            let changed = match (&state.current_focus, &member) {
                (None, None) => false,
                (Some(a), Some(b)) => !a.same(b),
                _ => true,
            };
            state.current_focus = member.clone();
            changed
        };

        if changed {
            self.emit_change(&self.name, member.clone());
        }
        member
    }

    /// Emit a focus-change notification from the root of this hierarchy.
    fn emit_change(&self, origin: &str, new_focus: Option<Member>) {
        let root = self.root();
        root.focus_changed.emit(FocusChangeEvent {
            tree: origin.to_string(),
            new_focus,
        });
    }
}

impl fmt::Debug for FocusTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("FocusTree")
            .field("name", &self.name)
            .field("members", &state.members.len())
            .field("root", &state.parent.upgrade().is_none())
            .field("current_focus", &state.current_focus)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::TargetId;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct Stub {
        id: TargetId,
        focusable: AtomicBool,
    }

    impl Stub {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                id: TargetId::next(),
                focusable: AtomicBool::new(true),
            })
        }

        fn disabled() -> Arc<Self> {
            let stub = Self::new();
            stub.focusable.store(false, Ordering::SeqCst);
            stub
        }
    }

    impl FocusTarget for Stub {
        fn target_id(&self) -> TargetId {
            self.id
        }

        fn is_focusable(&self) -> bool {
            self.focusable.load(Ordering::SeqCst)
        }

        fn has_focus(&self) -> bool {
            false
        }
    }

    fn leaf(stub: &Arc<Stub>) -> Member {
        Member::Leaf(Arc::clone(stub) as Arc<dyn FocusTarget>)
    }

    #[test]
    fn test_insertion_order_is_tab_order() {
        let tree = FocusTree::new("t1");
        let a = Stub::new();
        let b = Stub::new();
        tree.add_member(leaf(&a));
        tree.add_member(leaf(&b));

        assert!(tree.get_first_member(true).unwrap().same(&leaf(&a)));
        assert!(tree.get_last_member(true).unwrap().same(&leaf(&b)));
        assert_eq!(tree.size(), 2);
    }

    #[test]
    fn test_traversal_totality() {
        // N focusable leaves: N advances from any leaf cycle back to it,
        // visiting every leaf exactly once.
        let tree = FocusTree::new("t2");
        let panel = FocusTree::new("t2-panel");
        let a = Stub::new();
        let b = Stub::new();
        let c = Stub::new();
        let d = Stub::new();
        tree.add_member(leaf(&a));
        tree.add_member(leaf(&b));
        panel.add_member(leaf(&c));
        panel.add_member(leaf(&d));
        tree.add_member(panel);

        let _ = tree.reset_focus_member(true).unwrap();

        let mut visited = vec![tree.get_focus_member().unwrap().unwrap()];
        for _ in 0..3 {
            visited.push(tree.get_next_focus_member(true).unwrap().unwrap());
        }
        for (i, m) in visited.iter().enumerate() {
            for later in &visited[i + 1..] {
                assert!(!m.same(later), "leaf visited twice before cycle completed");
            }
        }

        let back = tree.get_next_focus_member(true).unwrap().unwrap();
        assert!(back.same(&visited[0]));
    }

    #[test]
    fn test_prev_wraps_to_last() {
        let tree = FocusTree::new("t3");
        let a = Stub::new();
        let b = Stub::new();
        tree.add_member(leaf(&a));
        tree.add_member(leaf(&b));

        let _ = tree.reset_focus_member(true).unwrap();
        let prev = tree.get_prev_focus_member(true).unwrap().unwrap();
        assert!(prev.same(&leaf(&b)));
    }

    #[test]
    fn test_single_member_is_noop_without_notification() {
        let tree = FocusTree::new("t4");
        let a = Stub::new();
        tree.add_member(leaf(&a));
        let _ = tree.reset_focus_member(true).unwrap();

        let notifications = Arc::new(AtomicUsize::new(0));
        let n = Arc::clone(&notifications);
        tree.add_focus_change_listener(move |_| {
            n.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        let next = tree.get_next_focus_member(true).unwrap().unwrap();
        assert!(next.same(&leaf(&a)));
        let prev = tree.get_prev_focus_member(true).unwrap().unwrap();
        assert!(prev.same(&leaf(&a)));
        assert_eq!(notifications.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_disabled_members_skipped() {
        let tree = FocusTree::new("t5");
        let a = Stub::new();
        let off = Stub::disabled();
        let c = Stub::new();
        tree.add_member(leaf(&a));
        tree.add_member(leaf(&off));
        tree.add_member(leaf(&c));

        let _ = tree.reset_focus_member(true).unwrap();
        let next = tree.get_next_focus_member(true).unwrap().unwrap();
        assert!(next.same(&leaf(&c)));

        // Without the enabled check, the disabled member is reachable.
        let prev = tree.get_prev_focus_member(false).unwrap().unwrap();
        assert!(prev.same(&leaf(&off)));
    }

    #[test]
    fn test_failover_prefers_previous_sibling() {
        let tree = FocusTree::new("t6");
        let a = Stub::new();
        let b = Stub::new();
        let c = Stub::new();
        tree.add_member(leaf(&a));
        tree.add_member(leaf(&b));
        tree.add_member(leaf(&c));

        tree.set_focus_member(&leaf(&b), true).unwrap();
        let removed = tree.remove_member(&leaf(&b), true);
        assert!(removed.unwrap().same(&leaf(&b)));
        assert!(tree.get_focus_member().unwrap().unwrap().same(&leaf(&a)));
    }

    #[test]
    fn test_failover_falls_through_to_next() {
        let tree = FocusTree::new("t7");
        let a = Stub::new();
        let b = Stub::new();
        tree.add_member(leaf(&a));
        tree.add_member(leaf(&b));

        tree.set_focus_member(&leaf(&a), true).unwrap();
        let _ = tree.remove_member(&leaf(&a), true);
        assert!(tree.get_focus_member().unwrap().unwrap().same(&leaf(&b)));
    }

    #[test]
    fn test_failover_to_none_when_alone() {
        let tree = FocusTree::new("t8");
        let a = Stub::new();
        tree.add_member(leaf(&a));

        tree.set_focus_member(&leaf(&a), true).unwrap();
        let _ = tree.remove_member(&leaf(&a), true);
        assert!(tree.get_focus_member().unwrap().is_none());
        assert_eq!(tree.size(), 0);
    }

    #[test]
    fn test_removing_focused_subtree_fails_over() {
        let tree = FocusTree::new("t9");
        let a = Stub::new();
        let panel = FocusTree::new("t9-panel");
        let inner = Stub::new();
        panel.add_member(leaf(&inner));
        tree.add_member(leaf(&a));
        tree.add_member(Arc::clone(&panel));

        tree.set_focus_member(&leaf(&inner), true).unwrap();
        let _ = tree.remove_member(&Member::Group(Arc::clone(&panel)), true);
        assert!(tree.get_focus_member().unwrap().unwrap().same(&leaf(&a)));
        assert!(panel.is_root());
    }

    #[test]
    fn test_replace_member_moves_focus_to_replacement() {
        let tree = FocusTree::new("t10");
        let a = Stub::new();
        let b = Stub::new();
        tree.add_member(leaf(&a));

        tree.set_focus_member(&leaf(&a), true).unwrap();
        let _ = tree.replace_member(&leaf(&a), Some(leaf(&b)), true);
        assert!(tree.get_focus_member().unwrap().unwrap().same(&leaf(&b)));
        assert!(tree.contains(&leaf(&b)));
        assert!(!tree.contains(&leaf(&a)));
    }

    #[test]
    fn test_replace_absent_member_appends() {
        let tree = FocusTree::new("t11");
        let a = Stub::new();
        let stranger = Stub::new();

        let result = tree.replace_member(&leaf(&stranger), Some(leaf(&a)), true);
        assert!(result.is_none());
        assert!(tree.contains(&leaf(&a)));
    }

    #[test]
    fn test_root_only_operations_reject_nested_trees() {
        let root = FocusTree::new("t12");
        let nested = FocusTree::new("t12-nested");
        root.add_member(Arc::clone(&nested));

        let err = nested.get_focus_member().unwrap_err();
        assert_eq!(
            err,
            FocusTreeError::NotRoot {
                name: "t12-nested".to_string()
            }
        );
        assert!(nested.reset_focus_member(true).is_err());
        assert!(nested.get_next_focus_member(true).is_err());
        assert!(nested.add_focus_change_listener(|_| {}).is_err());
    }

    #[test]
    fn test_set_focus_member_honors_enabled_check() {
        let tree = FocusTree::new("t13");
        let off = Stub::disabled();
        tree.add_member(leaf(&off));

        assert!(!tree.set_focus_member(&leaf(&off), true).unwrap());
        assert!(tree.set_focus_member(&leaf(&off), false).unwrap());
    }

    #[test]
    fn test_set_focus_member_rejects_strangers() {
        let tree = FocusTree::new("t14");
        let a = Stub::new();
        let stranger = Stub::new();
        tree.add_member(leaf(&a));

        assert!(!tree.set_focus_member(&leaf(&stranger), true).unwrap());
        assert!(tree.get_focus_member().unwrap().is_none());
    }

    #[test]
    fn test_contains_recurses() {
        let tree = FocusTree::new("t15");
        let panel = FocusTree::new("t15-panel");
        let inner = Stub::new();
        panel.add_member(leaf(&inner));
        tree.add_member(Arc::clone(&panel));

        assert!(tree.contains(&leaf(&inner)));
        assert!(tree.contains(&Member::Group(panel)));
    }

    #[test]
    fn test_reset_notifies_only_on_change() {
        let tree = FocusTree::new("t16");
        let a = Stub::new();
        tree.add_member(leaf(&a));

        let notifications = Arc::new(AtomicUsize::new(0));
        let n = Arc::clone(&notifications);
        tree.add_focus_change_listener(move |_| {
            n.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        let _ = tree.reset_focus_member(true).unwrap();
        assert_eq!(notifications.load(Ordering::SeqCst), 1);
        let _ = tree.reset_focus_member(true).unwrap();
        assert_eq!(notifications.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_by_name_registry() {
        let tree = FocusTree::new("t17-registry");
        assert!(Arc::ptr_eq(&FocusTree::by_name("t17-registry").unwrap(), &tree));
        drop(tree);
        assert!(FocusTree::by_name("t17-registry").is_none());
    }

    #[test]
    fn test_describe_lists_nested_structure() {
        let tree = FocusTree::new("t18");
        let panel = FocusTree::new("t18-panel");
        let a = Stub::new();
        let inner = Stub::new();
        tree.add_member(leaf(&a));
        panel.add_member(leaf(&inner));
        tree.add_member(panel);

        let description = tree.describe();
        assert!(description.contains("[t18]"));
        assert!(description.contains("[t18-panel]"));
        assert_eq!(description.lines().count(), 4);
    }

    #[test]
    fn test_add_member_at_positions() {
        let tree = FocusTree::new("t19");
        let a = Stub::new();
        let b = Stub::new();
        let c = Stub::new();
        tree.add_member(leaf(&a));
        tree.add_member(leaf(&c));
        tree.add_member_after(leaf(&b), &leaf(&a));

        let _ = tree.reset_focus_member(true).unwrap();
        let second = tree.get_next_focus_member(true).unwrap().unwrap();
        assert!(second.same(&leaf(&b)));

        let d = Stub::new();
        tree.add_member_before(leaf(&d), &leaf(&a));
        assert!(tree.get_first_member(true).unwrap().same(&leaf(&d)));
    }
}
