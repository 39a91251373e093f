use crate::clipboard::Clipboard;
use crate::selection::Selection;
use crate::task::TaskId;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Opaque identity of whoever issues edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u64);

/// Everything the engine keeps for one actor.
#[derive(Debug)]
pub struct ActorSession {
    pub selection: Selection,
    clipboard: Option<Arc<Clipboard>>,
}

impl ActorSession {
    fn new(actor: ActorId) -> Self {
        Self {
            selection: Selection::new(actor),
            clipboard: None,
        }
    }

    /// The clipboard, if one was captured and holds at least one block.
    pub fn clipboard(&self) -> Option<&Arc<Clipboard>> {
        self.clipboard.as_ref().filter(|c| !c.is_empty())
    }

    pub fn has_clipboard(&self) -> bool {
        self.clipboard().is_some()
    }

    /// Replaces any previous clipboard.
    pub fn set_clipboard(&mut self, clipboard: Clipboard) {
        self.clipboard = Some(Arc::new(clipboard));
    }

}

/// Per-actor sessions, created on first use and dropped when the actor
/// leaves.
///
/// In-flight edits are tracked per actor, outside the sessions, so an actor
/// stays busy across [`SessionRegistry::end_session`] until its edit
/// reports back.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: FxHashMap<ActorId, ActorSession>,
    in_flight: FxHashMap<ActorId, TaskId>,
    /// In-flight tasks whose session ended before they completed.
    detached: FxHashSet<TaskId>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_mut(&mut self, actor: ActorId) -> &mut ActorSession {
        self.sessions
            .entry(actor)
            .or_insert_with(|| ActorSession::new(actor))
    }

    pub fn get(&self, actor: ActorId) -> Option<&ActorSession> {
        self.sessions.get(&actor)
    }

    pub fn get_mut(&mut self, actor: ActorId) -> Option<&mut ActorSession> {
        self.sessions.get_mut(&actor)
    }

    pub fn is_busy(&self, actor: ActorId) -> bool {
        self.in_flight.contains_key(&actor)
    }

    pub fn in_flight(&self, actor: ActorId) -> Option<TaskId> {
        self.in_flight.get(&actor).copied()
    }

    pub(crate) fn begin(&mut self, actor: ActorId, task: TaskId) {
        self.in_flight.insert(actor, task);
    }

    /// Clears `task` for `actor`. Returns true if the session that issued it
    /// is still alive and may receive its results.
    pub(crate) fn finish(&mut self, actor: ActorId, task: TaskId) -> bool {
        if self.in_flight.get(&actor) == Some(&task) {
            self.in_flight.remove(&actor);
        }
        !self.detached.remove(&task) && self.sessions.contains_key(&actor)
    }

    /// Drops the actor's session. An edit still in flight keeps the actor
    /// busy, but its results are discarded when it completes.
    pub fn end_session(&mut self, actor: ActorId) -> Option<ActorSession> {
        if let Some(task) = self.in_flight(actor) {
            self.detached.insert(task);
        }
        self.sessions.remove(&actor)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
