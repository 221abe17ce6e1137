use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use super::models::{Conversation, Message};
use crate::backend::{Document, Role, Source, Turn};

/// Everything the front end renders from.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    pub current_document: Option<Document>,
    pub conversation: Conversation,
    pub busy: bool,
}

/// Shared handle to the session. Clones point at the same state.
///
/// Every operation takes the lock once and releases it before
/// returning, so callers never observe a half-applied change and the
/// lock is never held across an `.await`.
#[derive(Clone, Debug)]
pub struct Session {
    id: Uuid,
    state: Arc<RwLock<SessionState>>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: Arc::new(RwLock::new(SessionState::default())),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    // A panic while holding the lock can't leave the state invalid
    // since every write is a single assignment or push.
    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Switches to `doc` and drops the conversation so context from
    /// one document never leaks into another.
    pub fn select_document(&self, doc: Document) {
        tracing::info!(session_id = %self.id, document_id = %doc.id, "Selected document");
        let mut state = self.write();
        state.current_document = Some(doc);
        state.conversation.clear();
    }

    pub fn append_message(&self, role: Role, content: &str, sources: Vec<Source>) {
        self.write()
            .conversation
            .push(Message::new(role, content, sources));
    }

    pub fn clear_conversation(&self) {
        self.write().conversation.clear();
    }

    pub fn set_busy(&self, busy: bool) {
        self.write().busy = busy;
    }

    /// Marks the session busy unless it already is. The returned guard
    /// clears the flag when dropped.
    pub fn try_begin(&self) -> Option<BusyGuard> {
        let mut state = self.write();
        if state.busy {
            return None;
        }
        state.busy = true;
        Some(BusyGuard {
            session: self.clone(),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.read().busy
    }

    pub fn current_document(&self) -> Option<Document> {
        self.read().current_document.clone()
    }

    /// The conversation so far as role and content pairs, oldest first.
    pub fn history(&self) -> Vec<Turn> {
        self.read().conversation.turns()
    }

    pub fn snapshot(&self) -> SessionState {
        self.read().clone()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds the session's busy flag for one outstanding request.
#[derive(Debug)]
pub struct BusyGuard {
    session: Session,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.session.set_busy(false);
    }
}
