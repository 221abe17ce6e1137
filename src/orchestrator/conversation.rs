use crate::backend::{Role, SharedBackend};
use crate::session::Session;

/// Shown in place of an answer when the chat request fails.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyMessage,
    NoDocument,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Ignored(SkipReason),
    /// The backend answered and its reply was appended
    Answered,
    /// The request failed and the fallback reply was appended
    FellBack,
}

/// Runs one question and answer exchange at a time against the
/// session's current document.
///
/// A submission moves through `Idle -> Sending -> Answered | FellBack
/// -> Idle`. There is no error state: a failed request still leaves a
/// user turn followed by an assistant turn.
#[derive(Clone)]
pub struct ConversationOrchestrator {
    session: Session,
    backend: SharedBackend,
}

impl ConversationOrchestrator {
    pub fn new(session: Session, backend: SharedBackend) -> Self {
        Self { session, backend }
    }

    pub async fn submit_message(&self, text: &str) -> SubmitOutcome {
        let message = text.trim();
        if message.is_empty() {
            return SubmitOutcome::Ignored(SkipReason::EmptyMessage);
        }
        if self.session.current_document().is_none() {
            return SubmitOutcome::Ignored(SkipReason::NoDocument);
        }
        let Some(_busy) = self.session.try_begin() else {
            return SubmitOutcome::Ignored(SkipReason::Busy);
        };
        // Re-read now that we hold busy, an upload may have finished
        // in between and swapped the document
        let Some(document) = self.session.current_document() else {
            return SubmitOutcome::Ignored(SkipReason::NoDocument);
        };

        // History is captured before the new turn is appended, the
        // new turn goes to the backend as `message` instead
        let history = self.session.history();
        self.session.append_message(Role::User, message, Vec::new());

        match self.backend.chat(message, &document.id, &history).await {
            Ok(reply) => {
                self.session
                    .append_message(Role::Assistant, &reply.text, reply.sources);
                SubmitOutcome::Answered
            }
            Err(err) => {
                tracing::warn!(
                    session_id = %self.session.id(),
                    document_id = %document.id,
                    "Chat request failed: {}",
                    err
                );
                self.session
                    .append_message(Role::Assistant, FALLBACK_REPLY, Vec::new());
                SubmitOutcome::FellBack
            }
        }
    }

    /// Starts over with the current document. Returns false and does
    /// nothing while a request is in flight.
    pub fn reset(&self) -> bool {
        let Some(_busy) = self.session.try_begin() else {
            return false;
        };
        self.session.clear_conversation();
        true
    }
}
