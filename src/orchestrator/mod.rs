//! Sequences user intents against the backend and the session. These
//! are the only writers to a `Session`.
pub mod conversation;
pub mod upload;

pub use conversation::{ConversationOrchestrator, FALLBACK_REPLY, SkipReason, SubmitOutcome};
pub use upload::{UploadOrchestrator, UploadOutcome, ValidationError};

/// One-shot signals for the front end that aren't part of the session
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// A document was just installed and the conversation can start
    ReadyToConverse,
}
