//! In-memory state for one document conversation.
pub mod models;
mod store;

pub use models::{Conversation, Message};
pub use store::{BusyGuard, Session, SessionState};
