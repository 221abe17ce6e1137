//! The conversation held by a session.
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::backend::{Role, Source, Turn};

/// A single turn in the conversation. Fields are private so a message
/// can't change once it has been appended.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct Message {
    role: Role,
    content: String,
    sources: Vec<Source>,
    timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: &str, sources: Vec<Source>) -> Self {
        Message {
            role,
            content: content.to_string(),
            sources,
            timestamp: Utc::now(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Strips sources and timestamp for sending as chat history.
    pub fn to_turn(&self) -> Turn {
        Turn::new(self.role, &self.content)
    }
}

#[derive(Clone, Default, Debug, PartialEq)]
pub struct Conversation(Vec<Message>);

impl Conversation {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn messages(&self) -> &[Message] {
        &self.0
    }

    pub fn push(&mut self, msg: Message) {
        self.0.push(msg)
    }

    pub fn clear(&mut self) {
        self.0.clear()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.0.iter()
    }

    pub fn turns(&self) -> Vec<Turn> {
        self.0.iter().map(Message::to_turn).collect()
    }
}
