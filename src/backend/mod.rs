//! Gateway to the remote RAG service. Nothing else in the crate talks
//! to the network.
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

mod client;
pub mod error;
pub mod models;

pub use client::HttpBackend;
pub use error::{ApiError, UploadError};
pub use models::{ChatReply, Document, Relevance, Role, Source, Turn, UploadFile};

/// The remote operations the session layer depends on. Each call
/// resolves or fails exactly once; nothing is retried or cached.
#[async_trait]
pub trait Backend {
    async fn upload(&self, file: &UploadFile) -> Result<Document, UploadError>;

    /// `history` is every prior turn in chronological order, not
    /// including `message`.
    async fn chat(
        &self,
        message: &str,
        document_id: &str,
        history: &[Turn],
    ) -> Result<ChatReply, ApiError>;

    async fn list_documents(&self) -> Result<Vec<Document>, ApiError>;

    async fn get_document(&self, id: &str) -> Result<Document, ApiError>;

    async fn delete_document(&self, id: &str) -> Result<Value, ApiError>;
}

pub type SharedBackend = Arc<dyn Backend + Send + Sync + 'static>;
