//! Test utilities for integration tests
#![allow(dead_code)]
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::{Notify, mpsc};

use docchat::backend::{
    ApiError, Backend, ChatReply, Document, HttpBackend, SharedBackend, Turn, UploadError,
    UploadFile,
};
use docchat::orchestrator::{ConversationOrchestrator, Notice, UploadOrchestrator};
use docchat::session::Session;

/// Points an `HttpBackend` at a mockito server with the API mounted
/// under `/api`, the way the real backend is deployed.
pub fn backend_for(server: &mockito::ServerGuard) -> SharedBackend {
    Arc::new(HttpBackend::new(&format!("{}/api", server.url())))
}

/// A session wired to both orchestrators, with ready notices sent
/// immediately.
pub struct Harness {
    pub session: Session,
    pub uploads: UploadOrchestrator,
    pub conversation: ConversationOrchestrator,
    pub notices: mpsc::UnboundedReceiver<Notice>,
}

pub fn harness(backend: SharedBackend) -> Harness {
    let session = Session::new();
    let (tx, rx) = mpsc::unbounded_channel();
    let uploads = UploadOrchestrator::new(session.clone(), backend.clone())
        .ready_delay(Duration::ZERO)
        .notify(tx);
    let conversation = ConversationOrchestrator::new(session.clone(), backend);
    Harness {
        session,
        uploads,
        conversation,
        notices: rx,
    }
}

pub fn pdf(name: &str, size: usize) -> UploadFile {
    UploadFile::from_bytes(name, "application/pdf", vec![b'%'; size])
}

pub fn document_body(id: &str, file_name: &str) -> String {
    json!({
        "success": true,
        "data": {"documentId": id, "fileName": file_name}
    })
    .to_string()
}

pub fn chat_body(message: &str) -> String {
    json!({
        "success": true,
        "data": {"message": message, "sources": []}
    })
    .to_string()
}

/// A backend that parks every upload and chat request until the gate
/// is opened, so tests can act while a request is in flight.
pub struct GatedBackend {
    pub gate: Notify,
    pub uploads: AtomicUsize,
    pub chats: AtomicUsize,
}

impl GatedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            gate: Notify::new(),
            uploads: AtomicUsize::new(0),
            chats: AtomicUsize::new(0),
        })
    }

    pub fn open(&self) {
        self.gate.notify_one();
    }

    pub fn upload_calls(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn chat_calls(&self) -> usize {
        self.chats.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for GatedBackend {
    async fn upload(&self, file: &UploadFile) -> Result<Document, UploadError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        Ok(Document::new("gated-doc", &file.file_name))
    }

    async fn chat(
        &self,
        message: &str,
        _document_id: &str,
        _history: &[Turn],
    ) -> Result<ChatReply, ApiError> {
        self.chats.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        Ok(ChatReply {
            text: format!("echo: {}", message),
            sources: vec![],
        })
    }

    async fn list_documents(&self) -> Result<Vec<Document>, ApiError> {
        Ok(vec![])
    }

    async fn get_document(&self, id: &str) -> Result<Document, ApiError> {
        Ok(Document::new(id, "existing.txt"))
    }

    async fn delete_document(&self, _id: &str) -> Result<Value, ApiError> {
        Ok(json!({"success": true}))
    }
}

/// Yields to the runtime until `session` reports busy.
pub async fn wait_until_busy(session: &Session) {
    while !session.is_busy() {
        tokio::task::yield_now().await;
    }
}
