use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;

use super::Notice;
use crate::backend::{ApiError, Document, SharedBackend, UploadFile};
use crate::session::Session;

pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const ACCEPTED_MIME_TYPES: [&str; 2] = ["application/pdf", "text/plain"];

/// Problems caught before anything is sent to the backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unsupported type: {0} (only PDF and TXT files are supported)")]
    UnsupportedType(String),
    #[error("too large: {size} bytes (files must be {limit} bytes or less)")]
    TooLarge { size: u64, limit: u64 },
}

pub fn validate(file: &UploadFile) -> Result<(), ValidationError> {
    if !ACCEPTED_MIME_TYPES.contains(&file.mime_type.as_str()) {
        return Err(ValidationError::UnsupportedType(file.mime_type.clone()));
    }
    if file.size > MAX_UPLOAD_BYTES {
        return Err(ValidationError::TooLarge {
            size: file.size,
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// No file was given or another request is in flight
    Ignored,
    Rejected(ValidationError),
    Succeeded(Document),
    Failed(String),
}

/// Validates and uploads files, installing the result as the
/// session's current document.
#[derive(Clone)]
pub struct UploadOrchestrator {
    session: Session,
    backend: SharedBackend,
    ready_delay: Duration,
    notices: Option<mpsc::UnboundedSender<Notice>>,
}

impl UploadOrchestrator {
    pub fn new(session: Session, backend: SharedBackend) -> Self {
        Self {
            session,
            backend,
            ready_delay: Duration::from_secs(1),
            notices: None,
        }
    }

    pub fn ready_delay(mut self, delay: Duration) -> Self {
        self.ready_delay = delay;
        self
    }

    /// Send `Notice::ReadyToConverse` on `tx` after each document is
    /// installed.
    pub fn notify(mut self, tx: mpsc::UnboundedSender<Notice>) -> Self {
        self.notices = Some(tx);
        self
    }

    /// Entry point for a drop or file picker event. Only the first
    /// file is used and an empty selection does nothing.
    pub async fn submit_files(&self, files: Vec<UploadFile>) -> UploadOutcome {
        match files.into_iter().next() {
            Some(file) => self.submit_upload(file).await,
            None => UploadOutcome::Ignored,
        }
    }

    pub async fn submit_upload(&self, file: UploadFile) -> UploadOutcome {
        if let Err(err) = validate(&file) {
            tracing::info!(file_name = %file.file_name, "Rejected upload: {}", err);
            return UploadOutcome::Rejected(err);
        }

        let Some(_busy) = self.session.try_begin() else {
            tracing::debug!("Ignoring upload while another request is in flight");
            return UploadOutcome::Ignored;
        };

        match self.backend.upload(&file).await {
            Ok(document) => {
                self.session.select_document(document.clone());
                self.signal_ready();
                UploadOutcome::Succeeded(document)
            }
            Err(err) => {
                tracing::warn!(
                    session_id = %self.session.id(),
                    file_name = %file.file_name,
                    "Upload failed: {}",
                    err
                );
                UploadOutcome::Failed(err.message)
            }
        }
    }

    /// Selects a document that was uploaded earlier. Returns `Ok(None)`
    /// if another request is in flight.
    pub async fn open_document(&self, id: &str) -> Result<Option<Document>, ApiError> {
        let Some(_busy) = self.session.try_begin() else {
            return Ok(None);
        };

        let document = self.backend.get_document(id).await?;
        self.session.select_document(document.clone());
        self.signal_ready();
        Ok(Some(document))
    }

    fn signal_ready(&self) {
        let Some(tx) = self.notices.clone() else {
            return;
        };
        let delay = self.ready_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The front end may already be gone
            let _ = tx.send(Notice::ReadyToConverse);
        });
    }
}
