//! Wire types exchanged with the document chat backend.
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A document the backend has accepted and indexed.
///
/// Anything the backend returns besides the id and file name is kept
/// in `metadata` so it survives a round trip untouched.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Document {
    #[serde(rename = "documentId")]
    pub id: String,
    #[serde(rename = "fileName", default)]
    pub file_name: String,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl Document {
    pub fn new(id: &str, file_name: &str) -> Self {
        Self {
            id: id.to_string(),
            file_name: file_name.to_string(),
            metadata: Map::new(),
        }
    }
}

// The backend has sent both `0.87` and `"high"` here depending on the
// retriever in use.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum Relevance {
    Score(f64),
    Label(String),
}

impl fmt::Display for Relevance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relevance::Score(score) => write!(f, "{:.2}", score),
            Relevance::Label(label) => write!(f, "{}", label),
        }
    }
}

/// A retrieved excerpt backing an assistant answer.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Source {
    pub id: String,
    pub relevance: Relevance,
    pub text: String,
}

/// A prior turn as sent to the backend: role and content only.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
    #[serde(rename = "documentId")]
    pub document_id: &'a str,
    pub messages: &'a [Turn],
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct ChatReply {
    #[serde(rename = "message")]
    pub text: String,
    #[serde(default)]
    pub sources: Vec<Source>,
}

// Responses come back either bare or wrapped as
// `{"success": true, "data": ...}`. Try the wrapped form first since
// a bare payload never has a `data` field.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub(crate) enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub(crate) fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(inner) => inner,
        }
    }
}

#[derive(Clone, Debug)]
enum FileBody {
    Bytes(Vec<u8>),
    // Read only when the upload is actually sent so an oversized file
    // is rejected without loading it
    Path(PathBuf),
}

/// A file the user picked or dropped, not yet sent anywhere.
#[derive(Clone, Debug)]
pub struct UploadFile {
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
    body: FileBody,
}

impl UploadFile {
    pub fn from_bytes(file_name: &str, mime_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            size: bytes.len() as u64,
            body: FileBody::Bytes(bytes),
        }
    }

    /// Describes a file on disk, inferring the MIME type from its
    /// extension. The contents are not read until upload.
    pub async fn from_path(path: &Path) -> Result<Self, std::io::Error> {
        let metadata = tokio::fs::metadata(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();

        Ok(Self {
            file_name,
            mime_type,
            size: metadata.len(),
            body: FileBody::Path(path.to_path_buf()),
        })
    }

    pub async fn contents(&self) -> Result<Vec<u8>, std::io::Error> {
        match &self.body {
            FileBody::Bytes(bytes) => Ok(bytes.clone()),
            FileBody::Path(path) => tokio::fs::read(path).await,
        }
    }
}
