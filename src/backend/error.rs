use serde_json::Value;
use thiserror::Error;

/// Shown when an upload fails and the backend gave no reason.
pub const UPLOAD_FAILED_MESSAGE: &str = "Upload failed. Please try again.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("backend returned {status}: {}", .message.as_deref().unwrap_or("no error message"))]
    Status {
        status: u16,
        message: Option<String>,
    },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("could not read file: {0}")]
    File(#[from] std::io::Error),
}

impl ApiError {
    /// Builds a `Status` error from a non-2xx response body, picking
    /// up the backend's `error` field when there is one.
    pub fn from_response_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(String::from));
        ApiError::Status { status, message }
    }

    /// Human readable error text the backend sent, if any.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct UploadError {
    pub message: String,
}

impl From<ApiError> for UploadError {
    fn from(err: ApiError) -> Self {
        let message = err
            .backend_message()
            .unwrap_or(UPLOAD_FAILED_MESSAGE)
            .to_string();
        UploadError { message }
    }
}
