use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{ApiError, UploadError};
use super::models::{ChatReply, ChatRequest, Document, Envelope, Turn, UploadFile};
use super::Backend;
use crate::core::AppConfig;

/// Talks to the backend's REST API over HTTP.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(60 * 10),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.api_base_url()).with_timeout(config.request_timeout)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn document_url(&self, id: &str) -> String {
        self.url(&format!("/documents/{}", urlencoding::encode(id)))
    }

    async fn try_upload(&self, file: &UploadFile) -> Result<Document, ApiError> {
        let bytes = file.contents().await?;
        let part = Part::bytes(bytes)
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)?;
        let form = Form::new().part("file", part);

        let resp = self
            .client
            .post(self.url("/documents/upload"))
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await?;

        decode(resp).await
    }
}

/// Turns a non-2xx response into `ApiError::Status` and decodes
/// everything else, unwrapping the `data` envelope if present.
async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::from_response_body(status.as_u16(), &body));
    }
    let payload: Envelope<T> = resp.json().await?;
    Ok(payload.into_inner())
}

#[async_trait]
impl Backend for HttpBackend {
    async fn upload(&self, file: &UploadFile) -> Result<Document, UploadError> {
        tracing::debug!(
            file_name = %file.file_name,
            mime_type = %file.mime_type,
            size = file.size,
            "Uploading document"
        );
        self.try_upload(file).await.map_err(|err| {
            tracing::debug!("Upload request failed: {}", err);
            UploadError::from(err)
        })
    }

    async fn chat(
        &self,
        message: &str,
        document_id: &str,
        history: &[Turn],
    ) -> Result<ChatReply, ApiError> {
        tracing::debug!(document_id, turns = history.len(), "Sending chat message");
        let payload = ChatRequest {
            message,
            document_id,
            messages: history,
        };
        let resp = self
            .client
            .post(self.url("/chat"))
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await?;

        decode(resp).await
    }

    async fn list_documents(&self) -> Result<Vec<Document>, ApiError> {
        let resp = self
            .client
            .get(self.url("/documents"))
            .timeout(self.timeout)
            .send()
            .await?;

        decode(resp).await
    }

    async fn get_document(&self, id: &str) -> Result<Document, ApiError> {
        let resp = self
            .client
            .get(self.document_url(id))
            .timeout(self.timeout)
            .send()
            .await?;

        decode(resp).await
    }

    async fn delete_document(&self, id: &str) -> Result<Value, ApiError> {
        let resp = self
            .client
            .delete(self.document_url(id))
            .timeout(self.timeout)
            .send()
            .await?;

        decode(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::models::{Relevance, Role};
    use anyhow::Result;
    use mockito::Matcher;
    use serde_json::json;
    use std::fs;

    fn backend(server: &mockito::ServerGuard) -> HttpBackend {
        HttpBackend::new(&format!("{}/api/", server.url()))
    }

    #[test]
    fn it_trims_trailing_slash_from_base_url() {
        let backend = HttpBackend::new("http://localhost:5000/api/");
        assert_eq!(backend.base_url(), "http://localhost:5000/api");
        assert_eq!(
            backend.document_url("a b/c"),
            "http://localhost:5000/api/documents/a%20b%2Fc"
        );
    }

    #[tokio::test]
    async fn it_uploads_as_multipart() -> Result<()> {
        let mut server = mockito::Server::new_async().await;
        let mock_resp = fs::read_to_string("./tests/data/upload_response.json")?;
        let mock = server
            .mock("POST", "/api/documents/upload")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data; boundary=".into()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="file"; filename="report.pdf""#.into()),
                Matcher::Regex("Content-Type: application/pdf".into()),
                Matcher::Regex("quarterly numbers".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(mock_resp)
            .create_async()
            .await;

        let file = UploadFile::from_bytes(
            "report.pdf",
            "application/pdf",
            b"quarterly numbers".to_vec(),
        );
        let doc = backend(&server).upload(&file).await?;

        mock.assert_async().await;
        assert_eq!(doc.id, "doc-123");
        assert_eq!(doc.file_name, "report.pdf");
        assert_eq!(doc.metadata["chunks"], 42);
        Ok(())
    }

    #[tokio::test]
    async fn it_surfaces_upload_error_from_backend() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/documents/upload")
            .with_status(422)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success": false, "error": "Could not extract text from PDF"}"#)
            .create_async()
            .await;

        let file = UploadFile::from_bytes("scan.pdf", "application/pdf", vec![1, 2, 3]);
        let err = backend(&server).upload(&file).await.unwrap_err();
        assert_eq!(err.message, "Could not extract text from PDF");
    }

    #[tokio::test]
    async fn it_uses_generic_upload_message_on_network_failure() {
        // Nothing is listening on this port
        let backend = HttpBackend::new("http://127.0.0.1:9/api");
        let file = UploadFile::from_bytes("notes.txt", "text/plain", b"hi".to_vec());
        let err = backend.upload(&file).await.unwrap_err();
        assert_eq!(err.message, crate::backend::error::UPLOAD_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn it_sends_history_and_parses_sources() -> Result<()> {
        let mut server = mockito::Server::new_async().await;
        let mock_resp = fs::read_to_string("./tests/data/chat_response.json")?;
        let mock = server
            .mock("POST", "/api/chat")
            .match_body(Matcher::Json(json!({
                "message": "What changed?",
                "documentId": "doc-123",
                "messages": [
                    {"role": "user", "content": "Summarize"},
                    {"role": "assistant", "content": "A quarterly report."}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(mock_resp)
            .create_async()
            .await;

        let history = vec![
            Turn::new(Role::User, "Summarize"),
            Turn::new(Role::Assistant, "A quarterly report."),
        ];
        let reply = backend(&server)
            .chat("What changed?", "doc-123", &history)
            .await?;

        mock.assert_async().await;
        assert!(reply.text.starts_with("Revenue grew"));
        assert_eq!(reply.sources[0].id, "chunk-7");
        assert_eq!(reply.sources[0].relevance, Relevance::Score(0.91));
        Ok(())
    }

    #[tokio::test]
    async fn it_returns_status_error_for_failed_chat() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/chat")
            .with_status(500)
            .with_body(r#"{"error": "LLM provider unavailable"}"#)
            .create_async()
            .await;

        let err = backend(&server).chat("Hi", "doc-1", &[]).await.unwrap_err();
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message.as_deref(), Some("LLM provider unavailable"));
            }
            other => panic!("Expected Status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn it_lists_gets_and_deletes_documents() -> Result<()> {
        let mut server = mockito::Server::new_async().await;
        let list_resp = fs::read_to_string("./tests/data/documents_response.json")?;
        let list = server
            .mock("GET", "/api/documents")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(list_resp)
            .create_async()
            .await;
        let get = server
            .mock("GET", "/api/documents/doc-456")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"documentId": "doc-456", "fileName": "handbook.txt"}"#)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/api/documents/doc-456")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success": true, "message": "Document deleted"}"#)
            .create_async()
            .await;

        let backend = backend(&server);
        let docs = backend.list_documents().await?;
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].file_name, "report.pdf");
        assert_eq!(docs[1].id, "doc-456");

        let doc = backend.get_document("doc-456").await?;
        assert_eq!(doc.file_name, "handbook.txt");

        let confirmation = backend.delete_document("doc-456").await?;
        assert_eq!(confirmation["message"], "Document deleted");

        list.assert_async().await;
        get.assert_async().await;
        delete.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn it_reports_missing_document() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/documents/nope")
            .with_status(404)
            .with_body(r#"{"error": "Document not found"}"#)
            .create_async()
            .await;

        let err = backend(&server).get_document("nope").await.unwrap_err();
        assert_eq!(err.backend_message(), Some("Document not found"));
    }
}
