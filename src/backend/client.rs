//! Thin async client over the backend's three routes.
//!
//! `BackendClient` only moves bytes: it validates and uploads the file,
//! POSTs summary and chat requests, and hands back a [`Reply`]. Deciding what
//! the user sees on failure is left to [`crate::session::Session`].

use super::reply::Reply;
use super::upload::{upload_file_name, validate_pdf, PDF_MIME};
use crate::config::ClientConfig;
use crate::document::PdfDocument;
use crate::error::PdfAiError;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Body of `POST /summarize`.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRequest<'a> {
    pub text: &'a str,
    pub page: u32,
    pub file_hash: &'a str,
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub question: &'a str,
    pub context: &'a str,
}

/// HTTP client bound to one backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl BackendClient {
    pub fn new(config: ClientConfig) -> Result<Self, PdfAiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(concat!("pdf-ai-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PdfAiError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Upload a local PDF and return the backend's page texts.
    ///
    /// The file travels as multipart field `file`. On a non-success status
    /// the reply's `error` field becomes the
    /// [`PdfAiError::UploadRejected`] message, falling back to the
    /// configured upload error string.
    pub async fn upload(&self, path: &Path) -> Result<PdfDocument, PdfAiError> {
        validate_pdf(path)?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PdfAiError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
        let size = bytes.len();

        let part = Part::bytes(bytes)
            .file_name(upload_file_name(path))
            .mime_str(PDF_MIME)
            .map_err(|e| PdfAiError::InvalidConfig(format!("multipart MIME: {e}")))?;
        let form = Form::new().part("file", part);

        let url = self.config.endpoint("upload");
        debug!("Uploading {} ({} bytes) to {}", path.display(), size, url);

        let response = self
            .http
            .post(&url)
            .timeout(Duration::from_secs(self.config.upload_timeout_secs))
            .multipart(form)
            .send()
            .await
            .map_err(|e| PdfAiError::transport(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            // Body may be empty or not JSON at all.
            let message = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| self.config.messages.upload_error.clone());
            warn!("Upload rejected with HTTP {}: {}", status, message);
            return Err(PdfAiError::UploadRejected { message });
        }

        let mut document =
            response
                .json::<PdfDocument>()
                .await
                .map_err(|e| PdfAiError::InvalidReply {
                    detail: e.to_string(),
                })?;
        document.rewrite_file_url(&self.config.base_url);

        info!(
            "Uploaded {}: {} pages, {} with text",
            path.display(),
            document.page_count(),
            document.pages.len()
        );
        Ok(document)
    }

    /// Request the summary of one page.
    pub async fn summarize(&self, request: &SummaryRequest<'_>) -> Result<Reply, PdfAiError> {
        debug!(
            "Summarizing page {} ({} chars)",
            request.page,
            request.text.len()
        );
        self.post_json("summarize", request).await
    }

    /// Ask a question about the document.
    pub async fn chat(&self, request: &ChatRequest<'_>) -> Result<Reply, PdfAiError> {
        debug!(
            "Asking {:?} with {} chars of context",
            request.question,
            request.context.len()
        );
        self.post_json("chat", request).await
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        route: &str,
        body: &T,
    ) -> Result<Reply, PdfAiError> {
        let url = self.config.endpoint(route);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| PdfAiError::transport(&url, e))?;
        Reply::from_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_request_wire_shape() {
        let req = SummaryRequest {
            text: "page text",
            page: 3,
            file_hash: "unknown",
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"text": "page text", "page": 3, "file_hash": "unknown"})
        );
    }

    #[test]
    fn chat_request_wire_shape() {
        let req = ChatRequest {
            question: "What is this?",
            context: "a\n\nb\n\n",
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"question": "What is this?", "context": "a\n\nb\n\n"})
        );
    }

    #[test]
    fn client_builds_from_default_config() {
        let client = BackendClient::new(ClientConfig::default()).unwrap();
        assert!(client.config().endpoint("upload").ends_with("/upload"));
    }

    #[tokio::test]
    async fn upload_rejects_missing_file_before_network() {
        let config = ClientConfig::builder()
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let client = BackendClient::new(config).unwrap();
        let err = client
            .upload(Path::new("/no/such/file.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, PdfAiError::FileNotFound { .. }));
    }
}
