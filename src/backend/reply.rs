//! Content-type negotiation between streamed and single-document replies.
//!
//! The summary and chat endpoints may answer either way:
//!
//! * `Content-Type: text/event-stream`: the body is fed to the
//!   [`crate::stream`] assembler and published frame by frame.
//! * anything else: the body is one JSON object; its designated field
//!   (`summary` or `response`) becomes the whole content in a single
//!   publication, and an `error` field is reported as
//!   [`PdfAiError::BackendReported`].

use crate::error::PdfAiError;
use crate::sink::PublicationSink;
use crate::stream;
use reqwest::header::CONTENT_TYPE;
use reqwest::Response;
use serde_json::Value;
use tracing::{debug, warn};

/// Media type of a streamed reply.
pub const EVENT_STREAM: &str = "text/event-stream";

/// A successful backend response, classified by content type.
#[derive(Debug)]
pub enum Reply {
    /// Body still unread; frames arrive as it is polled.
    Streaming(Response),
    /// Body already parsed as JSON.
    Document(Value),
}

impl Reply {
    /// Check the status and classify `response`.
    ///
    /// A non-success status is returned as [`PdfAiError::HttpStatus`] and the
    /// body is never read.
    pub async fn from_response(response: Response) -> Result<Self, PdfAiError> {
        let url = response.url().to_string();
        let status = response.status();
        if !status.is_success() {
            warn!("{} answered HTTP {}", url, status);
            return Err(PdfAiError::HttpStatus {
                url,
                status: status.as_u16(),
            });
        }

        if is_event_stream(&response) {
            debug!("{} is streaming", url);
            return Ok(Reply::Streaming(response));
        }

        let doc = response
            .json::<Value>()
            .await
            .map_err(|e| PdfAiError::InvalidReply {
                detail: e.to_string(),
            })?;
        Ok(Reply::Document(doc))
    }

    /// Turn the reply into its final content, publishing along the way.
    ///
    /// Streamed replies publish after every relevant frame; JSON replies
    /// publish `field` exactly once. Errors publish nothing; the caller
    /// decides what to show instead.
    pub async fn into_content(
        self,
        field: &str,
        sink: &dyn PublicationSink,
    ) -> Result<String, PdfAiError> {
        match self {
            Reply::Streaming(response) => stream::assemble(response.bytes_stream(), sink).await,
            Reply::Document(doc) => {
                let content = extract_field(&doc, field)?;
                sink.publish(&content);
                Ok(content)
            }
        }
    }
}

fn is_event_stream(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains(EVENT_STREAM))
}

/// Pull `field` out of a JSON reply.
///
/// A string is taken as is and any other non-null value as its JSON text.
/// Without the field, an `error` entry becomes
/// [`PdfAiError::BackendReported`]; otherwise the field is reported missing.
pub fn extract_field(doc: &Value, field: &str) -> Result<String, PdfAiError> {
    match doc.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) if !other.is_null() => Ok(other.to_string()),
        _ => match doc.get("error") {
            Some(Value::String(message)) => Err(PdfAiError::BackendReported {
                message: message.clone(),
            }),
            Some(other) if !other.is_null() => Err(PdfAiError::BackendReported {
                message: other.to_string(),
            }),
            _ => Err(PdfAiError::MissingField {
                field: field.to_string(),
            }),
        },
    }
}
