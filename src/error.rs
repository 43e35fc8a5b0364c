//! Error types for the pdf-ai-client library.
//!
//! Every failure the library can hit is a variant of [`PdfAiError`]. Callers
//! of the low-level API ([`crate::backend`], [`crate::stream`]) receive them
//! as `Err(..)`. The [`crate::session::Session`] layer instead logs them and
//! turns them into a fixed user-facing string published as the final content
//! of the summary or reply.
//!
//! Three variants map onto the three runtime failure classes of a reply:
//!
//! * [`PdfAiError::HttpStatus`]: the backend answered with a non-success
//!   status; the stream was never opened.
//! * [`PdfAiError::StreamRead`]: the body failed while it was being read.
//! * [`PdfAiError::BackendReported`]: a JSON reply carried an `error` field.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf-ai-client library.
#[derive(Debug, Error)]
pub enum PdfAiError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Transport errors ──────────────────────────────────────────────────
    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("Request to '{url}' failed: {reason}\nCheck your internet connection and --base-url.")]
    Transport { url: String, reason: String },

    /// The backend answered with a non-success HTTP status.
    #[error("Backend returned HTTP {status} for '{url}'")]
    HttpStatus { url: String, status: u16 },

    /// The upload endpoint refused the document.
    #[error("Upload rejected: {message}")]
    UploadRejected { message: String },

    /// Reading the reply body failed part-way through.
    #[error("Reading the reply stream failed: {detail}")]
    StreamRead { detail: String },

    // ── Reply errors ──────────────────────────────────────────────────────
    /// The backend reported a logical error in a JSON reply.
    #[error("{message}")]
    BackendReported { message: String },

    /// The reply body could not be parsed as the expected JSON document.
    #[error("Invalid reply from backend: {detail}")]
    InvalidReply { detail: String },

    /// The JSON reply did not carry the expected field.
    #[error("Reply is missing the '{field}' field")]
    MissingField { field: String },

    // ── Document errors ───────────────────────────────────────────────────
    /// The requested page has no text in the uploaded document.
    #[error("Page {page} does not exist (document has {total} pages)")]
    PageNotFound { page: u32, total: u32 },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not read the local file selected for upload.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PdfAiError {
    /// Map a reqwest error raised while sending a request.
    pub(crate) fn transport(url: &str, err: reqwest::Error) -> Self {
        PdfAiError::Transport {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}
