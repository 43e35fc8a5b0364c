//! # pdf-ai-client
//!
//! Client for a PDF assistant backend: upload a document, stream per-page
//! summaries and ask questions about it.
//!
//! ## Why this crate?
//!
//! The backend answers summary and chat requests either with a single JSON
//! object or with a server-sent-event style stream of `data: ` frames. This
//! crate hides the difference: every reply is turned into a sequence of
//! *publications*, each the full content so far, delivered to a
//! [`PublicationSink`]. A terminal, a TUI or a test all consume the same
//! thing.
//!
//! ## Flow
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Upload     validate locally, multipart POST /upload → page texts
//!  ├─ 2. Request    POST /summarize {text,page,file_hash} or /chat {question,context}
//!  ├─ 3. Negotiate  text/event-stream → assembler, anything else → JSON field
//!  ├─ 4. Assemble   bytes → UTF-8 → frames → `data: ` payloads → accumulator
//!  └─ 5. Publish    accumulator → summary store / chat message / observer
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_ai_client::{BackendClient, ClientConfig, FnSink, Session};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BackendClient::new(ClientConfig::default())?;
//!     let session = Session::upload(client, Path::new("report.pdf")).await?;
//!
//!     let printer = FnSink::new(|content: &str| eprintln!("{} chars so far", content.len()));
//!     session.generate_summary(1, &printer).await?;
//!     println!("{}", session.summaries().get(1).unwrap_or_default());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfai` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf-ai-client = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod document;
pub mod error;
pub mod messages;
pub mod session;
pub mod sink;
pub mod state;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{BackendClient, ChatRequest, Reply, SummaryRequest};
pub use config::{ClientConfig, ClientConfigBuilder, PageSelection, DEFAULT_BASE_URL};
pub use document::PdfDocument;
pub use error::PdfAiError;
pub use messages::Messages;
pub use session::{ChatOutcome, Session, SessionReport, SummaryOutcome, Target};
pub use sink::{FnSink, NoopSink, PublicationSink, SharedSink, Tee};
pub use state::{ChatMessage, Conversation, InFlight, PageCursor, Role, StateCell, SummaryStore};
pub use stream::{assemble, snapshots, FrameDecoder};
