//! One uploaded document and everything the user has asked about it.
//!
//! [`Session`] wires the pieces together: the [`BackendClient`] produces a
//! [`Reply`](crate::backend::Reply), the reply publishes into a sink built
//! from the [`SummaryStore`] or [`Conversation`], and an [`InFlight`] guard
//! keeps duplicate requests off the wire.
//!
//! Failures after the request was attempted never surface as `Err`: they are
//! logged and the fixed user-facing string from
//! [`Messages`](crate::messages::Messages) is published as the final content,
//! exactly like a successful reply would be. A backend-reported `error` field
//! is published as is.

use crate::backend::{BackendClient, ChatRequest, SummaryRequest};
use crate::config::PageSelection;
use crate::document::PdfDocument;
use crate::error::PdfAiError;
use crate::sink::{FnSink, PublicationSink, Tee};
use crate::state::{ChatMessage, Conversation, InFlight, PageCursor, Role, SummaryStore};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, error, info};

/// Field carrying the content of a JSON summary reply.
pub const SUMMARY_FIELD: &str = "summary";

/// Field carrying the content of a JSON chat reply.
pub const CHAT_FIELD: &str = "response";

/// What a request is for; at most one request per target is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    PageSummary(u32),
    Conversation,
}

/// Result of [`Session::generate_summary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SummaryOutcome {
    /// The backend answered; `content` is the final summary.
    Generated { page: u32, content: String },
    /// The request failed; `content` is what was published instead.
    Failed {
        page: u32,
        content: String,
        error: String,
    },
    /// A non-empty summary was already stored; nothing was sent.
    AlreadyAvailable { page: u32 },
    /// Another request for this page is still running; nothing was sent.
    InProgress { page: u32 },
}

impl SummaryOutcome {
    pub fn page(&self) -> u32 {
        match self {
            SummaryOutcome::Generated { page, .. }
            | SummaryOutcome::Failed { page, .. }
            | SummaryOutcome::AlreadyAvailable { page }
            | SummaryOutcome::InProgress { page } => *page,
        }
    }
}

/// Result of [`Session::ask`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChatOutcome {
    /// Assistant message `id` holds the final reply.
    Answered { id: u64, content: String },
    /// Assistant message `id` holds the fixed apology or backend message.
    Failed {
        id: u64,
        content: String,
        error: String,
    },
    /// The question was blank; the conversation is unchanged.
    Ignored,
    /// A reply is still streaming; the conversation is unchanged.
    Busy,
}

/// Serializable view of a session, printed by `pdfai --json`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub file_url: Option<String>,
    pub total_pages: u32,
    pub summaries: BTreeMap<u32, String>,
    pub messages: Vec<ChatMessage>,
}

/// A document loaded from the backend plus its view state.
#[derive(Debug)]
pub struct Session {
    client: BackendClient,
    document: PdfDocument,
    summaries: SummaryStore,
    conversation: Conversation,
    in_flight: InFlight<Target>,
    cursor: PageCursor,
}

impl Session {
    /// Start a session over an already uploaded document.
    pub fn new(client: BackendClient, document: PdfDocument) -> Self {
        let greeting = client.config().messages.greeting.clone();
        let cursor = PageCursor::new(document.page_count());
        Self {
            client,
            document,
            summaries: SummaryStore::new(),
            conversation: Conversation::with_greeting(greeting),
            in_flight: InFlight::new(),
            cursor,
        }
    }

    /// Upload `path` and start a session over the result.
    pub async fn upload(client: BackendClient, path: &Path) -> Result<Self, PdfAiError> {
        let document = client.upload(path).await?;
        Ok(Self::new(client, document))
    }

    /// Upload another file into this session, discarding all view state.
    ///
    /// On failure the current document and its state are kept.
    pub async fn reupload(&mut self, path: &Path) -> Result<(), PdfAiError> {
        let document = self.client.upload(path).await?;
        self.load_document(document);
        Ok(())
    }

    /// Replace the document: summaries are cleared, the conversation goes
    /// back to the greeting and the cursor to page 1.
    pub fn load_document(&mut self, document: PdfDocument) {
        self.cursor = PageCursor::new(document.page_count());
        self.document = document;
        self.summaries.clear();
        self.conversation
            .reset(self.client.config().messages.greeting.clone());
        debug!("Session reset for {} pages", self.document.page_count());
    }

    pub fn document(&self) -> &PdfDocument {
        &self.document
    }

    pub fn summaries(&self) -> &SummaryStore {
        &self.summaries
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut PageCursor {
        &mut self.cursor
    }

    pub fn in_flight(&self) -> &InFlight<Target> {
        &self.in_flight
    }

    /// Summarize `page`, publishing into the summary store and `observer`.
    ///
    /// Returns `Err` only when the document has no such page. Nothing is sent
    /// when a non-empty summary already exists or the page is in flight.
    pub async fn generate_summary(
        &self,
        page: u32,
        observer: &dyn PublicationSink,
    ) -> Result<SummaryOutcome, PdfAiError> {
        let text = self
            .document
            .page_text(page)
            .ok_or_else(|| PdfAiError::PageNotFound {
                page,
                total: self.document.page_count(),
            })?;

        // A streaming page already has partial text in the store, so the
        // in-flight check must come first.
        let Some(_guard) = self.in_flight.try_acquire(Target::PageSummary(page)) else {
            debug!("Page {} summary already in flight", page);
            return Ok(SummaryOutcome::InProgress { page });
        };
        if self.summaries.has_summary(page) {
            debug!("Page {} already summarized", page);
            return Ok(SummaryOutcome::AlreadyAvailable { page });
        }

        let config = self.client.config();
        let request = SummaryRequest {
            text,
            page,
            file_hash: self.document.file_hash_or(&config.file_hash_placeholder),
        };
        let sink = Tee(self.summaries.sink(page), observer);

        info!("Requesting summary of page {}", page);
        let result = match self.client.summarize(&request).await {
            Ok(reply) => reply.into_content(SUMMARY_FIELD, &sink).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(content) => {
                info!("Page {} summary complete ({} chars)", page, content.len());
                Ok(SummaryOutcome::Generated { page, content })
            }
            Err(e) => {
                error!("Summary of page {} failed: {}", page, e);
                let content = user_facing(&e, &config.messages.summary_error);
                sink.publish(&content);
                Ok(SummaryOutcome::Failed {
                    page,
                    content,
                    error: e.to_string(),
                })
            }
        }
    }

    /// Ask `question` about the whole document.
    ///
    /// The question and an empty assistant message are appended first; every
    /// publication then overwrites that assistant message. On failure its
    /// content is replaced by the fixed apology.
    pub async fn ask(&self, question: &str, observer: &dyn PublicationSink) -> ChatOutcome {
        if question.trim().is_empty() {
            return ChatOutcome::Ignored;
        }
        let Some(_guard) = self.in_flight.try_acquire(Target::Conversation) else {
            debug!("Chat reply still streaming, question dropped");
            return ChatOutcome::Busy;
        };

        self.conversation.push(Role::User, question);
        let id = self.conversation.push(Role::Assistant, "");
        let sink = Tee(self.conversation.sink(id), observer);

        let context = self.document.full_text();
        let request = ChatRequest {
            question,
            context: &context,
        };

        info!("Asking question ({} chars of context)", context.len());
        let result = match self.client.chat(&request).await {
            Ok(reply) => reply.into_content(CHAT_FIELD, &sink).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(content) => ChatOutcome::Answered { id, content },
            Err(e) => {
                error!("Chat request failed: {}", e);
                let content = user_facing(&e, &self.client.config().messages.chat_error);
                sink.publish(&content);
                ChatOutcome::Failed {
                    id,
                    content,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Summarize every page in `selection`, at most
    /// [`ClientConfig::concurrency`](crate::config::ClientConfig::concurrency)
    /// at a time.
    ///
    /// `observer` receives each page's publications tagged with its page
    /// number. Results come back sorted by page.
    pub async fn summarize_pages(
        &self,
        selection: &PageSelection,
        observer: &(dyn Fn(u32, &str) + Send + Sync),
    ) -> Vec<(u32, Result<SummaryOutcome, PdfAiError>)> {
        let concurrency = self.client.config().concurrency.max(1);
        let pages = selection.to_pages(self.document.page_count());
        debug!("Summarizing {} pages, concurrency {}", pages.len(), concurrency);

        let mut results: Vec<_> = stream::iter(pages.into_iter().map(|page| async move {
            let sink = FnSink::new(move |content: &str| observer(page, content));
            (page, self.generate_summary(page, &sink).await)
        }))
        .buffer_unordered(concurrency)
        .collect()
        .await;

        results.sort_by_key(|(page, _)| *page);
        results
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            file_url: self.document.file_url.clone(),
            total_pages: self.document.page_count(),
            summaries: (*self.summaries.snapshot()).clone(),
            messages: (*self.conversation.messages()).clone(),
        }
    }
}

/// Text shown in place of a failed reply.
fn user_facing(err: &PdfAiError, fallback: &str) -> String {
    match err {
        PdfAiError::BackendReported { message } => message.clone(),
        _ => fallback.to_string(),
    }
}
