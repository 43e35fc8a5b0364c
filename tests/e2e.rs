//! End-to-end tests against a live backend.
//!
//! These tests upload a real PDF and stream real model output, so they are
//! gated behind the `E2E_ENABLED` environment variable and do not run in CI
//! unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture
//!
//! Optional:
//!   PDFAI_BASE_URL   backend to hit (default: the public deployment)
//!   E2E_PDF          PDF to upload instead of the generated one-page file

use pdf_ai_client::{
    BackendClient, ChatOutcome, ClientConfig, FnSink, NoopSink, Session, SummaryOutcome,
    DEFAULT_BASE_URL,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless E2E_ENABLED is set.
macro_rules! e2e_skip_unless_enabled {
    () => {
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    };
}

/// One page with a sentence of text, small enough to type by hand.
const ONE_PAGE_PDF: &str = "%PDF-1.4
1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj
2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj
3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj
4 0 obj << /Length 88 >> stream
BT /F1 18 Tf 72 720 Td (Rust ownership rules prevent data races at compile time.) Tj ET
endstream endobj
5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj
trailer << /Root 1 0 R >>
%%EOF
";

fn client() -> BackendClient {
    let base = std::env::var("PDFAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let config = ClientConfig::builder().base_url(base).build().unwrap();
    BackendClient::new(config).unwrap()
}

/// The PDF under test, plus the temp file keeping it alive when generated.
fn pdf() -> (PathBuf, Option<tempfile::NamedTempFile>) {
    if let Ok(path) = std::env::var("E2E_PDF") {
        return (PathBuf::from(path), None);
    }
    let mut f = tempfile::Builder::new()
        .suffix(".pdf")
        .tempfile()
        .unwrap();
    f.write_all(ONE_PAGE_PDF.as_bytes()).unwrap();
    (f.path().to_path_buf(), Some(f))
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_live_upload_summary_and_chat() {
    e2e_skip_unless_enabled!();
    let (path, _keep) = pdf();

    let session = Session::upload(client(), &path).await.unwrap();
    let doc = session.document();
    println!("pages: {}  file_url: {:?}", doc.page_count(), doc.file_url);
    assert!(doc.page_count() >= 1);

    let publications = AtomicUsize::new(0);
    let counter = FnSink::new(|_: &str| {
        publications.fetch_add(1, Ordering::SeqCst);
    });
    let outcome = session.generate_summary(1, &counter).await.unwrap();
    println!("summary: {outcome:?}");
    match outcome {
        SummaryOutcome::Generated { content, .. } => assert!(!content.trim().is_empty()),
        other => panic!("expected a generated summary, got {other:?}"),
    }
    assert!(publications.load(Ordering::SeqCst) >= 1);

    let answer = session.ask("What is this document about?", &NoopSink).await;
    println!("answer: {answer:?}");
    assert!(matches!(answer, ChatOutcome::Answered { .. }));
    assert_eq!(session.conversation().len(), 3);
}

#[tokio::test]
async fn test_live_upload_of_missing_file_fails_locally() {
    e2e_skip_unless_enabled!();
    let err = Session::upload(client(), std::path::Path::new("/no/such/file.pdf"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not found"));
}
