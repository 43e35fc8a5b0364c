//! The uploaded document as described by the backend.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reply of the upload endpoint: extracted page text plus where the backend
/// keeps the file.
///
/// Page keys arrive as JSON strings (`"1"`, `"2"`, …) and are parsed into
/// 1-indexed numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfDocument {
    /// URL the PDF can be fetched from for rendering.
    #[serde(default)]
    pub file_url: Option<String>,

    /// Page count reported by the backend.
    #[serde(default)]
    pub total_pages: Option<u32>,

    /// Extracted text per page.
    #[serde(default)]
    pub pages: BTreeMap<u32, String>,

    /// Content hash, when the backend provides one.
    #[serde(default)]
    pub file_hash: Option<String>,
}

impl PdfDocument {
    /// Number of pages: the reported total, else the highest page with text.
    pub fn page_count(&self) -> u32 {
        self.total_pages
            .unwrap_or_else(|| self.pages.keys().next_back().copied().unwrap_or(0))
    }

    pub fn page_text(&self, page: u32) -> Option<&str> {
        self.pages.get(&page).map(String::as_str)
    }

    /// Context sent with chat questions: every non-empty page from 1 to
    /// [`page_count`](Self::page_count), each followed by a blank line.
    pub fn full_text(&self) -> String {
        let mut text = String::new();
        for page in 1..=self.page_count() {
            if let Some(t) = self.page_text(page).filter(|t| !t.is_empty()) {
                text.push_str(t);
                text.push_str("\n\n");
            }
        }
        text
    }

    /// The backend hash, or `placeholder` when it sent none.
    pub fn file_hash_or<'a>(&'a self, placeholder: &'a str) -> &'a str {
        self.file_hash.as_deref().unwrap_or(placeholder)
    }

    /// Point `file_url` at the backend's temporary-PDF route.
    ///
    /// Files served from `{base}/files/` are only reachable through
    /// `{base}/api/temp-pdf/`. Other URLs are left alone.
    pub fn rewrite_file_url(&mut self, base_url: &str) {
        let base = base_url.trim_end_matches('/');
        let from = format!("{base}/files/");
        if let Some(url) = self.file_url.as_mut() {
            if let Some(rest) = url.strip_prefix(&from) {
                *url = format!("{base}/api/temp-pdf/{rest}");
            }
        }
    }
}
