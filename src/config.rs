//! Configuration for talking to the document-assistant backend.
//!
//! Every client knob lives in [`ClientConfig`], built through
//! [`ClientConfigBuilder`] so callers only set what they care about and
//! validation runs once in [`ClientConfigBuilder::build`].

use crate::error::PdfAiError;
use crate::messages::Messages;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Backend used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://pdf-ai-teal.vercel.app";

/// Configuration for a [`crate::backend::BackendClient`] and the
/// [`crate::session::Session`] built on top of it.
///
/// # Example
/// ```rust
/// use pdf_ai_client::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("http://localhost:8000")
///     .concurrency(2)
///     .build()
///     .unwrap();
/// assert_eq!(config.endpoint("chat"), "http://localhost:8000/chat");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Root URL of the backend, without a trailing slash.
    pub base_url: String,

    /// TCP/TLS connect timeout in seconds. Default: 10.
    ///
    /// Only the connect phase is bounded for summary and chat requests; a
    /// streamed reply may legitimately stay open for a long time.
    pub connect_timeout_secs: u64,

    /// Whole-request timeout for the upload in seconds. Default: 120.
    pub upload_timeout_secs: u64,

    /// `file_hash` sent with summary requests when the upload reply carried
    /// none. Default: `"unknown"`.
    pub file_hash_placeholder: String,

    /// Maximum number of page summaries streamed at once. Default: 4.
    pub concurrency: usize,

    /// Fixed user-facing strings.
    pub messages: Messages,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_secs: 10,
            upload_timeout_secs: 120,
            file_hash_placeholder: "unknown".to_string(),
            concurrency: 4,
            messages: Messages::default(),
        }
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Absolute URL of a backend route, e.g. `endpoint("summarize")`.
    pub fn endpoint(&self, route: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            route.trim_start_matches('/')
        )
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.connect_timeout_secs = secs.max(1);
        self
    }

    pub fn upload_timeout_secs(mut self, secs: u64) -> Self {
        self.config.upload_timeout_secs = secs.max(1);
        self
    }

    pub fn file_hash_placeholder(mut self, hash: impl Into<String>) -> Self {
        self.config.file_hash_placeholder = hash.into();
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn messages(mut self, messages: Messages) -> Self {
        self.config.messages = messages;
        self
    }

    /// Build the configuration, validating the base URL.
    pub fn build(mut self) -> Result<ClientConfig, PdfAiError> {
        let raw = self.config.base_url.trim();
        let url = Url::parse(raw).map_err(|e| {
            PdfAiError::InvalidConfig(format!("base URL '{raw}' is not a valid URL: {e}"))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PdfAiError::InvalidConfig(format!(
                "base URL must use http or https, got '{}'",
                url.scheme()
            )));
        }
        self.config.base_url = raw.trim_end_matches('/').to_string();
        Ok(self.config)
    }
}

// ── Page selection ───────────────────────────────────────────────────────

/// Which pages to summarise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Every page of the document (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(u32),
    /// A contiguous range of pages (1-indexed, inclusive).
    Range(u32, u32),
    /// Specific pages (1-indexed, deduplicated).
    Set(Vec<u32>),
}

impl PageSelection {
    /// Expand into a sorted, deduplicated list of 1-indexed page numbers that
    /// exist in a document of `total_pages` pages.
    pub fn to_pages(&self, total_pages: u32) -> Vec<u32> {
        let in_range = |p: &u32| *p >= 1 && *p <= total_pages;
        let mut pages: Vec<u32> = match self {
            PageSelection::All => (1..=total_pages).collect(),
            PageSelection::Single(p) => Some(*p).filter(in_range).into_iter().collect(),
            PageSelection::Range(start, end) => ((*start).max(1)..=(*end).min(total_pages)).collect(),
            PageSelection::Set(set) => set.iter().copied().filter(in_range).collect(),
        };
        pages.sort_unstable();
        pages.dedup();
        pages
    }
}

impl FromStr for PageSelection {
    type Err = PdfAiError;

    /// Parse `all`, `5`, `3-15` or `1,3,5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let page = |p: &str| -> Result<u32, PdfAiError> {
            let n: u32 = p
                .trim()
                .parse()
                .map_err(|_| PdfAiError::InvalidConfig(format!("invalid page number '{}'", p.trim())))?;
            if n < 1 {
                return Err(PdfAiError::InvalidConfig(
                    "pages are 1-indexed, minimum is 1".into(),
                ));
            }
            Ok(n)
        };

        if s == "all" {
            return Ok(PageSelection::All);
        }

        if let Some((start, end)) = s.split_once('-') {
            let (start, end) = (page(start)?, page(end)?);
            if start > end {
                return Err(PdfAiError::InvalidConfig(format!(
                    "invalid page range '{start}-{end}': start must be <= end"
                )));
            }
            return Ok(PageSelection::Range(start, end));
        }

        if s.contains(',') {
            let pages = s.split(',').map(page).collect::<Result<Vec<_>, _>>()?;
            return Ok(PageSelection::Set(pages));
        }

        Ok(PageSelection::Single(page(&s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_public_backend() {
        let c = ClientConfig::default();
        assert_eq!(c.base_url, DEFAULT_BASE_URL);
        assert_eq!(c.file_hash_placeholder, "unknown");
        assert_eq!(c.concurrency, 4);
    }

    #[test]
    fn build_strips_trailing_slash() {
        let c = ClientConfig::builder()
            .base_url("http://127.0.0.1:9000/")
            .build()
            .unwrap();
        assert_eq!(c.base_url, "http://127.0.0.1:9000");
        assert_eq!(c.endpoint("/upload"), "http://127.0.0.1:9000/upload");
    }

    #[test]
    fn build_rejects_non_http_scheme() {
        let err = ClientConfig::builder()
            .base_url("ftp://example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, PdfAiError::InvalidConfig(_)));
    }

    #[test]
    fn build_rejects_garbage_url() {
        assert!(ClientConfig::builder().base_url("not a url").build().is_err());
    }

    #[test]
    fn concurrency_is_at_least_one() {
        let c = ClientConfig::builder().concurrency(0).build().unwrap();
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn page_selection_to_pages() {
        assert_eq!(PageSelection::All.to_pages(3), vec![1, 2, 3]);
        assert_eq!(PageSelection::Single(2).to_pages(3), vec![2]);
        assert_eq!(PageSelection::Single(7).to_pages(3), Vec::<u32>::new());
        assert_eq!(PageSelection::Range(2, 10).to_pages(4), vec![2, 3, 4]);
        assert_eq!(PageSelection::Set(vec![3, 1, 3, 9]).to_pages(5), vec![1, 3]);
    }

    #[test]
    fn page_selection_parse() {
        assert_eq!("all".parse::<PageSelection>().unwrap(), PageSelection::All);
        assert_eq!("4".parse::<PageSelection>().unwrap(), PageSelection::Single(4));
        assert_eq!(
            " 2-5 ".parse::<PageSelection>().unwrap(),
            PageSelection::Range(2, 5)
        );
        assert_eq!(
            "1,3, 5".parse::<PageSelection>().unwrap(),
            PageSelection::Set(vec![1, 3, 5])
        );
    }

    #[test]
    fn page_selection_parse_errors() {
        assert!("0".parse::<PageSelection>().is_err());
        assert!("5-2".parse::<PageSelection>().is_err());
        assert!("one".parse::<PageSelection>().is_err());
        assert!("1,x".parse::<PageSelection>().is_err());
    }
}
