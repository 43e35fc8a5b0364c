//! Fixed user-facing strings.
//!
//! Every string a front-end shows in place of backend content lives here.
//! Callers can override any of them via
//! [`crate::config::ClientConfigBuilder::messages`].

use serde::{Deserialize, Serialize};

/// First assistant message of every new conversation.
pub const DEFAULT_GREETING: &str =
    "Hi! I'm your PDF assistant. Ask me anything about the document you uploaded.";

/// Published as the summary when the request or its stream fails.
pub const DEFAULT_SUMMARY_ERROR: &str =
    "Something went wrong while generating the summary. Please try again.";

/// Published as the assistant reply when the chat request or its stream fails.
pub const DEFAULT_CHAT_ERROR: &str =
    "Sorry, I ran into an error while processing your request. Please try again.";

/// Used when the upload endpoint rejects a file without explaining why.
pub const DEFAULT_UPLOAD_ERROR: &str = "Error processing the PDF";

/// The set of fixed strings a [`crate::session::Session`] publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Messages {
    pub greeting: String,
    pub summary_error: String,
    pub chat_error: String,
    pub upload_error: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            greeting: DEFAULT_GREETING.to_string(),
            summary_error: DEFAULT_SUMMARY_ERROR.to_string(),
            chat_error: DEFAULT_CHAT_ERROR.to_string(),
            upload_error: DEFAULT_UPLOAD_ERROR.to_string(),
        }
    }
}
