//! HTTP plumbing for the document-assistant backend.
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`upload`] | validate the local file before it leaves the machine |
//! | [`client`] | POST `upload`, `summarize` and `chat` |
//! | [`reply`]  | classify a response as streamed or JSON and turn it into content |

pub mod client;
pub mod reply;
pub mod upload;

pub use client::{BackendClient, ChatRequest, SummaryRequest};
pub use reply::Reply;
