//! Stream assembler: fold a server-sent-event byte stream into one string.
//!
//! The backend streams summaries and chat replies as blank-line separated
//! frames. Frames that start with `data: ` carry a text fragment; the
//! fragments are concatenated verbatim, and after each one the whole
//! accumulated text is published so the caller can render progressive
//! output.
//!
//! ```text
//! bytes ──► UTF-8 (carry split sequences) ──► split on "\n\n" ──► "data: " ? ──► append ──► publish
//! ```
//!
//! Chunk boundaries carry no meaning: a multi-byte character, the `data: `
//! prefix or the `\n\n` boundary itself may be cut anywhere and the result
//! is the same as if every byte had arrived in one chunk. A frame still
//! unterminated when the stream ends is treated as the final frame.
//!
//! The assembler keeps no state between invocations. Deduplication and
//! "already in flight" checks belong to the caller (see
//! [`crate::state::InFlight`]).

use crate::error::PdfAiError;
use crate::sink::PublicationSink;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::{debug, trace};

/// Prefix marking a frame whose remainder is payload text.
pub const DATA_PREFIX: &str = "data: ";

/// Separator between two frames.
pub const FRAME_BOUNDARY: &str = "\n\n";

/// A boxed stream of accumulated snapshots.
pub type SnapshotStream<'a> = Pin<Box<dyn Stream<Item = Result<String, PdfAiError>> + Send + 'a>>;

// ── UTF-8 carry-over ─────────────────────────────────────────────────────

/// Incremental UTF-8 decoder.
///
/// An incomplete sequence at the end of a chunk is held back and completed by
/// the next chunk. Invalid bytes become U+FFFD.
#[derive(Debug, Default)]
struct Utf8Carry {
    pending: Vec<u8>,
}

impl Utf8Carry {
    fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest: &[u8] = &bytes;
        loop {
            match std::str::from_utf8(rest) {
                Ok(s) => {
                    out.push_str(s);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[bad..];
                        }
                        None => {
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush a sequence the stream never completed.
    fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let tail = std::mem::take(&mut self.pending);
        debug!("Stream ended inside a UTF-8 sequence ({} bytes)", tail.len());
        String::from_utf8_lossy(&tail).into_owned()
    }
}

// ── Frames ───────────────────────────────────────────────────────────────

/// Splits decoded text into frames and yields the payload of each relevant
/// one.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    utf8: Utf8Carry,
    buffer: String,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns the payloads of every frame it completed, in
    /// arrival order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let text = self.utf8.decode(chunk);
        let previous = self.buffer.len();
        self.buffer.push_str(&text);

        // Older text held no boundary; only one straddling the seam can be new.
        let mut scan = previous.saturating_sub(FRAME_BOUNDARY.len() - 1);
        while !self.buffer.is_char_boundary(scan) {
            scan -= 1;
        }

        let mut payloads = Vec::new();
        let mut start = 0;
        while let Some(rel) = self.buffer[scan..].find(FRAME_BOUNDARY) {
            let end = scan + rel;
            push_payload(&self.buffer[start..end], &mut payloads);
            start = end + FRAME_BOUNDARY.len();
            scan = start;
        }
        self.buffer.drain(..start);
        payloads
    }

    /// Signal end-of-stream; returns the payload of the unterminated final
    /// frame, if it is relevant.
    pub fn finish(&mut self) -> Option<String> {
        let text = self.utf8.finish();
        self.buffer.push_str(&text);
        let last = std::mem::take(&mut self.buffer);

        let mut payloads = Vec::with_capacity(1);
        push_payload(&last, &mut payloads);
        payloads.pop()
    }
}

fn push_payload(frame: &str, payloads: &mut Vec<String>) {
    match frame.strip_prefix(DATA_PREFIX) {
        Some(payload) => {
            trace!("data frame: {} bytes", payload.len());
            payloads.push(payload.to_string());
        }
        None if frame.is_empty() => {}
        None => trace!("ignoring non-data frame ({} bytes)", frame.len()),
    }
}

// ── Assembly ─────────────────────────────────────────────────────────────

struct Unfold<S> {
    inner: Pin<Box<S>>,
    decoder: FrameDecoder,
    accumulated: String,
    pending: VecDeque<String>,
    done: bool,
}

/// Turn a byte stream into a stream of accumulated snapshots.
///
/// Each item is the full content after one more relevant frame. A read error
/// is yielded once as [`PdfAiError::StreamRead`] and ends the stream.
pub fn snapshots<'a, S, B, E>(source: S) -> SnapshotStream<'a>
where
    S: Stream<Item = Result<B, E>> + Send + 'a,
    B: AsRef<[u8]> + Send + 'a,
    E: Display + Send + 'a,
{
    let state = Unfold {
        inner: Box::pin(source),
        decoder: FrameDecoder::new(),
        accumulated: String::new(),
        pending: VecDeque::new(),
        done: false,
    };

    let s = stream::unfold(state, |mut st| async move {
        loop {
            if let Some(payload) = st.pending.pop_front() {
                st.accumulated.push_str(&payload);
                let snapshot = st.accumulated.clone();
                return Some((Ok(snapshot), st));
            }
            if st.done {
                return None;
            }
            match st.inner.next().await {
                Some(Ok(chunk)) => {
                    let payloads = st.decoder.push(chunk.as_ref());
                    st.pending.extend(payloads);
                }
                Some(Err(e)) => {
                    st.done = true;
                    return Some((
                        Err(PdfAiError::StreamRead {
                            detail: e.to_string(),
                        }),
                        st,
                    ));
                }
                None => {
                    st.done = true;
                    st.pending.extend(st.decoder.finish());
                }
            }
        }
    });

    Box::pin(s)
}

/// Read `source` to the end, publishing the accumulated content to `sink`
/// after every relevant frame.
///
/// Returns the final content. An empty stream returns `""` without a single
/// publication. On a read error the loop stops and the error is returned;
/// publications already made stand, nothing else is published.
pub async fn assemble<S, B, E>(source: S, sink: &dyn PublicationSink) -> Result<String, PdfAiError>
where
    S: Stream<Item = Result<B, E>> + Send,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
{
    let mut snaps = snapshots(source);
    let mut content = String::new();
    let mut frames = 0usize;

    while let Some(snapshot) = snaps.next().await {
        content = snapshot?;
        frames += 1;
        sink.publish(&content);
    }

    debug!("Stream complete: {} frames, {} bytes", frames, content.len());
    Ok(content)
}
