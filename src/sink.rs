//! Publication-sink trait for progressive output.
//!
//! The stream assembler hands the *full* accumulated content to a
//! [`PublicationSink`] every time a relevant frame arrives. The sink decides
//! what that means: overwrite a summary cell, update a chat message, redraw a
//! terminal line. The assembler itself never keeps previous values.
//!
//! # Example
//!
//! ```rust
//! use pdf_ai_client::{FnSink, PublicationSink};
//! use std::sync::{Arc, Mutex};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let seen_in_sink = Arc::clone(&seen);
//! let sink = FnSink::new(move |content: &str| {
//!     seen_in_sink.lock().unwrap().push(content.to_string());
//! });
//!
//! sink.publish("Hello");
//! sink.publish("Hello, world");
//! assert_eq!(seen.lock().unwrap().len(), 2);
//! ```

use std::sync::Arc;

/// Receives the current accumulated content after each change.
///
/// Implementations must be `Send + Sync`: several page summaries may stream
/// concurrently and each publishes from its own task.
pub trait PublicationSink: Send + Sync {
    /// Called with the whole accumulated content, never a delta.
    fn publish(&self, content: &str);
}

/// A sink that drops every publication.
///
/// Handy when only the final value returned by the assembler matters.
pub struct NoopSink;

impl PublicationSink for NoopSink {
    fn publish(&self, _content: &str) {}
}

/// Adapts a closure into a [`PublicationSink`].
pub struct FnSink<F>(F);

impl<F> FnSink<F>
where
    F: Fn(&str) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> PublicationSink for FnSink<F>
where
    F: Fn(&str) + Send + Sync,
{
    fn publish(&self, content: &str) {
        (self.0)(content)
    }
}

/// Forwards every publication to two sinks, first `A` then `B`.
pub struct Tee<A, B>(pub A, pub B);

impl<A, B> PublicationSink for Tee<A, B>
where
    A: PublicationSink,
    B: PublicationSink,
{
    fn publish(&self, content: &str) {
        self.0.publish(content);
        self.1.publish(content);
    }
}

impl<S: PublicationSink + ?Sized> PublicationSink for &S {
    fn publish(&self, content: &str) {
        (**self).publish(content)
    }
}

impl<S: PublicationSink + ?Sized> PublicationSink for Arc<S> {
    fn publish(&self, content: &str) {
        (**self).publish(content)
    }
}

/// Convenience alias for a shared, type-erased sink.
pub type SharedSink = Arc<dyn PublicationSink>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct Recording {
        values: Mutex<Vec<String>>,
    }

    impl PublicationSink for Recording {
        fn publish(&self, content: &str) {
            self.values.lock().unwrap().push(content.to_string());
        }
    }

    #[test]
    fn noop_sink_does_not_panic() {
        NoopSink.publish("anything");
    }

    #[test]
    fn fn_sink_forwards_content() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let sink = FnSink::new(move |s: &str| {
            assert_eq!(s, "abc");
            c.fetch_add(1, Ordering::SeqCst);
        });
        sink.publish("abc");
        sink.publish("abc");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn tee_publishes_to_both_in_order() {
        let a = Recording {
            values: Mutex::new(Vec::new()),
        };
        let b = Recording {
            values: Mutex::new(Vec::new()),
        };
        let tee = Tee(&a, &b);
        tee.publish("one");
        tee.publish("one two");
        assert_eq!(*a.values.lock().unwrap(), vec!["one", "one two"]);
        assert_eq!(*b.values.lock().unwrap(), vec!["one", "one two"]);
    }

    #[test]
    fn arc_dyn_sink_works() {
        let sink: SharedSink = Arc::new(NoopSink);
        sink.publish("x");
        Tee(Arc::clone(&sink), NoopSink).publish("y");
    }
}
