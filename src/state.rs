//! View state owned by a session: summaries, chat, page cursor, in-flight set.
//!
//! Each container is an explicit handle passed to whoever reads or updates
//! it. Updates are copy-on-write: [`StateCell::update`] clones the current
//! value, mutates the copy and swaps it in, so a [`StateCell::snapshot`] taken
//! earlier never changes under the reader.

use crate::sink::PublicationSink;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── StateCell ────────────────────────────────────────────────────────────

/// A shared cell holding an immutable value that is replaced on update.
#[derive(Debug, Default)]
pub struct StateCell<T> {
    inner: Arc<Mutex<Arc<T>>>,
}

impl<T> Clone for StateCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone> StateCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Arc::new(value))),
        }
    }

    /// The current value. Later updates do not affect it.
    pub fn snapshot(&self) -> Arc<T> {
        Arc::clone(&lock(&self.inner))
    }

    /// Copy the current value, apply `f` to the copy and store it.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = lock(&self.inner);
        let mut next = (**guard).clone();
        let out = f(&mut next);
        *guard = Arc::new(next);
        out
    }

    /// Replace the value outright.
    pub fn set(&self, value: T) {
        *lock(&self.inner) = Arc::new(value);
    }
}

// ── Summaries ────────────────────────────────────────────────────────────

/// Page number → summary text.
#[derive(Debug, Clone, Default)]
pub struct SummaryStore {
    cell: StateCell<BTreeMap<u32, String>>,
}

impl SummaryStore {
    pub fn new() -> Self {
        Self {
            cell: StateCell::new(BTreeMap::new()),
        }
    }

    pub fn get(&self, page: u32) -> Option<String> {
        self.cell.snapshot().get(&page).cloned()
    }

    /// True when the page already has non-empty summary text.
    pub fn has_summary(&self, page: u32) -> bool {
        self.cell
            .snapshot()
            .get(&page)
            .is_some_and(|s| !s.is_empty())
    }

    pub fn insert(&self, page: u32, content: impl Into<String>) {
        let content = content.into();
        self.cell.update(|m| {
            m.insert(page, content);
        });
    }

    pub fn clear(&self) {
        self.cell.set(BTreeMap::new());
    }

    pub fn snapshot(&self) -> Arc<BTreeMap<u32, String>> {
        self.cell.snapshot()
    }

    /// A sink that writes every publication into this store under `page`.
    pub fn sink(&self, page: u32) -> SummarySink {
        SummarySink {
            store: self.clone(),
            page,
        }
    }
}

/// Publishes into one page's slot of a [`SummaryStore`].
pub struct SummarySink {
    store: SummaryStore,
    page: u32,
}

impl PublicationSink for SummarySink {
    fn publish(&self, content: &str) {
        self.store.insert(self.page, content);
    }
}

// ── Conversation ─────────────────────────────────────────────────────────

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: u64,
    pub role: Role,
    pub content: String,
}

/// Ordered chat transcript.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    cell: StateCell<Vec<ChatMessage>>,
}

impl Conversation {
    /// A conversation opened by an assistant greeting (id 1).
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        let conversation = Self {
            cell: StateCell::new(Vec::new()),
        };
        conversation.reset(greeting);
        conversation
    }

    /// Drop every message and start over with `greeting`.
    pub fn reset(&self, greeting: impl Into<String>) {
        self.cell.set(vec![ChatMessage {
            id: 1,
            role: Role::Assistant,
            content: greeting.into(),
        }]);
    }

    /// Append a message; its id is the transcript length after insertion.
    pub fn push(&self, role: Role, content: impl Into<String>) -> u64 {
        let content = content.into();
        self.cell.update(|msgs| {
            let id = msgs.len() as u64 + 1;
            msgs.push(ChatMessage { id, role, content });
            id
        })
    }

    /// Overwrite the content of message `id`. Returns false if it is unknown.
    pub fn set_content(&self, id: u64, content: &str) -> bool {
        self.cell.update(|msgs| match msgs.iter_mut().find(|m| m.id == id) {
            Some(m) => {
                m.content.clear();
                m.content.push_str(content);
                true
            }
            None => false,
        })
    }

    pub fn get(&self, id: u64) -> Option<ChatMessage> {
        self.cell.snapshot().iter().find(|m| m.id == id).cloned()
    }

    pub fn messages(&self) -> Arc<Vec<ChatMessage>> {
        self.cell.snapshot()
    }

    pub fn len(&self) -> usize {
        self.cell.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A sink that writes every publication into message `id`.
    pub fn sink(&self, id: u64) -> MessageSink {
        MessageSink {
            conversation: self.clone(),
            id,
        }
    }
}

/// Publishes into one message of a [`Conversation`].
pub struct MessageSink {
    conversation: Conversation,
    id: u64,
}

impl PublicationSink for MessageSink {
    fn publish(&self, content: &str) {
        if !self.conversation.set_content(self.id, content) {
            debug!("Message {} vanished before publication", self.id);
        }
    }
}

// ── Page cursor ──────────────────────────────────────────────────────────

/// Current page of a document, always within `1..=total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    current: u32,
    total: u32,
}

impl PageCursor {
    /// Start on page 1. A document without pages still reports page 1.
    pub fn new(total: u32) -> Self {
        Self {
            current: 1,
            total: total.max(1),
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Move forward one page; stays on the last page.
    pub fn next(&mut self) -> u32 {
        if self.current < self.total {
            self.current += 1;
        }
        self.current
    }

    /// Move back one page; stays on page 1.
    pub fn prev(&mut self) -> u32 {
        if self.current > 1 {
            self.current -= 1;
        }
        self.current
    }

    /// Jump to `page` if it exists. Returns false and stays put otherwise.
    pub fn goto(&mut self, page: u32) -> bool {
        if (1..=self.total).contains(&page) {
            self.current = page;
            true
        } else {
            false
        }
    }
}

// ── In-flight guard ──────────────────────────────────────────────────────

/// Keys with a request currently in flight.
///
/// [`InFlight::try_acquire`] hands out at most one [`InFlightGuard`] per key;
/// dropping the guard (request finished, failed or abandoned) frees the key.
#[derive(Debug)]
pub struct InFlight<K: Eq + Hash> {
    keys: Arc<Mutex<HashSet<K>>>,
}

impl<K: Eq + Hash> Default for InFlight<K> {
    fn default() -> Self {
        Self {
            keys: Arc::new(Mutex::new(HashSet::new())),
        }
    }
}

impl<K: Eq + Hash> Clone for InFlight<K> {
    fn clone(&self) -> Self {
        Self {
            keys: Arc::clone(&self.keys),
        }
    }
}

impl<K: Eq + Hash + Clone> InFlight<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`, or `None` if it is already in flight.
    pub fn try_acquire(&self, key: K) -> Option<InFlightGuard<K>> {
        if lock(&self.keys).insert(key.clone()) {
            Some(InFlightGuard {
                keys: Arc::clone(&self.keys),
                key,
            })
        } else {
            None
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        lock(&self.keys).contains(key)
    }

    pub fn len(&self) -> usize {
        lock(&self.keys).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Releases its key when dropped.
#[derive(Debug)]
pub struct InFlightGuard<K: Eq + Hash> {
    keys: Arc<Mutex<HashSet<K>>>,
    key: K,
}

impl<K: Eq + Hash> Drop for InFlightGuard<K> {
    fn drop(&mut self) {
        lock(&self.keys).remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_unaffected_by_later_updates() {
        let cell = StateCell::new(vec![1, 2]);
        let before = cell.snapshot();
        cell.update(|v| v.push(3));
        assert_eq!(*before, vec![1, 2]);
        assert_eq!(*cell.snapshot(), vec![1, 2, 3]);
    }

    #[test]
    fn cloned_cells_share_state() {
        let a = StateCell::new(0u32);
        let b = a.clone();
        b.set(7);
        assert_eq!(*a.snapshot(), 7);
    }

    #[test]
    fn summary_store_empty_text_is_not_a_summary() {
        let store = SummaryStore::new();
        store.insert(2, "");
        assert!(!store.has_summary(2));
        store.insert(2, "short");
        assert!(store.has_summary(2));
        assert_eq!(store.get(2).as_deref(), Some("short"));
        assert_eq!(store.get(3), None);
    }

    #[test]
    fn summary_sink_overwrites_page_slot() {
        let store = SummaryStore::new();
        let sink = store.sink(4);
        sink.publish("Hel");
        sink.publish("Hello");
        assert_eq!(store.get(4).as_deref(), Some("Hello"));
        assert_eq!(store.snapshot().len(), 1);
        store.clear();
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn conversation_ids_follow_length() {
        let chat = Conversation::with_greeting("hi");
        assert_eq!(chat.len(), 1);
        assert_eq!(chat.messages()[0].role, Role::Assistant);
        let q = chat.push(Role::User, "what is this?");
        let a = chat.push(Role::Assistant, "");
        assert_eq!((q, a), (2, 3));
    }

    #[test]
    fn message_sink_updates_in_place() {
        let chat = Conversation::with_greeting("hi");
        let id = chat.push(Role::Assistant, "");
        let sink = chat.sink(id);
        sink.publish("A");
        sink.publish("An answer");
        assert_eq!(chat.len(), 2);
        assert_eq!(chat.get(id).unwrap().content, "An answer");
    }

    #[test]
    fn set_content_unknown_id() {
        let chat = Conversation::with_greeting("hi");
        assert!(!chat.set_content(42, "x"));
    }

    #[test]
    fn reset_restores_single_greeting() {
        let chat = Conversation::with_greeting("hi");
        chat.push(Role::User, "q");
        chat.reset("hello again");
        let msgs = chat.messages();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].content, "hello again");
        assert_eq!(msgs[0].id, 1);
    }

    #[test]
    fn role_serialises_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
    }

    #[test]
    fn page_cursor_clamps() {
        let mut c = PageCursor::new(3);
        assert_eq!(c.prev(), 1);
        assert_eq!(c.next(), 2);
        assert_eq!(c.next(), 3);
        assert_eq!(c.next(), 3);
        assert!(!c.goto(0));
        assert!(!c.goto(4));
        assert!(c.goto(2));
        assert_eq!(c.current(), 2);
    }

    #[test]
    fn page_cursor_empty_document() {
        let mut c = PageCursor::new(0);
        assert_eq!(c.total(), 1);
        assert_eq!(c.next(), 1);
    }

    #[test]
    fn in_flight_is_exclusive_until_dropped() {
        let flights: InFlight<u32> = InFlight::new();
        let guard = flights.try_acquire(1).expect("first acquire");
        assert!(flights.try_acquire(1).is_none());
        assert!(flights.try_acquire(2).is_some());
        assert!(flights.contains(&1));
        drop(guard);
        assert!(!flights.contains(&1));
        assert!(flights.try_acquire(1).is_some());
    }

    #[test]
    fn in_flight_clones_share_keys() {
        let a: InFlight<&'static str> = InFlight::new();
        let b = a.clone();
        let _g = a.try_acquire("chat").unwrap();
        assert!(b.try_acquire("chat").is_none());
        assert_eq!(b.len(), 1);
    }
}
