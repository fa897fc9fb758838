//! # Key Registry
//!
//! Defines the publishing side of the bus: one live stream per data key,
//! created lazily the first time the key is seen, plus a stream announcing
//! every newly created key.

use crate::subscriber::EventStream;
use crate::NEW_KEYS_STREAM;
use parking_lot::RwLock;
use shared_types::NormalizedRecord;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Live stream of records for one key.
pub type KeyStream = EventStream<NormalizedRecord>;

/// Registry of per-key streams.
///
/// This is the interface the subscription engine consumes; it only ever
/// reads from it.
pub trait KeyRegistry: Send + Sync {
    /// Stream of records for `key`, created (and announced) if it is new.
    fn stream(&self, key: &str) -> KeyStream;

    /// Every key that currently has a stream.
    fn known_keys(&self) -> Vec<String>;

    /// Stream of key names, emitted once when each key is created.
    fn new_keys(&self) -> EventStream<String>;
}

/// In-memory implementation of the key registry.
///
/// A newly created key is announced before its first record is emitted, so
/// a subscriber that attaches during the announcement also sees that record.
pub struct InMemoryKeyRegistry {
    /// Stream per key.
    streams: RwLock<HashMap<String, KeyStream>>,

    /// Announcements of new keys.
    announcements: EventStream<String>,

    /// Total records published.
    records_published: AtomicU64,
}

impl InMemoryKeyRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
            announcements: EventStream::new(NEW_KEYS_STREAM),
            records_published: AtomicU64::new(0),
        }
    }

    /// Publish a record on the stream of its path.
    ///
    /// Returns the number of observers notified.
    pub fn publish(&self, record: &NormalizedRecord) -> usize {
        let stream = self.register(&record.path);
        self.records_published.fetch_add(1, Ordering::Relaxed);
        stream.emit(record)
    }

    /// Ensure `key` has a stream, announcing it if it was just created.
    pub fn register(&self, key: &str) -> KeyStream {
        let (stream, created) = self.get_or_create(key);
        if created {
            debug!(key = %key, "New key registered");
            self.announcements.emit(&key.to_string());
        }
        stream
    }

    /// Number of observers attached to `key`'s stream (0 if unknown).
    #[must_use]
    pub fn subscriber_count(&self, key: &str) -> usize {
        self.streams
            .read()
            .get(key)
            .map_or(0, EventStream::observer_count)
    }

    /// Number of known keys.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.streams.read().len()
    }

    /// Total number of records published.
    #[must_use]
    pub fn records_published(&self) -> u64 {
        self.records_published.load(Ordering::Relaxed)
    }

    fn get_or_create(&self, key: &str) -> (KeyStream, bool) {
        if let Some(stream) = self.streams.read().get(key) {
            return (stream.clone(), false);
        }

        let mut streams = self.streams.write();
        if let Some(stream) = streams.get(key) {
            return (stream.clone(), false);
        }
        let stream = KeyStream::new(key);
        streams.insert(key.to_string(), stream.clone());
        (stream, true)
    }
}

impl Default for InMemoryKeyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyRegistry for InMemoryKeyRegistry {
    fn stream(&self, key: &str) -> KeyStream {
        self.register(key)
    }

    fn known_keys(&self) -> Vec<String> {
        self.streams.read().keys().cloned().collect()
    }

    fn new_keys(&self) -> EventStream<String> {
        self.announcements.clone()
    }
}
