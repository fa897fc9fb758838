//! Delta ingest
//!
//! Entry point for incoming data: flattens each delta and fans the records
//! out to the position tracker, the key registry and the replay cache, in
//! that order. Publishing before caching keeps a subscriber that attaches
//! during a key's announcement from seeing the same record twice (once by
//! replay, once live).

use std::sync::Arc;

use shared_bus::InMemoryKeyRegistry;
use shared_types::{Delta, NormalizedRecord};
use tracing::trace;

use crate::adapters::{InMemoryReplayCache, PositionTracker};

/// Feeds incoming deltas into the in-memory adapters.
pub struct DeltaIngest {
    registry: Arc<InMemoryKeyRegistry>,
    cache: Arc<InMemoryReplayCache>,
    positions: Arc<PositionTracker>,
    default_context: String,
}

impl DeltaIngest {
    /// `default_context` is used for deltas that carry no context.
    pub fn new(
        registry: Arc<InMemoryKeyRegistry>,
        cache: Arc<InMemoryReplayCache>,
        positions: Arc<PositionTracker>,
        default_context: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            cache,
            positions,
            default_context: default_context.into(),
        }
    }

    /// Ingest every value of `delta`. Returns the number of records.
    pub fn ingest(&self, delta: &Delta) -> usize {
        let records = delta.normalize(&self.default_context);
        let count = records.len();
        for record in records {
            self.ingest_record(record);
        }
        count
    }

    /// Ingest one record. Returns the number of live observers notified.
    pub fn ingest_record(&self, record: NormalizedRecord) -> usize {
        self.positions.observe(&record);
        let notified = self.registry.publish(&record);
        trace!(key = %record.path, context = %record.context, notified, "Record ingested");
        self.cache.store(record);
        notified
    }
}
