//! In-memory replay cache.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use shared_types::{NormalizedRecord, Principal};

use crate::ports::ReplaySource;

type BySourceKey = (String, String);

/// Keeps the latest record per (context, path, source).
///
/// Records of one path are kept ordered by context, then source; that is the
/// order `recent_for` returns them in.
#[derive(Debug, Default)]
pub struct InMemoryReplayCache {
    entries: RwLock<BTreeMap<String, BTreeMap<BySourceKey, NormalizedRecord>>>,
}

impl InMemoryReplayCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `record`, replacing the previous one with the same identity.
    pub fn store(&self, record: NormalizedRecord) {
        let slot = (record.context.clone(), record.source.clone());
        self.entries
            .write()
            .entry(record.path.clone())
            .or_default()
            .insert(slot, record);
    }

    /// Number of cached records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReplaySource for InMemoryReplayCache {
    fn recent_for(
        &self,
        principal: &Principal,
        filter: &dyn Fn(&NormalizedRecord) -> bool,
        key: &str,
    ) -> Vec<NormalizedRecord> {
        let entries = self.entries.read();
        let Some(records) = entries.get(key) else {
            return Vec::new();
        };
        records
            .values()
            .filter(|record| principal.can_read(&record.context) && filter(record))
            .cloned()
            .collect()
    }
}
