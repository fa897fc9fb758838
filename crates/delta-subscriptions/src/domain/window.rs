//! Deduplicating window buffer for the fixed-interval policy.

use std::collections::HashMap;

use shared_types::{NormalizedRecord, RecordIdentity};

/// Records collected during one window, at most one per identity.
///
/// A later record for an identity replaces the earlier one in place, so the
/// drained batch is in first-arrival order of identities and carries the
/// latest value of each.
#[derive(Debug, Default)]
pub struct DedupWindow {
    slots: HashMap<RecordIdentity, usize>,
    records: Vec<NormalizedRecord>,
}

impl DedupWindow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record, replacing any earlier one with the same identity.
    pub fn push(&mut self, record: NormalizedRecord) {
        let identity = record.identity();
        match self.slots.get(&identity) {
            Some(&slot) => self.records[slot] = record,
            None => {
                self.slots.insert(identity, self.records.len());
                self.records.push(record);
            }
        }
    }

    /// Take the surviving records and start an empty window.
    pub fn drain(&mut self) -> Vec<NormalizedRecord> {
        self.slots.clear();
        std::mem::take(&mut self.records)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
