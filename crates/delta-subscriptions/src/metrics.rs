//! Counters for subscription activity
//!
//! Thread-safe counters shared by the registrar and every subscription it
//! creates.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector for the subscription engine
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Subscriptions opened
    pub subscriptions_opened: AtomicU64,
    /// Subscriptions detached
    pub subscriptions_detached: AtomicU64,
    /// (row, key) attachments made
    pub keys_attached: AtomicU64,
    /// Records delivered to subscribers, replay included
    pub records_delivered: AtomicU64,
    /// Records delivered from the replay source
    pub records_replayed: AtomicU64,
    /// Configuration warnings reported
    pub warnings_emitted: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_subscribe(&self) {
        self.subscriptions_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_detach(&self) {
        self.subscriptions_detached.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_attach(&self) {
        self.keys_attached.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivery(&self) {
        self.records_delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record `count` replayed records; they also count as deliveries.
    pub fn record_replay(&self, count: usize) {
        self.records_replayed.fetch_add(count as u64, Ordering::Relaxed);
        self.records_delivered.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_warning(&self) {
        self.warnings_emitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        let opened = self.subscriptions_opened.load(Ordering::Relaxed);
        let detached = self.subscriptions_detached.load(Ordering::Relaxed);
        MetricsSnapshot {
            subscriptions_opened: opened,
            subscriptions_detached: detached,
            subscriptions_active: opened.saturating_sub(detached),
            keys_attached: self.keys_attached.load(Ordering::Relaxed),
            records_delivered: self.records_delivered.load(Ordering::Relaxed),
            records_replayed: self.records_replayed.load(Ordering::Relaxed),
            warnings_emitted: self.warnings_emitted.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`EngineMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub subscriptions_opened: u64,
    pub subscriptions_detached: u64,
    pub subscriptions_active: u64,
    pub keys_attached: u64,
    pub records_delivered: u64,
    pub records_replayed: u64,
    pub warnings_emitted: u64,
}
