//! Shared fixture: one engine wired to in-memory adapters.

use std::sync::Arc;

use delta_subscriptions::{
    DeltaIngest, EngineConfig, InMemoryReplayCache, PositionTracker, RecordSink,
    SubscriptionRegistrar, WarnSink,
};
use parking_lot::Mutex;
use serde_json::Value;
use shared_bus::{DetachHandle, InMemoryKeyRegistry};
use shared_types::{ConfigWarning, Delta, NormalizedRecord, Principal, SubscriptionCommand};

pub const SELF_ID: &str = "vessels.urn:mrn:imo:mmsi:230099999";

/// Engine plus the adapters behind it.
pub struct Engine {
    pub registry: Arc<InMemoryKeyRegistry>,
    pub cache: Arc<InMemoryReplayCache>,
    pub positions: Arc<PositionTracker>,
    pub ingest: DeltaIngest,
    pub registrar: Arc<SubscriptionRegistrar>,
}

impl Engine {
    /// Build on the current tokio runtime.
    pub fn new() -> Self {
        let registry = Arc::new(InMemoryKeyRegistry::new());
        let cache = Arc::new(InMemoryReplayCache::new());
        let positions = Arc::new(PositionTracker::new());
        let ingest = DeltaIngest::new(
            Arc::clone(&registry),
            Arc::clone(&cache),
            Arc::clone(&positions),
            SELF_ID,
        );
        let registrar = SubscriptionRegistrar::new(
            registry.clone(),
            cache.clone(),
            positions.clone(),
            EngineConfig::default().with_self_context(SELF_ID),
        )
        .expect("engine needs a tokio runtime");

        Self {
            registry,
            cache,
            positions,
            ingest,
            registrar: Arc::new(registrar),
        }
    }

    /// Ingest a delta given as JSON text.
    pub fn ingest_json(&self, text: &str) -> usize {
        let delta = Delta::from_json(text).expect("test delta must parse");
        self.ingest.ingest(&delta)
    }

    /// Ingest a single value with an explicit context and source.
    pub fn put(&self, context: &str, source: &str, path: &str, value: Value) {
        self.ingest
            .ingest_record(NormalizedRecord::new(context, source, path, value, "2024-05-01T12:00:00.000Z"));
    }

    pub fn subscribe(&self, command: SubscriptionCommand) -> (DetachHandle, Collector) {
        self.subscribe_as(command, Principal::unrestricted("test"))
    }

    pub fn subscribe_as(
        &self,
        command: SubscriptionCommand,
        principal: Principal,
    ) -> (DetachHandle, Collector) {
        let collector = Collector::default();
        let handle = self.registrar.subscribe(
            command,
            collector.warn_sink(),
            collector.record_sink(),
            principal,
        );
        (handle, collector)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Records and warnings received by one subscriber.
#[derive(Clone, Default)]
pub struct Collector {
    pub records: Arc<Mutex<Vec<NormalizedRecord>>>,
    pub warnings: Arc<Mutex<Vec<ConfigWarning>>>,
}

impl Collector {
    pub fn warn_sink(&self) -> WarnSink {
        let warnings = Arc::clone(&self.warnings);
        Arc::new(move |w: &ConfigWarning| warnings.lock().push(w.clone()))
    }

    pub fn record_sink(&self) -> RecordSink {
        let records = Arc::clone(&self.records);
        Arc::new(move |r: &NormalizedRecord| records.lock().push(r.clone()))
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn values(&self) -> Vec<Value> {
        self.records.lock().iter().map(|r| r.value.clone()).collect()
    }

    pub fn contexts(&self) -> Vec<String> {
        self.records.lock().iter().map(|r| r.context.clone()).collect()
    }
}
