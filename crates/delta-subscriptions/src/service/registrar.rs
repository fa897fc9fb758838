//! Subscription Registrar
//!
//! Turns a subscription command into live attachments on the key registry:
//!
//! ```text
//!   keyStream(key) ──filter(context)──> PolicyStage(row) ──> on_record
//!        ▲
//!   new-key stream ──> attach_key(key) for every matching row
//! ```
//!
//! The context predicate is compiled once per command and the path matcher and
//! policy once per row; every later attach, including those triggered by keys
//! that appear after `subscribe` returns, reuses them.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use shared_bus::{DetachHandle, Filtered, Source};
use shared_types::{ConfigWarning, NormalizedRecord, Principal, SubscriptionCommand};
use tokio::runtime::Handle;
use tracing::{debug, info, trace};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::domain::{ContextMatcher, ContextPredicate, PathMatcher};
use crate::error::EngineError;
use crate::metrics::EngineMetrics;
use crate::ports::{EntitySnapshot, KeyRegistry, RecordSink, ReplaySource, SubscriptionApi, WarnSink};
use crate::service::policy_stage::PolicyStage;

/// Entry point for opening subscriptions.
pub struct SubscriptionRegistrar {
    registry: Arc<dyn KeyRegistry>,
    replay: Arc<dyn ReplaySource>,
    snapshot: Arc<dyn EntitySnapshot>,
    config: EngineConfig,
    scheduler: Handle,
    metrics: Arc<EngineMetrics>,
}

impl SubscriptionRegistrar {
    /// Create a registrar driven by the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoScheduler`] outside a runtime context.
    pub fn new(
        registry: Arc<dyn KeyRegistry>,
        replay: Arc<dyn ReplaySource>,
        snapshot: Arc<dyn EntitySnapshot>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        let scheduler = Handle::try_current().map_err(|_| EngineError::NoScheduler)?;
        Ok(Self::with_scheduler(registry, replay, snapshot, config, scheduler))
    }

    /// Create a registrar whose window timers run on `scheduler`.
    pub fn with_scheduler(
        registry: Arc<dyn KeyRegistry>,
        replay: Arc<dyn ReplaySource>,
        snapshot: Arc<dyn EntitySnapshot>,
        config: EngineConfig,
        scheduler: Handle,
    ) -> Self {
        Self {
            registry,
            replay,
            snapshot,
            config,
            scheduler,
            metrics: Arc::new(EngineMetrics::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Open a subscription. See [`SubscriptionApi::subscribe`].
    pub fn subscribe(
        &self,
        command: SubscriptionCommand,
        on_warn: WarnSink,
        on_record: RecordSink,
        principal: Principal,
    ) -> DetachHandle {
        let id = Uuid::new_v4();
        let on_warn = self.reporting(id, on_warn);

        let context = ContextMatcher::compile(
            &self.config.self_context,
            command.context.as_ref(),
            Arc::clone(&self.snapshot),
            &on_warn,
        );

        let mut rows = Vec::with_capacity(command.subscribe.len());
        for (index, row) in command.subscribe.iter().enumerate() {
            if row.path.is_empty() {
                debug!(subscription_id = %id, row = index, "Skipping row without path");
                continue;
            }
            rows.push(CompiledRow {
                index,
                matcher: PathMatcher::compile(&row.path),
                stage: PolicyStage::for_row(
                    row,
                    self.config.default_fixed_period,
                    self.scheduler.clone(),
                    &on_warn,
                ),
                attached: Mutex::new(HashSet::new()),
            });
        }

        let subscription = Arc::new(ActiveSubscription {
            id,
            context,
            rows,
            handles: Mutex::new(Some(Vec::new())),
            delivery: Arc::new(Delivery {
                open: AtomicBool::new(true),
                sink: on_record,
                metrics: Arc::clone(&self.metrics),
            }),
            principal,
            registry: Arc::clone(&self.registry),
            replay: Arc::clone(&self.replay),
            metrics: Arc::clone(&self.metrics),
        });
        self.metrics.record_subscribe();

        // Listen before taking the snapshot so no key created in between is
        // missed; the per-row attached sets absorb the overlap.
        let weak: Weak<ActiveSubscription> = Arc::downgrade(&subscription);
        let listener = self
            .registry
            .new_keys()
            .subscribe(Arc::new(move |key: &String| {
                if let Some(subscription) = weak.upgrade() {
                    subscription.attach_key(key);
                }
            }));
        subscription.keep(listener);

        let mut keys = self.registry.known_keys();
        keys.sort();
        for key in &keys {
            subscription.attach_key(key);
        }

        info!(
            subscription_id = %id,
            principal = %subscription.principal.id,
            rows = subscription.rows.len(),
            attached = subscription.attached_count(),
            "Subscription opened"
        );

        DetachHandle::new(move || subscription.detach())
    }

    /// Wrap `on_warn` so every warning is also counted and logged.
    fn reporting(&self, id: Uuid, on_warn: WarnSink) -> WarnSink {
        let metrics = Arc::clone(&self.metrics);
        Arc::new(move |warning: &ConfigWarning| {
            metrics.record_warning();
            trace!(subscription_id = %id, warning = %warning, "Warning reported");
            on_warn(warning);
        })
    }
}

impl SubscriptionApi for SubscriptionRegistrar {
    fn subscribe(
        &self,
        command: SubscriptionCommand,
        on_warn: WarnSink,
        on_record: RecordSink,
        principal: Principal,
    ) -> DetachHandle {
        SubscriptionRegistrar::subscribe(self, command, on_warn, on_record, principal)
    }
}

struct CompiledRow {
    index: usize,
    matcher: PathMatcher,
    stage: PolicyStage,
    /// Keys this row is attached to; a key is attached at most once.
    attached: Mutex<HashSet<String>>,
}

/// Gate between the attached streams and the caller's sink.
///
/// Closed on detach, so a record already in flight through a stream snapshot
/// is not delivered afterwards.
struct Delivery {
    open: AtomicBool,
    sink: RecordSink,
    metrics: Arc<EngineMetrics>,
}

impl Delivery {
    fn deliver(&self, record: &NormalizedRecord) {
        if self.open.load(Ordering::Acquire) {
            self.metrics.record_delivery();
            (self.sink)(record);
        }
    }

    fn replay(&self, records: &[NormalizedRecord]) {
        if !self.open.load(Ordering::Acquire) {
            return;
        }
        self.metrics.record_replay(records.len());
        for record in records {
            (self.sink)(record);
        }
    }

    fn close(&self) -> bool {
        self.open.swap(false, Ordering::AcqRel)
    }
}

/// Runtime state of one subscribe call.
struct ActiveSubscription {
    id: Uuid,
    context: ContextPredicate,
    rows: Vec<CompiledRow>,
    /// `None` once detached.
    handles: Mutex<Option<Vec<DetachHandle>>>,
    delivery: Arc<Delivery>,
    principal: Principal,
    registry: Arc<dyn KeyRegistry>,
    replay: Arc<dyn ReplaySource>,
    metrics: Arc<EngineMetrics>,
}

impl ActiveSubscription {
    /// Attach every row matching `key` that is not attached to it yet, then
    /// replay the cached values for each new attachment.
    fn attach_key(&self, key: &str) {
        let mut stream: Option<Arc<dyn Source<NormalizedRecord>>> = None;

        for row in &self.rows {
            if !row.matcher.matches(key) || !row.attached.lock().insert(key.to_string()) {
                continue;
            }

            let upstream = Arc::clone(stream.get_or_insert_with(|| {
                Arc::new(self.registry.stream(key)) as Arc<dyn Source<NormalizedRecord>>
            }));
            let filtered = Filtered::new(upstream, Arc::clone(&self.context));
            let delivery = Arc::clone(&self.delivery);
            let handle = row
                .stage
                .apply(Arc::new(filtered))
                .subscribe(Arc::new(move |record: &NormalizedRecord| delivery.deliver(record)));

            if !self.keep(handle) {
                return;
            }
            self.metrics.record_attach();
            debug!(
                subscription_id = %self.id,
                row = row.index,
                key,
                policy = row.stage.policy().name(),
                "Attached key stream"
            );

            self.replay_key(row.index, key);
        }
    }

    fn replay_key(&self, row: usize, key: &str) {
        let filter: &dyn Fn(&NormalizedRecord) -> bool = &*self.context;
        let records = self.replay.recent_for(&self.principal, filter, key);
        if records.is_empty() {
            return;
        }
        debug!(subscription_id = %self.id, row, key, records = records.len(), "Replaying cached values");
        self.delivery.replay(&records);
    }

    /// Record `handle`, or release it at once when already detached.
    fn keep(&self, handle: DetachHandle) -> bool {
        if let Some(handles) = self.handles.lock().as_mut() {
            handles.push(handle);
            return true;
        }
        handle.release();
        false
    }

    fn attached_count(&self) -> usize {
        self.rows.iter().map(|row| row.attached.lock().len()).sum()
    }

    fn detach(&self) {
        if !self.delivery.close() {
            return;
        }
        let handles = self.handles.lock().take().unwrap_or_default();
        let released = handles.len();
        for handle in handles {
            handle.release();
        }
        self.metrics.record_detach();
        info!(subscription_id = %self.id, handles = released, "Subscription detached");
    }
}
