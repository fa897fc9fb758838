//! Rate shaping between a filtered key stream and the subscriber
//!
//! A `PolicyStage` is built once per subscribe row and applied to every key
//! stream the row attaches to. Each application owns its own debounce gate or
//! window, so two keys never share rate state.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use shared_bus::{DetachHandle, Observer, Source};
use shared_types::{NormalizedRecord, SubscribeRow};
use tokio::runtime::Handle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

use crate::domain::{DebounceGate, DedupWindow, DeliveryPolicy};
use crate::ports::WarnSink;

/// Delivery policy bound to the scheduler that drives its timers.
#[derive(Debug, Clone)]
pub struct PolicyStage {
    policy: DeliveryPolicy,
    scheduler: Handle,
}

impl PolicyStage {
    pub fn new(policy: DeliveryPolicy, scheduler: Handle) -> Self {
        Self { policy, scheduler }
    }

    /// Select the stage for `row`, reporting its warnings once.
    pub fn for_row(
        row: &SubscribeRow,
        default_period: Duration,
        scheduler: Handle,
        on_warn: &WarnSink,
    ) -> Self {
        let selection = DeliveryPolicy::select(row, default_period);
        for warning in &selection.warnings {
            warn!(path = %row.path, warning = %warning, "Subscription row adjusted");
            on_warn(warning);
        }
        debug!(path = %row.path, policy = selection.policy.name(), "Delivery policy selected");
        Self::new(selection.policy, scheduler)
    }

    #[must_use]
    pub fn policy(&self) -> DeliveryPolicy {
        self.policy
    }

    /// Shape `upstream` by this stage's policy.
    pub fn apply(&self, upstream: Arc<dyn Source<NormalizedRecord>>) -> RatedStream {
        RatedStream {
            upstream,
            policy: self.policy,
            scheduler: self.scheduler.clone(),
        }
    }
}

/// A key stream with a delivery policy applied.
pub struct RatedStream {
    upstream: Arc<dyn Source<NormalizedRecord>>,
    policy: DeliveryPolicy,
    scheduler: Handle,
}

impl RatedStream {
    fn debounced(&self, min_period: Duration, observer: Observer<NormalizedRecord>) -> DetachHandle {
        let gate = Mutex::new(DebounceGate::new(min_period));
        self.upstream.subscribe(Arc::new(move |record: &NormalizedRecord| {
            let admitted = gate.lock().admit(Instant::now().into_std());
            if admitted {
                observer(record);
            } else {
                trace!(path = %record.path, "Suppressed by minPeriod");
            }
        }))
    }

    fn windowed(&self, period: Duration, observer: Observer<NormalizedRecord>) -> DetachHandle {
        let window = Arc::new(Mutex::new(DedupWindow::new()));

        let sink = Arc::clone(&window);
        let upstream = self
            .upstream
            .subscribe(Arc::new(move |record: &NormalizedRecord| {
                sink.lock().push(record.clone());
            }));

        // Windows are aligned to the attach instant.
        let start = Instant::now() + period;
        let task = self.scheduler.spawn(async move {
            let mut ticker = time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let batch = window.lock().drain();
                if !batch.is_empty() {
                    trace!(records = batch.len(), "Flushing window");
                }
                for record in &batch {
                    observer(record);
                }
            }
        });
        let flush = task.abort_handle();

        DetachHandle::new(move || {
            upstream.release();
            flush.abort();
        })
    }
}

impl Source<NormalizedRecord> for RatedStream {
    fn subscribe(&self, observer: Observer<NormalizedRecord>) -> DetachHandle {
        match self.policy {
            DeliveryPolicy::Passthrough => self.upstream.subscribe(observer),
            DeliveryPolicy::DebounceSuppress { min_period } => self.debounced(min_period, observer),
            DeliveryPolicy::FixedInterval { period } => self.windowed(period, observer),
        }
    }
}
