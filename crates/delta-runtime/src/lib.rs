//! # Delta Runtime Library
//!
//! Wires the subscription engine to line-oriented input and output. The
//! `main.rs` binary feeds it stdin; tests feed it strings.
//!
//! ```text
//! stdin (delta per line) ──> DeltaIngest ──> registry / cache / positions
//!                                                │
//! command file ──> ClientSession ──> SubscriptionRegistrar
//!                                                │
//!                                   stdout <── record JSON lines
//! ```

use std::sync::Arc;

use delta_subscriptions::{
    ClientSession, DeltaIngest, EngineConfig, EngineError, InMemoryReplayCache, MetricsSnapshot,
    PositionTracker, SubscriptionRegistrar,
};
use shared_bus::InMemoryKeyRegistry;
use shared_types::{ConfigWarning, Delta, NormalizedRecord, Principal};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

/// Errors for a single input line.
#[derive(Debug, Error)]
pub enum PipeError {
    #[error("Invalid delta: {0}")]
    InvalidDelta(#[from] serde_json::Error),
}

/// One engine instance with a single client attached to an output channel.
pub struct DeltaPipe {
    ingest: DeltaIngest,
    registrar: Arc<SubscriptionRegistrar>,
    session: ClientSession,
}

impl DeltaPipe {
    /// Build the engine on the current runtime. Every delivered record is
    /// sent to `output` as one JSON line.
    pub fn new(config: EngineConfig, output: UnboundedSender<String>) -> Result<Self, EngineError> {
        let registry = Arc::new(InMemoryKeyRegistry::new());
        let cache = Arc::new(InMemoryReplayCache::new());
        let positions = Arc::new(PositionTracker::new());

        let ingest = DeltaIngest::new(
            Arc::clone(&registry),
            Arc::clone(&cache),
            Arc::clone(&positions),
            config.self_context.clone(),
        );
        let registrar = Arc::new(SubscriptionRegistrar::new(registry, cache, positions, config)?);

        let session = ClientSession::new(
            registrar.clone(),
            Principal::unrestricted("stdin"),
            Arc::new(|warning: &ConfigWarning| debug!(warning = %warning, "Warning delivered")),
            Arc::new(move |record: &NormalizedRecord| match serde_json::to_string(record) {
                Ok(line) => {
                    if output.send(line).is_err() {
                        debug!("Output closed, dropping record");
                    }
                }
                Err(e) => warn!(error = %e, key = %record.path, "Record not serializable"),
            }),
        );

        Ok(Self {
            ingest,
            registrar,
            session,
        })
    }

    /// Handle a client command (subscribe or unsubscribe) in JSON.
    pub fn command(&self, text: &str) {
        self.session.handle_message(text);
    }

    /// Ingest one input line. Blank lines are ignored.
    ///
    /// Returns the number of records the delta carried.
    pub fn handle_line(&self, line: &str) -> Result<usize, PipeError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(0);
        }
        let delta = Delta::from_json(line)?;
        Ok(self.ingest.ingest(&delta))
    }

    pub fn active_subscriptions(&self) -> usize {
        self.session.active_subscriptions()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.registrar.metrics().snapshot()
    }

    /// Release every subscription.
    pub fn close(&self) {
        self.session.close();
    }
}
