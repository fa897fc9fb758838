//! Inbound Ports (Driving Ports)
//!
//! The API a protocol handler uses to open a subscription on behalf of a
//! connected client.

use std::sync::Arc;

use shared_bus::DetachHandle;
use shared_types::{ConfigWarning, NormalizedRecord, Principal, SubscriptionCommand};

/// Receives configuration warnings for one subscription.
pub type WarnSink = Arc<dyn Fn(&ConfigWarning) + Send + Sync>;

/// Receives delivered records for one subscription.
pub type RecordSink = Arc<dyn Fn(&NormalizedRecord) + Send + Sync>;

/// Subscription entry point (Driving Port)
pub trait SubscriptionApi: Send + Sync {
    /// Open a subscription.
    ///
    /// Never fails: problems with individual rows are reported through
    /// `on_warn` and the rest of the command still takes effect. Records are
    /// delivered through `on_record` until the returned handle is released
    /// or dropped.
    fn subscribe(
        &self,
        command: SubscriptionCommand,
        on_warn: WarnSink,
        on_record: RecordSink,
        principal: Principal,
    ) -> DetachHandle;
}
