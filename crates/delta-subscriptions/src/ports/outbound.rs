//! Outbound Ports (Driven Ports)
//!
//! Dependencies the subscription engine needs from the rest of the server.

use shared_types::{NormalizedRecord, Position, Principal};

pub use shared_bus::KeyRegistry;

/// Recent values per key, used to prime new attachments (Driven Port)
pub trait ReplaySource: Send + Sync {
    /// Latest record per (context, source) under `key` that `principal` may
    /// read and that satisfies `filter`.
    fn recent_for(
        &self,
        principal: &Principal,
        filter: &dyn Fn(&NormalizedRecord) -> bool,
        key: &str,
    ) -> Vec<NormalizedRecord>;
}

/// Current entity positions, used by geofence contexts (Driven Port)
pub trait EntitySnapshot: Send + Sync {
    /// Last known position of the entity identified by `context`.
    fn position_of(&self, context: &str) -> Option<Position>;
}
