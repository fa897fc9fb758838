//! Adapters Layer (Driven Adapters)
//!
//! In-memory implementations of the driven ports, plus the ingest path that
//! feeds them from incoming deltas.
//!
//! ## Adapters
//!
//! - `InMemoryReplayCache` - Latest record per (context, path, source)
//! - `PositionTracker` - Last known position per context
//! - `DeltaIngest` - Flattens deltas into the tracker, registry and cache

pub mod ingest;
pub mod position_tracker;
pub mod replay_cache;

pub use ingest::DeltaIngest;
pub use position_tracker::PositionTracker;
pub use replay_cache::InMemoryReplayCache;
