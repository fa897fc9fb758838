//! # Delta Subscriptions
//!
//! Subscription matching and delivery for the telemetry bus. Clients declare
//! interest in a context and a set of key patterns; the engine attaches them
//! to every matching key stream, present and future, shapes each stream with
//! the row's delivery policy and primes new attachments from the replay
//! cache.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure logic, no I/O
//!   - `PathMatcher`: Wildcard key patterns
//!   - `ContextMatcher`: Context predicates (wildcard, self alias, geofence)
//!   - `DeliveryPolicy`: Policy selection from a subscribe row
//!   - `DebounceGate`, `DedupWindow`: Per-stream rate state
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `SubscriptionApi`: Driving port (inbound API)
//!   - `KeyRegistry`, `ReplaySource`, `EntitySnapshot`: Driven ports
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `PolicyStage`: Applies a policy to a key stream
//!   - `SubscriptionRegistrar`: Implements `SubscriptionApi`
//!   - `ClientSession`: Subscriptions of one connected client
//!
//! - **Adapters Layer** (`adapters/`): In-memory driven adapters
//!   - `InMemoryReplayCache`, `PositionTracker`, `DeltaIngest`
//!
//! ## Invariants
//!
//! - A row attaches to a given key at most once.
//! - The context predicate is compiled once per command; path matcher and
//!   policy once per row.
//! - After detach, no callback of the subscription runs and no observer of it
//!   remains on any stream.
//!
//! ## Usage Example
//!
//! ```ignore
//! use delta_subscriptions::{EngineConfig, SubscriptionRegistrar};
//! use shared_types::{Principal, SubscribeRow, SubscriptionCommand};
//!
//! let registrar = SubscriptionRegistrar::new(registry, cache, positions, EngineConfig::from_env()?)?;
//! let handle = registrar.subscribe(
//!     SubscriptionCommand::new(None).with_row(SubscribeRow::new("navigation.*").with_period(1000)),
//!     on_warn,
//!     on_record,
//!     Principal::unrestricted("client-1"),
//! );
//! // ...
//! handle.release();
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-exports for convenience
pub use adapters::{DeltaIngest, InMemoryReplayCache, PositionTracker};
pub use config::EngineConfig;
pub use domain::{ContextMatcher, ContextPredicate, DeliveryPolicy, PathMatcher};
pub use error::EngineError;
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use ports::{EntitySnapshot, KeyRegistry, RecordSink, ReplaySource, SubscriptionApi, WarnSink};
pub use service::{ClientSession, PolicyStage, SubscriptionRegistrar};
