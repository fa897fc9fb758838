//! # Shared Bus - Keyed Telemetry Bus
//!
//! Owns the live data streams that subscriptions attach to.
//!
//! ## Architecture
//!
//! ```text
//!   publish(record)             ┌──────────────────────────┐
//!  ───────────────────────────▶ │   InMemoryKeyRegistry    │
//!                               │                          │
//!                               │  "navigation.position" ──┼──▶ observers
//!                               │  "navigation.speed…"  ───┼──▶ observers
//!                               │                          │
//!                               │  keys.new (announce)  ───┼──▶ registrars
//!                               └──────────────────────────┘
//! ```
//!
//! ## Streams
//!
//! - **Explicit observer lists:** `EventStream<T>` delivers synchronously, in
//!   subscription order, without holding its lock during callbacks.
//! - **Detach handles:** every subscription returns a `DetachHandle`; release
//!   is idempotent and also happens on drop.
//! - **Lazy keys:** a key's stream is created the first time the key is
//!   published or requested, and announced on the new-key stream.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use publisher::{InMemoryKeyRegistry, KeyRegistry, KeyStream};
pub use subscriber::{DetachHandle, EventStream, Filtered, Observer, Predicate, Source};

/// Name of the stream announcing newly created keys.
pub const NEW_KEYS_STREAM: &str = "keys.new";
