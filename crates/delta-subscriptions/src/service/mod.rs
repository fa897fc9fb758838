//! Service Layer
//!
//! Orchestrates domain logic over the ports: rate shaping per row, the
//! registrar that owns subscription lifecycles, and per-client sessions.

pub mod policy_stage;
pub mod registrar;
pub mod session;

pub use policy_stage::{PolicyStage, RatedStream};
pub use registrar::SubscriptionRegistrar;
pub use session::ClientSession;
