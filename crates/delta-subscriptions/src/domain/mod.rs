//! Domain Layer - Pure matching and policy logic
//!
//! This layer contains:
//! - Wildcard key patterns
//! - Context predicates (wildcard, self alias, geofence)
//! - Great-circle distance
//! - Delivery policy selection and debounce admission
//! - Deduplicating window buffer
//!
//! RULES:
//! - No I/O operations
//! - No async code
//! - No timers; callers pass the current instant

pub mod context_matcher;
pub mod geodesy;
pub mod path_matcher;
pub mod policy;
pub mod window;

pub use context_matcher::{ContextMatcher, ContextPredicate, SELF_ALIASES};
pub use geodesy::{distance_m, within_radius, EARTH_RADIUS_M};
pub use path_matcher::PathMatcher;
pub use policy::{DebounceGate, DeliveryPolicy, PolicySelection, DEFAULT_FIXED_PERIOD};
pub use window::DedupWindow;
