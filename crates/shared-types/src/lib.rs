//! # Shared Types Crate
//!
//! Contains the telemetry entities and client message types shared by the
//! bus, the subscription engine, and the runtime.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate types are defined here.
//! - **Lenient Wire Types**: Client messages keep questionable fields in raw
//!   form so problems surface as [`ConfigWarning`]s, never as parse failures
//!   of an otherwise usable subscription.
//! - **Immutable Records**: A [`NormalizedRecord`] is never modified after it
//!   is flattened out of a [`Delta`].

pub mod entities;
pub mod errors;
pub mod principal;
pub mod subscription;

pub use entities::*;
pub use errors::*;
pub use principal::*;
pub use subscription::*;
