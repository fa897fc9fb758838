//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - API for protocol handlers opening subscriptions
//! - Driven Ports (outbound) - Key registry, replay cache and entity positions

pub mod inbound;
pub mod outbound;

pub use inbound::{RecordSink, SubscriptionApi, WarnSink};
pub use outbound::{EntitySnapshot, KeyRegistry, ReplaySource};
