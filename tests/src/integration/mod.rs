//! Integration flows across shared-bus, shared-types and delta-subscriptions.

pub mod flows;
pub mod geofence;
pub mod lifecycle;
pub mod support;
