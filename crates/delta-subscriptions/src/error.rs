//! Error types for the subscription engine
//!
//! Subscribing itself never fails; these cover engine construction and
//! configuration only. Per-row problems are `ConfigWarning`s.

use thiserror::Error;

/// Errors raised while building the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No tokio runtime available to drive delivery timers")]
    NoScheduler,

    #[error("Invalid value for {name}: {value:?} ({reason})")]
    InvalidConfig {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}
