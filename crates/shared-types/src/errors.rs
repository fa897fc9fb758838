//! # Warning Types
//!
//! Subscription problems are never fatal. Each one is reported to the
//! caller's warning sink as a [`ConfigWarning`] and the subscription carries on
//! with a narrower but well-defined behavior.

use thiserror::Error;

/// A non-fatal problem with a client's subscription message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigWarning {
    /// Policy name other than `instant` or `fixed`.
    #[error("Unsupported policy '{policy}' for path '{path}', only 'instant' and 'fixed' are supported")]
    UnsupportedPolicy { path: String, policy: String },

    /// Policy contradicts the timing field that selected the real policy.
    #[error("'{field}' implies policy '{applied}', ignoring policy '{policy}' for path '{path}'")]
    PolicyIgnored {
        path: String,
        policy: String,
        field: &'static str,
        applied: &'static str,
    },

    /// Format other than `delta`.
    #[error("Only 'delta' format is supported, ignoring format '{format}' for path '{path}'")]
    UnsupportedFormat { path: String, format: String },

    /// Radius context missing its radius or center.
    #[error("Radius context requires 'radius' and 'position.latitude'/'position.longitude', nothing will match")]
    IncompleteRadius,

    /// Unsubscribe other than the unsubscribe-everything form.
    #[error("Only unsubscribing from everything is supported (context '*' with a single path '*')")]
    UnsupportedUnsubscribe,

    /// Message that is neither a valid subscribe nor unsubscribe.
    #[error("Malformed subscription message: {reason}")]
    MalformedCommand { reason: String },
}
