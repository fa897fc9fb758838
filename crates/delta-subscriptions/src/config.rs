//! Engine configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::domain::DEFAULT_FIXED_PERIOD;
use crate::error::EngineError;

/// Context of this installation's own entity when none is configured.
pub const DEFAULT_SELF_CONTEXT: &str = "vessels.self";

/// Environment variable naming the self context.
pub const ENV_SELF_CONTEXT: &str = "DS_SELF_CONTEXT";

/// Environment variable for the fixed policy's default period, in ms.
pub const ENV_DEFAULT_PERIOD_MS: &str = "DS_DEFAULT_PERIOD_MS";

/// Configuration shared by every subscription of one engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Full context of the installation's own entity; the target of `self`
    /// and `vessels.self` context specifiers.
    pub self_context: String,

    /// Window length of fixed-interval rows that carry no period.
    pub default_fixed_period: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            self_context: DEFAULT_SELF_CONTEXT.to_string(),
            default_fixed_period: DEFAULT_FIXED_PERIOD,
        }
    }
}

impl EngineConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DS_SELF_CONTEXT`: Self context (default: vessels.self)
    /// - `DS_DEFAULT_PERIOD_MS`: Default fixed period in ms (default: 1000)
    pub fn from_env() -> Result<Self, EngineError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EngineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(context) = lookup(ENV_SELF_CONTEXT).filter(|v| !v.trim().is_empty()) {
            config.self_context = context.trim().to_string();
        }

        if let Some(raw) = lookup(ENV_DEFAULT_PERIOD_MS) {
            let millis = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or(EngineError::InvalidConfig {
                    name: ENV_DEFAULT_PERIOD_MS,
                    value: raw.clone(),
                    reason: "expected a positive integer",
                })?;
            config.default_fixed_period = Duration::from_millis(millis);
        }

        Ok(config)
    }

    pub fn with_self_context(mut self, context: impl Into<String>) -> Self {
        self.self_context = context.into();
        self
    }

    pub fn with_default_fixed_period(mut self, period: Duration) -> Self {
        self.default_fixed_period = period;
        self
    }
}
