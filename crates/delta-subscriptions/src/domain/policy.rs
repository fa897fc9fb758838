//! Delivery policy selection
//!
//! Turns the timing fields of a subscribe row into one of three delivery
//! policies. Selection is pure: warnings are returned, not emitted, so the
//! caller decides where they go and the same row always yields the same
//! policy.

use std::time::{Duration, Instant};

use shared_types::{ConfigWarning, SubscribeRow, FORMAT_DELTA, POLICY_FIXED, POLICY_INSTANT};

/// Window length used by the fixed policy when the row has no period.
pub const DEFAULT_FIXED_PERIOD: Duration = Duration::from_millis(1000);

/// How records of one row reach the subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryPolicy {
    /// Every record, immediately.
    Passthrough,
    /// Immediately, but at most one record per `min_period`.
    DebounceSuppress { min_period: Duration },
    /// Latest record per identity, once per `period`.
    FixedInterval { period: Duration },
}

/// Outcome of [`DeliveryPolicy::select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicySelection {
    pub policy: DeliveryPolicy,
    pub warnings: Vec<ConfigWarning>,
}

impl DeliveryPolicy {
    /// Select the policy for `row`.
    ///
    /// Priority: `minPeriod` (debounce), then `period` or policy `fixed`
    /// (fixed interval), else passthrough. Non-positive timing fields count as
    /// absent.
    #[must_use]
    pub fn select(row: &SubscribeRow, default_period: Duration) -> PolicySelection {
        let mut warnings = Vec::new();
        let policy_name = row.policy.as_deref();

        let policy = if let Some(min_period) = row.min_period_millis() {
            if let Some(name) = policy_name.filter(|name| *name != POLICY_INSTANT) {
                warnings.push(ignored(row, name, "minPeriod", POLICY_INSTANT));
            }
            Self::DebounceSuppress {
                min_period: Duration::from_millis(min_period),
            }
        } else if row.period_millis().is_some() || policy_name == Some(POLICY_FIXED) {
            if let Some(name) = policy_name.filter(|name| *name != POLICY_FIXED) {
                warnings.push(ignored(row, name, "period", POLICY_FIXED));
            }
            Self::FixedInterval {
                period: row
                    .period_millis()
                    .map_or(default_period, Duration::from_millis),
            }
        } else {
            Self::Passthrough
        };

        if let Some(format) = row.format.as_deref().filter(|f| *f != FORMAT_DELTA) {
            warnings.push(ConfigWarning::UnsupportedFormat {
                path: row.path.clone(),
                format: format.to_string(),
            });
        }
        if let Some(name) = policy_name.filter(|n| *n != POLICY_INSTANT && *n != POLICY_FIXED) {
            warnings.push(ConfigWarning::UnsupportedPolicy {
                path: row.path.clone(),
                policy: name.to_string(),
            });
        }

        PolicySelection { policy, warnings }
    }

    /// Short name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Passthrough => "passthrough",
            Self::DebounceSuppress { .. } => "debounce",
            Self::FixedInterval { .. } => "fixed",
        }
    }
}

fn ignored(row: &SubscribeRow, policy: &str, field: &'static str, applied: &'static str) -> ConfigWarning {
    ConfigWarning::PolicyIgnored {
        path: row.path.clone(),
        policy: policy.to_string(),
        field,
        applied,
    }
}

/// Admission state of a debounce-suppress stream.
///
/// A record is admitted when nothing has been delivered yet or at least
/// `min_period` has passed since the last delivery; admitted records restart
/// the window, suppressed ones do not.
#[derive(Debug, Clone)]
pub struct DebounceGate {
    min_period: Duration,
    last_delivered: Option<Instant>,
}

impl DebounceGate {
    #[must_use]
    pub fn new(min_period: Duration) -> Self {
        Self {
            min_period,
            last_delivered: None,
        }
    }

    /// Decide whether a record arriving at `now` is delivered.
    pub fn admit(&mut self, now: Instant) -> bool {
        let open = self
            .last_delivered
            .map_or(true, |last| now.saturating_duration_since(last) >= self.min_period);
        if open {
            self.last_delivered = Some(now);
        }
        open
    }
}
