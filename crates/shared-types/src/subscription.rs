//! # Subscription Commands
//!
//! Shapes of the subscribe/unsubscribe messages a client sends. These are the
//! contract boundary with the transport layer, so every field is lenient:
//! anything a client can get wrong is kept in raw form and reported as a
//! [`ConfigWarning`](crate::ConfigWarning) later instead of failing to parse.

use crate::entities::Position;
use crate::errors::ConfigWarning;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Policy name selecting immediate delivery.
pub const POLICY_INSTANT: &str = "instant";

/// Policy name selecting fixed-interval delivery.
pub const POLICY_FIXED: &str = "fixed";

/// The only supported output format.
pub const FORMAT_DELTA: &str = "delta";

/// A subscribe message: an optional context filter and ordered rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionCommand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ContextSpecifier>,
    #[serde(default)]
    pub subscribe: Vec<SubscribeRow>,
}

impl SubscriptionCommand {
    /// Create an empty command with the given context filter.
    #[must_use]
    pub fn new(context: Option<ContextSpecifier>) -> Self {
        Self {
            context,
            subscribe: Vec::new(),
        }
    }

    /// Builder-style method to append a row.
    #[must_use]
    pub fn with_row(mut self, row: SubscribeRow) -> Self {
        self.subscribe.push(row);
        self
    }
}

/// One (pattern, policy) pairing of a subscribe message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRow {
    /// Wildcard key pattern.
    #[serde(default)]
    pub path: String,
    /// Fixed delivery interval in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<f64>,
    /// Minimum spacing between deliveries in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_period: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl SubscribeRow {
    /// Create a row for the given pattern with no policy fields.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Builder-style method to set the period.
    #[must_use]
    pub fn with_period(mut self, millis: u64) -> Self {
        self.period = Some(millis as f64);
        self
    }

    /// Builder-style method to set the minimum period.
    #[must_use]
    pub fn with_min_period(mut self, millis: u64) -> Self {
        self.min_period = Some(millis as f64);
        self
    }

    /// Builder-style method to set the policy name.
    #[must_use]
    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.policy = Some(policy.into());
        self
    }

    /// Builder-style method to set the format name.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// `period` in whole milliseconds, or `None` when absent or not positive.
    /// Positive values below one millisecond round up to 1 ms.
    #[must_use]
    pub fn period_millis(&self) -> Option<u64> {
        positive_millis(self.period)
    }

    /// `minPeriod` in whole milliseconds, or `None` when absent or not positive.
    #[must_use]
    pub fn min_period_millis(&self) -> Option<u64> {
        positive_millis(self.min_period)
    }
}

fn positive_millis(value: Option<f64>) -> Option<u64> {
    value
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v.max(1.0).trunc() as u64)
}

/// Which contexts a subscription wants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextSpecifier {
    /// Wildcard pattern over context ids (or the `self` alias).
    Pattern(String),
    /// Every entity within `radius` meters of `position`.
    Radius(RadiusSpecifier),
}

impl ContextSpecifier {
    /// Shorthand for a pattern specifier.
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self::Pattern(pattern.into())
    }

    /// Shorthand for a fully specified radius.
    #[must_use]
    pub fn radius(radius: f64, position: Position) -> Self {
        Self::Radius(RadiusSpecifier {
            radius: Some(radius),
            position: Some(PositionSpecifier {
                latitude: Some(position.latitude),
                longitude: Some(position.longitude),
            }),
        })
    }
}

/// Geofence specifier; every field may be missing on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RadiusSpecifier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionSpecifier>,
}

/// Possibly incomplete position of a geofence center.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionSpecifier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl RadiusSpecifier {
    /// The radius and center, if both are fully specified and usable.
    #[must_use]
    pub fn resolve(&self) -> Option<(f64, Position)> {
        let radius = self.radius.filter(|r| r.is_finite() && *r >= 0.0)?;
        let position = self.position.as_ref()?;
        let center = Position::new(position.latitude?, position.longitude?);
        Some((radius, center))
    }
}

/// An unsubscribe message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsubscribeCommand {
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub unsubscribe: Vec<UnsubscribeRow>,
}

/// One row of an unsubscribe message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsubscribeRow {
    #[serde(default)]
    pub path: String,
}

impl UnsubscribeCommand {
    /// The "drop everything" form: `{"context":"*","unsubscribe":[{"path":"*"}]}`.
    #[must_use]
    pub fn all() -> Self {
        Self {
            context: "*".to_string(),
            unsubscribe: vec![UnsubscribeRow {
                path: "*".to_string(),
            }],
        }
    }

    /// Whether this is the only supported form, unsubscribe from everything.
    #[must_use]
    pub fn is_unsubscribe_all(&self) -> bool {
        self.context == "*" && matches!(self.unsubscribe.as_slice(), [row] if row.path == "*")
    }
}

/// Any message a client may send.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    Subscribe(SubscriptionCommand),
    Unsubscribe(UnsubscribeCommand),
}

impl ClientCommand {
    /// Parse a client message from JSON text.
    ///
    /// A message with an `unsubscribe` member is an unsubscribe, one with a
    /// `subscribe` member is a subscribe; anything else is malformed.
    pub fn from_json(text: &str) -> Result<Self, ConfigWarning> {
        let value: Value = serde_json::from_str(text).map_err(malformed)?;

        if value.get("unsubscribe").is_some() {
            return serde_json::from_value(value)
                .map(Self::Unsubscribe)
                .map_err(malformed);
        }
        if value.get("subscribe").is_some() {
            return serde_json::from_value(value)
                .map(Self::Subscribe)
                .map_err(malformed);
        }

        Err(ConfigWarning::MalformedCommand {
            reason: "expected a 'subscribe' or 'unsubscribe' member".to_string(),
        })
    }
}

fn malformed(e: serde_json::Error) -> ConfigWarning {
    ConfigWarning::MalformedCommand {
        reason: e.to_string(),
    }
}
