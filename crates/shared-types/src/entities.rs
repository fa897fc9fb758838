//! # Core Domain Entities
//!
//! Defines the telemetry entities that flow through the bus.
//!
//! ## Clusters
//!
//! - **Wire input**: `Delta`, `Update`, `SourceRef`, `PathValue`
//! - **Normalized data**: `NormalizedRecord`, `RecordIdentity`
//! - **Geography**: `Position`

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key under which an entity publishes its own position.
pub const POSITION_PATH: &str = "navigation.position";

/// Source identifier used when an update carries no source information.
pub const UNKNOWN_SOURCE: &str = "unknown";

// =============================================================================
// CLUSTER A: NORMALIZED DATA
// =============================================================================

/// One value of one key for one context, flattened out of a delta.
///
/// Records are immutable once produced; every stage clones rather than mutates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Entity the value belongs to (e.g. `vessels.urn:mrn:imo:mmsi:230099999`).
    pub context: String,
    /// Identifier of the device or connection that produced the value.
    pub source: String,
    /// Dotted key of the signal (e.g. `navigation.speedOverGround`).
    pub path: String,
    /// The value itself, kept in its JSON form.
    pub value: Value,
    /// RFC 3339 timestamp as carried on the wire.
    pub timestamp: String,
}

impl NormalizedRecord {
    /// Create a new record.
    pub fn new(
        context: impl Into<String>,
        source: impl Into<String>,
        path: impl Into<String>,
        value: Value,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            context: context.into(),
            source: source.into(),
            path: path.into(),
            value,
            timestamp: timestamp.into(),
        }
    }

    /// Identity used to collapse duplicates: context + source + path.
    #[must_use]
    pub fn identity(&self) -> RecordIdentity {
        RecordIdentity {
            context: self.context.clone(),
            source: self.source.clone(),
            path: self.path.clone(),
        }
    }
}

/// Deduplication identity of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordIdentity {
    pub context: String,
    pub source: String,
    pub path: String,
}

// =============================================================================
// CLUSTER B: GEOGRAPHY
// =============================================================================

/// A position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Extract a position from a `navigation.position` value.
    ///
    /// Returns `None` unless both coordinates are present and finite.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let latitude = value.get("latitude")?.as_f64()?;
        let longitude = value.get("longitude")?.as_f64()?;
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        Some(Self::new(latitude, longitude))
    }
}

// =============================================================================
// CLUSTER C: WIRE INPUT
// =============================================================================

/// An inbound delta: updates for one context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    /// Context of every value in the delta; absent means the self context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default)]
    pub updates: Vec<Update>,
}

/// A batch of values sharing one source and timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Update {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceRef>,
    /// Precomputed source reference, preferred over `source` when present.
    #[serde(rename = "$source", default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub values: Vec<PathValue>,
}

/// Structured description of where an update came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub label: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}

/// A single key/value pair inside an update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathValue {
    pub path: String,
    pub value: Value,
}

impl Update {
    /// Resolve the source identifier of this update.
    ///
    /// `$source` wins, then `label.src`, then `label`, then [`UNKNOWN_SOURCE`].
    #[must_use]
    pub fn source_id(&self) -> String {
        if let Some(source_ref) = &self.source_ref {
            return source_ref.clone();
        }
        match &self.source {
            Some(SourceRef {
                label,
                src: Some(src),
                ..
            }) => format!("{label}.{src}"),
            Some(SourceRef { label, .. }) => label.clone(),
            None => UNKNOWN_SOURCE.to_string(),
        }
    }
}

impl Delta {
    /// Parse a delta from its JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Flatten the delta into one record per value.
    ///
    /// Updates without a timestamp are stamped with the current time.
    #[must_use]
    pub fn normalize(&self, default_context: &str) -> Vec<NormalizedRecord> {
        let context = self.context.as_deref().unwrap_or(default_context);
        let mut records = Vec::new();

        for update in &self.updates {
            let source = update.source_id();
            let timestamp = update
                .timestamp
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

            records.extend(update.values.iter().map(|pv| {
                NormalizedRecord::new(
                    context,
                    source.clone(),
                    pv.path.clone(),
                    pv.value.clone(),
                    timestamp.clone(),
                )
            }));
        }

        records
    }
}
