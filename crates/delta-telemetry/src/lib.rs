//! # Delta Telemetry
//!
//! Structured logging for the delta stream services.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use delta_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&TelemetryConfig::from_env())?;
//!     // Logs are now written to stderr
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DS_SERVICE_NAME` | `delta-stream` | Service name in log records |
//! | `DS_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `DS_JSON_LOGS` | `false` | Emit JSON lines instead of text |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter '{filter}': {reason}")]
    Filter { filter: String, reason: String },

    #[error("Failed to install global subscriber: {0}")]
    SubscriberInit(String),
}
