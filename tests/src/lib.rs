//! # Delta Stream Test Suite
//!
//! Cross-crate tests driving the engine the way a server does: deltas enter
//! through `DeltaIngest`, clients subscribe through the registrar or a
//! `ClientSession`.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── support.rs    # Shared engine fixture
//!     ├── flows.rs      # Ingest → match → deliver, replay
//!     ├── geofence.rs   # Radius contexts fed by live positions
//!     └── lifecycle.rs  # Detach, re-entrancy, concurrency
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p delta-tests
//! cargo test -p delta-tests integration::geofence
//! ```

pub mod integration;
