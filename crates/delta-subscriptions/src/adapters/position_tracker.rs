//! Last known position per context.

use std::collections::HashMap;

use parking_lot::RwLock;
use shared_types::{NormalizedRecord, Position, POSITION_PATH};
use tracing::trace;

use crate::ports::EntitySnapshot;

/// Entity positions fed from `navigation.position` records.
#[derive(Debug, Default)]
pub struct PositionTracker {
    positions: RwLock<HashMap<String, Position>>,
}

impl PositionTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Update from `record` if it carries a position.
    ///
    /// Returns whether the record was a usable position fix.
    pub fn observe(&self, record: &NormalizedRecord) -> bool {
        if record.path != POSITION_PATH {
            return false;
        }
        let Some(position) = Position::from_value(&record.value) else {
            trace!(context = %record.context, "Ignoring malformed position");
            return false;
        };
        self.set_position(&record.context, position);
        true
    }

    pub fn set_position(&self, context: &str, position: Position) {
        self.positions.write().insert(context.to_string(), position);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.read().is_empty()
    }
}

impl EntitySnapshot for PositionTracker {
    fn position_of(&self, context: &str) -> Option<Position> {
        self.positions.read().get(context).copied()
    }
}
