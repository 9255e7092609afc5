use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Count of records durably committed for one partition of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StepCheckpoint(u64);

impl StepCheckpoint {
    pub const ZERO: StepCheckpoint = StepCheckpoint(0);

    pub fn new(items: u64) -> Self {
        Self(items)
    }

    pub fn items(&self) -> u64 {
        self.0
    }

    pub fn advance(self, committed: u64) -> Self {
        Self(self.0 + committed)
    }
}

/// A checkpoint as persisted by a checkpoint store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub checkpoint: StepCheckpoint,
    pub updated_at: DateTime<Utc>,
}

impl CheckpointRecord {
    pub fn now(checkpoint: StepCheckpoint) -> Self {
        Self {
            checkpoint,
            updated_at: Utc::now(),
        }
    }
}
