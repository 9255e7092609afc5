use serde::{Deserialize, Serialize};

/// What a step does with a record the source could not map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum RecordErrorPolicy {
    /// The first bad record fails the step.
    #[default]
    Abort,
    /// Up to `limit` bad records per partition are skipped.
    Skip { limit: u64 },
}

impl RecordErrorPolicy {
    pub fn allows_skip(&self, skipped_so_far: u64) -> bool {
        match self {
            RecordErrorPolicy::Abort => false,
            RecordErrorPolicy::Skip { limit } => skipped_so_far < *limit,
        }
    }
}
