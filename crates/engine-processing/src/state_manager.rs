use engine_core::{error::StateStoreError, state::CheckpointStore};
use model::{core::identifiers::PartitionKey, execution::checkpoint::StepCheckpoint};
use std::sync::Arc;
use tracing::info;

/// Checkpoint access for one partition of one step.
pub struct CheckpointManager {
    key: PartitionKey,
    store: Arc<dyn CheckpointStore>,
}

impl CheckpointManager {
    pub fn new(key: PartitionKey, store: Arc<dyn CheckpointStore>) -> Self {
        Self { key, store }
    }

    pub fn key(&self) -> &PartitionKey {
        &self.key
    }

    /// The checkpoint left by a previous execution, if any.
    pub async fn resume_point(&self) -> Result<Option<StepCheckpoint>, StateStoreError> {
        match self.store.load_checkpoint(&self.key).await? {
            Some(record) => {
                info!(
                    key = %self.key,
                    checkpoint = record.checkpoint.items(),
                    updated_at = %record.updated_at,
                    "Resuming from checkpoint"
                );
                Ok(Some(record.checkpoint))
            }
            None => {
                info!(key = %self.key, "No checkpoint found, starting from beginning");
                Ok(None)
            }
        }
    }

    pub async fn commit(&self, checkpoint: StepCheckpoint) -> Result<(), StateStoreError> {
        self.store.save_checkpoint(&self.key, checkpoint).await
    }

    /// Discards the checkpoint once the step has completed.
    pub async fn clear(&self) -> Result<(), StateStoreError> {
        self.store.clear_checkpoint(&self.key).await
    }
}
