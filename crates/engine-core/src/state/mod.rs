use crate::error::StateStoreError;
use async_trait::async_trait;
use model::{
    core::identifiers::{ExecutionId, JobInstanceId, PartitionKey},
    execution::{
        checkpoint::{CheckpointRecord, StepCheckpoint},
        job::JobExecution,
        step::StepExecution,
    },
};
use std::sync::Arc;

pub mod memory;
pub mod models;
pub mod sled_store;

/// Durable per-partition progress marker.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn load_checkpoint(
        &self,
        key: &PartitionKey,
    ) -> Result<Option<CheckpointRecord>, StateStoreError>;

    /// Stores a new value. Moving a checkpoint backwards is rejected.
    async fn save_checkpoint(
        &self,
        key: &PartitionKey,
        checkpoint: StepCheckpoint,
    ) -> Result<(), StateStoreError>;

    async fn clear_checkpoint(&self, key: &PartitionKey) -> Result<(), StateStoreError>;
}

/// Execution metadata owned by the batch runtime.
#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn next_execution_id(&self) -> Result<ExecutionId, StateStoreError>;

    async fn save_execution(&self, execution: &JobExecution) -> Result<(), StateStoreError>;

    async fn load_execution(
        &self,
        id: ExecutionId,
    ) -> Result<Option<JobExecution>, StateStoreError>;

    /// Executions of one instance, oldest first.
    async fn instance_executions(
        &self,
        instance_id: &JobInstanceId,
    ) -> Result<Vec<JobExecution>, StateStoreError>;

    /// Every known execution, oldest first.
    async fn all_executions(&self) -> Result<Vec<JobExecution>, StateStoreError>;

    async fn save_step_execution(&self, step: &StepExecution) -> Result<(), StateStoreError>;

    async fn step_executions(
        &self,
        id: ExecutionId,
    ) -> Result<Vec<StepExecution>, StateStoreError>;

    async fn mark_step_complete(
        &self,
        instance_id: &JobInstanceId,
        step_name: &str,
    ) -> Result<(), StateStoreError>;

    async fn is_step_complete(
        &self,
        instance_id: &JobInstanceId,
        step_name: &str,
    ) -> Result<bool, StateStoreError>;
}

/// The two views of one state backend, handed out separately.
#[derive(Clone)]
pub struct StateHandles {
    pub repository: Arc<dyn JobRepository>,
    pub checkpoints: Arc<dyn CheckpointStore>,
}

impl StateHandles {
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: JobRepository + CheckpointStore + 'static,
    {
        Self {
            repository: store.clone(),
            checkpoints: store,
        }
    }
}
