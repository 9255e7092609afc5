use crate::{
    error::StateStoreError,
    state::{CheckpointStore, JobRepository, models::Keys},
};
use async_trait::async_trait;
use model::{
    core::identifiers::{ExecutionId, JobInstanceId, PartitionKey},
    execution::{
        checkpoint::{CheckpointRecord, StepCheckpoint},
        job::JobExecution,
        step::StepExecution,
    },
};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::atomic::{AtomicI64, Ordering},
};
use tokio::sync::RwLock;

/// Non-durable state backend. State lives as long as the store.
#[derive(Default)]
pub struct MemoryStateStore {
    next_id: AtomicI64,
    checkpoints: RwLock<HashMap<String, CheckpointRecord>>,
    executions: RwLock<BTreeMap<ExecutionId, JobExecution>>,
    steps: RwLock<BTreeMap<String, StepExecution>>,
    completed: RwLock<HashSet<String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for MemoryStateStore {
    async fn load_checkpoint(
        &self,
        key: &PartitionKey,
    ) -> Result<Option<CheckpointRecord>, StateStoreError> {
        let checkpoints = self.checkpoints.read().await;
        Ok(checkpoints.get(&Keys::checkpoint(key)).cloned())
    }

    async fn save_checkpoint(
        &self,
        key: &PartitionKey,
        checkpoint: StepCheckpoint,
    ) -> Result<(), StateStoreError> {
        let db_key = Keys::checkpoint(key);
        let mut checkpoints = self.checkpoints.write().await;
        if let Some(existing) = checkpoints.get(&db_key) {
            if checkpoint < existing.checkpoint {
                return Err(StateStoreError::CheckpointRegression {
                    key: db_key,
                    current: existing.checkpoint,
                    requested: checkpoint,
                });
            }
        }
        checkpoints.insert(db_key, CheckpointRecord::now(checkpoint));
        Ok(())
    }

    async fn clear_checkpoint(&self, key: &PartitionKey) -> Result<(), StateStoreError> {
        self.checkpoints.write().await.remove(&Keys::checkpoint(key));
        Ok(())
    }
}

#[async_trait]
impl JobRepository for MemoryStateStore {
    async fn next_execution_id(&self) -> Result<ExecutionId, StateStoreError> {
        Ok(ExecutionId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1))
    }

    async fn save_execution(&self, execution: &JobExecution) -> Result<(), StateStoreError> {
        self.executions
            .write()
            .await
            .insert(execution.execution_id, execution.clone());
        Ok(())
    }

    async fn load_execution(
        &self,
        id: ExecutionId,
    ) -> Result<Option<JobExecution>, StateStoreError> {
        Ok(self.executions.read().await.get(&id).cloned())
    }

    async fn instance_executions(
        &self,
        instance_id: &JobInstanceId,
    ) -> Result<Vec<JobExecution>, StateStoreError> {
        Ok(self
            .executions
            .read()
            .await
            .values()
            .filter(|e| &e.instance_id == instance_id)
            .cloned()
            .collect())
    }

    async fn all_executions(&self) -> Result<Vec<JobExecution>, StateStoreError> {
        Ok(self.executions.read().await.values().cloned().collect())
    }

    async fn save_step_execution(&self, step: &StepExecution) -> Result<(), StateStoreError> {
        self.steps.write().await.insert(
            Keys::step_execution(step.execution_id, &step.step_name),
            step.clone(),
        );
        Ok(())
    }

    async fn step_executions(
        &self,
        id: ExecutionId,
    ) -> Result<Vec<StepExecution>, StateStoreError> {
        let prefix = Keys::step_prefix(id);
        let mut steps: Vec<StepExecution> = self
            .steps
            .read()
            .await
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, step)| step.clone())
            .collect();
        steps.sort_by_key(|s| s.start_time);
        Ok(steps)
    }

    async fn mark_step_complete(
        &self,
        instance_id: &JobInstanceId,
        step_name: &str,
    ) -> Result<(), StateStoreError> {
        self.completed
            .write()
            .await
            .insert(Keys::step_done(instance_id, step_name));
        Ok(())
    }

    async fn is_step_complete(
        &self,
        instance_id: &JobInstanceId,
        step_name: &str,
    ) -> Result<bool, StateStoreError> {
        Ok(self
            .completed
            .read()
            .await
            .contains(&Keys::step_done(instance_id, step_name)))
    }
}
