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
use serde::de::DeserializeOwned;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use std::path::Path;
use tracing::{debug, warn};

/// Job repository and checkpoint store backed by a single sled database.
pub struct SledStateStore {
    db: sled::Db,
}

impl SledStateStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, sled::Error> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// The underlying database, shared with table sinks living in the same directory.
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    fn scan<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>, StateStoreError> {
        let mut values = Vec::new();
        for item in self.db.scan_prefix(prefix) {
            let (_key, value) = item?;
            values.push(bincode::deserialize(&value)?);
        }
        Ok(values)
    }
}

#[async_trait]
impl CheckpointStore for SledStateStore {
    async fn load_checkpoint(
        &self,
        key: &PartitionKey,
    ) -> Result<Option<CheckpointRecord>, StateStoreError> {
        match self.db.get(Keys::checkpoint(key))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn save_checkpoint(
        &self,
        key: &PartitionKey,
        checkpoint: StepCheckpoint,
    ) -> Result<(), StateStoreError> {
        let db_key = Keys::checkpoint(key);
        let new_bytes = bincode::serialize(&CheckpointRecord::now(checkpoint))?;

        // Check-then-set inside a transaction so a stale writer cannot move
        // the checkpoint backwards.
        let result = self.db.transaction::<_, _, StateStoreError>(|tx_db| {
            if let Some(existing_bytes) = tx_db.get(&db_key)? {
                let existing: CheckpointRecord = bincode::deserialize(&existing_bytes)
                    .map_err(|e| ConflictableTransactionError::Abort(e.into()))?;

                if checkpoint < existing.checkpoint {
                    return Err(ConflictableTransactionError::Abort(
                        StateStoreError::CheckpointRegression {
                            key: db_key.clone(),
                            current: existing.checkpoint,
                            requested: checkpoint,
                        },
                    ));
                }
            }

            tx_db.insert(db_key.as_bytes(), new_bytes.as_slice())?;
            Ok(())
        });

        match result {
            Ok(()) => {
                self.db.flush_async().await?;
                debug!(key = %key, items = checkpoint.items(), "Checkpoint saved");
                Ok(())
            }
            Err(TransactionError::Abort(e)) => {
                warn!(key = %key, error = %e, "Checkpoint save rejected");
                Err(e)
            }
            Err(TransactionError::Storage(e)) => Err(StateStoreError::Storage(e)),
        }
    }

    async fn clear_checkpoint(&self, key: &PartitionKey) -> Result<(), StateStoreError> {
        self.db.remove(Keys::checkpoint(key))?;
        self.db.flush_async().await?;
        Ok(())
    }
}

#[async_trait]
impl JobRepository for SledStateStore {
    async fn next_execution_id(&self) -> Result<ExecutionId, StateStoreError> {
        // sled ids start at 0; execution ids must be positive.
        let id = self.db.generate_id()? + 1;
        Ok(ExecutionId::new(id as i64))
    }

    async fn save_execution(&self, execution: &JobExecution) -> Result<(), StateStoreError> {
        let bytes = bincode::serialize(execution)?;
        let mut batch = sled::Batch::default();
        batch.insert(Keys::execution(execution.execution_id).as_bytes(), bytes);
        batch.insert(
            Keys::instance_execution(&execution.instance_id, execution.execution_id).as_bytes(),
            Vec::<u8>::new(),
        );
        self.db
            .apply_batch(batch)
            .map_err(|e| StateStoreError::SaveExecution(e.to_string()))?;
        self.db.flush_async().await?;
        Ok(())
    }

    async fn load_execution(
        &self,
        id: ExecutionId,
    ) -> Result<Option<JobExecution>, StateStoreError> {
        match self
            .db
            .get(Keys::execution(id))
            .map_err(|e| StateStoreError::LoadExecution(e.to_string()))?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn instance_executions(
        &self,
        instance_id: &JobInstanceId,
    ) -> Result<Vec<JobExecution>, StateStoreError> {
        let mut executions = Vec::new();
        for item in self.db.scan_prefix(Keys::instance_prefix(instance_id)) {
            let (key, _) = item?;
            let id = std::str::from_utf8(&key)
                .ok()
                .and_then(|k| k.rsplit(':').next())
                .and_then(|id| id.parse::<ExecutionId>().ok())
                .ok_or_else(|| StateStoreError::LoadExecution("corrupt instance index".into()))?;
            if let Some(execution) = self.load_execution(id).await? {
                executions.push(execution);
            }
        }
        Ok(executions)
    }

    async fn all_executions(&self) -> Result<Vec<JobExecution>, StateStoreError> {
        self.scan("exec:")
    }

    async fn save_step_execution(&self, step: &StepExecution) -> Result<(), StateStoreError> {
        let bytes = bincode::serialize(step)?;
        self.db
            .insert(Keys::step_execution(step.execution_id, &step.step_name), bytes)?;
        self.db.flush_async().await?;
        Ok(())
    }

    async fn step_executions(
        &self,
        id: ExecutionId,
    ) -> Result<Vec<StepExecution>, StateStoreError> {
        let mut steps: Vec<StepExecution> = self.scan(&Keys::step_prefix(id))?;
        steps.sort_by_key(|s| s.start_time);
        Ok(steps)
    }

    async fn mark_step_complete(
        &self,
        instance_id: &JobInstanceId,
        step_name: &str,
    ) -> Result<(), StateStoreError> {
        self.db
            .insert(Keys::step_done(instance_id, step_name), Vec::<u8>::new())?;
        self.db.flush_async().await?;
        Ok(())
    }

    async fn is_step_complete(
        &self,
        instance_id: &JobInstanceId,
        step_name: &str,
    ) -> Result<bool, StateStoreError> {
        Ok(self
            .db
            .contains_key(Keys::step_done(instance_id, step_name))?)
    }
}
