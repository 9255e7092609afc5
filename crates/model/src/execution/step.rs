use crate::{core::identifiers::ExecutionId, execution::status::BatchStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one step within a job execution, aggregated over its partitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepExecution {
    pub execution_id: ExecutionId,
    pub step_name: String,
    pub status: BatchStatus,
    pub partitions: usize,
    pub items_read: u64,
    pub items_written: u64,
    pub items_skipped: u64,
    pub commit_count: u64,
    /// JSON text recorded on the step context by a partition mapper.
    pub persistent_user_data: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub exit_status: Option<String>,
}

impl StepExecution {
    pub fn started(execution_id: ExecutionId, step_name: impl Into<String>) -> Self {
        Self {
            execution_id,
            step_name: step_name.into(),
            status: BatchStatus::Started,
            partitions: 0,
            items_read: 0,
            items_written: 0,
            items_skipped: 0,
            commit_count: 0,
            persistent_user_data: None,
            start_time: Utc::now(),
            end_time: None,
            exit_status: None,
        }
    }

    pub fn finish(&mut self, status: BatchStatus, exit_status: Option<String>) {
        self.status = status;
        self.exit_status = exit_status;
        self.end_time = Some(Utc::now());
    }
}
