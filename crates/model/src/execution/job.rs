use crate::{
    core::identifiers::{ExecutionId, JobInstanceId},
    execution::{errors::ExecutionStateError, parameters::JobParameters, status::BatchStatus},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of one run (or restart) of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobExecution {
    pub execution_id: ExecutionId,
    pub instance_id: JobInstanceId,
    pub job_name: String,
    pub status: BatchStatus,
    pub parameters: JobParameters,
    pub create_time: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub exit_status: Option<String>,
}

impl JobExecution {
    pub fn new(
        execution_id: ExecutionId,
        instance_id: JobInstanceId,
        job_name: impl Into<String>,
        parameters: JobParameters,
    ) -> Self {
        Self {
            execution_id,
            instance_id,
            job_name: job_name.into(),
            status: BatchStatus::Starting,
            parameters,
            create_time: Utc::now(),
            start_time: None,
            end_time: None,
            exit_status: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Applies a status change, enforcing the execution lifecycle:
    /// STARTING -> STARTED -> {COMPLETED, FAILED, STOPPED}, STARTING -> FAILED/STOPPED,
    /// and FAILED/STOPPED -> ABANDONED. Terminal executions are otherwise immutable.
    pub fn transition(&mut self, to: BatchStatus) -> Result<(), ExecutionStateError> {
        use BatchStatus::*;

        let allowed = matches!(
            (self.status, to),
            (Starting, Started)
                | (Starting, Failed)
                | (Starting, Stopped)
                | (Started, Completed)
                | (Started, Failed)
                | (Started, Stopped)
                | (Failed, Abandoned)
                | (Stopped, Abandoned)
        );
        if !allowed {
            return Err(ExecutionStateError::IllegalTransition {
                from: self.status,
                to,
            });
        }

        let now = Utc::now();
        if to == Started {
            self.start_time = Some(now);
        }
        if to.is_terminal() && self.end_time.is_none() {
            self.end_time = Some(now);
        }
        self.status = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn execution() -> JobExecution {
        JobExecution::new(
            ExecutionId::new(1),
            JobInstanceId::new("job-report-0"),
            "job-report",
            JobParameters::new(),
        )
    }

    #[test]
    fn walks_the_happy_path() {
        let mut exec = execution();
        assert_eq!(exec.status, BatchStatus::Starting);

        exec.transition(BatchStatus::Started).unwrap();
        assert!(exec.start_time.is_some());
        assert!(exec.end_time.is_none());

        exec.transition(BatchStatus::Completed).unwrap();
        assert!(exec.end_time.is_some());
        assert!(exec.is_terminal());
    }

    #[test]
    fn terminal_execution_is_immutable() {
        let mut exec = execution();
        exec.transition(BatchStatus::Started).unwrap();
        exec.transition(BatchStatus::Completed).unwrap();

        let err = exec.transition(BatchStatus::Started).unwrap_err();
        assert_eq!(
            err,
            ExecutionStateError::IllegalTransition {
                from: BatchStatus::Completed,
                to: BatchStatus::Started
            }
        );
        assert!(exec.transition(BatchStatus::Abandoned).is_err());
    }

    #[test]
    fn failed_execution_can_be_abandoned() {
        let mut exec = execution();
        exec.transition(BatchStatus::Started).unwrap();
        exec.transition(BatchStatus::Failed).unwrap();
        let end = exec.end_time;

        exec.transition(BatchStatus::Abandoned).unwrap();
        assert_eq!(exec.status, BatchStatus::Abandoned);
        assert_eq!(exec.end_time, end);
    }
}
