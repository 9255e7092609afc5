use connectors::sink::error::SinkError;
use engine_config::error::ConfigError;
use engine_core::error::StateStoreError;
use engine_processing::error::{ListenerError, PlanningError};
use model::{
    core::identifiers::ExecutionId,
    execution::{errors::ExecutionStateError, status::BatchStatus},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobStartError {
    #[error("No job named '{0}' is registered")]
    UnknownJob(String),

    #[error("Job '{job}' requires parameter '{parameter}'")]
    MissingParameter { job: String, parameter: String },

    #[error("State error: {0}")]
    State(#[from] StateStoreError),
}

#[derive(Debug, Error)]
pub enum InvalidRestartError {
    #[error("Execution id {0} is not set; nothing to restart")]
    Unset(ExecutionId),

    #[error("Execution {0} not found")]
    NotFound(ExecutionId),

    #[error("Execution {id} is not the latest execution of its instance (latest is {latest})")]
    NotLatest { id: ExecutionId, latest: ExecutionId },

    #[error("Execution {id} is {status} and cannot be restarted")]
    NotRestartable { id: ExecutionId, status: BatchStatus },

    #[error("No job named '{0}' is registered")]
    UnknownJob(String),

    #[error("State error: {0}")]
    State(#[from] StateStoreError),
}

#[derive(Debug, Error)]
pub enum StatusQueryError {
    #[error("Execution {0} not found")]
    NotFound(ExecutionId),

    #[error("State error: {0}")]
    State(#[from] StateStoreError),
}

/// Errors from `stop`, `abandon` and orphan recovery.
#[derive(Debug, Error)]
pub enum OperatorError {
    #[error("Execution {0} not found")]
    NotFound(ExecutionId),

    #[error("Execution {id} is {status}, not running")]
    NotRunning { id: ExecutionId, status: BatchStatus },

    #[error(transparent)]
    IllegalTransition(#[from] ExecutionStateError),

    #[error("State error: {0}")]
    State(#[from] StateStoreError),
}

/// Errors surfaced by the job execution controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    JobStart(#[from] JobStartError),

    #[error(transparent)]
    InvalidRestart(#[from] InvalidRestartError),

    #[error(transparent)]
    StatusQuery(#[from] StatusQueryError),
}

/// Failures inside a running job. They end the execution as FAILED and are
/// recorded as its exit status.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Partition planning failed: {0}")]
    Planning(#[from] PlanningError),

    #[error("Failed to open sink: {0}")]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("{failed} of {total} partitions failed: {first}")]
    PartitionsFailed {
        failed: usize,
        total: usize,
        first: String,
    },

    #[error("State error: {0}")]
    State(#[from] StateStoreError),
}
