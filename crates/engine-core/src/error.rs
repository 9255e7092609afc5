use model::execution::checkpoint::StepCheckpoint;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateStoreError {
    #[error("Failed to save checkpoint: {0}")]
    SaveCheckpoint(String),

    #[error("Failed to load checkpoint: {0}")]
    LoadCheckpoint(String),

    #[error("Checkpoint for '{key}' cannot move back from {current:?} to {requested:?}")]
    CheckpointRegression {
        key: String,
        current: StepCheckpoint,
        requested: StepCheckpoint,
    },

    #[error("Failed to save execution: {0}")]
    SaveExecution(String),

    #[error("Failed to load execution: {0}")]
    LoadExecution(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("Encoding error: {0}")]
    Encoding(#[from] bincode::Error),
}
