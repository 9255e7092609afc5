use engine_config::error::ConfigError;
use engine_runtime::error::{ControllerError, OperatorError, StatusQueryError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to load the job definition: {0}")]
    JobDefinition(#[from] ConfigError),

    #[error("Invalid job parameters: {0}")]
    Parameters(String),

    #[error("Failed to open state at {path}: {reason}")]
    StateOpen { path: String, reason: String },

    #[error(transparent)]
    Controller(#[from] ControllerError),

    #[error(transparent)]
    StatusQuery(#[from] StatusQueryError),

    #[error(transparent)]
    Operator(#[from] OperatorError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}
