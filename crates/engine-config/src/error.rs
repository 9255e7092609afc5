use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, validating or resolving job definitions.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read job definition '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid job definition '{location}': {source}")]
    Parse {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Job '{job}' failed validation: {}", .errors.join("; "))]
    ValidationFailed { job: String, errors: Vec<String> },

    #[error("Job '{0}' is already registered")]
    DuplicateJob(String),

    #[error("Unresolved property '{placeholder}' in '{input}'")]
    UnresolvedPlaceholder { placeholder: String, input: String },

    #[error("Unterminated property reference in '{0}'")]
    UnterminatedPlaceholder(String),
}
