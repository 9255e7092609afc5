use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// A required setting is absent or invalid. Raised before any I/O.
    #[error("Source configuration error: {0}")]
    Configuration(String),

    #[error("Resource not found: {kind} '{location}'")]
    ResourceNotFound { kind: &'static str, location: String },

    #[error("Invalid mapping file '{location}': {reason}")]
    InvalidMapping { location: String, reason: String },

    /// The resume point lies beyond the end of the stream.
    #[error("Failed to skip {requested} records, end of stream reached after {skipped}")]
    CheckpointMismatch { requested: u64, skipped: u64 },

    #[error("Malformed record at position {position}: {reason}")]
    MalformedRecord { position: u64, reason: String },

    #[error("Unidentified record at position {position}: {reason}")]
    UnidentifiedRecord { position: u64, reason: String },

    #[error("Source is not open")]
    NotOpen,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Delimited parsing error: {0}")]
    Csv(#[from] csv::Error),
}

impl SourceError {
    /// Per-record errors leave the stream usable; a step policy may skip them.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            SourceError::MalformedRecord { .. } | SourceError::UnidentifiedRecord { .. }
        )
    }
}
