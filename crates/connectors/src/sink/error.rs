use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    /// The chunk was not committed; nothing from it is visible.
    #[error("Failed to persist {records} records to '{table}': {reason}")]
    Persistence {
        table: String,
        records: usize,
        reason: String,
    },

    #[error("Sink configuration error: {0}")]
    Configuration(String),

    #[error("Sink is closed")]
    Closed,

    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
