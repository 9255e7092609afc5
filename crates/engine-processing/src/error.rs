use crate::chunk::state::ChunkState;
use connectors::{file::delimited::error::SourceError, sink::error::SinkError};
use engine_core::error::StateStoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// The chunk was not committed and the checkpoint did not move.
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] StateStoreError),

    #[error("Skip limit of {limit} exceeded: {source}")]
    SkipLimitExceeded {
        limit: u64,
        #[source]
        source: SourceError,
    },

    #[error("Illegal chunk state change from {from:?} to {to:?}")]
    IllegalState { from: ChunkState, to: ChunkState },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanningError {
    #[error("Partition count must be at least 1, got {0}")]
    NoPartitions(usize),

    #[error("Expected properties for {expected} partitions, got {actual}")]
    PropertyCountMismatch { expected: usize, actual: usize },
}

#[derive(Error, Debug)]
pub enum ListenerError {
    #[error("Listener '{listener}' failed in {hook}: {reason}")]
    Hook {
        listener: String,
        hook: &'static str,
        reason: String,
    },

    #[error("Listener write failed: {0}")]
    Write(#[from] SinkError),
}
