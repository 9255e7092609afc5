use crate::file::delimited::error::SourceError;
use model::{execution::checkpoint::StepCheckpoint, records::record::Record};

/// Resumable, sequential reader over a record stream.
pub trait RecordSource: Send {
    /// Opens the stream, skipping exactly `resume` records when given.
    fn open(&mut self, resume: Option<StepCheckpoint>) -> Result<(), SourceError>;

    /// Next record, or `None` once the stream is exhausted.
    fn read_next(&mut self) -> Result<Option<Record>, SourceError>;

    /// Records consumed so far, including the resume offset.
    fn checkpoint(&self) -> StepCheckpoint;

    /// Releases the stream. Idempotent.
    fn close(&mut self) -> Result<(), SourceError>;
}
