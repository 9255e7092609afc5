use crate::sink::error::SinkError;
use async_trait::async_trait;
use model::{core::value::Value, records::record::Record};

pub mod error;
pub mod fault;
pub mod log;
pub mod table;

/// Persists chunks of records, one atomic write per chunk.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Persists every record or none of them.
    async fn write_chunk(&mut self, records: &[Record]) -> Result<(), SinkError>;

    /// Releases the underlying handle. Idempotent.
    fn close(&mut self) -> Result<(), SinkError>;
}

/// Capability to perform one atomic write of rows into a named table.
///
/// Handed to listeners so their side effects do not depend on a concrete store.
#[async_trait]
pub trait TransactionalWrite: Send + Sync {
    async fn write_atomic(&self, table: &str, rows: Vec<Vec<Value>>) -> Result<(), SinkError>;
}
