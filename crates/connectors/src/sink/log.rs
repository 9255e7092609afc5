use crate::sink::{RecordSink, error::SinkError, fault::FaultInjector};
use async_trait::async_trait;
use model::records::record::Record;
use std::sync::Arc;
use tracing::{debug, info};

/// Sink that only reports what it would persist. Handy for dry runs.
pub struct LogSink {
    name: String,
    partition: usize,
    fault: Option<Arc<dyn FaultInjector>>,
    written: u64,
    closed: bool,
}

impl LogSink {
    pub fn new(name: impl Into<String>, partition: usize, fault: Option<Arc<dyn FaultInjector>>) -> Self {
        Self {
            name: name.into(),
            partition,
            fault,
            written: 0,
            closed: false,
        }
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

#[async_trait]
impl RecordSink for LogSink {
    async fn write_chunk(&mut self, records: &[Record]) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        if let Some(fault) = &self.fault {
            fault
                .before_write(records.len())
                .map_err(|reason| SinkError::Persistence {
                    table: self.name.clone(),
                    records: records.len(),
                    reason,
                })?;
        }

        for record in records {
            debug!(sink = %self.name, position = record.position, record = ?record.fields, "Record");
        }
        self.written += records.len() as u64;

        if let Some(fault) = &self.fault {
            fault.after_write();
        }
        info!(
            sink = %self.name,
            partition = self.partition,
            records = records.len(),
            total = self.written,
            "Number of records persisted"
        );
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.closed = true;
        Ok(())
    }
}
