use connectors::{sink::RecordSink, source::RecordSource};
use tracing::{debug, error};

/// Owns a partition's source and sink and closes both when dropped,
/// whichever way the partition ends.
pub struct PartitionResources {
    partition: usize,
    pub(crate) source: Box<dyn RecordSource>,
    pub(crate) sink: Box<dyn RecordSink>,
}

impl PartitionResources {
    pub fn new(
        partition: usize,
        source: Box<dyn RecordSource>,
        sink: Box<dyn RecordSink>,
    ) -> Self {
        Self {
            partition,
            source,
            sink,
        }
    }

    pub fn partition(&self) -> usize {
        self.partition
    }
}

impl Drop for PartitionResources {
    fn drop(&mut self) {
        if let Err(e) = self.source.close() {
            error!(partition = self.partition, error = %e, "Failed to close record source");
        }
        if let Err(e) = self.sink.close() {
            error!(partition = self.partition, error = %e, "Failed to close record sink");
        }
        debug!(partition = self.partition, "Released partition resources");
    }
}
