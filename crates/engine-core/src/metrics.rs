use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    records_read: AtomicU64,
    records_written: AtomicU64,
    records_skipped: AtomicU64,
    chunks_committed: AtomicU64,
    bytes_written: AtomicU64,
    failure_count: AtomicU64,
}

/// Step counters shared by all partitions of a step.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub records_read: u64,
    pub records_written: u64,
    pub records_skipped: u64,
    pub chunks_committed: u64,
    pub bytes_written: u64,
    pub failure_count: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn increment_read(&self, count: u64) {
        self.inner.records_read.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_skipped(&self, count: u64) {
        self.inner.records_skipped.fetch_add(count, Ordering::Relaxed);
    }

    /// Accounts one committed chunk.
    pub fn record_commit(&self, records: u64, bytes: u64) {
        self.inner.records_written.fetch_add(records, Ordering::Relaxed);
        self.inner.bytes_written.fetch_add(bytes, Ordering::Relaxed);
        self.inner.chunks_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failures(&self, count: u64) {
        self.inner.failure_count.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_read: self.inner.records_read.load(Ordering::Relaxed),
            records_written: self.inner.records_written.load(Ordering::Relaxed),
            records_skipped: self.inner.records_skipped.load(Ordering::Relaxed),
            chunks_committed: self.inner.chunks_committed.load(Ordering::Relaxed),
            bytes_written: self.inner.bytes_written.load(Ordering::Relaxed),
            failure_count: self.inner.failure_count.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_counters() {
        let metrics = Metrics::new();
        let other = metrics.clone();

        metrics.increment_read(3);
        other.record_commit(3, 120);
        other.increment_skipped(1);

        let snap = metrics.snapshot();
        assert_eq!(snap.records_read, 3);
        assert_eq!(snap.records_written, 3);
        assert_eq!(snap.chunks_committed, 1);
        assert_eq!(snap.bytes_written, 120);
        assert_eq!(snap.records_skipped, 1);
    }
}
