use std::{
    fmt::Debug,
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
};
use tracing::warn;

/// Hook consulted by sinks before a chunk is applied. Used to exercise
/// failure and restart handling deterministically.
pub trait FaultInjector: Send + Sync + Debug {
    /// Returns an error message when the upcoming write must fail.
    fn before_write(&self, records: usize) -> Result<(), String>;

    /// Called after a chunk was durably written.
    fn after_write(&self);
}

/// Fails exactly once, on the write that follows `threshold` successful writes.
#[derive(Debug)]
pub struct FailAfterWrites {
    threshold: u64,
    successes: AtomicU64,
    fired: AtomicBool,
}

impl FailAfterWrites {
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold,
            successes: AtomicU64::new(0),
            fired: AtomicBool::new(false),
        }
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

impl FaultInjector for FailAfterWrites {
    fn before_write(&self, records: usize) -> Result<(), String> {
        if self.successes.load(Ordering::SeqCst) == self.threshold
            && !self.fired.swap(true, Ordering::SeqCst)
        {
            warn!(
                records,
                after = self.threshold,
                "Injected write failure for chunk"
            );
            return Err(format!(
                "injected failure after {} successful writes",
                self.threshold
            ));
        }
        Ok(())
    }

    fn after_write(&self) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }
}
