use crate::{
    chunk::{config::ChunkConfig, guard::PartitionResources, state::ChunkState},
    error::ProcessingError,
    state_manager::CheckpointManager,
};
use engine_config::settings::policy::RecordErrorPolicy;
use engine_core::metrics::Metrics;
use model::{execution::checkpoint::StepCheckpoint, records::chunk::Chunk};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How a partition's chunk loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionOutcome {
    pub partition: usize,
    /// `Done` or `Stopped`.
    pub state: ChunkState,
    pub checkpoint: StepCheckpoint,
    pub read: u64,
    pub written: u64,
    pub skipped: u64,
    pub chunks: u64,
}

/// Runs read, write, checkpoint cycles for one partition.
///
/// A chunk is either written and its checkpoint advanced by exactly the
/// records it consumed, or nothing is committed and the checkpoint stays put.
pub struct ChunkProcessor {
    resources: PartitionResources,
    checkpoints: CheckpointManager,
    metrics: Metrics,
    config: ChunkConfig,
    cancel: CancellationToken,
    state: ChunkState,
    items: StepCheckpoint,
    read: u64,
    written: u64,
    skipped: u64,
    chunks: u64,
}

impl ChunkProcessor {
    pub fn new(
        resources: PartitionResources,
        checkpoints: CheckpointManager,
        metrics: Metrics,
        config: ChunkConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            resources,
            checkpoints,
            metrics,
            config,
            cancel,
            state: ChunkState::Init,
            items: StepCheckpoint::ZERO,
            read: 0,
            written: 0,
            skipped: 0,
            chunks: 0,
        }
    }

    pub fn state(&self) -> ChunkState {
        self.state
    }

    /// Consumes the processor. Source and sink are released on every path.
    pub async fn run(mut self) -> Result<PartitionOutcome, ProcessingError> {
        match self.execute().await {
            Ok(()) => Ok(self.outcome()),
            Err(e) => {
                self.state = ChunkState::Failed;
                self.metrics.increment_failures(1);
                error!(
                    partition = self.resources.partition(),
                    checkpoint = self.items.items(),
                    error = %e,
                    "Partition failed"
                );
                Err(e)
            }
        }
    }

    async fn execute(&mut self) -> Result<(), ProcessingError> {
        let partition = self.resources.partition();
        let prior = self.checkpoints.resume_point().await?;
        self.resources.source.open(prior)?;
        self.items = prior.unwrap_or(StepCheckpoint::ZERO);

        info!(
            partition,
            key = %self.checkpoints.key(),
            start = self.items.items(),
            chunk_size = self.config.chunk_size,
            "Starting chunk processing"
        );

        loop {
            if self.cancel.is_cancelled() {
                self.transition(ChunkState::Stopped)?;
                warn!(partition, checkpoint = self.items.items(), "Partition stopped");
                return Ok(());
            }

            self.transition(ChunkState::Reading)?;
            let mut chunk = Chunk::with_capacity(self.config.chunk_size);
            let exhausted = self.fill(&mut chunk)?;

            if chunk.consumed() == 0 {
                // End of stream with nothing pending: no empty write.
                self.transition(ChunkState::Draining)?;
                break;
            }

            if !chunk.is_empty() {
                self.transition(ChunkState::Writing)?;
                self.resources.sink.write_chunk(chunk.records()).await?;
            }

            self.transition(ChunkState::Checkpointing)?;
            let next = self.items.advance(chunk.consumed());
            self.checkpoints.commit(next).await?;
            self.items = next;

            self.written += chunk.len() as u64;
            self.chunks += 1;
            self.metrics
                .record_commit(chunk.len() as u64, chunk.size_bytes() as u64);
            debug!(
                partition,
                records = chunk.len(),
                skipped = chunk.skipped(),
                checkpoint = next.items(),
                "Chunk committed"
            );

            if exhausted {
                self.transition(ChunkState::Draining)?;
                break;
            }
        }

        self.transition(ChunkState::Done)?;
        info!(
            partition,
            read = self.read,
            written = self.written,
            skipped = self.skipped,
            checkpoint = self.items.items(),
            "Partition completed"
        );
        Ok(())
    }

    /// Reads until the chunk is full or the stream ends. Returns true at end of stream.
    fn fill(&mut self, chunk: &mut Chunk) -> Result<bool, ProcessingError> {
        while !chunk.is_full() {
            match self.resources.source.read_next() {
                Ok(Some(record)) => {
                    self.read += 1;
                    self.metrics.increment_read(1);
                    chunk.push(record);
                }
                Ok(None) => return Ok(true),
                Err(e) if e.is_record_level() => match self.config.error_policy {
                    RecordErrorPolicy::Abort => return Err(e.into()),
                    policy @ RecordErrorPolicy::Skip { limit } => {
                        if !policy.allows_skip(self.skipped) {
                            return Err(ProcessingError::SkipLimitExceeded { limit, source: e });
                        }
                        warn!(
                            partition = self.resources.partition(),
                            error = %e,
                            "Skipping record"
                        );
                        self.skipped += 1;
                        self.metrics.increment_skipped(1);
                        chunk.mark_skipped();
                    }
                },
                Err(e) => return Err(e.into()),
            }
        }
        Ok(false)
    }

    fn transition(&mut self, to: ChunkState) -> Result<(), ProcessingError> {
        if !self.state.can_transition(to) {
            return Err(ProcessingError::IllegalState {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }

    fn outcome(&self) -> PartitionOutcome {
        PartitionOutcome {
            partition: self.resources.partition(),
            state: self.state,
            checkpoint: self.items,
            read: self.read,
            written: self.written,
            skipped: self.skipped,
            chunks: self.chunks,
        }
    }
}
