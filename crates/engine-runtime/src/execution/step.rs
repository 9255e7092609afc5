use crate::{
    error::ExecutionError,
    execution::factory::{self, RuntimeEnv},
};
use engine_config::settings::StepDefinition;
use engine_core::{context::step::StepContext, metrics::Metrics, state::StateHandles};
use engine_processing::{
    chunk::{
        config::ChunkConfig,
        processor::{ChunkProcessor, PartitionOutcome},
        state::ChunkState,
    },
    listener::{StepListener, step_listeners},
    partition::mapper_for,
    state_manager::CheckpointManager,
};
use model::{
    core::identifiers::{ExecutionId, JobInstanceId, PartitionKey},
    execution::{parameters::JobParameters, status::BatchStatus, step::StepExecution},
};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Runs one step: plans partitions, fans them out, aggregates the result.
pub struct StepRunner<'a> {
    step: &'a StepDefinition,
    execution_id: ExecutionId,
    instance_id: &'a JobInstanceId,
    job_name: &'a str,
    parameters: &'a JobParameters,
    state: &'a StateHandles,
    env: &'a RuntimeEnv,
    cancel: &'a CancellationToken,
}

impl<'a> StepRunner<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        step: &'a StepDefinition,
        execution_id: ExecutionId,
        instance_id: &'a JobInstanceId,
        job_name: &'a str,
        parameters: &'a JobParameters,
        state: &'a StateHandles,
        env: &'a RuntimeEnv,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            step,
            execution_id,
            instance_id,
            job_name,
            parameters,
            state,
            env,
            cancel,
        }
    }

    /// Runs the step to a terminal status. Errors are returned only when the
    /// step execution itself cannot be recorded.
    pub async fn run(&self) -> Result<StepExecution, ExecutionError> {
        let mut step_exec = StepExecution::started(self.execution_id, &self.step.name);
        self.state.repository.save_step_execution(&step_exec).await?;

        let mut ctx = StepContext::new(
            self.execution_id,
            self.instance_id.clone(),
            self.job_name,
            &self.step.name,
            self.parameters.clone(),
        );
        let listeners = step_listeners(&self.step.listeners, &self.env.writer());
        info!(step = %self.step.name, execution_id = %self.execution_id, "Starting step");

        let mut failure = before_hooks(&listeners, &ctx).await;
        let mut status = BatchStatus::Completed;
        if failure.is_none() {
            match self.execute(&mut ctx, &mut step_exec).await {
                Ok(s) => status = s,
                Err(e) => {
                    error!(step = %self.step.name, error = %e, "Step failed");
                    failure = Some(e.to_string());
                }
            }
        }
        if failure.is_some() {
            status = BatchStatus::Failed;
        }

        ctx.status = status;
        ctx.exit_status = failure.clone();
        if let Some(e) = after_hooks(&listeners, &ctx).await {
            status = BatchStatus::Failed;
            failure.get_or_insert(e);
        }

        step_exec.persistent_user_data = ctx.persistent_user_data().map(|v| v.to_string());
        step_exec.finish(status, Some(failure.unwrap_or_else(|| status.to_string())));
        self.state.repository.save_step_execution(&step_exec).await?;

        if status == BatchStatus::Completed {
            for partition in 0..step_exec.partitions {
                self.state
                    .checkpoints
                    .clear_checkpoint(&self.key(partition))
                    .await?;
            }
            self.state
                .repository
                .mark_step_complete(self.instance_id, &self.step.name)
                .await?;
        }

        info!(
            step = %self.step.name,
            status = %status,
            read = step_exec.items_read,
            written = step_exec.items_written,
            skipped = step_exec.items_skipped,
            "Step finished"
        );
        Ok(step_exec)
    }

    async fn execute(
        &self,
        ctx: &mut StepContext,
        step_exec: &mut StepExecution,
    ) -> Result<BatchStatus, ExecutionError> {
        let plan = mapper_for(&self.step.partition).plan(ctx)?;
        step_exec.partitions = plan.partitions();

        // Every partition gets its own handles before any of them starts.
        let mut processors = Vec::with_capacity(plan.partitions());
        let metrics = Metrics::new();
        for idx in 0..plan.partitions() {
            let key = self.key(idx);
            let resources = factory::partition_resources(
                self.env,
                self.step,
                self.parameters,
                &plan.properties_for(idx),
                &key,
            )
            .await?;
            processors.push(ChunkProcessor::new(
                resources,
                CheckpointManager::new(key, self.state.checkpoints.clone()),
                metrics.clone(),
                ChunkConfig::from(self.step),
                self.cancel.child_token(),
            ));
        }

        let mut set = JoinSet::new();
        for processor in processors {
            set.spawn(processor.run());
        }

        let total = plan.partitions();
        let mut outcomes: Vec<PartitionOutcome> = Vec::with_capacity(total);
        let mut failures: Vec<String> = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(outcome)) => outcomes.push(outcome),
                Ok(Err(e)) => failures.push(e.to_string()),
                Err(e) => failures.push(format!("partition task aborted: {e}")),
            }
        }

        let snapshot = metrics.snapshot();
        step_exec.items_read = snapshot.records_read;
        step_exec.items_written = snapshot.records_written;
        step_exec.items_skipped = snapshot.records_skipped;
        step_exec.commit_count = snapshot.chunks_committed;

        if let Some(first) = failures.first() {
            return Err(ExecutionError::PartitionsFailed {
                failed: failures.len(),
                total,
                first: first.clone(),
            });
        }
        if outcomes.iter().any(|o| o.state == ChunkState::Stopped) {
            warn!(step = %self.step.name, "Step stopped before completion");
            return Ok(BatchStatus::Stopped);
        }
        Ok(BatchStatus::Completed)
    }

    fn key(&self, partition: usize) -> PartitionKey {
        PartitionKey::new(self.instance_id.clone(), &self.step.name, partition)
    }
}

async fn before_hooks(listeners: &[Arc<dyn StepListener>], ctx: &StepContext) -> Option<String> {
    for listener in listeners {
        if let Err(e) = listener.before_step(ctx).await {
            error!(listener = listener.name(), error = %e, "before_step failed");
            return Some(e.to_string());
        }
    }
    None
}

/// Runs every hook even when one fails; reports the first failure.
async fn after_hooks(listeners: &[Arc<dyn StepListener>], ctx: &StepContext) -> Option<String> {
    let mut first = None;
    for listener in listeners {
        if let Err(e) = listener.after_step(ctx).await {
            error!(listener = listener.name(), error = %e, "after_step failed");
            first.get_or_insert(e.to_string());
        }
    }
    first
}
