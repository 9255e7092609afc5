use crate::{
    error::ExecutionError,
    execution::{factory::RuntimeEnv, step::StepRunner},
};
use engine_config::settings::JobDefinition;
use engine_core::{context::job::JobContext, state::StateHandles};
use engine_processing::listener::{JobListener, job_listeners};
use model::execution::{job::JobExecution, status::BatchStatus};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Drives one job execution from STARTING to a terminal status.
pub struct JobExecutor {
    job: Arc<JobDefinition>,
    execution: JobExecution,
    state: StateHandles,
    env: RuntimeEnv,
    cancel: CancellationToken,
}

impl JobExecutor {
    pub fn new(
        job: Arc<JobDefinition>,
        execution: JobExecution,
        state: StateHandles,
        env: RuntimeEnv,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            job,
            execution,
            state,
            env,
            cancel,
        }
    }

    /// Never fails: every problem ends up in the execution's status and exit status.
    pub async fn run(mut self) -> JobExecution {
        let id = self.execution.execution_id;
        if self.cancel.is_cancelled() {
            self.finish(BatchStatus::Stopped, None).await;
            return self.execution;
        }

        self.set_status(BatchStatus::Started);
        self.save().await;
        info!(
            job = %self.job.name,
            execution_id = %id,
            instance = %self.execution.instance_id,
            params = %self.execution.parameters,
            "Job started"
        );

        let listeners = job_listeners(&self.job.listeners, &self.env.writer());
        let mut ctx = JobContext::from_execution(&self.execution);

        let mut failure = None;
        for listener in &listeners {
            if let Err(e) = listener.before_job(&ctx).await {
                error!(listener = listener.name(), error = %e, "before_job failed");
                failure = Some(e.to_string());
                break;
            }
        }

        let mut status = BatchStatus::Failed;
        if failure.is_none() {
            match self.run_steps().await {
                Ok((s, exit)) => {
                    status = s;
                    failure = exit;
                }
                Err(e) => {
                    error!(job = %self.job.name, execution_id = %id, error = %e, "Job failed");
                    failure = Some(e.to_string());
                }
            }
        }

        ctx.status = status;
        ctx.exit_status = failure.clone();
        if let Some(e) = after_hooks(&listeners, &ctx).await {
            status = BatchStatus::Failed;
            failure.get_or_insert(e);
        }

        self.finish(status, failure).await;
        self.execution
    }

    /// Runs steps in definition order. Returns the job status and, for a
    /// non-completed run, the reason.
    async fn run_steps(&self) -> Result<(BatchStatus, Option<String>), ExecutionError> {
        let instance = &self.execution.instance_id;

        for step in &self.job.steps {
            if self.cancel.is_cancelled() {
                warn!(job = %self.job.name, step = %step.name, "Stop requested before step");
                return Ok((BatchStatus::Stopped, None));
            }
            if self
                .state
                .repository
                .is_step_complete(instance, &step.name)
                .await?
            {
                info!(step = %step.name, "Step already completed for this instance, skipping");
                continue;
            }

            let step_exec = StepRunner::new(
                step,
                self.execution.execution_id,
                instance,
                &self.job.name,
                &self.execution.parameters,
                &self.state,
                &self.env,
                &self.cancel,
            )
            .run()
            .await?;

            match step_exec.status {
                BatchStatus::Completed => continue,
                BatchStatus::Stopped => return Ok((BatchStatus::Stopped, None)),
                other => {
                    let reason = step_exec
                        .exit_status
                        .map(|e| format!("step '{}' {other}: {e}", step.name));
                    return Ok((BatchStatus::Failed, reason));
                }
            }
        }

        Ok((BatchStatus::Completed, None))
    }

    fn set_status(&mut self, to: BatchStatus) {
        if let Err(e) = self.execution.transition(to) {
            error!(execution_id = %self.execution.execution_id, error = %e, "Status change rejected");
        }
    }

    async fn finish(&mut self, status: BatchStatus, failure: Option<String>) {
        self.set_status(status);
        self.execution.exit_status = Some(failure.unwrap_or_else(|| status.to_string()));
        self.save().await;
        info!(
            job = %self.job.name,
            execution_id = %self.execution.execution_id,
            status = %self.execution.status,
            exit_status = self.execution.exit_status.as_deref().unwrap_or_default(),
            "Job finished"
        );
    }

    async fn save(&self) {
        if let Err(e) = self.state.repository.save_execution(&self.execution).await {
            error!(execution_id = %self.execution.execution_id, error = %e, "Failed to persist execution");
        }
    }
}

async fn after_hooks(listeners: &[Arc<dyn JobListener>], ctx: &JobContext) -> Option<String> {
    let mut first = None;
    for listener in listeners {
        if let Err(e) = listener.after_job(ctx).await {
            error!(listener = listener.name(), error = %e, "after_job failed");
            first.get_or_insert(e.to_string());
        }
    }
    first
}
