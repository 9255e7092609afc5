use crate::{
    error::{InvalidRestartError, JobStartError, OperatorError, StatusQueryError},
    execution::{executor::JobExecutor, factory::RuntimeEnv},
};
use async_trait::async_trait;
use engine_config::{registry::JobRegistry, settings::JobDefinition};
use engine_core::{error::StateStoreError, state::StateHandles};
use model::{
    core::identifiers::{ExecutionId, JobInstanceId},
    execution::{
        job::JobExecution, parameters::JobParameters, status::BatchStatus, step::StepExecution,
    },
};
use std::{collections::HashMap, sync::Arc};
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub const ORPHANED_EXIT_STATUS: &str = "orphaned by process exit";

/// The operations the job execution controller relies on.
#[async_trait]
pub trait BatchRuntime: Send + Sync {
    async fn start(
        &self,
        job_name: &str,
        parameters: JobParameters,
    ) -> Result<ExecutionId, JobStartError>;

    async fn restart(
        &self,
        execution_id: ExecutionId,
        parameters: JobParameters,
    ) -> Result<ExecutionId, InvalidRestartError>;

    async fn job_execution(&self, execution_id: ExecutionId)
    -> Result<JobExecution, StatusQueryError>;
}

struct RunningJob {
    cancel: CancellationToken,
    handle: JoinHandle<JobExecution>,
}

/// Starts, restarts, stops and abandons job executions. Each execution runs
/// on its own tokio task.
pub struct JobOperator {
    registry: Arc<JobRegistry>,
    state: StateHandles,
    env: RuntimeEnv,
    running: Mutex<HashMap<ExecutionId, RunningJob>>,
    // Serialises restart checks with the launch they admit.
    admission: Mutex<()>,
}

impl JobOperator {
    pub fn new(registry: Arc<JobRegistry>, state: StateHandles, env: RuntimeEnv) -> Self {
        Self {
            registry,
            state,
            env,
            running: Mutex::new(HashMap::new()),
            admission: Mutex::new(()),
        }
    }

    pub async fn step_executions(
        &self,
        execution_id: ExecutionId,
    ) -> Result<Vec<StepExecution>, StatusQueryError> {
        self.job_execution(execution_id).await?;
        Ok(self.state.repository.step_executions(execution_id).await?)
    }

    /// Requests a running execution to stop. Partitions finish their current
    /// chunk, then the execution ends STOPPED.
    pub async fn stop(&self, execution_id: ExecutionId) -> Result<(), OperatorError> {
        let mut execution = self
            .state
            .repository
            .load_execution(execution_id)
            .await?
            .ok_or(OperatorError::NotFound(execution_id))?;
        if execution.is_terminal() {
            return Err(OperatorError::NotRunning {
                id: execution_id,
                status: execution.status,
            });
        }

        match self.running.lock().await.get(&execution_id) {
            Some(job) => {
                info!(execution_id = %execution_id, "Stop requested");
                job.cancel.cancel();
            }
            None => {
                // Nothing in this process drives it; record the stop directly.
                warn!(execution_id = %execution_id, "Execution has no live task, marking STOPPED");
                execution.transition(BatchStatus::Stopped)?;
                self.state.repository.save_execution(&execution).await?;
            }
        }
        Ok(())
    }

    /// Stops every execution running in this process.
    pub async fn stop_all(&self) {
        for (id, job) in self.running.lock().await.iter() {
            if !job.handle.is_finished() {
                info!(execution_id = %id, "Stop requested");
                job.cancel.cancel();
            }
        }
    }

    /// Marks a FAILED or STOPPED execution as never to be restarted.
    pub async fn abandon(&self, execution_id: ExecutionId) -> Result<JobExecution, OperatorError> {
        let mut execution = self
            .state
            .repository
            .load_execution(execution_id)
            .await?
            .ok_or(OperatorError::NotFound(execution_id))?;
        execution.transition(BatchStatus::Abandoned)?;
        self.state.repository.save_execution(&execution).await?;
        info!(execution_id = %execution_id, "Execution abandoned");
        Ok(execution)
    }

    /// Fails executions left STARTING/STARTED by a process that no longer runs them.
    pub async fn recover_orphans(&self) -> Result<Vec<ExecutionId>, OperatorError> {
        let running = self.running.lock().await;
        let mut recovered = Vec::new();

        for mut execution in self.state.repository.all_executions().await? {
            if execution.is_terminal() || running.contains_key(&execution.execution_id) {
                continue;
            }
            execution.transition(BatchStatus::Failed)?;
            execution.exit_status = Some(ORPHANED_EXIT_STATUS.to_string());
            self.state.repository.save_execution(&execution).await?;
            warn!(execution_id = %execution.execution_id, "Recovered orphaned execution as FAILED");
            recovered.push(execution.execution_id);
        }
        Ok(recovered)
    }

    /// Waits for the task driving `execution_id`, if this process runs it,
    /// then returns the stored execution.
    pub async fn wait(&self, execution_id: ExecutionId) -> Result<JobExecution, StatusQueryError> {
        let job = self.running.lock().await.remove(&execution_id);
        if let Some(job) = job {
            if let Err(e) = job.handle.await {
                error!(execution_id = %execution_id, error = %e, "Job task did not finish cleanly");
            }
        }
        self.job_execution(execution_id).await
    }

    async fn launch(
        &self,
        job: Arc<JobDefinition>,
        execution_id: ExecutionId,
        instance_id: JobInstanceId,
        parameters: JobParameters,
    ) -> Result<(), StateStoreError> {
        let execution = JobExecution::new(execution_id, instance_id, &job.name, parameters);
        self.state.repository.save_execution(&execution).await?;

        let cancel = CancellationToken::new();
        let executor = JobExecutor::new(
            job,
            execution,
            self.state.clone(),
            self.env.clone(),
            cancel.clone(),
        );

        let mut running = self.running.lock().await;
        running.retain(|_, job| !job.handle.is_finished());
        running.insert(
            execution_id,
            RunningJob {
                cancel,
                handle: tokio::spawn(executor.run()),
            },
        );
        Ok(())
    }
}

#[async_trait]
impl BatchRuntime for JobOperator {
    async fn start(
        &self,
        job_name: &str,
        parameters: JobParameters,
    ) -> Result<ExecutionId, JobStartError> {
        let job = self
            .registry
            .get(job_name)
            .ok_or_else(|| JobStartError::UnknownJob(job_name.to_string()))?;

        if let Some(missing) = job
            .required_parameters
            .iter()
            .find(|p| !parameters.contains(p))
        {
            return Err(JobStartError::MissingParameter {
                job: job.name.clone(),
                parameter: missing.clone(),
            });
        }

        let id = self.state.repository.next_execution_id().await?;
        let instance = JobInstanceId::derive(&job.name, parameters.as_map(), id);
        self.launch(job, id, instance.clone(), parameters).await?;
        info!(job = job_name, execution_id = %id, instance = %instance, "Job execution launched");
        Ok(id)
    }

    async fn restart(
        &self,
        execution_id: ExecutionId,
        parameters: JobParameters,
    ) -> Result<ExecutionId, InvalidRestartError> {
        if execution_id.is_unset() {
            return Err(InvalidRestartError::Unset(execution_id));
        }
        let _admission = self.admission.lock().await;

        let previous = self
            .state
            .repository
            .load_execution(execution_id)
            .await?
            .ok_or(InvalidRestartError::NotFound(execution_id))?;

        let executions = self
            .state
            .repository
            .instance_executions(&previous.instance_id)
            .await?;
        if let Some(latest) = executions.last() {
            if latest.execution_id != execution_id {
                return Err(InvalidRestartError::NotLatest {
                    id: execution_id,
                    latest: latest.execution_id,
                });
            }
        }

        if !previous.status.is_restartable() {
            return Err(InvalidRestartError::NotRestartable {
                id: execution_id,
                status: previous.status,
            });
        }

        let job = self
            .registry
            .get(&previous.job_name)
            .ok_or_else(|| InvalidRestartError::UnknownJob(previous.job_name.clone()))?;

        let merged = previous.parameters.merged(&parameters);
        let id = self.state.repository.next_execution_id().await?;
        self.launch(job, id, previous.instance_id, merged).await?;
        info!(
            job = %previous.job_name,
            previous = %execution_id,
            execution_id = %id,
            "Job execution restarted"
        );
        Ok(id)
    }

    async fn job_execution(
        &self,
        execution_id: ExecutionId,
    ) -> Result<JobExecution, StatusQueryError> {
        self.state
            .repository
            .load_execution(execution_id)
            .await?
            .ok_or(StatusQueryError::NotFound(execution_id))
    }
}
