use crate::{
    error::{ControllerError, StatusQueryError},
    operator::BatchRuntime,
};
use model::{
    core::identifiers::ExecutionId,
    execution::{job::JobExecution, parameters::JobParameters},
};
use std::{fmt, str::FromStr, sync::Arc, time::Duration};
use tracing::{debug, error, info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobCommand {
    Start,
    Restart,
}

impl fmt::Display for JobCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobCommand::Start => f.write_str("START"),
            JobCommand::Restart => f.write_str("RESTART"),
        }
    }
}

impl FromStr for JobCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "START" => Ok(JobCommand::Start),
            "RESTART" => Ok(JobCommand::Restart),
            other => Err(format!("unknown job command '{other}'")),
        }
    }
}

/// Starts or restarts jobs and polls them until they reach a terminal status.
#[derive(Clone)]
pub struct JobController {
    runtime: Arc<dyn BatchRuntime>,
    policy: PollPolicy,
}

impl JobController {
    pub fn new(runtime: Arc<dyn BatchRuntime>, policy: PollPolicy) -> Self {
        Self { runtime, policy }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    pub async fn start(
        &self,
        job_name: &str,
        parameters: JobParameters,
    ) -> Result<ExecutionId, ControllerError> {
        let id = self.runtime.start(job_name, parameters).await?;
        info!(job = job_name, execution_id = %id, "Job started");
        Ok(id)
    }

    pub async fn restart(
        &self,
        execution_id: ExecutionId,
        parameters: JobParameters,
    ) -> Result<ExecutionId, ControllerError> {
        let id = self.runtime.restart(execution_id, parameters).await?;
        info!(previous = %execution_id, execution_id = %id, "Job restarted");
        Ok(id)
    }

    /// Polls every `interval` while the execution is incomplete and attempts
    /// remain. Returns the first terminal snapshot, or the last one seen when
    /// attempts run out.
    pub async fn await_completion(
        &self,
        execution_id: ExecutionId,
        interval: Duration,
        max_attempts: u32,
    ) -> Result<JobExecution, StatusQueryError> {
        let max_attempts = max_attempts.max(1);
        let mut attempts = 0;
        let mut last: Option<JobExecution> = None;

        while last.as_ref().is_none_or(|e| !e.is_terminal()) && attempts < max_attempts {
            tokio::time::sleep(interval).await;
            attempts += 1;

            let execution = match self.runtime.job_execution(execution_id).await {
                Ok(execution) => execution,
                Err(e) => {
                    error!(execution_id = %execution_id, attempt = attempts, error = %e, "Status query failed");
                    return Err(e);
                }
            };
            debug!(
                execution_id = %execution_id,
                attempt = attempts,
                status = %execution.status,
                "Polled execution"
            );
            last = Some(execution);
        }

        // max_attempts >= 1, so at least one query has run.
        let execution = last.ok_or(StatusQueryError::NotFound(execution_id))?;
        if !execution.is_terminal() {
            warn!(
                execution_id = %execution_id,
                attempts,
                status = %execution.status,
                "Gave up waiting for execution"
            );
        }
        Ok(execution)
    }

    /// Runs `command` and waits for the resulting execution with the configured policy.
    pub async fn run(
        &self,
        command: JobCommand,
        job_name: &str,
        parameters: JobParameters,
        execution_id: ExecutionId,
    ) -> Result<JobExecution, ControllerError> {
        let id = match command {
            JobCommand::Start => self.start(job_name, parameters).await?,
            JobCommand::Restart => self.restart(execution_id, parameters).await?,
        };
        let execution = self
            .await_completion(id, self.policy.interval, self.policy.max_attempts)
            .await?;
        info!(
            job = %execution.job_name,
            execution_id = %id,
            status = %execution.status,
            "Job execution resolved"
        );
        Ok(execution)
    }
}
