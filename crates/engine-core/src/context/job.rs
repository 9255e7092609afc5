use model::{
    core::identifiers::{ExecutionId, JobInstanceId},
    execution::{job::JobExecution, parameters::JobParameters, status::BatchStatus},
};

/// What a job listener can see of the running execution.
#[derive(Debug, Clone)]
pub struct JobContext {
    pub execution_id: ExecutionId,
    pub instance_id: JobInstanceId,
    pub job_name: String,
    pub parameters: JobParameters,
    /// Status at the time the hook runs. `Started` for `before_job`.
    pub status: BatchStatus,
    pub exit_status: Option<String>,
}

impl JobContext {
    pub fn from_execution(execution: &JobExecution) -> Self {
        Self {
            execution_id: execution.execution_id,
            instance_id: execution.instance_id.clone(),
            job_name: execution.job_name.clone(),
            parameters: execution.parameters.clone(),
            status: execution.status,
            exit_status: execution.exit_status.clone(),
        }
    }
}
