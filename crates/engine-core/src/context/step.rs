use model::{
    core::identifiers::{ExecutionId, JobInstanceId},
    execution::{parameters::JobParameters, status::BatchStatus},
};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Per step execution state shared with the partition planner and step listeners.
#[derive(Debug, Clone)]
pub struct StepContext {
    pub execution_id: ExecutionId,
    pub instance_id: JobInstanceId,
    pub job_name: String,
    pub step_name: String,
    pub parameters: JobParameters,
    pub status: BatchStatus,
    pub exit_status: Option<String>,
    persistent_user_data: Option<JsonValue>,
    transient: HashMap<String, JsonValue>,
}

impl StepContext {
    pub fn new(
        execution_id: ExecutionId,
        instance_id: JobInstanceId,
        job_name: impl Into<String>,
        step_name: impl Into<String>,
        parameters: JobParameters,
    ) -> Self {
        Self {
            execution_id,
            instance_id,
            job_name: job_name.into(),
            step_name: step_name.into(),
            parameters,
            status: BatchStatus::Started,
            exit_status: None,
            persistent_user_data: None,
            transient: HashMap::new(),
        }
    }

    /// Data stored with the step execution once the step ends.
    pub fn persistent_user_data(&self) -> Option<&JsonValue> {
        self.persistent_user_data.as_ref()
    }

    pub fn set_persistent_user_data(&mut self, data: JsonValue) {
        self.persistent_user_data = Some(data);
    }

    /// Scratch values that live only as long as this step execution.
    pub fn transient(&self, key: &str) -> Option<&JsonValue> {
        self.transient.get(key)
    }

    pub fn set_transient(&mut self, key: impl Into<String>, value: JsonValue) {
        self.transient.insert(key.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_user_data_apart_from_transient_values() {
        let mut ctx = StepContext::new(
            ExecutionId::new(1),
            JobInstanceId::new("job-1"),
            "job",
            "load",
            JobParameters::new(),
        );
        assert!(ctx.persistent_user_data().is_none());

        ctx.set_persistent_user_data(json!("hello"));
        ctx.set_transient("partitions", json!(2));

        assert_eq!(ctx.persistent_user_data(), Some(&json!("hello")));
        assert_eq!(ctx.transient("partitions"), Some(&json!(2)));
        assert!(ctx.transient("other").is_none());
    }
}
