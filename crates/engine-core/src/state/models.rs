use model::core::identifiers::{ExecutionId, JobInstanceId, PartitionKey};

/// Key layout shared by the state backends.
pub(crate) struct Keys;

impl Keys {
    #[inline]
    pub fn checkpoint(key: &PartitionKey) -> String {
        format!(
            "chk:{}:{}:{}",
            key.instance_id, key.step_name, key.partition
        )
    }

    #[inline]
    pub fn execution(id: ExecutionId) -> String {
        format!("exec:{:020}", id.value())
    }

    #[inline]
    pub fn instance_prefix(instance_id: &JobInstanceId) -> String {
        format!("inst:{instance_id}:")
    }

    #[inline]
    pub fn instance_execution(instance_id: &JobInstanceId, id: ExecutionId) -> String {
        format!("{}{:020}", Self::instance_prefix(instance_id), id.value())
    }

    #[inline]
    pub fn step_prefix(id: ExecutionId) -> String {
        format!("step:{:020}:", id.value())
    }

    #[inline]
    pub fn step_execution(id: ExecutionId, step_name: &str) -> String {
        format!("{}{step_name}", Self::step_prefix(id))
    }

    #[inline]
    pub fn step_done(instance_id: &JobInstanceId, step_name: &str) -> String {
        format!("done:{instance_id}:{step_name}")
    }
}
