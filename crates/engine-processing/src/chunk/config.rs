use engine_config::settings::{StepDefinition, policy::RecordErrorPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub error_policy: RecordErrorPolicy,
}

impl ChunkConfig {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            error_policy: RecordErrorPolicy::Abort,
        }
    }

    pub fn with_policy(mut self, policy: RecordErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }
}

impl From<&StepDefinition> for ChunkConfig {
    fn from(step: &StepDefinition) -> Self {
        ChunkConfig::new(step.chunk_size).with_policy(step.on_record_error)
    }
}
