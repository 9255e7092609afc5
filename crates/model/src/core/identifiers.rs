use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

/// Identifier of a single job execution.
///
/// `-1` is the sentinel used by callers to express "no prior execution".
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExecutionId(i64);

impl ExecutionId {
    pub const NONE: ExecutionId = ExecutionId(-1);

    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Unset ids are the sentinel and any other non-positive value.
    pub fn is_unset(&self) -> bool {
        self.0 <= 0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExecutionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(ExecutionId)
    }
}

impl From<i64> for ExecutionId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Identity shared by an execution and all of its restarts.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobInstanceId(String);

impl JobInstanceId {
    /// Derives the identity of a new instance from the job name, its
    /// parameters and the execution that creates it. Every start gets its own
    /// instance; restarts reuse the instance of the execution they resume.
    pub fn derive(
        job_name: &str,
        parameters: &BTreeMap<String, String>,
        first_execution: ExecutionId,
    ) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(job_name.as_bytes());
        hasher.update(&first_execution.value().to_le_bytes());
        for (key, value) in parameters {
            hasher.update(b"\0");
            hasher.update(key.as_bytes());
            hasher.update(b"=");
            hasher.update(value.as_bytes());
        }
        let hash = hasher.finalize().to_hex();
        Self(format!("{job_name}-{}", &hash[..16]))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Addresses one partition of one step within a job instance.
/// Checkpoints are keyed by this triple.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionKey {
    pub instance_id: JobInstanceId,
    pub step_name: String,
    pub partition: usize,
}

impl PartitionKey {
    pub fn new(instance_id: JobInstanceId, step_name: impl Into<String>, partition: usize) -> Self {
        Self {
            instance_id,
            step_name: step_name.into(),
            partition,
        }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/part-{}",
            self.instance_id, self.step_name, self.partition
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_unset() {
        assert!(ExecutionId::NONE.is_unset());
        assert!(ExecutionId::new(0).is_unset());
        assert!(!ExecutionId::new(7).is_unset());
    }

    #[test]
    fn instance_id_depends_on_parameters_and_first_execution() {
        let mut params = BTreeMap::new();
        params.insert("date".to_string(), "2024-01-01".to_string());
        let first = ExecutionId::new(1);

        let a = JobInstanceId::derive("job-report", &params, first);
        let b = JobInstanceId::derive("job-report", &params, first);
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("job-report-"));

        assert_ne!(a, JobInstanceId::derive("job-report", &params, ExecutionId::new(2)));

        params.insert("date".to_string(), "2024-01-02".to_string());
        assert_ne!(a, JobInstanceId::derive("job-report", &params, first));
    }
}
