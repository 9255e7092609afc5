use crate::{error::ConfigError, settings::JobDefinition, validation::job_validator::JobValidator};
use std::{collections::HashMap, path::Path, sync::Arc};
use tracing::info;

/// Job definitions known to the runtime, by name.
#[derive(Debug, Default, Clone)]
pub struct JobRegistry {
    jobs: HashMap<String, Arc<JobDefinition>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and adds a definition. Names must be unique.
    pub fn register(&mut self, job: JobDefinition) -> Result<Arc<JobDefinition>, ConfigError> {
        JobValidator::new(&job).validate()?;
        if self.jobs.contains_key(&job.name) {
            return Err(ConfigError::DuplicateJob(job.name));
        }

        let job = Arc::new(job);
        self.jobs.insert(job.name.clone(), job.clone());
        info!(job = %job.name, steps = job.steps.len(), "Registered job");
        Ok(job)
    }

    pub fn load_file(&mut self, path: &Path) -> Result<Arc<JobDefinition>, ConfigError> {
        self.register(JobDefinition::from_file(path)?)
    }

    pub fn get(&self, name: &str) -> Option<Arc<JobDefinition>> {
        self.jobs.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.jobs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const JOB: &str = r#"{
        "name": "job-report",
        "steps": [{
            "name": "load",
            "reader": { "type": "delimited", "file": "a.csv", "stream": "s", "mapping": "m.json" },
            "writer": { "type": "log" }
        }]
    }"#;

    #[test]
    fn loads_and_looks_up_jobs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("job.json");
        fs::write(&path, JOB).unwrap();

        let mut registry = JobRegistry::new();
        registry.load_file(&path).unwrap();

        assert!(registry.get("job-report").is_some());
        assert!(registry.get("other").is_none());
        assert_eq!(registry.names(), vec!["job-report"]);
    }

    #[test]
    fn rejects_duplicates() {
        let mut registry = JobRegistry::new();
        registry
            .register(JobDefinition::from_json("a", JOB).unwrap())
            .unwrap();
        let err = registry
            .register(JobDefinition::from_json("b", JOB).unwrap())
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateJob(name) if name == "job-report"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let mut registry = JobRegistry::new();
        let err = registry.load_file(Path::new("/nonexistent/job.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
