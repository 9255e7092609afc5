use crate::{
    error::ConfigError,
    settings::{
        JobDefinition, StepDefinition, listener::ListenerSettings, writer::WriterSettings,
    },
};
use std::collections::HashSet;
use tracing::{debug, warn};

const LARGE_CHUNK: usize = 100_000;

/// Structural checks run when a job definition is registered.
pub struct JobValidator<'a> {
    job: &'a JobDefinition,
}

impl<'a> JobValidator<'a> {
    pub fn new(job: &'a JobDefinition) -> Self {
        Self { job }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.job.name.trim().is_empty() {
            errors.push("job name cannot be empty".to_string());
        }
        if self.job.steps.is_empty() {
            errors.push("job defines no steps".to_string());
        }
        if self
            .job
            .required_parameters
            .iter()
            .any(|p| p.trim().is_empty())
        {
            errors.push("required parameter names cannot be empty".to_string());
        }
        Self::validate_listeners("job", &self.job.listeners, &mut errors);

        let mut seen = HashSet::new();
        for step in &self.job.steps {
            if !seen.insert(step.name.as_str()) {
                errors.push(format!("step '{}' is defined more than once", step.name));
            }
            self.validate_step(step, &mut errors);
        }

        if !errors.is_empty() {
            return Err(ConfigError::ValidationFailed {
                job: self.job.name.clone(),
                errors,
            });
        }

        debug!(job = %self.job.name, steps = self.job.steps.len(), "Job definition is valid");
        Ok(())
    }

    fn validate_step(&self, step: &StepDefinition, errors: &mut Vec<String>) {
        if step.name.trim().is_empty() {
            errors.push("step name cannot be empty".to_string());
        }

        if step.chunk_size == 0 {
            errors.push(format!("step '{}': chunk_size must be at least 1", step.name));
        } else if step.chunk_size > LARGE_CHUNK {
            warn!(
                step = %step.name,
                chunk_size = step.chunk_size,
                "Chunk size is very large, may cause memory issues"
            );
        }

        if let WriterSettings::Table { table, columns, .. } = &step.writer {
            if table.trim().is_empty() {
                errors.push(format!("step '{}': table name cannot be empty", step.name));
            }
            if columns.is_empty() {
                errors.push(format!(
                    "step '{}': table writer needs at least one column",
                    step.name
                ));
            }
        }

        Self::validate_listeners(&format!("step '{}'", step.name), &step.listeners, errors);
    }

    fn validate_listeners(owner: &str, listeners: &[ListenerSettings], errors: &mut Vec<String>) {
        for listener in listeners {
            if let ListenerSettings::Audit { table } = listener {
                if table.trim().is_empty() {
                    errors.push(format!("{owner}: audit listener needs a table"));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(raw: &str) -> JobDefinition {
        JobDefinition::from_json("inline", raw).unwrap()
    }

    const STEP: &str = r#"{
        "name": "load",
        "reader": { "type": "delimited", "file": "a.csv", "stream": "s", "mapping": "m.json" },
        "writer": { "type": "log" }
    }"#;

    #[test]
    fn accepts_minimal_job() {
        let job = job(&format!(r#"{{ "name": "job", "steps": [{STEP}] }}"#));
        JobValidator::new(&job).validate().unwrap();
    }

    #[test]
    fn collects_every_problem() {
        let job = job(&format!(
            r#"{{
                "name": "job",
                "listeners": [{{ "type": "audit", "table": "" }}],
                "steps": [
                    {STEP},
                    {{
                        "name": "load",
                        "chunk_size": 0,
                        "reader": {{ "type": "delimited", "file": "a.csv", "stream": "s", "mapping": "m.json" }},
                        "writer": {{ "type": "table", "table": "T", "columns": [] }}
                    }}
                ]
            }}"#
        ));

        match JobValidator::new(&job).validate() {
            Err(ConfigError::ValidationFailed { job, errors }) => {
                assert_eq!(job, "job");
                assert_eq!(errors.len(), 4, "{errors:?}");
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn rejects_job_without_steps() {
        let job = job(r#"{ "name": "job", "steps": [] }"#);
        assert!(JobValidator::new(&job).validate().is_err());
    }
}
