use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod listener;
pub mod partition;
pub mod policy;
pub mod reader;
pub mod writer;

use listener::ListenerSettings;
use partition::PartitionSettings;
use policy::RecordErrorPolicy;
use reader::ReaderSettings;
use writer::WriterSettings;

pub const DEFAULT_CHUNK_SIZE: usize = 10;

/// A named job: ordered chunk steps plus job-level listeners.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDefinition {
    pub name: String,
    /// Parameters that must be present when the job is started.
    #[serde(default)]
    pub required_parameters: Vec<String>,
    #[serde(default)]
    pub listeners: Vec<ListenerSettings>,
    pub steps: Vec<StepDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDefinition {
    pub name: String,
    /// Records per chunk (the commit interval).
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    pub reader: ReaderSettings,
    pub writer: WriterSettings,
    #[serde(default)]
    pub partition: PartitionSettings,
    #[serde(default)]
    pub listeners: Vec<ListenerSettings>,
    #[serde(default)]
    pub on_record_error: RecordErrorPolicy,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl JobDefinition {
    pub fn from_json(location: &str, raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
            location: location.to_string(),
            source,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&path.display().to_string(), &raw)
    }

    pub fn step(&self, name: &str) -> Option<&StepDefinition> {
        self.steps.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOB: &str = r#"{
        "name": "job-report",
        "required_parameters": ["input"],
        "listeners": [{ "type": "audit", "table": "RAW_REPORT" }],
        "steps": [{
            "name": "load",
            "reader": {
                "type": "delimited",
                "file": "${input}",
                "stream": "reportStream",
                "mapping": "mapping.json"
            },
            "writer": {
                "type": "table",
                "table": "RAW_REPORT",
                "columns": ["date", "impressions", "clicks", "earning"]
            }
        }]
    }"#;

    #[test]
    fn applies_defaults() {
        let job = JobDefinition::from_json("inline", JOB).unwrap();
        let step = job.step("load").unwrap();

        assert_eq!(step.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(step.partition, PartitionSettings::default());
        assert_eq!(step.on_record_error, RecordErrorPolicy::Abort);
        assert!(step.listeners.is_empty());
        assert_eq!(job.listeners.len(), 1);
    }

    #[test]
    fn reports_location_on_parse_errors() {
        let err = JobDefinition::from_json("broken.json", "{ \"name\": ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { location, .. } if location == "broken.json"));
    }
}
