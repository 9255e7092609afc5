use crate::{error::ConfigError, substitution::PropertyResolver};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WriterSettings {
    /// Durable table in the state database.
    Table {
        table: String,
        columns: Vec<String>,
        /// Fail one write after this many successful ones.
        #[serde(default)]
        fail_after_writes: Option<u64>,
    },
    /// Logs chunks instead of storing them.
    Log {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        fail_after_writes: Option<u64>,
    },
}

impl WriterSettings {
    pub fn fail_after_writes(&self) -> Option<u64> {
        match self {
            WriterSettings::Table {
                fail_after_writes, ..
            }
            | WriterSettings::Log {
                fail_after_writes, ..
            } => *fail_after_writes,
        }
    }

    pub fn resolve(&self, resolver: &PropertyResolver<'_>) -> Result<Self, ConfigError> {
        match self {
            WriterSettings::Table {
                table,
                columns,
                fail_after_writes,
            } => Ok(WriterSettings::Table {
                table: resolver.resolve(table)?,
                columns: columns.clone(),
                fail_after_writes: *fail_after_writes,
            }),
            WriterSettings::Log {
                name,
                fail_after_writes,
            } => Ok(WriterSettings::Log {
                name: resolver.resolve_opt(name)?,
                fail_after_writes: *fail_after_writes,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::execution::{parameters::JobParameters, partition::PartitionProperties};

    #[test]
    fn resolves_table_name() {
        let writer: WriterSettings = serde_json::from_str(
            r#"{ "type": "table", "table": "REPORT_${region}", "columns": ["a"], "fail_after_writes": 1 }"#,
        )
        .unwrap();
        let partition = PartitionProperties::new();
        let params = JobParameters::new().with("region", "EU");
        let resolved = writer
            .resolve(&PropertyResolver::new(&partition, &params))
            .unwrap();

        assert_eq!(
            resolved,
            WriterSettings::Table {
                table: "REPORT_EU".into(),
                columns: vec!["a".into()],
                fail_after_writes: Some(1),
            }
        );
        assert_eq!(resolved.fail_after_writes(), Some(1));
    }
}
