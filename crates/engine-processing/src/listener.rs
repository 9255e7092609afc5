use crate::error::ListenerError;
use async_trait::async_trait;
use connectors::sink::TransactionalWrite;
use engine_config::settings::listener::ListenerSettings;
use engine_core::context::{job::JobContext, step::StepContext};
use model::core::value::Value;
use std::sync::Arc;
use tracing::info;

/// Hooks around a job execution.
#[async_trait]
pub trait JobListener: Send + Sync {
    fn name(&self) -> &str;

    async fn before_job(&self, ctx: &JobContext) -> Result<(), ListenerError>;

    async fn after_job(&self, ctx: &JobContext) -> Result<(), ListenerError>;
}

/// Hooks around a step execution.
#[async_trait]
pub trait StepListener: Send + Sync {
    fn name(&self) -> &str;

    async fn before_step(&self, ctx: &StepContext) -> Result<(), ListenerError>;

    async fn after_step(&self, ctx: &StepContext) -> Result<(), ListenerError>;
}

/// Writes one marker row per hook through a transactional write capability.
pub struct AuditListener {
    table: String,
    writer: Arc<dyn TransactionalWrite>,
}

impl AuditListener {
    pub fn new(table: impl Into<String>, writer: Arc<dyn TransactionalWrite>) -> Self {
        Self {
            table: table.into(),
            writer,
        }
    }

    async fn mark(&self, label: &str) -> Result<(), ListenerError> {
        let row = vec![
            Value::Int(chrono::Utc::now().timestamp_millis()),
            Value::String(label.to_string()),
            Value::String(label.to_string()),
            Value::String("1.0".to_string()),
        ];
        self.writer.write_atomic(&self.table, vec![row]).await?;
        info!(table = %self.table, marker = label, "Audit marker written");
        Ok(())
    }
}

#[async_trait]
impl JobListener for AuditListener {
    fn name(&self) -> &str {
        "audit"
    }

    async fn before_job(&self, _ctx: &JobContext) -> Result<(), ListenerError> {
        self.mark("Before Job").await
    }

    async fn after_job(&self, _ctx: &JobContext) -> Result<(), ListenerError> {
        self.mark("After Job").await
    }
}

#[async_trait]
impl StepListener for AuditListener {
    fn name(&self) -> &str {
        "audit"
    }

    async fn before_step(&self, _ctx: &StepContext) -> Result<(), ListenerError> {
        self.mark("Before Step").await
    }

    async fn after_step(&self, _ctx: &StepContext) -> Result<(), ListenerError> {
        self.mark("After Step").await
    }
}

/// Logs lifecycle events.
#[derive(Debug, Default)]
pub struct LogListener;

#[async_trait]
impl JobListener for LogListener {
    fn name(&self) -> &str {
        "log"
    }

    async fn before_job(&self, ctx: &JobContext) -> Result<(), ListenerError> {
        info!(job = %ctx.job_name, execution_id = %ctx.execution_id, params = %ctx.parameters, "Before job");
        Ok(())
    }

    async fn after_job(&self, ctx: &JobContext) -> Result<(), ListenerError> {
        info!(job = %ctx.job_name, execution_id = %ctx.execution_id, status = %ctx.status, "After job");
        Ok(())
    }
}

#[async_trait]
impl StepListener for LogListener {
    fn name(&self) -> &str {
        "log"
    }

    async fn before_step(&self, ctx: &StepContext) -> Result<(), ListenerError> {
        info!(step = %ctx.step_name, execution_id = %ctx.execution_id, "Before step");
        Ok(())
    }

    async fn after_step(&self, ctx: &StepContext) -> Result<(), ListenerError> {
        info!(step = %ctx.step_name, execution_id = %ctx.execution_id, status = %ctx.status, "After step");
        Ok(())
    }
}

/// Builds job listeners; audit listeners write through `writer`.
pub fn job_listeners(
    settings: &[ListenerSettings],
    writer: &Arc<dyn TransactionalWrite>,
) -> Vec<Arc<dyn JobListener>> {
    settings
        .iter()
        .map(|s| -> Arc<dyn JobListener> {
            match s {
                ListenerSettings::Audit { table } => {
                    Arc::new(AuditListener::new(table.clone(), writer.clone()))
                }
                ListenerSettings::Log => Arc::new(LogListener),
            }
        })
        .collect()
}

pub fn step_listeners(
    settings: &[ListenerSettings],
    writer: &Arc<dyn TransactionalWrite>,
) -> Vec<Arc<dyn StepListener>> {
    settings
        .iter()
        .map(|s| -> Arc<dyn StepListener> {
            match s {
                ListenerSettings::Audit { table } => {
                    Arc::new(AuditListener::new(table.clone(), writer.clone()))
                }
                ListenerSettings::Log => Arc::new(LogListener),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::sink::error::SinkError;
    use model::{
        core::identifiers::{ExecutionId, JobInstanceId},
        execution::{job::JobExecution, parameters::JobParameters},
    };
    use std::sync::Mutex;

    #[derive(Default)]
    struct CapturingWriter {
        rows: Mutex<Vec<(String, Vec<Value>)>>,
    }

    #[async_trait]
    impl TransactionalWrite for CapturingWriter {
        async fn write_atomic(&self, table: &str, rows: Vec<Vec<Value>>) -> Result<(), SinkError> {
            let mut captured = self.rows.lock().unwrap();
            for row in rows {
                captured.push((table.to_string(), row));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn audit_listener_writes_markers() {
        let writer = Arc::new(CapturingWriter::default());
        let listener = AuditListener::new("RAW_REPORT", writer.clone());
        let execution = JobExecution::new(
            ExecutionId::new(1),
            JobInstanceId::new("job-1"),
            "job",
            JobParameters::new(),
        );
        let ctx = JobContext::from_execution(&execution);

        listener.before_job(&ctx).await.unwrap();
        listener.after_job(&ctx).await.unwrap();

        let rows = writer.rows.lock().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, "RAW_REPORT");
        assert_eq!(rows[0].1[1], Value::String("Before Job".into()));
        assert_eq!(rows[1].1[1], Value::String("After Job".into()));
    }

    #[test]
    fn builds_listeners_from_settings() {
        let writer: Arc<dyn TransactionalWrite> = Arc::new(CapturingWriter::default());
        let listeners = job_listeners(
            &[
                ListenerSettings::Log,
                ListenerSettings::Audit {
                    table: "T".into(),
                },
            ],
            &writer,
        );
        let names: Vec<&str> = listeners.iter().map(|l| l.name()).collect();
        assert_eq!(names, vec!["log", "audit"]);
    }
}
