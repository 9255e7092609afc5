use crate::error::ExecutionError;
use connectors::{
    file::delimited::source::DelimitedSourceSettings,
    sink::{
        TransactionalWrite,
        error::SinkError,
        fault::{FailAfterWrites, FaultInjector},
        log::LogSink,
        table::{TableSink, TableSinkSettings, TableStore},
    },
};
use engine_config::{
    settings::{StepDefinition, reader::ReaderSettings, writer::WriterSettings},
    substitution::PropertyResolver,
};
use engine_core::connectors::{sink::Sink, source::Source};
use engine_processing::chunk::guard::PartitionResources;
use model::{
    core::identifiers::PartitionKey,
    execution::{parameters::JobParameters, partition::PartitionProperties},
};
use std::{collections::HashMap, path::PathBuf, sync::Arc};
use tokio::sync::Mutex;
use tracing::debug;

/// Shared collaborators handed to every execution.
#[derive(Clone)]
pub struct RuntimeEnv {
    pub tables: TableStore,
    pub resource_roots: Vec<PathBuf>,
    /// Fault hooks live as long as the runtime, so an injected failure
    /// fires once per partition rather than once per execution.
    faults: Arc<Mutex<HashMap<String, Arc<FailAfterWrites>>>>,
}

impl RuntimeEnv {
    pub fn new(tables: TableStore, resource_roots: Vec<PathBuf>) -> Self {
        Self {
            tables,
            resource_roots,
            faults: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The capability listeners use for their side effects.
    pub fn writer(&self) -> Arc<dyn TransactionalWrite> {
        Arc::new(self.tables.clone())
    }

    async fn fault_for(
        &self,
        key: &PartitionKey,
        threshold: Option<u64>,
    ) -> Option<Arc<dyn FaultInjector>> {
        let threshold = threshold?;
        let mut faults = self.faults.lock().await;
        let fault = faults
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(FailAfterWrites::new(threshold)))
            .clone();
        Some(fault)
    }
}

pub fn create_source(env: &RuntimeEnv, reader: &ReaderSettings) -> Source {
    match reader {
        ReaderSettings::Delimited {
            file,
            stream,
            mapping,
            encoding,
        } => Source::delimited(DelimitedSourceSettings {
            file_path: Some(file.clone()),
            stream_name: Some(stream.clone()),
            mapping_file: Some(mapping.clone()),
            encoding: encoding.clone(),
            resource_roots: env.resource_roots.clone(),
        }),
    }
}

pub fn create_sink(
    env: &RuntimeEnv,
    step_name: &str,
    writer: &WriterSettings,
    key: &PartitionKey,
    fault: Option<Arc<dyn FaultInjector>>,
) -> Result<Sink, SinkError> {
    match writer {
        WriterSettings::Table { table, columns, .. } => Ok(Sink::Table(TableSink::open(
            env.tables.clone(),
            TableSinkSettings {
                table: table.clone(),
                columns: columns.clone(),
            },
            key.clone(),
            fault,
        )?)),
        WriterSettings::Log { name, .. } => Ok(Sink::Log(LogSink::new(
            name.clone().unwrap_or_else(|| step_name.to_string()),
            key.partition,
            fault,
        ))),
    }
}

/// Resolves the step's settings for one partition and acquires its handles.
pub async fn partition_resources(
    env: &RuntimeEnv,
    step: &StepDefinition,
    parameters: &JobParameters,
    properties: &PartitionProperties,
    key: &PartitionKey,
) -> Result<PartitionResources, ExecutionError> {
    let resolver = PropertyResolver::new(properties, parameters);
    let reader = step.reader.resolve(&resolver)?;
    let writer = step.writer.resolve(&resolver)?;

    let fault = env.fault_for(key, writer.fail_after_writes()).await;
    let source = create_source(env, &reader);
    let sink = create_sink(env, &step.name, &writer, key, fault)?;

    debug!(key = %key, source = %source.format(), sink = %sink.kind(), "Created partition resources");
    Ok(PartitionResources::new(
        key.partition,
        Box::new(source),
        Box::new(sink),
    ))
}
