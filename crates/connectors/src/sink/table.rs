use crate::sink::{RecordSink, TransactionalWrite, error::SinkError, fault::FaultInjector};
use async_trait::async_trait;
use model::{
    core::{identifiers::PartitionKey, value::Value},
    records::record::Record,
};
use std::{path::Path, sync::Arc};
use tracing::{debug, info};

const DATA_PREFIX: &str = "r:";
const MARKER_PREFIX: &str = "m:";

/// Durable tables kept in a sled database, one tree per table.
#[derive(Clone)]
pub struct TableStore {
    db: sled::Db,
}

impl TableStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, sled::Error> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    pub fn from_db(db: sled::Db) -> Self {
        Self { db }
    }

    /// Acquires a handle on the table's tree, creating it on first use.
    pub fn table(&self, name: &str) -> Result<sled::Tree, SinkError> {
        Ok(self.db.open_tree(format!("table:{name}"))?)
    }

    /// Rows written by record sinks, ordered by instance, step, partition, then record position.
    pub fn data_rows(&self, table: &str) -> Result<Vec<Vec<serde_json::Value>>, SinkError> {
        self.rows_with_prefix(table, DATA_PREFIX)
    }

    /// Rows written through [`TransactionalWrite`], in insertion order.
    pub fn marker_rows(&self, table: &str) -> Result<Vec<Vec<serde_json::Value>>, SinkError> {
        self.rows_with_prefix(table, MARKER_PREFIX)
    }

    fn rows_with_prefix(
        &self,
        table: &str,
        prefix: &str,
    ) -> Result<Vec<Vec<serde_json::Value>>, SinkError> {
        let tree = self.table(table)?;
        let mut rows = Vec::new();
        for item in tree.scan_prefix(prefix) {
            let (_key, value) = item?;
            rows.push(serde_json::from_slice(&value)?);
        }
        Ok(rows)
    }
}

#[async_trait]
impl TransactionalWrite for TableStore {
    async fn write_atomic(&self, table: &str, rows: Vec<Vec<Value>>) -> Result<(), SinkError> {
        let tree = self.table(table)?;
        let mut batch = sled::Batch::default();
        let count = rows.len();
        for row in rows {
            let key = format!("{MARKER_PREFIX}{:020}", self.db.generate_id()?);
            let values: Vec<serde_json::Value> = row.iter().map(Value::to_json).collect();
            let value =
                serde_json::to_vec(&values).map_err(|e| persistence(table, count, e))?;
            batch.insert(key.as_bytes(), value);
        }

        tree.apply_batch(batch)
            .map_err(|e| persistence(table, count, e))?;
        tree.flush_async()
            .await
            .map_err(|e| persistence(table, count, e))?;
        debug!(table, rows = count, "Transactional write committed");
        Ok(())
    }
}

/// Destination table and the ordered columns each record is projected onto.
#[derive(Debug, Clone)]
pub struct TableSinkSettings {
    pub table: String,
    pub columns: Vec<String>,
}

/// Writes each chunk into a sled tree with a single atomic batch.
///
/// Row keys are derived from the writing partition (instance, step and
/// partition index) and the record position, so replaying a chunk after a
/// crash overwrites the rows it already wrote while other writers sharing
/// the table keep theirs.
pub struct TableSink {
    store: TableStore,
    tree: Option<sled::Tree>,
    settings: TableSinkSettings,
    key: PartitionKey,
    fault: Option<Arc<dyn FaultInjector>>,
}

impl TableSink {
    pub fn open(
        store: TableStore,
        settings: TableSinkSettings,
        key: PartitionKey,
        fault: Option<Arc<dyn FaultInjector>>,
    ) -> Result<Self, SinkError> {
        if settings.table.trim().is_empty() {
            return Err(SinkError::Configuration("table name cannot be empty".into()));
        }
        if settings.columns.is_empty() {
            return Err(SinkError::Configuration(format!(
                "table '{}' needs at least one column",
                settings.table
            )));
        }

        let tree = store.table(&settings.table)?;
        Ok(Self {
            store,
            tree: Some(tree),
            settings,
            key,
            fault,
        })
    }

    pub fn store(&self) -> &TableStore {
        &self.store
    }

    fn row_key(&self, record: &Record) -> String {
        format!(
            "{DATA_PREFIX}{}\0{}\0{:04}:{:020}",
            self.key.instance_id, self.key.step_name, self.key.partition, record.position
        )
    }

    fn project(&self, record: &Record) -> Vec<serde_json::Value> {
        self.settings
            .columns
            .iter()
            .map(|col| record.get_value(col).to_json())
            .collect()
    }
}

#[async_trait]
impl RecordSink for TableSink {
    async fn write_chunk(&mut self, records: &[Record]) -> Result<(), SinkError> {
        let table = self.settings.table.as_str();
        let tree = self.tree.as_ref().ok_or(SinkError::Closed)?;

        if let Some(fault) = &self.fault {
            fault
                .before_write(records.len())
                .map_err(|reason| SinkError::Persistence {
                    table: table.to_string(),
                    records: records.len(),
                    reason,
                })?;
        }

        let mut batch = sled::Batch::default();
        for record in records {
            let value = serde_json::to_vec(&self.project(record))
                .map_err(|e| persistence(table, records.len(), e))?;
            batch.insert(self.row_key(record).as_bytes(), value);
        }

        tree.apply_batch(batch)
            .map_err(|e| persistence(table, records.len(), e))?;
        tree.flush_async()
            .await
            .map_err(|e| persistence(table, records.len(), e))?;

        if let Some(fault) = &self.fault {
            fault.after_write();
        }

        info!(
            table,
            partition = %self.key,
            records = records.len(),
            "Number of records persisted"
        );
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if let Some(tree) = self.tree.take() {
            tree.flush()?;
            debug!(table = %self.settings.table, "Released table handle");
        }
        Ok(())
    }
}

fn persistence(table: &str, records: usize, err: impl std::fmt::Display) -> SinkError {
    SinkError::Persistence {
        table: table.to_string(),
        records,
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::fault::FailAfterWrites;
    use model::core::{identifiers::JobInstanceId, value::FieldValue};
    use tempfile::tempdir;

    fn record(position: u64, clicks: i64) -> Record {
        Record::new(
            "report",
            position,
            vec![
                FieldValue::new("clicks", Value::Int(clicks)),
                FieldValue::new("date", Value::String(format!("d{position}"))),
            ],
        )
    }

    fn key(step: &str) -> PartitionKey {
        PartitionKey::new(JobInstanceId::new("report-1"), step, 0)
    }

    fn settings() -> TableSinkSettings {
        TableSinkSettings {
            table: "RAW_REPORT".into(),
            columns: vec!["date".into(), "clicks".into(), "earning".into()],
        }
    }

    #[tokio::test]
    async fn projects_records_onto_columns() {
        let dir = tempdir().unwrap();
        let store = TableStore::open(dir.path()).unwrap();
        let mut sink = TableSink::open(store.clone(), settings(), key("load"), None).unwrap();

        sink.write_chunk(&[record(1, 10), record(2, 20)]).await.unwrap();

        let rows = store.data_rows("RAW_REPORT").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            vec![
                serde_json::json!("d1"),
                serde_json::json!(10),
                serde_json::Value::Null
            ]
        );
    }

    #[tokio::test]
    async fn replaying_a_chunk_does_not_duplicate_rows() {
        let dir = tempdir().unwrap();
        let store = TableStore::open(dir.path()).unwrap();
        let mut sink = TableSink::open(store.clone(), settings(), key("load"), None).unwrap();

        let chunk = [record(1, 10), record(2, 20)];
        sink.write_chunk(&chunk).await.unwrap();
        sink.write_chunk(&chunk).await.unwrap();

        assert_eq!(store.data_rows("RAW_REPORT").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn writers_sharing_a_table_keep_their_rows() {
        let dir = tempdir().unwrap();
        let store = TableStore::open(dir.path()).unwrap();
        let mut first = TableSink::open(store.clone(), settings(), key("first"), None).unwrap();
        let mut second = TableSink::open(store.clone(), settings(), key("second"), None).unwrap();
        let other = PartitionKey::new(JobInstanceId::new("report-2"), "first", 0);
        let mut third = TableSink::open(store.clone(), settings(), other, None).unwrap();

        first.write_chunk(&[record(1, 1), record(2, 2)]).await.unwrap();
        second.write_chunk(&[record(1, 10), record(2, 20)]).await.unwrap();
        third.write_chunk(&[record(1, 100)]).await.unwrap();

        let clicks: Vec<_> = store
            .data_rows("RAW_REPORT")
            .unwrap()
            .iter()
            .map(|row| row[1].as_i64().unwrap())
            .collect();
        assert_eq!(clicks, vec![1, 2, 10, 20, 100]);
    }

    #[tokio::test]
    async fn injected_failure_persists_nothing() {
        let dir = tempdir().unwrap();
        let store = TableStore::open(dir.path()).unwrap();
        let fault = Arc::new(FailAfterWrites::new(1));
        let mut sink = TableSink::open(store.clone(), settings(), key("load"), Some(fault)).unwrap();

        sink.write_chunk(&[record(1, 1)]).await.unwrap();
        let err = sink
            .write_chunk(&[record(2, 2), record(3, 3)])
            .await
            .unwrap_err();

        assert!(matches!(err, SinkError::Persistence { records: 2, .. }));
        assert_eq!(store.data_rows("RAW_REPORT").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn closed_sink_rejects_writes() {
        let dir = tempdir().unwrap();
        let store = TableStore::open(dir.path()).unwrap();
        let mut sink = TableSink::open(store, settings(), key("load"), None).unwrap();

        sink.close().unwrap();
        sink.close().unwrap();
        assert!(matches!(
            sink.write_chunk(&[record(1, 1)]).await,
            Err(SinkError::Closed)
        ));
    }

    #[test]
    fn encoding_failures_are_persistence_errors() {
        let err = serde_json::from_str::<u8>("not a number").unwrap_err();
        assert!(matches!(
            persistence("RAW_REPORT", 2, err),
            SinkError::Persistence { records: 2, .. }
        ));
    }

    #[test]
    fn requires_columns() {
        let dir = tempdir().unwrap();
        let store = TableStore::open(dir.path()).unwrap();
        let settings = TableSinkSettings {
            table: "RAW_REPORT".into(),
            columns: vec![],
        };
        assert!(matches!(
            TableSink::open(store, settings, key("load"), None),
            Err(SinkError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn transactional_write_keeps_markers_apart() {
        let dir = tempdir().unwrap();
        let store = TableStore::open(dir.path()).unwrap();

        store
            .write_atomic(
                "RAW_REPORT",
                vec![vec![Value::Int(1), Value::String("Before Job".into())]],
            )
            .await
            .unwrap();

        assert_eq!(store.marker_rows("RAW_REPORT").unwrap().len(), 1);
        assert!(store.data_rows("RAW_REPORT").unwrap().is_empty());
    }
}
