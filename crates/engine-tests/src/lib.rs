#![allow(dead_code)]

use connectors::sink::table::TableStore;
use engine_config::{registry::JobRegistry, settings::JobDefinition};
use engine_core::state::{StateHandles, sled_store::SledStateStore};
use engine_runtime::{
    controller::{JobController, PollPolicy},
    execution::factory::RuntimeEnv,
    operator::JobOperator,
};
use model::{
    core::identifiers::{JobInstanceId, PartitionKey},
    execution::checkpoint::StepCheckpoint,
};
use std::{path::Path, sync::Arc, time::Duration};

pub mod restart;
pub mod utils;

/// Poll quickly; jobs in these tests finish in milliseconds.
pub const TEST_POLL_POLICY: PollPolicy = PollPolicy {
    interval: Duration::from_millis(20),
    max_attempts: 500,
};

/// One "process" worth of runtime over a state directory. Dropping it and
/// opening another over the same directory simulates a process restart.
pub struct TestRuntime {
    pub operator: Arc<JobOperator>,
    pub controller: JobController,
    pub state: StateHandles,
    pub tables: TableStore,
    db: sled::Db,
}

impl TestRuntime {
    pub fn open(dir: &Path, jobs: Vec<JobDefinition>) -> Self {
        let store = Arc::new(SledStateStore::open(dir.join("state")).expect("open state store"));
        let db = store.db().clone();
        let tables = TableStore::from_db(db.clone());

        let mut registry = JobRegistry::new();
        for job in jobs {
            registry.register(job).expect("register job");
        }

        let state = StateHandles::new(store);
        let env = RuntimeEnv::new(tables.clone(), vec![dir.to_path_buf()]);
        let operator = Arc::new(JobOperator::new(Arc::new(registry), state.clone(), env));
        let controller = JobController::new(operator.clone(), TEST_POLL_POLICY);

        Self {
            operator,
            controller,
            state,
            tables,
            db,
        }
    }

    /// Flushes and releases the database so the directory can be reopened.
    pub fn close(self) {
        self.db.flush().expect("flush state");
    }

    pub async fn checkpoint(
        &self,
        instance: &JobInstanceId,
        step: &str,
        partition: usize,
    ) -> Option<StepCheckpoint> {
        self.state
            .checkpoints
            .load_checkpoint(&PartitionKey::new(instance.clone(), step, partition))
            .await
            .expect("load checkpoint")
            .map(|record| record.checkpoint)
    }

    /// Values of the first column of every data row in `table`.
    pub fn column_values(&self, table: &str) -> Vec<i64> {
        self.tables
            .data_rows(table)
            .expect("read table")
            .iter()
            .filter_map(|row| row.first().and_then(|v| v.as_i64()))
            .collect()
    }
}
