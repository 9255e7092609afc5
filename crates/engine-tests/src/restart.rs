#[cfg(test)]
mod tests {
    use crate::{
        TestRuntime,
        utils::{
            NUMBERS_TABLE, definition, fail_after, job, numbers_step, write_mapping,
            write_numbers,
        },
    };
    use engine_config::settings::JobDefinition;
    use engine_runtime::{
        controller::JobCommand,
        error::{ControllerError, InvalidRestartError},
        operator::{BatchRuntime, ORPHANED_EXIT_STATUS},
    };
    use model::{
        core::identifiers::{ExecutionId, JobInstanceId},
        execution::{job::JobExecution, parameters::JobParameters, status::BatchStatus},
    };
    use tempfile::tempdir;
    use tracing_test::traced_test;

    fn ten_records_failing_after(writes: u64) -> JobDefinition {
        definition(job(
            "load-ten",
            vec![fail_after(
                numbers_step("load", "ten.csv", NUMBERS_TABLE, 3),
                writes,
            )],
        ))
    }

    // Scenario: 10 records in chunks of 3; the third write fails, the process
    // goes away, a new process restarts the execution.
    // Expected Outcome: the failed run leaves checkpoint 6 and rows 1..6; the
    // restart completes with the same rows as an uninterrupted run.
    #[traced_test]
    #[tokio::test]
    async fn tc01_restart_matches_uninterrupted_run() {
        let clean_dir = tempdir().unwrap();
        write_mapping(clean_dir.path());
        write_numbers(clean_dir.path(), "ten.csv", 10);
        let clean = TestRuntime::open(
            clean_dir.path(),
            vec![definition(job(
                "load-ten",
                vec![numbers_step("load", "ten.csv", NUMBERS_TABLE, 3)],
            ))],
        );
        let done = clean
            .controller
            .run(JobCommand::Start, "load-ten", JobParameters::new(), ExecutionId::NONE)
            .await
            .unwrap();
        assert_eq!(done.status, BatchStatus::Completed);
        let expected = clean.column_values(NUMBERS_TABLE);
        assert_eq!(expected, (1..=10).collect::<Vec<_>>());

        let dir = tempdir().unwrap();
        write_mapping(dir.path());
        write_numbers(dir.path(), "ten.csv", 10);

        let first = TestRuntime::open(dir.path(), vec![ten_records_failing_after(2)]);
        let failed = first
            .controller
            .run(JobCommand::Start, "load-ten", JobParameters::new(), ExecutionId::NONE)
            .await
            .unwrap();
        assert_eq!(failed.status, BatchStatus::Failed);
        assert!(failed.exit_status.as_deref().unwrap().contains("injected failure"));
        assert_eq!(
            first
                .checkpoint(&failed.instance_id, "load", 0)
                .await
                .map(|c| c.items()),
            Some(6)
        );
        assert_eq!(first.column_values(NUMBERS_TABLE), (1..=6).collect::<Vec<_>>());
        first.close();

        let second = TestRuntime::open(dir.path(), vec![ten_records_failing_after(2)]);
        let restarted = second
            .controller
            .run(
                JobCommand::Restart,
                "load-ten",
                JobParameters::new(),
                failed.execution_id,
            )
            .await
            .unwrap();

        assert_eq!(restarted.status, BatchStatus::Completed);
        assert_eq!(restarted.instance_id, failed.instance_id);
        assert_ne!(restarted.execution_id, failed.execution_id);
        assert_eq!(second.column_values(NUMBERS_TABLE), expected);

        let steps = second
            .operator
            .step_executions(restarted.execution_id)
            .await
            .unwrap();
        assert_eq!(steps[0].items_read, 4);
        assert_eq!(steps[0].items_written, 4);
        assert!(logs_contain("Job execution restarted"));
    }

    // Scenario: a two-step job whose second step fails on its first write.
    // Expected Outcome: the restart runs only the second step.
    #[tokio::test]
    async fn tc02_completed_steps_are_not_rerun() {
        let dir = tempdir().unwrap();
        write_mapping(dir.path());
        write_numbers(dir.path(), "three.csv", 3);

        let rt = TestRuntime::open(
            dir.path(),
            vec![definition(job(
                "two-steps",
                vec![
                    numbers_step("first", "three.csv", "FIRST", 2),
                    fail_after(numbers_step("second", "three.csv", "SECOND", 2), 0),
                ],
            ))],
        );

        let failed = rt
            .controller
            .run(JobCommand::Start, "two-steps", JobParameters::new(), ExecutionId::NONE)
            .await
            .unwrap();
        assert_eq!(failed.status, BatchStatus::Failed);
        assert!(failed.exit_status.unwrap().starts_with("step 'second' FAILED"));

        let steps = rt.operator.step_executions(failed.execution_id).await.unwrap();
        let statuses: Vec<_> = steps.iter().map(|s| (s.step_name.as_str(), s.status)).collect();
        assert_eq!(
            statuses,
            vec![("first", BatchStatus::Completed), ("second", BatchStatus::Failed)]
        );

        let restarted = rt
            .controller
            .run(
                JobCommand::Restart,
                "two-steps",
                JobParameters::new(),
                failed.execution_id,
            )
            .await
            .unwrap();
        assert_eq!(restarted.status, BatchStatus::Completed);

        let steps = rt
            .operator
            .step_executions(restarted.execution_id)
            .await
            .unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].step_name, "second");
        assert_eq!(rt.column_values("FIRST"), vec![1, 2, 3]);
        assert_eq!(rt.column_values("SECOND"), vec![1, 2, 3]);
    }

    // Scenario: stop requested right after start, then a restart; finally a
    // second start of the same job is stopped and abandoned.
    // Expected Outcome: STOPPED, restartable into COMPLETED; ABANDONED
    // executions refuse restarts.
    #[tokio::test]
    async fn tc03_stop_restart_and_abandon() {
        let dir = tempdir().unwrap();
        write_mapping(dir.path());
        write_numbers(dir.path(), "many.csv", 50);

        let mut raw = job(
            "many",
            vec![numbers_step("load", "${input}", NUMBERS_TABLE, 1)],
        );
        raw["required_parameters"] = serde_json::json!(["input"]);
        let rt = TestRuntime::open(dir.path(), vec![definition(raw)]);
        let params = JobParameters::new().with("input", "many.csv");

        let id = rt.controller.start("many", params.clone()).await.unwrap();
        rt.operator.stop(id).await.unwrap();
        let policy = rt.controller.policy();
        let stopped = rt
            .controller
            .await_completion(id, policy.interval, policy.max_attempts)
            .await
            .unwrap();
        assert_eq!(stopped.status, BatchStatus::Stopped);

        let restarted = rt
            .controller
            .run(JobCommand::Restart, "many", JobParameters::new(), id)
            .await
            .unwrap();
        assert_eq!(restarted.status, BatchStatus::Completed);
        assert_eq!(rt.column_values(NUMBERS_TABLE), (1..=50).collect::<Vec<_>>());

        // Starting again with the same parameters opens a second instance.
        let id = rt.controller.start("many", params).await.unwrap();
        rt.operator.stop(id).await.unwrap();
        let stopped = rt.operator.wait(id).await.unwrap();
        assert_eq!(stopped.status, BatchStatus::Stopped);
        assert_ne!(stopped.instance_id, restarted.instance_id);

        let abandoned = rt.operator.abandon(id).await.unwrap();
        assert_eq!(abandoned.status, BatchStatus::Abandoned);
        let err = rt
            .controller
            .run(JobCommand::Restart, "many", JobParameters::new(), id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ControllerError::InvalidRestart(InvalidRestartError::NotRestartable { .. })
        ));
    }

    // Scenario: the input shrinks below the saved checkpoint before a restart.
    // Expected Outcome: the restart fails instead of silently skipping data.
    #[tokio::test]
    async fn tc04_restart_beyond_available_data_fails() {
        let dir = tempdir().unwrap();
        write_mapping(dir.path());
        write_numbers(dir.path(), "ten.csv", 10);

        let rt = TestRuntime::open(dir.path(), vec![ten_records_failing_after(2)]);
        let failed = rt
            .controller
            .run(JobCommand::Start, "load-ten", JobParameters::new(), ExecutionId::NONE)
            .await
            .unwrap();
        assert_eq!(failed.status, BatchStatus::Failed);

        write_numbers(dir.path(), "ten.csv", 4);
        let restarted = rt
            .controller
            .run(
                JobCommand::Restart,
                "load-ten",
                JobParameters::new(),
                failed.execution_id,
            )
            .await
            .unwrap();

        assert_eq!(restarted.status, BatchStatus::Failed);
        let exit = restarted.exit_status.unwrap();
        assert!(exit.contains("Failed to skip 6 records"), "{exit}");
        assert_eq!(
            rt.checkpoint(&failed.instance_id, "load", 0)
                .await
                .map(|c| c.items()),
            Some(6)
        );
    }

    // Scenario: a process died while its execution was STARTED.
    // Expected Outcome: the next process marks it FAILED and can restart it.
    #[tokio::test]
    async fn tc05_orphaned_execution_is_recovered() {
        let dir = tempdir().unwrap();
        write_mapping(dir.path());
        write_numbers(dir.path(), "ten.csv", 10);

        let crashed = TestRuntime::open(dir.path(), vec![ten_records_failing_after(100)]);
        let id = crashed.state.repository.next_execution_id().await.unwrap();
        let params = JobParameters::new();
        let mut orphan = JobExecution::new(
            id,
            JobInstanceId::derive("load-ten", params.as_map(), id),
            "load-ten",
            params,
        );
        orphan.transition(BatchStatus::Started).unwrap();
        crashed.state.repository.save_execution(&orphan).await.unwrap();
        crashed.close();

        let rt = TestRuntime::open(dir.path(), vec![ten_records_failing_after(100)]);
        assert_eq!(rt.operator.recover_orphans().await.unwrap(), vec![id]);

        let recovered = rt.operator.job_execution(id).await.unwrap();
        assert_eq!(recovered.status, BatchStatus::Failed);
        assert_eq!(recovered.exit_status.as_deref(), Some(ORPHANED_EXIT_STATUS));

        let restarted = rt
            .controller
            .run(JobCommand::Restart, "load-ten", JobParameters::new(), id)
            .await
            .unwrap();
        assert_eq!(restarted.status, BatchStatus::Completed);
        assert_eq!(rt.column_values(NUMBERS_TABLE).len(), 10);
    }
}
