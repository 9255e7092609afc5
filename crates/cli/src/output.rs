use crate::error::CliError;
use model::execution::{job::JobExecution, step::StepExecution};
use serde::Serialize;

#[derive(Serialize)]
struct StatusReport<'a> {
    execution: &'a JobExecution,
    steps: &'a [StepExecution],
}

/// The two lines printed once a run or restart resolves.
pub fn print_exit(execution: &JobExecution) {
    println!("Exit Status : {}", execution.status);
    println!("Done");
}

pub fn print_status_json(execution: &JobExecution, steps: &[StepExecution]) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(&StatusReport { execution, steps })?;
    println!("{json}");
    Ok(())
}

pub fn print_status_table(execution: &JobExecution, steps: &[StepExecution]) {
    println!("Execution {} of job '{}':", execution.execution_id, execution.job_name);
    println!("-----------------------------");
    println!("{:<16} {}", "Instance", execution.instance_id);
    println!("{:<16} {}", "Status", execution.status);
    println!("{:<16} {}", "Parameters", execution.parameters);
    println!("{:<16} {}", "Created", execution.create_time.to_rfc3339());
    println!("{:<16} {}", "Started", timestamp(execution.start_time));
    println!("{:<16} {}", "Ended", timestamp(execution.end_time));
    println!(
        "{:<16} {}",
        "Exit status",
        execution.exit_status.as_deref().unwrap_or("n/a")
    );

    if steps.is_empty() {
        return;
    }
    println!();
    println!(
        "{:<20} {:<10} {:>6} {:>8} {:>8} {:>8} {:>8}",
        "Step", "Status", "Parts", "Read", "Written", "Skipped", "Commits"
    );
    for step in steps {
        println!(
            "{:<20} {:<10} {:>6} {:>8} {:>8} {:>8} {:>8}",
            step.step_name,
            step.status.as_str(),
            step.partitions,
            step.items_read,
            step.items_written,
            step.items_skipped,
            step.commit_count
        );
    }
}

fn timestamp(ts: Option<chrono::DateTime<chrono::Utc>>) -> String {
    ts.map(|ts| ts.to_rfc3339())
        .unwrap_or_else(|| "n/a".to_string())
}
