use crate::{
    commands::{Commands, ParameterArgs, RuntimeArgs},
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use connectors::sink::table::TableStore;
use engine_config::registry::JobRegistry;
use engine_core::state::{StateHandles, memory::MemoryStateStore, sled_store::SledStateStore};
use engine_runtime::{
    controller::{JobCommand, JobController, PollPolicy},
    error::OperatorError,
    execution::factory::RuntimeEnv,
    operator::{BatchRuntime, JobOperator},
};
use model::{core::identifiers::ExecutionId, execution::job::JobExecution};
use std::{path::Path, sync::Arc, time::Duration};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod output;
mod params;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "batchrun",
    version = "0.1.0",
    about = "Chunked batch jobs with restart from checkpoints"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    runtime: RuntimeArgs,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let code = match execute(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!(error = %err, "batchrun failed");
            eprintln!("Error: {err}");
            ExitCode::GeneralError
        }
    };
    std::process::exit(code.as_i32());
}

async fn execute(cli: Cli) -> Result<ExitCode, CliError> {
    match cli.command {
        Commands::Run { job, params } => {
            launch(&cli.runtime, &job, &params, JobCommand::Start, ExecutionId::NONE).await
        }
        Commands::Restart {
            job,
            execution_id,
            params,
        } => launch(&cli.runtime, &job, &params, JobCommand::Restart, execution_id).await,
        Commands::Status { execution_id, json } => {
            let runtime = Runtime::open(&cli.runtime, JobRegistry::new(), Vec::new()).await?;
            let execution = runtime.operator.job_execution(execution_id).await?;
            let steps = runtime.operator.step_executions(execution_id).await?;
            if json {
                output::print_status_json(&execution, &steps)?;
            } else {
                output::print_status_table(&execution, &steps);
            }
            Ok(ExitCode::Success)
        }
        Commands::Abandon { execution_id } => {
            let runtime = Runtime::open(&cli.runtime, JobRegistry::new(), Vec::new()).await?;
            let execution = runtime.operator.abandon(execution_id).await?;
            println!("Execution {} is {}", execution.execution_id, execution.status);
            Ok(ExitCode::Success)
        }
    }
}

async fn launch(
    args: &RuntimeArgs,
    job_file: &Path,
    param_args: &ParameterArgs,
    command: JobCommand,
    execution_id: ExecutionId,
) -> Result<ExitCode, CliError> {
    let mut registry = JobRegistry::new();
    let job = registry.load_file(job_file)?;
    let parameters = params::collect(param_args.param_file.as_deref(), &param_args.params)?;

    // Data files are also looked up next to the job definition.
    let mut roots = args.resource_dirs.clone();
    if let Some(parent) = job_file.parent() {
        roots.push(parent.to_path_buf());
    }

    let runtime = Runtime::open(args, registry, roots).await?;
    let shutdown = ShutdownCoordinator::new(runtime.operator.clone());
    shutdown.register_handlers();

    info!(job = %job.name, command = %command, params = %parameters, "Running job");
    let execution = runtime
        .controller
        .run(command, &job.name, parameters, execution_id)
        .await?;
    let execution = runtime.settle(execution).await?;

    output::print_exit(&execution);
    Ok(ExitCode::for_status(
        execution.status,
        shutdown.is_shutdown_requested(),
    ))
}

struct Runtime {
    operator: Arc<JobOperator>,
    controller: JobController,
}

impl Runtime {
    async fn open(
        args: &RuntimeArgs,
        registry: JobRegistry,
        resource_roots: Vec<std::path::PathBuf>,
    ) -> Result<Self, CliError> {
        let (state, tables) = open_state(args)?;
        let env = RuntimeEnv::new(tables, resource_roots);
        let operator = Arc::new(JobOperator::new(Arc::new(registry), state, env));

        let recovered = operator.recover_orphans().await?;
        if !recovered.is_empty() {
            warn!(count = recovered.len(), "Marked orphaned executions as FAILED");
        }

        let policy = PollPolicy {
            interval: Duration::from_millis(args.poll_interval_ms),
            max_attempts: args.max_attempts,
        };
        let controller = JobController::new(operator.clone(), policy);
        Ok(Self {
            operator,
            controller,
        })
    }

    /// The process is about to exit; an execution still running after the
    /// poll budget is stopped so its state stays restartable.
    async fn settle(&self, execution: JobExecution) -> Result<JobExecution, CliError> {
        if execution.is_terminal() {
            return Ok(execution);
        }

        let id = execution.execution_id;
        warn!(execution_id = %id, status = %execution.status, "Poll budget exhausted, stopping execution");
        match self.operator.stop(id).await {
            Ok(()) | Err(OperatorError::NotRunning { .. }) => {}
            Err(e) => return Err(e.into()),
        }
        Ok(self.operator.wait(id).await?)
    }
}

fn open_state(args: &RuntimeArgs) -> Result<(StateHandles, TableStore), CliError> {
    if args.ephemeral {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|err| CliError::StateOpen {
                path: "<temporary>".into(),
                reason: err.to_string(),
            })?;
        let store = Arc::new(MemoryStateStore::new());
        return Ok((StateHandles::new(store), TableStore::from_db(db)));
    }

    let path = match &args.state_dir {
        Some(path) => path.clone(),
        None => dirs::home_dir()
            .ok_or_else(|| CliError::Unexpected("Could not determine home directory".into()))?
            .join(".batchrun/state"),
    };
    let store = SledStateStore::open(&path).map_err(|err| CliError::StateOpen {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    info!(path = %path.display(), "Opened state store");

    let tables = TableStore::from_db(store.db().clone());
    Ok((StateHandles::new(Arc::new(store)), tables))
}
