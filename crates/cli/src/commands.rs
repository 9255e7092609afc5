use clap::{Args, Subcommand};
use model::{core::identifiers::ExecutionId, execution::parameters::ParameterPair};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Start a new execution of the job and wait for it to finish
    Run {
        #[arg(long, help = "Job definition file (JSON)")]
        job: PathBuf,

        #[command(flatten)]
        params: ParameterArgs,
    },
    /// Restart a FAILED or STOPPED execution from its last checkpoint
    Restart {
        #[arg(long, help = "Job definition file (JSON)")]
        job: PathBuf,

        #[arg(long, allow_hyphen_values = true, help = "Execution to restart")]
        execution_id: ExecutionId,

        #[command(flatten)]
        params: ParameterArgs,
    },
    /// Show the status of an execution and its steps
    Status {
        #[arg(long, allow_hyphen_values = true)]
        execution_id: ExecutionId,

        #[arg(
            long,
            help = "If set, prints the execution as JSON instead of a table"
        )]
        json: bool,
    },
    /// Mark a FAILED or STOPPED execution as never to be restarted
    Abandon {
        #[arg(long, allow_hyphen_values = true)]
        execution_id: ExecutionId,
    },
}

#[derive(Args)]
pub struct ParameterArgs {
    /// Job parameter as KEY=VALUE; repeatable
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<ParameterPair>,

    /// File of KEY=VALUE lines; --param entries override it
    #[arg(long, value_name = "FILE")]
    pub param_file: Option<PathBuf>,
}

/// Settings shared by every subcommand.
#[derive(Args)]
pub struct RuntimeArgs {
    #[arg(
        long,
        global = true,
        help = "State directory (defaults to ~/.batchrun/state)"
    )]
    pub state_dir: Option<PathBuf>,

    #[arg(
        long = "resource-dir",
        global = true,
        help = "Directory searched for data and mapping files; repeatable"
    )]
    pub resource_dirs: Vec<PathBuf>,

    #[arg(long, global = true, default_value_t = 1000)]
    pub poll_interval_ms: u64,

    #[arg(long, global = true, default_value_t = 10)]
    pub max_attempts: u32,

    #[arg(
        long,
        global = true,
        help = "Keep state in memory; nothing survives the process"
    )]
    pub ephemeral: bool,
}
