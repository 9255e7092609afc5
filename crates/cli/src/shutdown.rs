use engine_runtime::operator::JobOperator;
use model::execution::status::BatchStatus;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::signal;
use tracing::{error, info};

/// Listens for SIGINT and SIGTERM and asks every running execution to stop.
/// Executions end STOPPED after their current chunk and stay restartable.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    operator: Arc<JobOperator>,
    shutdown_requested: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new(operator: Arc<JobOperator>) -> Self {
        Self {
            operator,
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn register_handlers(&self) {
        let operator = self.operator.clone();
        let shutdown_flag = self.shutdown_requested.clone();

        tokio::spawn(async move {
            let ctrl_c = async {
                if let Err(e) = signal::ctrl_c().await {
                    error!(error = %e, "Failed to install SIGINT handler");
                    std::future::pending::<()>().await;
                }
            };

            #[cfg(unix)]
            let terminate = async {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to install SIGTERM handler");
                        std::future::pending::<()>().await;
                    }
                }
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => {
                    info!("Received SIGINT (Ctrl+C), stopping running executions");
                }
                _ = terminate => {
                    info!("Received SIGTERM, stopping running executions");
                }
            }

            shutdown_flag.store(true, Ordering::SeqCst);
            operator.stop_all().await;
        });
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }
}

/// Exit codes for the CLI application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    ShutdownRequested = 130, // Standard exit code for SIGINT
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn for_status(status: BatchStatus, shutdown_requested: bool) -> Self {
        match status {
            BatchStatus::Completed => ExitCode::Success,
            _ if shutdown_requested => ExitCode::ShutdownRequested,
            _ => ExitCode::GeneralError,
        }
    }
}
