use crate::execution::status::BatchStatus;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecutionStateError {
    #[error("illegal status transition {from} -> {to}")]
    IllegalTransition { from: BatchStatus, to: BatchStatus },
}
