use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Lifecycle status shared by job and step executions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Starting,
    Started,
    Completed,
    Failed,
    Stopped,
    Abandoned,
}

impl BatchStatus {
    pub const INCOMPLETE: [BatchStatus; 2] = [BatchStatus::Starting, BatchStatus::Started];

    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Starting => "STARTING",
            BatchStatus::Started => "STARTED",
            BatchStatus::Completed => "COMPLETED",
            BatchStatus::Failed => "FAILED",
            BatchStatus::Stopped => "STOPPED",
            BatchStatus::Abandoned => "ABANDONED",
        }
    }

    /// Any status outside STARTING/STARTED is terminal.
    pub fn is_terminal(&self) -> bool {
        !Self::INCOMPLETE.contains(self)
    }

    pub fn is_restartable(&self) -> bool {
        matches!(self, BatchStatus::Failed | BatchStatus::Stopped)
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "STARTING" => Ok(BatchStatus::Starting),
            "STARTED" => Ok(BatchStatus::Started),
            "COMPLETED" => Ok(BatchStatus::Completed),
            "FAILED" => Ok(BatchStatus::Failed),
            "STOPPED" => Ok(BatchStatus::Stopped),
            "ABANDONED" => Ok(BatchStatus::Abandoned),
            other => Err(format!("unknown batch status '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_starting_and_started_are_incomplete() {
        assert!(!BatchStatus::Starting.is_terminal());
        assert!(!BatchStatus::Started.is_terminal());
        for status in [
            BatchStatus::Completed,
            BatchStatus::Failed,
            BatchStatus::Stopped,
            BatchStatus::Abandoned,
        ] {
            assert!(status.is_terminal(), "{status} should be terminal");
        }
    }

    #[test]
    fn restartable_statuses() {
        assert!(BatchStatus::Failed.is_restartable());
        assert!(BatchStatus::Stopped.is_restartable());
        assert!(!BatchStatus::Completed.is_restartable());
        assert!(!BatchStatus::Abandoned.is_restartable());
    }
}
