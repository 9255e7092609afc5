use serde::{Deserialize, Serialize};

/// Job and step listeners, selected by configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ListenerSettings {
    /// Inserts a marker row before and after the job or step.
    Audit { table: String },
    /// Logs the lifecycle events.
    Log,
}
