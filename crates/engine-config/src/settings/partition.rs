use model::execution::partition::PartitionProperties;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PartitionSettings {
    /// One partition without properties.
    Single {
        /// Stored as the step's persistent user data when set.
        #[serde(default)]
        user_data: Option<JsonValue>,
    },
    /// A fixed number of partitions. `properties` is either empty or holds
    /// one map per partition.
    Static {
        count: usize,
        #[serde(default)]
        properties: Vec<PartitionProperties>,
    },
}

impl Default for PartitionSettings {
    fn default() -> Self {
        PartitionSettings::Single { user_data: None }
    }
}
