use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type PartitionProperties = BTreeMap<String, String>;

/// How a step is split into independently executable slices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionPlan {
    partitions: usize,
    properties: Vec<PartitionProperties>,
}

impl PartitionPlan {
    /// A single partition without properties.
    pub fn single() -> Self {
        Self {
            partitions: 1,
            properties: Vec::new(),
        }
    }

    /// Callers are expected to validate `partitions >= 1` before building a plan.
    pub fn new(partitions: usize, properties: Vec<PartitionProperties>) -> Self {
        Self {
            partitions,
            properties,
        }
    }

    pub fn partitions(&self) -> usize {
        self.partitions
    }

    /// Properties of partition `idx`; empty when the plan carries none for it.
    pub fn properties_for(&self, idx: usize) -> PartitionProperties {
        self.properties.get(idx).cloned().unwrap_or_default()
    }

    pub fn properties(&self) -> &[PartitionProperties] {
        &self.properties
    }
}
