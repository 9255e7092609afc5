use crate::error::PlanningError;
use engine_config::settings::partition::PartitionSettings;
use engine_core::context::step::StepContext;
use model::execution::partition::{PartitionPlan, PartitionProperties};
use serde_json::{Value as JsonValue, json};
use tracing::debug;

/// Decides how many partitions a step runs and what each one receives.
pub trait PartitionMapper: Send + Sync {
    fn plan(&self, ctx: &mut StepContext) -> Result<PartitionPlan, PlanningError>;
}

/// One partition with empty properties.
#[derive(Debug, Clone, Default)]
pub struct SinglePartition {
    user_data: Option<JsonValue>,
}

impl SinglePartition {
    pub fn with_user_data(data: JsonValue) -> Self {
        Self {
            user_data: Some(data),
        }
    }
}

impl PartitionMapper for SinglePartition {
    fn plan(&self, ctx: &mut StepContext) -> Result<PartitionPlan, PlanningError> {
        if let Some(data) = &self.user_data {
            ctx.set_persistent_user_data(data.clone());
        }
        ctx.set_transient("partitions", json!(1));
        Ok(PartitionPlan::single())
    }
}

/// A fixed partition count with optional per-partition properties.
#[derive(Debug, Clone)]
pub struct StaticPartitions {
    count: usize,
    properties: Vec<PartitionProperties>,
}

impl StaticPartitions {
    pub fn new(count: usize, properties: Vec<PartitionProperties>) -> Self {
        Self { count, properties }
    }
}

impl PartitionMapper for StaticPartitions {
    fn plan(&self, ctx: &mut StepContext) -> Result<PartitionPlan, PlanningError> {
        if self.count < 1 {
            return Err(PlanningError::NoPartitions(self.count));
        }
        if !self.properties.is_empty() && self.properties.len() != self.count {
            return Err(PlanningError::PropertyCountMismatch {
                expected: self.count,
                actual: self.properties.len(),
            });
        }

        debug!(step = %ctx.step_name, partitions = self.count, "Planned static partitions");
        ctx.set_transient("partitions", json!(self.count));
        Ok(PartitionPlan::new(self.count, self.properties.clone()))
    }
}

pub fn mapper_for(settings: &PartitionSettings) -> Box<dyn PartitionMapper> {
    match settings {
        PartitionSettings::Single { user_data } => Box::new(SinglePartition {
            user_data: user_data.clone(),
        }),
        PartitionSettings::Static { count, properties } => {
            Box::new(StaticPartitions::new(*count, properties.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{
        core::identifiers::{ExecutionId, JobInstanceId},
        execution::parameters::JobParameters,
    };

    fn ctx() -> StepContext {
        StepContext::new(
            ExecutionId::new(1),
            JobInstanceId::new("job-1"),
            "job",
            "load",
            JobParameters::new(),
        )
    }

    #[test]
    fn default_plan_is_one_empty_partition() {
        let mut ctx = ctx();
        let plan = mapper_for(&PartitionSettings::default()).plan(&mut ctx).unwrap();

        assert_eq!(plan.partitions(), 1);
        assert!(plan.properties_for(0).is_empty());
        assert!(ctx.persistent_user_data().is_none());
    }

    #[test]
    fn single_partition_records_user_data() {
        let mut ctx = ctx();
        SinglePartition::with_user_data(json!("hello"))
            .plan(&mut ctx)
            .unwrap();
        assert_eq!(ctx.persistent_user_data(), Some(&json!("hello")));
    }

    #[test]
    fn static_plan_hands_out_properties() {
        let mut first = PartitionProperties::new();
        first.insert("file".into(), "a.csv".into());
        let mut second = PartitionProperties::new();
        second.insert("file".into(), "b.csv".into());

        let plan = StaticPartitions::new(2, vec![first.clone(), second])
            .plan(&mut ctx())
            .unwrap();
        assert_eq!(plan.partitions(), 2);
        assert_eq!(plan.properties_for(0), first);
    }

    #[test]
    fn static_plan_rejects_bad_counts() {
        assert_eq!(
            StaticPartitions::new(0, vec![]).plan(&mut ctx()),
            Err(PlanningError::NoPartitions(0))
        );
        assert_eq!(
            StaticPartitions::new(3, vec![PartitionProperties::new()]).plan(&mut ctx()),
            Err(PlanningError::PropertyCountMismatch {
                expected: 3,
                actual: 1
            })
        );
    }
}
