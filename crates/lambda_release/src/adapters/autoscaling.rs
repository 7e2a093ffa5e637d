use lambda_release_core::ReleaseResult;
use serde::{Deserialize, Serialize};

/// A scalable resource as addressed by the registrar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalableResource {
    pub service_namespace: String,
    pub resource_id: String,
    pub scalable_dimension: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalableTarget {
    pub resource: ScalableResource,
    pub min_capacity: i32,
    pub max_capacity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetTrackingPolicy {
    pub policy_name: String,
    pub policy_type: String,
    pub resource: ScalableResource,
    pub target_value: f64,
    pub predefined_metric_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingPolicySummary {
    pub policy_name: String,
    pub policy_type: String,
    pub resource_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_value: Option<f64>,
}

pub trait AutoscalingRegistrar {
    fn register_scalable_target(&self, target: &ScalableTarget) -> ReleaseResult<()>;

    fn put_scaling_policy(&self, policy: &TargetTrackingPolicy) -> ReleaseResult<()>;

    /// Policies attached to the target are removed along with it.
    fn deregister_scalable_target(&self, resource: &ScalableResource) -> ReleaseResult<()>;

    fn describe_scalable_targets(
        &self,
        resource: &ScalableResource,
    ) -> ReleaseResult<Vec<ScalableTarget>>;

    fn describe_scaling_policies(
        &self,
        policy_name: &str,
        resource: &ScalableResource,
    ) -> ReleaseResult<Vec<ScalingPolicySummary>>;
}
