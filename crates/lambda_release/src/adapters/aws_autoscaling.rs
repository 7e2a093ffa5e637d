use std::future::Future;

use aws_sdk_applicationautoscaling::error::DisplayErrorContext;
use aws_sdk_applicationautoscaling::types::{
    MetricType, PolicyType, PredefinedMetricSpecification, ScalableDimension, ServiceNamespace,
    TargetTrackingScalingPolicyConfiguration,
};
use lambda_release_core::{ReleaseError, ReleaseResult};
use tokio::runtime::Handle;
use tracing::debug;

use crate::adapters::autoscaling::{
    AutoscalingRegistrar, ScalableResource, ScalableTarget, ScalingPolicySummary,
    TargetTrackingPolicy,
};

/// [`AutoscalingRegistrar`] backed by Application Auto Scaling.
pub struct ApplicationAutoscalingRegistrar {
    client: aws_sdk_applicationautoscaling::Client,
    runtime: Handle,
}

impl ApplicationAutoscalingRegistrar {
    pub fn new(client: aws_sdk_applicationautoscaling::Client, runtime: Handle) -> Self {
        Self { client, runtime }
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

fn autoscaling_error<E>(action: &str, resource_id: &str, error: E) -> ReleaseError
where
    E: std::error::Error,
{
    ReleaseError::autoscaling(format!(
        "failed to {action} for '{resource_id}': {}",
        DisplayErrorContext(&error)
    ))
}

impl AutoscalingRegistrar for ApplicationAutoscalingRegistrar {
    fn register_scalable_target(&self, target: &ScalableTarget) -> ReleaseResult<()> {
        let resource = &target.resource;
        let output = self
            .block_on(
                self.client
                    .register_scalable_target()
                    .service_namespace(ServiceNamespace::from(resource.service_namespace.as_str()))
                    .resource_id(&resource.resource_id)
                    .scalable_dimension(ScalableDimension::from(
                        resource.scalable_dimension.as_str(),
                    ))
                    .min_capacity(target.min_capacity)
                    .max_capacity(target.max_capacity)
                    .send(),
            )
            .map_err(|error| {
                autoscaling_error("register scalable target", &resource.resource_id, error)
            })?;
        debug!(?output, "register_scalable_target response");
        Ok(())
    }

    fn put_scaling_policy(&self, policy: &TargetTrackingPolicy) -> ReleaseResult<()> {
        let resource = &policy.resource;
        let metric = PredefinedMetricSpecification::builder()
            .predefined_metric_type(MetricType::from(policy.predefined_metric_type.as_str()))
            .build()
            .map_err(|error| ReleaseError::autoscaling(format!("invalid metric: {error}")))?;
        let configuration = TargetTrackingScalingPolicyConfiguration::builder()
            .target_value(policy.target_value)
            .predefined_metric_specification(metric)
            .build()
            .map_err(|error| {
                ReleaseError::autoscaling(format!("invalid target tracking configuration: {error}"))
            })?;

        let output = self
            .block_on(
                self.client
                    .put_scaling_policy()
                    .policy_name(&policy.policy_name)
                    .service_namespace(ServiceNamespace::from(resource.service_namespace.as_str()))
                    .resource_id(&resource.resource_id)
                    .scalable_dimension(ScalableDimension::from(
                        resource.scalable_dimension.as_str(),
                    ))
                    .policy_type(PolicyType::from(policy.policy_type.as_str()))
                    .target_tracking_scaling_policy_configuration(configuration)
                    .send(),
            )
            .map_err(|error| autoscaling_error("put scaling policy", &resource.resource_id, error))?;
        debug!(?output, "put_scaling_policy response");
        Ok(())
    }

    fn deregister_scalable_target(&self, resource: &ScalableResource) -> ReleaseResult<()> {
        let output = self
            .block_on(
                self.client
                    .deregister_scalable_target()
                    .service_namespace(ServiceNamespace::from(resource.service_namespace.as_str()))
                    .resource_id(&resource.resource_id)
                    .scalable_dimension(ScalableDimension::from(
                        resource.scalable_dimension.as_str(),
                    ))
                    .send(),
            )
            .map_err(|error| {
                autoscaling_error("deregister scalable target", &resource.resource_id, error)
            })?;
        debug!(?output, "deregister_scalable_target response");
        Ok(())
    }

    fn describe_scalable_targets(
        &self,
        resource: &ScalableResource,
    ) -> ReleaseResult<Vec<ScalableTarget>> {
        let output = self
            .block_on(
                self.client
                    .describe_scalable_targets()
                    .service_namespace(ServiceNamespace::from(resource.service_namespace.as_str()))
                    .resource_ids(&resource.resource_id)
                    .scalable_dimension(ScalableDimension::from(
                        resource.scalable_dimension.as_str(),
                    ))
                    .send(),
            )
            .map_err(|error| {
                autoscaling_error("describe scalable targets", &resource.resource_id, error)
            })?;

        Ok(output
            .scalable_targets()
            .iter()
            .map(|target| ScalableTarget {
                resource: ScalableResource {
                    service_namespace: resource.service_namespace.clone(),
                    resource_id: target.resource_id().to_string(),
                    scalable_dimension: resource.scalable_dimension.clone(),
                },
                min_capacity: target.min_capacity(),
                max_capacity: target.max_capacity(),
            })
            .collect())
    }

    fn describe_scaling_policies(
        &self,
        policy_name: &str,
        resource: &ScalableResource,
    ) -> ReleaseResult<Vec<ScalingPolicySummary>> {
        let output = self
            .block_on(
                self.client
                    .describe_scaling_policies()
                    .policy_names(policy_name)
                    .service_namespace(ServiceNamespace::from(resource.service_namespace.as_str()))
                    .resource_id(&resource.resource_id)
                    .scalable_dimension(ScalableDimension::from(
                        resource.scalable_dimension.as_str(),
                    ))
                    .send(),
            )
            .map_err(|error| {
                autoscaling_error("describe scaling policies", &resource.resource_id, error)
            })?;

        Ok(output
            .scaling_policies()
            .iter()
            .map(|policy| ScalingPolicySummary {
                policy_name: policy.policy_name().to_string(),
                policy_type: policy.policy_type().as_str().to_string(),
                resource_id: policy.resource_id().to_string(),
                target_value: policy
                    .target_tracking_scaling_policy_configuration()
                    .map(|configuration| configuration.target_value()),
            })
            .collect())
    }
}
