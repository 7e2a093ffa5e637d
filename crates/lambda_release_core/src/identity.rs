//! Naming of the resources a release touches.

use serde::{Deserialize, Serialize};

use crate::alias::AliasName;

pub const SERVICE_NAMESPACE: &str = "lambda";
pub const SCALABLE_DIMENSION: &str = "lambda:function:ProvisionedConcurrency";

/// Shared by every alias of every function; the resource id is what scopes it.
pub const SCALING_POLICY_NAME: &str = "lambda-common-autoscaling-policy";
pub const SCALING_POLICY_TYPE: &str = "TargetTrackingScaling";
pub const SCALING_METRIC_TYPE: &str = "LambdaProvisionedConcurrencyUtilization";

pub const INVOKE_ACTION: &str = "lambda:InvokeFunction";
pub const GATEWAY_PRINCIPAL: &str = "apigateway.amazonaws.com";

/// Identity of a function as seen by the autoscaling registrar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceIdentity {
    pub service_namespace: String,
    pub scalable_dimension: String,
    pub function_name: String,
}

impl ResourceIdentity {
    pub fn for_function(function_name: impl Into<String>) -> Self {
        Self {
            service_namespace: SERVICE_NAMESPACE.to_string(),
            scalable_dimension: SCALABLE_DIMENSION.to_string(),
            function_name: function_name.into(),
        }
    }

    /// `function:{name}:{alias}`
    pub fn resource_id(&self, alias: AliasName) -> String {
        format!("function:{}:{alias}", self.function_name)
    }

    /// `{name}:{alias}`, the qualified function name.
    pub fn qualified_name(&self, alias: AliasName) -> String {
        format!("{}:{alias}", self.function_name)
    }
}

/// Capacity bounds and utilization setpoint for an alias.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingBounds {
    pub min_capacity: i32,
    pub max_capacity: i32,
    pub target_utilization: f64,
}

impl Default for ScalingBounds {
    fn default() -> Self {
        Self {
            min_capacity: 1,
            max_capacity: 10,
            target_utilization: 0.3,
        }
    }
}

/// Grants API Gateway GET access on every stage, two resource levels deep.
pub fn gateway_source_arn(gateway_arn: &str) -> String {
    format!("{}/*/GET/*/*", gateway_arn.trim_end_matches('/'))
}

/// `{env}-{alias}`
pub fn permission_statement_id(env: &str, alias: AliasName) -> String {
    format!("{env}-{alias}")
}
