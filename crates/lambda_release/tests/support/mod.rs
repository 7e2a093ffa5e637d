#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use lambda_release::adapters::autoscaling::{
    AutoscalingRegistrar, ScalableResource, ScalableTarget, ScalingPolicySummary,
    TargetTrackingPolicy,
};
use lambda_release::adapters::pause::Pause;
use lambda_release::adapters::registry::{
    AliasPage, FunctionRegistry, FunctionStatus, InvokePermission,
};
use lambda_release::handlers::orchestrator::{DeploymentOrchestrator, ReleaseTarget};
use lambda_release_core::settings::FunctionSettings;
use lambda_release_core::{ReleaseError, ReleaseResult};

pub const FUNCTION: &str = "recommend-api";
pub const ENV: &str = "dev";

#[derive(Debug, Clone, PartialEq)]
pub enum RegistryCall {
    UpdateConfiguration(usize),
    UpdateCode(usize),
    Publish(String),
    ListAliases(Option<String>),
    CreateAlias { alias: String, version: String },
    AddPermission(InvokePermission),
    GetConcurrency(String),
    PutConcurrency { alias: String, executions: i32 },
    DeleteConcurrency(String),
    Status,
}

/// In-memory function registry with scripted responses.
pub struct FakeRegistry {
    aliases: Mutex<Vec<String>>,
    page_limit: usize,
    next_version: Mutex<u32>,
    concurrency: Mutex<HashMap<String, i32>>,
    statuses: Mutex<VecDeque<String>>,
    reported_digest: Mutex<Option<String>>,
    reject_configuration: bool,
    calls: Mutex<Vec<RegistryCall>>,
}

impl FakeRegistry {
    pub fn with_aliases(aliases: &[&str]) -> Self {
        Self {
            aliases: Mutex::new(aliases.iter().map(|alias| alias.to_string()).collect()),
            page_limit: usize::MAX,
            next_version: Mutex::new(1),
            concurrency: Mutex::new(HashMap::new()),
            statuses: Mutex::new(VecDeque::new()),
            reported_digest: Mutex::new(None),
            reject_configuration: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn page_limit(mut self, limit: usize) -> Self {
        self.page_limit = limit;
        self
    }

    pub fn next_version(self, version: u32) -> Self {
        *self.next_version.lock().expect("poisoned mutex") = version;
        self
    }

    pub fn concurrency(self, alias: &str, executions: i32) -> Self {
        self.concurrency
            .lock()
            .expect("poisoned mutex")
            .insert(alias.to_string(), executions);
        self
    }

    pub fn statuses(self, statuses: &[&str]) -> Self {
        *self.statuses.lock().expect("poisoned mutex") =
            statuses.iter().map(|status| status.to_string()).collect();
        self
    }

    pub fn reported_digest(self, digest: &str) -> Self {
        *self.reported_digest.lock().expect("poisoned mutex") = Some(digest.to_string());
        self
    }

    pub fn rejecting_configuration(mut self) -> Self {
        self.reject_configuration = true;
        self
    }

    pub fn calls(&self) -> Vec<RegistryCall> {
        self.calls.lock().expect("poisoned mutex").clone()
    }

    pub fn aliases(&self) -> Vec<String> {
        self.aliases.lock().expect("poisoned mutex").clone()
    }

    pub fn concurrency_of(&self, alias: &str) -> Option<i32> {
        self.concurrency
            .lock()
            .expect("poisoned mutex")
            .get(alias)
            .copied()
    }

    pub fn status_polls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, RegistryCall::Status))
            .count()
    }

    fn record(&self, call: RegistryCall) {
        self.calls.lock().expect("poisoned mutex").push(call);
    }
}

impl FunctionRegistry for FakeRegistry {
    fn update_configuration(
        &self,
        _function_name: &str,
        settings: &FunctionSettings,
    ) -> ReleaseResult<()> {
        self.record(RegistryCall::UpdateConfiguration(settings.len()));
        if self.reject_configuration {
            return Err(ReleaseError::registry("InvalidParameterValueException"));
        }
        Ok(())
    }

    fn update_code(&self, _function_name: &str, archive: &[u8]) -> ReleaseResult<Option<String>> {
        self.record(RegistryCall::UpdateCode(archive.len()));
        Ok(self.reported_digest.lock().expect("poisoned mutex").clone())
    }

    fn publish_version(&self, _function_name: &str, description: &str) -> ReleaseResult<String> {
        self.record(RegistryCall::Publish(description.to_string()));
        let mut next = self.next_version.lock().expect("poisoned mutex");
        let version = next.to_string();
        *next += 1;
        Ok(version)
    }

    fn list_aliases(
        &self,
        _function_name: &str,
        page_size: i32,
        marker: Option<&str>,
    ) -> ReleaseResult<AliasPage> {
        self.record(RegistryCall::ListAliases(marker.map(str::to_string)));
        assert_eq!(page_size, 100, "aliases are listed 100 per page");

        let aliases = self.aliases();
        let start = marker
            .map(|marker| marker.parse::<usize>().expect("numeric marker"))
            .unwrap_or(0);
        let end = start.saturating_add(self.page_limit).min(aliases.len());
        Ok(AliasPage {
            names: aliases[start..end].to_vec(),
            next_marker: (end < aliases.len()).then(|| end.to_string()),
        })
    }

    fn create_alias(&self, _function_name: &str, alias: &str, version: &str) -> ReleaseResult<()> {
        self.record(RegistryCall::CreateAlias {
            alias: alias.to_string(),
            version: version.to_string(),
        });
        self.aliases
            .lock()
            .expect("poisoned mutex")
            .push(alias.to_string());
        Ok(())
    }

    fn add_invoke_permission(&self, permission: &InvokePermission) -> ReleaseResult<()> {
        self.record(RegistryCall::AddPermission(permission.clone()));
        Ok(())
    }

    fn provisioned_concurrency(
        &self,
        _function_name: &str,
        alias: &str,
    ) -> ReleaseResult<Option<i32>> {
        self.record(RegistryCall::GetConcurrency(alias.to_string()));
        Ok(self.concurrency_of(alias))
    }

    fn put_provisioned_concurrency(
        &self,
        _function_name: &str,
        alias: &str,
        executions: i32,
    ) -> ReleaseResult<()> {
        self.record(RegistryCall::PutConcurrency {
            alias: alias.to_string(),
            executions,
        });
        self.concurrency
            .lock()
            .expect("poisoned mutex")
            .insert(alias.to_string(), executions);
        Ok(())
    }

    fn delete_provisioned_concurrency(
        &self,
        _function_name: &str,
        alias: &str,
    ) -> ReleaseResult<()> {
        self.record(RegistryCall::DeleteConcurrency(alias.to_string()));
        self.concurrency
            .lock()
            .expect("poisoned mutex")
            .remove(alias);
        Ok(())
    }

    fn function_status(&self, _function_name: &str) -> ReleaseResult<FunctionStatus> {
        self.record(RegistryCall::Status);
        let mut statuses = self.statuses.lock().expect("poisoned mutex");
        let status = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        }
        .unwrap_or_else(|| "Successful".to_string());
        Ok(FunctionStatus {
            last_update_status: status,
            ..FunctionStatus::default()
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AutoscalingCall {
    Register(ScalableTarget),
    PutPolicy(TargetTrackingPolicy),
    Deregister(ScalableResource),
}

#[derive(Default)]
pub struct RecordingAutoscaler {
    calls: Mutex<Vec<AutoscalingCall>>,
    reject_policies: bool,
}

impl RecordingAutoscaler {
    pub fn rejecting_policies() -> Self {
        Self {
            reject_policies: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<AutoscalingCall> {
        self.calls.lock().expect("poisoned mutex").clone()
    }
}

impl AutoscalingRegistrar for RecordingAutoscaler {
    fn register_scalable_target(&self, target: &ScalableTarget) -> ReleaseResult<()> {
        self.calls
            .lock()
            .expect("poisoned mutex")
            .push(AutoscalingCall::Register(target.clone()));
        Ok(())
    }

    fn put_scaling_policy(&self, policy: &TargetTrackingPolicy) -> ReleaseResult<()> {
        self.calls
            .lock()
            .expect("poisoned mutex")
            .push(AutoscalingCall::PutPolicy(policy.clone()));
        if self.reject_policies {
            return Err(ReleaseError::autoscaling("LimitExceededException"));
        }
        Ok(())
    }

    fn deregister_scalable_target(&self, resource: &ScalableResource) -> ReleaseResult<()> {
        self.calls
            .lock()
            .expect("poisoned mutex")
            .push(AutoscalingCall::Deregister(resource.clone()));
        Ok(())
    }

    fn describe_scalable_targets(
        &self,
        resource: &ScalableResource,
    ) -> ReleaseResult<Vec<ScalableTarget>> {
        Ok(self
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                AutoscalingCall::Register(target) if &target.resource == resource => Some(target),
                _ => None,
            })
            .collect())
    }

    fn describe_scaling_policies(
        &self,
        policy_name: &str,
        resource: &ScalableResource,
    ) -> ReleaseResult<Vec<ScalingPolicySummary>> {
        Ok(self
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                AutoscalingCall::PutPolicy(policy)
                    if policy.policy_name == policy_name && &policy.resource == resource =>
                {
                    Some(ScalingPolicySummary {
                        policy_name: policy.policy_name,
                        policy_type: policy.policy_type,
                        resource_id: policy.resource.resource_id,
                        target_value: Some(policy.target_value),
                    })
                }
                _ => None,
            })
            .collect())
    }
}

#[derive(Default)]
pub struct RecordingPause {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingPause {
    pub fn total(&self) -> Duration {
        self.pauses.lock().expect("poisoned mutex").iter().sum()
    }

    pub fn count(&self) -> usize {
        self.pauses.lock().expect("poisoned mutex").len()
    }
}

impl Pause for RecordingPause {
    fn pause(&self, duration: Duration) {
        self.pauses.lock().expect("poisoned mutex").push(duration);
    }
}

pub fn orchestrator<'a>(
    registry: &'a FakeRegistry,
    autoscaler: &'a RecordingAutoscaler,
    pause: &'a RecordingPause,
) -> DeploymentOrchestrator<'a> {
    DeploymentOrchestrator::new(ReleaseTarget::new(ENV, FUNCTION), registry, autoscaler, pause)
}
