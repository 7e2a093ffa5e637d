//! Drives one function through a release.
//!
//! Forward path: configuration, code, publish, alias, cutover. Teardown of the
//! previous alias is independent of cutover and may run in a later process.
//! Nothing here retries or rolls back; a failed step leaves earlier side
//! effects in place.
//!
//! Alias numbering reads the latest alias and then creates `latest + 1` with
//! no lock. Two releases of the same function running at once can collide.

use std::path::Path;

use lambda_release_core::alias::{latest_alias_version, AliasName, AliasPlan, ALIAS_PAGE_SIZE};
use lambda_release_core::identity::{
    gateway_source_arn, permission_statement_id, ResourceIdentity, ScalingBounds,
    GATEWAY_PRINCIPAL, INVOKE_ACTION, SCALING_METRIC_TYPE, SCALING_POLICY_NAME,
    SCALING_POLICY_TYPE,
};
use lambda_release_core::package::{archive_path, build_archive, CodeArchive, PackageRules};
use lambda_release_core::polling::{is_successful_status, PollPolicy};
use lambda_release_core::session::DeploymentSession;
use lambda_release_core::settings::FunctionSettings;
use lambda_release_core::{ReleaseError, ReleaseResult};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::adapters::autoscaling::{
    AutoscalingRegistrar, ScalableResource, ScalableTarget, ScalingPolicySummary,
    TargetTrackingPolicy,
};
use crate::adapters::pause::Pause;
use crate::adapters::registry::{FunctionRegistry, FunctionStatus, InvokePermission};

/// Concurrency reported for an alias that has none configured.
pub const DEFAULT_PROVISIONED_CONCURRENCY: i32 = 1;

/// The function being released and the environment it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTarget {
    pub env: String,
    pub identity: ResourceIdentity,
}

impl ReleaseTarget {
    pub fn new(env: impl Into<String>, function_name: impl Into<String>) -> Self {
        Self {
            env: env.into(),
            identity: ResourceIdentity::for_function(function_name),
        }
    }

    pub fn function_name(&self) -> &str {
        &self.identity.function_name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaitOutcome {
    pub completed: bool,
    pub polls: u64,
    pub last_status: Option<FunctionStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoscalingSnapshot {
    pub alias: String,
    pub targets: Vec<ScalableTarget>,
    pub policies: Vec<ScalingPolicySummary>,
}

pub struct DeploymentOrchestrator<'a> {
    target: ReleaseTarget,
    registry: &'a dyn FunctionRegistry,
    autoscaler: &'a dyn AutoscalingRegistrar,
    pause: &'a dyn Pause,
}

impl<'a> DeploymentOrchestrator<'a> {
    pub fn new(
        target: ReleaseTarget,
        registry: &'a dyn FunctionRegistry,
        autoscaler: &'a dyn AutoscalingRegistrar,
        pause: &'a dyn Pause,
    ) -> Self {
        Self {
            target,
            registry,
            autoscaler,
            pause,
        }
    }

    pub fn target(&self) -> &ReleaseTarget {
        &self.target
    }

    fn function_name(&self) -> &str {
        self.target.function_name()
    }

    fn scalable_resource(&self, alias: AliasName) -> ScalableResource {
        let identity = &self.target.identity;
        ScalableResource {
            service_namespace: identity.service_namespace.clone(),
            resource_id: identity.resource_id(alias),
            scalable_dimension: identity.scalable_dimension.clone(),
        }
    }

    pub fn update_configuration(
        &self,
        session: &mut DeploymentSession,
        settings: &FunctionSettings,
    ) -> ReleaseResult<()> {
        info!(
            function = self.function_name(),
            fields = settings.len(),
            "updating function configuration"
        );
        self.registry
            .update_configuration(self.function_name(), settings)?;
        session.record_code_configured();
        Ok(())
    }

    /// Packages `source_root`, leaves the archive at `{source_root}/{function}.zip`,
    /// and uploads it.
    pub fn update_code(
        &self,
        session: &mut DeploymentSession,
        source_root: &Path,
        rules: &PackageRules,
    ) -> ReleaseResult<CodeArchive> {
        info!(function = self.function_name(), "compressing function code");
        let archive = build_archive(source_root, rules)?;
        let path = archive_path(source_root, self.function_name());
        archive.write_to(&path)?;
        debug!(path = %path.display(), "wrote code archive");

        self.upload_code(session, &archive)?;
        Ok(archive)
    }

    pub fn upload_code(
        &self,
        session: &mut DeploymentSession,
        archive: &CodeArchive,
    ) -> ReleaseResult<()> {
        let local_digest = archive.sha256_base64();
        info!(
            function = self.function_name(),
            size_bytes = archive.bytes().len(),
            code_sha256 = %local_digest,
            "updating function code"
        );
        let reported = self
            .registry
            .update_code(self.function_name(), archive.bytes())?;

        if let Some(reported) = reported {
            if reported != local_digest {
                return Err(ReleaseError::deployment(format!(
                    "uploaded code digest mismatch: local {local_digest}, registry {reported}"
                )));
            }
        }
        session.record_code_configured();
        Ok(())
    }

    pub fn publish_version(
        &self,
        session: &mut DeploymentSession,
        description: &str,
    ) -> ReleaseResult<String> {
        info!(function = self.function_name(), description, "publishing version");
        let version = self
            .registry
            .publish_version(self.function_name(), description)?;
        info!(function = self.function_name(), version = %version, "published version");
        session.record_published(version.clone());
        Ok(version)
    }

    /// Highest `v{n}` alias number across all pages, 0 when none exist.
    pub fn latest_alias_version(&self) -> ReleaseResult<u64> {
        let mut names = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let page =
                self.registry
                    .list_aliases(self.function_name(), ALIAS_PAGE_SIZE, marker.as_deref())?;
            names.extend(page.names);
            match page.next_marker {
                Some(next) if !next.is_empty() => marker = Some(next),
                _ => break,
            }
        }

        let latest = latest_alias_version(names.iter().map(String::as_str));
        info!(
            function = self.function_name(),
            aliases = names.len(),
            latest,
            "resolved latest alias"
        );
        Ok(latest)
    }

    pub fn create_alias(&self, session: &mut DeploymentSession) -> ReleaseResult<AliasPlan> {
        let version = session.require_published_version()?.to_string();
        let plan = AliasPlan::from_latest(self.latest_alias_version()?)?;

        info!(
            function = self.function_name(),
            previous = %plan.previous,
            next = %plan.next,
            version = %version,
            "creating alias"
        );
        self.registry
            .create_alias(self.function_name(), &plan.next.to_string(), &version)?;
        session.record_alias_created(plan);
        Ok(plan)
    }

    pub fn add_invoke_permission(
        &self,
        session: &DeploymentSession,
        gateway_arn: &str,
    ) -> ReleaseResult<()> {
        let alias = session.require_next_alias()?;
        let permission = InvokePermission {
            qualified_function_name: self.target.identity.qualified_name(alias),
            statement_id: permission_statement_id(&self.target.env, alias),
            action: INVOKE_ACTION.to_string(),
            principal: GATEWAY_PRINCIPAL.to_string(),
            source_arn: gateway_source_arn(gateway_arn),
        };
        info!(
            function = %permission.qualified_function_name,
            statement_id = %permission.statement_id,
            source_arn = %permission.source_arn,
            "adding invoke permission for API gateway"
        );
        self.registry.add_invoke_permission(&permission)
    }

    /// Reported concurrency, or [`DEFAULT_PROVISIONED_CONCURRENCY`] when the
    /// alias has none configured.
    pub fn provisioned_concurrency(&self, alias: AliasName) -> ReleaseResult<i32> {
        match self
            .registry
            .provisioned_concurrency(self.function_name(), &alias.to_string())?
        {
            Some(executions) => {
                info!(alias = %alias, executions, "read provisioned concurrency");
                Ok(executions)
            }
            None => {
                warn!(
                    alias = %alias,
                    default = DEFAULT_PROVISIONED_CONCURRENCY,
                    "no provisioned concurrency configured, using default"
                );
                Ok(DEFAULT_PROVISIONED_CONCURRENCY)
            }
        }
    }

    pub fn set_provisioned_concurrency(&self, alias: AliasName, need: i32) -> ReleaseResult<()> {
        info!(alias = %alias, need, "setting provisioned concurrency");
        self.registry
            .put_provisioned_concurrency(self.function_name(), &alias.to_string(), need)
    }

    pub fn delete_provisioned_concurrency(&self, alias: AliasName) -> ReleaseResult<()> {
        info!(alias = %alias, "deleting provisioned concurrency");
        self.registry
            .delete_provisioned_concurrency(self.function_name(), &alias.to_string())
    }

    /// Registers the alias as a scalable target, then attaches the shared
    /// target-tracking policy to it.
    pub fn add_autoscaling(&self, alias: AliasName, bounds: ScalingBounds) -> ReleaseResult<()> {
        let resource = self.scalable_resource(alias);
        info!(
            resource_id = %resource.resource_id,
            min_capacity = bounds.min_capacity,
            max_capacity = bounds.max_capacity,
            target_utilization = bounds.target_utilization,
            "adding provisioned concurrency autoscaling"
        );
        self.autoscaler.register_scalable_target(&ScalableTarget {
            resource: resource.clone(),
            min_capacity: bounds.min_capacity,
            max_capacity: bounds.max_capacity,
        })?;
        self.autoscaler.put_scaling_policy(&TargetTrackingPolicy {
            policy_name: SCALING_POLICY_NAME.to_string(),
            policy_type: SCALING_POLICY_TYPE.to_string(),
            resource,
            target_value: bounds.target_utilization,
            predefined_metric_type: SCALING_METRIC_TYPE.to_string(),
        })
    }

    pub fn delete_autoscaling(&self, alias: AliasName) -> ReleaseResult<()> {
        let resource = self.scalable_resource(alias);
        info!(resource_id = %resource.resource_id, "removing provisioned concurrency autoscaling");
        self.autoscaler.deregister_scalable_target(&resource)
    }

    pub fn describe_autoscaling(
        &self,
        session: &DeploymentSession,
    ) -> ReleaseResult<AutoscalingSnapshot> {
        let alias = session.require_next_alias()?;
        let resource = self.scalable_resource(alias);
        let targets = self.autoscaler.describe_scalable_targets(&resource)?;
        let policies = self
            .autoscaler
            .describe_scaling_policies(SCALING_POLICY_NAME, &resource)?;
        debug!(?targets, ?policies, "autoscaling read-back");
        Ok(AutoscalingSnapshot {
            alias: alias.to_string(),
            targets,
            policies,
        })
    }

    /// Carries the previous alias's concurrency over to the next alias and
    /// puts the next alias under autoscaling.
    pub fn run_cutover(
        &self,
        session: &mut DeploymentSession,
        bounds: ScalingBounds,
    ) -> ReleaseResult<()> {
        let previous = session.require_previous_alias()?;
        let next = session.require_next_alias()?;
        info!(previous = %previous, next = %next, "running cutover");

        let concurrency = self.provisioned_concurrency(previous)?;
        self.set_provisioned_concurrency(next, concurrency)?;
        self.add_autoscaling(next, bounds)?;

        session.record_cutover_complete();
        Ok(())
    }

    /// Removes concurrency and autoscaling from the previous alias. Without a
    /// recorded previous alias, uses `v{latest - 1}`.
    pub fn run_teardown(&self, session: &mut DeploymentSession) -> ReleaseResult<AliasName> {
        let previous = match session.previous_alias() {
            Some(alias) => alias,
            None => {
                let derived = AliasName::new(self.latest_alias_version()?).predecessor();
                info!(previous = %derived, "derived previous alias from registry");
                session.record_previous_alias(derived);
                derived
            }
        };
        info!(previous = %previous, "running teardown");

        self.delete_provisioned_concurrency(previous)?;
        self.delete_autoscaling(previous)?;

        session.record_teardown_complete();
        Ok(previous)
    }

    pub fn wait_for_update_completed(&self, policy: PollPolicy) -> ReleaseResult<WaitOutcome> {
        let attempts = policy.attempts();
        let mut last_status = None;

        for poll in 1..=attempts {
            let status = self.registry.function_status(self.function_name())?;
            debug!(poll, status = %status.last_update_status, "polled function status");

            if is_successful_status(&status.last_update_status) {
                info!(function = self.function_name(), polls = poll, "function update completed");
                return Ok(WaitOutcome {
                    completed: true,
                    polls: poll,
                    last_status: Some(status),
                });
            }

            last_status = Some(status);
            self.pause.pause(policy.interval());
        }

        warn!(
            function = self.function_name(),
            polls = attempts,
            max_wait_secs = policy.max_wait_secs,
            "function update did not complete"
        );
        Ok(WaitOutcome {
            completed: false,
            polls: attempts,
            last_status,
        })
    }
}
