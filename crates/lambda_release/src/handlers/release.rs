use std::path::PathBuf;

use lambda_release_core::identity::ScalingBounds;
use lambda_release_core::package::PackageRules;
use lambda_release_core::polling::PollPolicy;
use lambda_release_core::session::DeploymentSession;
use lambda_release_core::settings::FunctionSettings;
use lambda_release_core::{ReleaseError, ReleaseResult};
use serde::Serialize;
use tracing::info;

use crate::handlers::orchestrator::{AutoscalingSnapshot, DeploymentOrchestrator};

/// Inputs for one forward release of a function.
#[derive(Debug, Clone)]
pub struct ReleasePlan {
    pub settings: FunctionSettings,
    pub source_root: PathBuf,
    pub package_rules: PackageRules,
    pub description: String,
    pub gateway_arn: Option<String>,
    pub scaling: ScalingBounds,
    pub poll: PollPolicy,
    pub cutover: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseReport {
    pub function_name: String,
    pub env: String,
    pub stage: String,
    pub published_version: Option<String>,
    pub previous_alias: Option<String>,
    pub next_alias: Option<String>,
    pub code_sha256: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoscaling: Option<AutoscalingSnapshot>,
}

/// Configuration, code, publish, alias, permission, cutover. Each update
/// must settle before the next step starts.
pub fn run_release(
    orchestrator: &DeploymentOrchestrator<'_>,
    session: &mut DeploymentSession,
    plan: &ReleasePlan,
) -> ReleaseResult<ReleaseReport> {
    orchestrator.update_configuration(session, &plan.settings)?;
    wait_until_settled(orchestrator, plan.poll)?;

    let archive = orchestrator.update_code(session, &plan.source_root, &plan.package_rules)?;
    wait_until_settled(orchestrator, plan.poll)?;

    orchestrator.publish_version(session, &plan.description)?;
    orchestrator.create_alias(session)?;

    if let Some(gateway_arn) = &plan.gateway_arn {
        orchestrator.add_invoke_permission(session, gateway_arn)?;
    }

    let autoscaling = if plan.cutover {
        orchestrator.run_cutover(session, plan.scaling)?;
        Some(orchestrator.describe_autoscaling(session)?)
    } else {
        info!("cutover skipped");
        None
    };

    let target = orchestrator.target();
    Ok(ReleaseReport {
        function_name: target.function_name().to_string(),
        env: target.env.clone(),
        stage: session.stage().to_string(),
        published_version: session.published_version().map(str::to_string),
        previous_alias: session.previous_alias().map(|alias| alias.to_string()),
        next_alias: session.next_alias().map(|alias| alias.to_string()),
        code_sha256: archive.sha256_base64(),
        autoscaling,
    })
}

fn wait_until_settled(
    orchestrator: &DeploymentOrchestrator<'_>,
    poll: PollPolicy,
) -> ReleaseResult<()> {
    let outcome = orchestrator.wait_for_update_completed(poll)?;
    if outcome.completed {
        return Ok(());
    }
    let last = outcome
        .last_status
        .map(|status| status.last_update_status)
        .unwrap_or_else(|| "unknown".to_string());
    Err(ReleaseError::deployment(format!(
        "function update did not complete within {}s (last status: {last})",
        poll.max_wait_secs
    )))
}
