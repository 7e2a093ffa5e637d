use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use lambda_release::adapters::aws_autoscaling::ApplicationAutoscalingRegistrar;
use lambda_release::adapters::aws_lambda::LambdaFunctionRegistry;
use lambda_release::adapters::pause::ThreadPause;
use lambda_release::handlers::orchestrator::{DeploymentOrchestrator, ReleaseTarget};
use lambda_release::handlers::release::{run_release, ReleasePlan};
use lambda_release_core::alias::AliasName;
use lambda_release_core::identity::ScalingBounds;
use lambda_release_core::package::PackageRules;
use lambda_release_core::polling::{PollPolicy, DEFAULT_MAX_WAIT_SECS, DEFAULT_POLL_INTERVAL_SECS};
use lambda_release_core::release_version::{bump_version, read_version, version_file_path, BumpKind};
use lambda_release_core::session::DeploymentSession;
use lambda_release_core::settings::{settings_path, FunctionSettings};
use lambda_release_core::{ReleaseError, ReleaseResult};
use serde::Serialize;
use tokio::runtime::Handle;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "lambda-release",
    about = "Release a Lambda function through numbered aliases",
    long_about = "Updates configuration and code, publishes a version, binds it to the\n\
                  next v{n} alias, and moves provisioned concurrency autoscaling over."
)]
struct Cli {
    /// Function to release
    #[arg(long, env = "LAMBDA_RELEASE_FUNCTION", global = true)]
    function_name: Option<String>,
    /// Environment name, selects config/{env}.yaml and prefixes permission ids
    #[arg(long, env = "LAMBDA_RELEASE_ENV", default_value = "dev", global = true)]
    env: String,
    /// Project directory holding config/ and src/
    #[arg(long, default_value = ".", global = true)]
    project_root: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the forward release path
    Deploy(DeployArgs),
    /// Remove provisioned concurrency and autoscaling from the previous alias
    Teardown {
        /// Alias to tear down; defaults to the one before the latest
        #[arg(long)]
        previous_alias: Option<String>,
    },
    /// Print the latest v{n} alias number
    LatestAlias,
    /// Wait for the last function update to settle and print its status
    Status(PollArgs),
    /// Read or bump a service's release VERSION file
    Version(VersionArgs),
}

#[derive(Args)]
struct DeployArgs {
    /// Version description; defaults to "{env} release {timestamp}"
    #[arg(long)]
    description: Option<String>,
    /// Settings file; defaults to {project_root}/config/{env}.yaml
    #[arg(long)]
    config_file: Option<PathBuf>,
    /// Source directory to package; defaults to {project_root}/src
    #[arg(long)]
    source_dir: Option<PathBuf>,
    /// Additional exclude patterns for packaging
    #[arg(long = "exclude")]
    excludes: Vec<String>,
    /// API Gateway ARN granted invoke access on the new alias
    #[arg(long)]
    gateway_arn: Option<String>,
    /// Stop after the alias is created
    #[arg(long)]
    skip_cutover: bool,
    #[arg(long, default_value_t = 1)]
    min_capacity: i32,
    #[arg(long, default_value_t = 10)]
    max_capacity: i32,
    #[arg(long, default_value_t = 0.3)]
    target_utilization: f64,
    #[command(flatten)]
    poll: PollArgs,
}

#[derive(Args)]
struct PollArgs {
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    poll_interval_secs: u64,
    #[arg(long, default_value_t = DEFAULT_MAX_WAIT_SECS)]
    max_wait_secs: u64,
}

impl PollArgs {
    fn policy(&self) -> PollPolicy {
        PollPolicy::new(self.poll_interval_secs, self.max_wait_secs)
    }
}

#[derive(Args)]
struct VersionArgs {
    #[arg(value_enum)]
    action: VersionAction,
    /// Service whose scripts/build/{service}/VERSION file is used
    #[arg(long)]
    service: String,
    /// Update type for next/bump: major, minor, or patch
    #[arg(long, default_value = "patch")]
    kind: String,
    /// Explicit VERSION file path
    #[arg(long)]
    file: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum VersionAction {
    Get,
    Next,
    Bump,
}

// ── helpers ────────────────────────────────────────────────────────

struct ServiceClients {
    registry: LambdaFunctionRegistry,
    autoscaler: ApplicationAutoscalingRegistrar,
}

fn require_function_name(cli: &Cli) -> ReleaseResult<String> {
    cli.function_name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| {
            ReleaseError::config("--function-name (or LAMBDA_RELEASE_FUNCTION) must be set")
        })
}

fn print_json(value: &impl Serialize) -> ReleaseResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|error| ReleaseError::config(format!("failed to render output: {error}")))?;
    println!("{text}");
    Ok(())
}

fn default_description(env: &str) -> String {
    format!("{env} release {}", Utc::now().format("%Y-%m-%dT%H:%M:%SZ"))
}

fn release_plan(args: &DeployArgs, project_root: &Path, env: &str) -> ReleaseResult<ReleasePlan> {
    let config_file = args
        .config_file
        .clone()
        .unwrap_or_else(|| settings_path(project_root, env));
    let settings = FunctionSettings::load(&config_file)?;
    info!(path = %config_file.display(), fields = settings.len(), "loaded function settings");

    Ok(ReleasePlan {
        settings,
        source_root: args
            .source_dir
            .clone()
            .unwrap_or_else(|| project_root.join("src")),
        package_rules: PackageRules::default().with_extra_excludes(&args.excludes)?,
        description: args
            .description
            .clone()
            .unwrap_or_else(|| default_description(env)),
        gateway_arn: args.gateway_arn.clone(),
        scaling: ScalingBounds {
            min_capacity: args.min_capacity,
            max_capacity: args.max_capacity,
            target_utilization: args.target_utilization,
        },
        poll: args.poll.policy(),
        cutover: !args.skip_cutover,
    })
}

// ── commands ───────────────────────────────────────────────────────

fn run_version(args: &VersionArgs, project_root: &Path) -> ReleaseResult<()> {
    let path = args
        .file
        .clone()
        .unwrap_or_else(|| version_file_path(project_root, &args.service));
    match args.action {
        VersionAction::Get => println!("{}", read_version(&path)?),
        VersionAction::Next => {
            let kind: BumpKind = args.kind.parse()?;
            println!("{}", read_version(&path)?.next(kind)?);
        }
        VersionAction::Bump => {
            let kind: BumpKind = args.kind.parse()?;
            println!("{}", bump_version(&path, kind)?);
        }
    }
    Ok(())
}

fn run_command(cli: &Cli, clients: &ServiceClients) -> ReleaseResult<()> {
    let target = ReleaseTarget::new(cli.env.clone(), require_function_name(cli)?);
    let pause = ThreadPause;
    let orchestrator =
        DeploymentOrchestrator::new(target, &clients.registry, &clients.autoscaler, &pause);
    let mut session = DeploymentSession::new();

    match &cli.command {
        Commands::Deploy(args) => {
            let plan = release_plan(args, &cli.project_root, &cli.env)?;
            let report = run_release(&orchestrator, &mut session, &plan)?;
            print_json(&report)
        }
        Commands::Teardown { previous_alias } => {
            if let Some(name) = previous_alias {
                let alias = AliasName::parse(name).ok_or_else(|| {
                    ReleaseError::deployment(format!("'{name}' is not a v{{n}} alias"))
                })?;
                session.record_previous_alias(alias);
            }
            let previous = orchestrator.run_teardown(&mut session)?;
            println!("{previous}");
            Ok(())
        }
        Commands::LatestAlias => {
            println!("{}", orchestrator.latest_alias_version()?);
            Ok(())
        }
        Commands::Status(args) => {
            let outcome = orchestrator.wait_for_update_completed(args.policy())?;
            print_json(&outcome)
        }
        Commands::Version(args) => run_version(args, &cli.project_root),
    }
}

// ── main ───────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("lambda_release=info,lambda_release_core=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = if let Commands::Version(args) = &cli.command {
        run_version(args, &cli.project_root)
    } else {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let runtime = Handle::current();
        let clients = ServiceClients {
            registry: LambdaFunctionRegistry::new(
                aws_sdk_lambda::Client::new(&aws_config),
                runtime.clone(),
            ),
            autoscaler: ApplicationAutoscalingRegistrar::new(
                aws_sdk_applicationautoscaling::Client::new(&aws_config),
                runtime,
            ),
        };

        // The orchestrator blocks on the runtime, so it runs off the async workers.
        tokio::task::spawn_blocking(move || run_command(&cli, &clients))
            .await
            .unwrap_or_else(|join_error| {
                Err(ReleaseError::deployment(format!(
                    "release task aborted: {join_error}"
                )))
            })
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(release_error) => {
            error!(error = %release_error, "release failed");
            ExitCode::FAILURE
        }
    }
}
