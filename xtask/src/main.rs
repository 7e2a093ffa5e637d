use std::fs;
use std::path::Path;
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the lambda-release workspace",
    long_about = "Runs CI checks, builds the lambda-release binary for distribution,\n\
                  and forwards release commands to it during development."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Build lambda-release and copy it into dist/
    Dist {
        /// Compilation target triple
        #[arg(long)]
        target: Option<String>,
        /// Build profile used for the binary
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
    },
    /// Run lambda-release from source with the given arguments
    Release {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting and clippy
    Lint,
    /// Unit and integration tests
    Test,
    /// Lint + test
    Check,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn ensure_rust_target_installed(target: &str) {
    let output = Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output();

    let output = match output {
        Ok(value) => value,
        Err(error) => {
            eprintln!(
                "warning: failed to run `rustup target list --installed` ({error}); continuing without target preflight"
            );
            return;
        }
    };

    let installed = String::from_utf8_lossy(&output.stdout);
    if output.status.success() && !installed.lines().any(|line| line.trim() == target) {
        panic!(
            "rust target `{target}` is not installed. install it with `rustup target add {target}` and re-run `cargo run -p xtask -- dist`"
        );
    }
}

fn binary_name(target: Option<&str>) -> &'static str {
    let windows = match target {
        Some(triple) => triple.contains("windows"),
        None => cfg!(windows),
    };
    if windows {
        "lambda-release.exe"
    } else {
        "lambda-release"
    }
}

fn build_dist(target: Option<&str>, profile: BuildProfile) {
    if let Some(triple) = target {
        ensure_rust_target_installed(triple);
    }

    step("Build lambda-release");
    let mut cargo_args = vec!["build", "-p", "lambda_release", "--bin", "lambda-release"];
    if let Some(triple) = target {
        cargo_args.extend(["--target", triple]);
    }
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    step("Copy binary into dist/");
    let mut build_dir = Path::new("target").to_path_buf();
    if let Some(triple) = target {
        build_dir.push(triple);
    }
    build_dir.push(profile.dir_name());

    let name = binary_name(target);
    let dist_dir = Path::new("dist");
    fs::create_dir_all(dist_dir).expect("failed to create dist directory");
    fs::copy(build_dir.join(name), dist_dir.join(name)).unwrap_or_else(|error| {
        panic!("failed to copy {} into dist/: {error}", build_dir.join(name).display())
    });

    eprintln!("\nBuilt artifact:\n- {}", dist_dir.join(name).display());
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_lint() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);
}

fn ci_test() {
    step("Test lambda_release_core");
    run_cargo(&["test", "-p", "lambda_release_core"]);

    step("Test lambda_release");
    run_cargo(&["test", "-p", "lambda_release"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { job } => {
            match job {
                CiJob::Lint => ci_lint(),
                CiJob::Test => ci_test(),
                CiJob::Check => {
                    ci_lint();
                    ci_test();
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::Dist { target, profile } => build_dist(target.as_deref(), profile),
        Commands::Release { args } => {
            let mut cargo_args = vec!["run", "-p", "lambda_release", "--bin", "lambda-release", "--"];
            cargo_args.extend(args.iter().map(String::as_str));
            run_cargo(&cargo_args);
        }
    }
}
