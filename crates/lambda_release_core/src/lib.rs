//! Deployment domain primitives for the Lambda release workflow.
//!
//! This crate owns alias numbering, resource naming, the per-run deployment
//! session, packaging rules, and the settings/version files. It intentionally
//! excludes AWS SDK concerns; see `lambda_release` for the service adapters
//! and the orchestrator that drives them.

pub mod alias;
pub mod error;
pub mod identity;
pub mod package;
pub mod polling;
pub mod release_version;
pub mod session;
pub mod settings;

pub use error::{ReleaseError, ReleaseResult};
