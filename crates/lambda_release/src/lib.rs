//! AWS-oriented adapters and the release orchestrator.
//!
//! This crate owns the service integration details (Lambda and Application
//! Auto Scaling clients) behind the `FunctionRegistry` and
//! `AutoscalingRegistrar` traits, and the orchestrator that drives a function
//! through one release. Pure naming and session rules live in
//! `lambda_release_core`.

pub mod adapters;
pub mod handlers;
