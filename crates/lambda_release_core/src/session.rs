//! Per-run deployment state.
//!
//! A session lives for one process invocation and is never persisted. A
//! teardown started from a fresh process has no previous alias recorded and
//! must re-derive it from the registry.

use std::fmt;

use crate::alias::{AliasName, AliasPlan};
use crate::error::{ReleaseError, ReleaseResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum DeploymentStage {
    #[default]
    Idle,
    CodeConfigured,
    Published,
    AliasCreated,
    CutoverComplete,
}

impl DeploymentStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CodeConfigured => "code_configured",
            Self::Published => "published",
            Self::AliasCreated => "alias_created",
            Self::CutoverComplete => "cutover_complete",
        }
    }
}

impl fmt::Display for DeploymentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentSession {
    stage: DeploymentStage,
    published_version: Option<String>,
    previous_alias: Option<AliasName>,
    next_alias: Option<AliasName>,
    teardown_complete: bool,
}

impl DeploymentSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> DeploymentStage {
        self.stage
    }

    pub fn published_version(&self) -> Option<&str> {
        self.published_version.as_deref()
    }

    pub fn previous_alias(&self) -> Option<AliasName> {
        self.previous_alias
    }

    pub fn next_alias(&self) -> Option<AliasName> {
        self.next_alias
    }

    pub fn teardown_complete(&self) -> bool {
        self.teardown_complete
    }

    pub fn require_published_version(&self) -> ReleaseResult<&str> {
        self.published_version()
            .ok_or_else(|| ReleaseError::deployment("no published version"))
    }

    pub fn require_next_alias(&self) -> ReleaseResult<AliasName> {
        self.next_alias
            .ok_or_else(|| ReleaseError::deployment("no deployed alias recorded"))
    }

    pub fn require_previous_alias(&self) -> ReleaseResult<AliasName> {
        self.previous_alias
            .ok_or_else(|| ReleaseError::deployment("no previous alias recorded"))
    }

    /// Configuration and code updates may happen in either order and repeat.
    pub fn record_code_configured(&mut self) {
        self.stage = DeploymentStage::CodeConfigured;
    }

    pub fn record_published(&mut self, version: impl Into<String>) {
        self.published_version = Some(version.into());
        self.stage = DeploymentStage::Published;
    }

    pub fn record_alias_created(&mut self, plan: AliasPlan) {
        self.previous_alias = Some(plan.previous);
        self.next_alias = Some(plan.next);
        self.stage = DeploymentStage::AliasCreated;
    }

    pub fn record_cutover_complete(&mut self) {
        self.stage = DeploymentStage::CutoverComplete;
    }

    /// Fallback used when teardown runs without a recorded previous alias.
    pub fn record_previous_alias(&mut self, alias: AliasName) {
        self.previous_alias = Some(alias);
    }

    pub fn record_teardown_complete(&mut self) {
        self.teardown_complete = true;
    }
}
