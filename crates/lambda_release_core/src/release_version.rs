//! `major.minor.patch` release version kept in a per-service `VERSION` file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ReleaseError, ReleaseResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReleaseVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpKind {
    Major,
    Minor,
    Patch,
}

impl FromStr for BumpKind {
    type Err = ReleaseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            other => Err(ReleaseError::config(format!("unknown update type '{other}'"))),
        }
    }
}

impl ReleaseVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn next(self, kind: BumpKind) -> ReleaseResult<Self> {
        let bump = |component: u32| {
            component.checked_add(1).ok_or_else(|| {
                ReleaseError::config(format!("cannot bump {kind:?} of version {self}"))
            })
        };
        Ok(match kind {
            BumpKind::Major => Self::new(bump(self.major)?, 0, 0),
            BumpKind::Minor => Self::new(self.major, bump(self.minor)?, 0),
            BumpKind::Patch => Self::new(self.major, self.minor, bump(self.patch)?),
        })
    }
}

impl FromStr for ReleaseVersion {
    type Err = ReleaseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let malformed = || ReleaseError::config(format!("malformed version '{value}'"));
        let mut parts = value.trim().split('.');
        let mut component = || -> ReleaseResult<u32> {
            let part = parts.next().ok_or_else(malformed)?;
            if part.is_empty() || !part.bytes().all(|byte| byte.is_ascii_digit()) {
                return Err(malformed());
            }
            part.parse().map_err(|_| malformed())
        };
        let version = Self::new(component()?, component()?, component()?);
        if parts.next().is_some() {
            return Err(malformed());
        }
        Ok(version)
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// `scripts/build/{service}/VERSION` under `repo_root`.
pub fn version_file_path(repo_root: &Path, service_name: &str) -> PathBuf {
    repo_root
        .join("scripts")
        .join("build")
        .join(service_name)
        .join("VERSION")
}

pub fn read_version(path: &Path) -> ReleaseResult<ReleaseVersion> {
    let text = fs::read_to_string(path).map_err(|error| {
        ReleaseError::config(format!(
            "failed to read version file '{}': {error}",
            path.display()
        ))
    })?;
    text.parse()
}

pub fn write_version(path: &Path, version: ReleaseVersion) -> ReleaseResult<()> {
    fs::write(path, version.to_string())?;
    Ok(())
}

/// Reads, bumps, and writes back the version. Returns the new version.
pub fn bump_version(path: &Path, kind: BumpKind) -> ReleaseResult<ReleaseVersion> {
    let current = read_version(path)?;
    let next = current.next(kind)?;
    write_version(path, next)?;
    info!(path = %path.display(), from = %current, to = %next, "bumped release version");
    Ok(next)
}
