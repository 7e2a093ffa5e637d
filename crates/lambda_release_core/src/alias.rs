//! Alias naming: `v{n}` aliases ordered by their numeric suffix.
//!
//! Only aliases of the exact form `v` followed by ASCII digits take part in
//! numbering. Anything else an operator creates (`prod`, `live`, `v2-hotfix`)
//! is invisible to the release workflow.

use std::fmt;

use crate::error::{ReleaseError, ReleaseResult};

/// Aliases requested per `ListAliases` page.
pub const ALIAS_PAGE_SIZE: i32 = 100;

/// A numbered alias such as `v3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AliasName(u64);

impl AliasName {
    pub const fn new(number: u64) -> Self {
        Self(number)
    }

    pub const fn number(self) -> u64 {
        self.0
    }

    /// Parses `v{n}`. Returns `None` for any other name, including numbers
    /// beyond `u64`.
    pub fn parse(name: &str) -> Option<Self> {
        let digits = name.strip_prefix('v')?;
        if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(Self)
    }

    /// The alias that follows this one.
    pub fn successor(self) -> ReleaseResult<Self> {
        self.0.checked_add(1).map(Self).ok_or_else(|| {
            ReleaseError::deployment(format!("no alias number follows {self}"))
        })
    }

    /// The alias before this one, saturating at `v0`.
    pub fn predecessor(self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

impl fmt::Display for AliasName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Highest alias number among conforming names, or 0 when there is none.
pub fn latest_alias_version<'a, I>(names: I) -> u64
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .filter_map(AliasName::parse)
        .map(AliasName::number)
        .max()
        .unwrap_or(0)
}

/// The pair of aliases a release moves between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AliasPlan {
    pub previous: AliasName,
    pub next: AliasName,
}

impl AliasPlan {
    /// Plans `v{latest}` -> `v{latest + 1}`.
    pub fn from_latest(latest: u64) -> ReleaseResult<Self> {
        let previous = AliasName::new(latest);
        Ok(Self {
            previous,
            next: previous.successor()?,
        })
    }
}
