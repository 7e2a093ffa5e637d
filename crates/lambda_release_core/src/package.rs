//! Packaging of a function source tree into a zip archive.
//!
//! Member paths are relative to the source root and use `/` separators. The
//! process working directory is never consulted.

use std::fmt;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use glob::{MatchOptions, Pattern};
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{ReleaseError, ReleaseResult};

/// Virtual environments, helper scripts, and archives from earlier runs.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "venv",
    "venv/**",
    "scripts",
    "scripts/**",
    "update_lambda.py",
    "*.zip",
];

const EXCLUDE_MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// A glob over `/`-separated relative paths. `*`, `?` and `[...]` stay within
/// one component; `**` spans any number of components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludePattern(Pattern);

impl ExcludePattern {
    pub fn new(pattern: &str) -> ReleaseResult<Self> {
        let trimmed = pattern.trim().trim_start_matches("./").trim_matches('/');
        if trimmed.is_empty() {
            return Err(ReleaseError::package("exclude pattern must not be empty"));
        }
        let compiled = Pattern::new(trimmed).map_err(|error| {
            ReleaseError::package(format!("invalid exclude pattern '{trimmed}': {error}"))
        })?;
        Ok(Self(compiled))
    }

    pub fn matches(&self, relative_path: &str) -> bool {
        self.0.matches_with(relative_path, EXCLUDE_MATCH_OPTIONS)
    }
}

impl fmt::Display for ExcludePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct PackageRules {
    excludes: Vec<ExcludePattern>,
}

impl Default for PackageRules {
    fn default() -> Self {
        Self {
            excludes: DEFAULT_EXCLUDE_PATTERNS
                .iter()
                .filter_map(|pattern| ExcludePattern::new(pattern).ok())
                .collect(),
        }
    }
}

impl PackageRules {
    pub fn with_extra_excludes<I, S>(mut self, patterns: I) -> ReleaseResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.excludes.push(ExcludePattern::new(pattern.as_ref())?);
        }
        Ok(self)
    }

    /// First exclude pattern that matches `relative_path`.
    pub fn matching_exclude(&self, relative_path: &str) -> Option<&ExcludePattern> {
        self.excludes
            .iter()
            .find(|pattern| pattern.matches(relative_path))
    }
}

/// A built code archive held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeArchive {
    bytes: Vec<u8>,
    entries: Vec<String>,
}

impl CodeArchive {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            entries: Vec::new(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Member paths in archive order. Directories end with `/`.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Base64 SHA-256 of the archive bytes, the form Lambda reports as
    /// `CodeSha256`.
    pub fn sha256_base64(&self) -> String {
        STANDARD.encode(Sha256::digest(&self.bytes))
    }

    pub fn write_to(&self, path: &Path) -> ReleaseResult<()> {
        fs::write(path, &self.bytes)?;
        Ok(())
    }
}

/// `{function}.zip` inside the source root.
pub fn archive_path(source_root: &Path, function_name: &str) -> PathBuf {
    source_root.join(format!("{function_name}.zip"))
}

/// Zips every non-hidden file and directory under `source_root` that no
/// exclude pattern matches.
pub fn build_archive(source_root: &Path, rules: &PackageRules) -> ReleaseResult<CodeArchive> {
    if !source_root.is_dir() {
        return Err(ReleaseError::package(format!(
            "source root '{}' is not a directory",
            source_root.display()
        )));
    }

    let mut candidates = Vec::new();
    collect_entries(source_root, "", &mut candidates)?;
    candidates.sort_by(|a, b| a.relative.cmp(&b.relative));

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let file_options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);
    let dir_options = FileOptions::default().unix_permissions(0o755);

    let mut entries = Vec::new();
    for candidate in candidates {
        if let Some(pattern) = rules.matching_exclude(&candidate.relative) {
            debug!(path = %candidate.relative, %pattern, "excluded from archive");
            continue;
        }
        if candidate.is_dir {
            let name = format!("{}/", candidate.relative);
            zip.add_directory(name.as_str(), dir_options)?;
            entries.push(name);
        } else {
            let contents = fs::read(&candidate.absolute)?;
            zip.start_file(candidate.relative.as_str(), file_options)?;
            zip.write_all(&contents)?;
            entries.push(candidate.relative);
        }
    }

    let bytes = zip.finish()?.into_inner();
    info!(
        source_root = %source_root.display(),
        entries = entries.len(),
        size_bytes = bytes.len(),
        "packaged function code"
    );
    Ok(CodeArchive { bytes, entries })
}

struct Candidate {
    relative: String,
    absolute: PathBuf,
    is_dir: bool,
}

fn collect_entries(dir: &Path, prefix: &str, out: &mut Vec<Candidate>) -> ReleaseResult<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            return Err(ReleaseError::package(format!(
                "non UTF-8 file name under '{}'",
                dir.display()
            )));
        };
        if name.starts_with('.') {
            continue;
        }

        let relative = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}/{name}")
        };
        let absolute = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            out.push(Candidate {
                relative: relative.clone(),
                absolute: absolute.clone(),
                is_dir: true,
            });
            collect_entries(&absolute, &relative, out)?;
        } else if absolute.is_file() {
            out.push(Candidate {
                relative,
                absolute,
                is_dir: false,
            });
        }
    }
    Ok(())
}
