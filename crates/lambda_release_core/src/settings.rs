//! Environment-keyed function settings.
//!
//! The settings file is a YAML mapping applied verbatim to the function's
//! configuration. Keys are the registry's own field names; values are not
//! interpreted here.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::{ReleaseError, ReleaseResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionSettings(BTreeMap<String, Value>);

impl FunctionSettings {
    pub fn new(entries: BTreeMap<String, Value>) -> Self {
        Self(entries)
    }

    pub fn from_yaml_str(text: &str) -> ReleaseResult<Self> {
        let value: Value = serde_yaml::from_str(text)
            .map_err(|error| ReleaseError::config(format!("invalid settings YAML: {error}")))?;
        if !value.is_mapping() {
            return Err(ReleaseError::config("settings must be a YAML mapping"));
        }
        serde_yaml::from_value(value)
            .map(Self)
            .map_err(|error| ReleaseError::config(format!("settings keys must be strings: {error}")))
    }

    pub fn load(path: &Path) -> ReleaseResult<Self> {
        let text = fs::read_to_string(path).map_err(|error| {
            ReleaseError::config(format!(
                "failed to read settings file '{}': {error}",
                path.display()
            ))
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `{project_root}/config/{env}.yaml`
pub fn settings_path(project_root: &Path, env: &str) -> PathBuf {
    project_root.join("config").join(format!("{env}.yaml"))
}
