//! Typed view of a settings map as an `UpdateFunctionConfiguration` request.
//!
//! Field names follow the Lambda API. Unknown fields and wrongly typed values
//! are rejected before anything is sent.

use std::collections::HashMap;

use lambda_release_core::settings::FunctionSettings;
use lambda_release_core::{ReleaseError, ReleaseResult};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ConfigurationPatch {
    pub role: Option<String>,
    pub handler: Option<String>,
    pub description: Option<String>,
    pub timeout: Option<i32>,
    pub memory_size: Option<i32>,
    pub runtime: Option<String>,
    pub environment: Option<EnvironmentPatch>,
    pub vpc_config: Option<VpcConfigPatch>,
    pub dead_letter_config: Option<DeadLetterPatch>,
    #[serde(rename = "KMSKeyArn")]
    pub kms_key_arn: Option<String>,
    pub tracing_config: Option<TracingPatch>,
    pub layers: Option<Vec<String>>,
    pub ephemeral_storage: Option<EphemeralStoragePatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct EnvironmentPatch {
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct VpcConfigPatch {
    #[serde(default)]
    pub subnet_ids: Vec<String>,
    #[serde(default)]
    pub security_group_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct DeadLetterPatch {
    pub target_arn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct TracingPatch {
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct EphemeralStoragePatch {
    pub size: i32,
}

impl ConfigurationPatch {
    pub fn from_settings(settings: &FunctionSettings) -> ReleaseResult<Self> {
        let value = serde_yaml::to_value(settings)
            .map_err(|error| ReleaseError::registry(format!("invalid configuration: {error}")))?;
        serde_yaml::from_value(value)
            .map_err(|error| ReleaseError::registry(format!("invalid configuration: {error}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_api_field_names() {
        let settings = FunctionSettings::from_yaml_str(
            "Handler: app.handler\n\
             Timeout: 30\n\
             MemorySize: 1024\n\
             Runtime: python3.12\n\
             KMSKeyArn: arn:aws:kms:ap-northeast-2:123456789012:key/abc\n\
             Environment:\n  Variables:\n    STAGE: prod\n\
             VpcConfig:\n  SubnetIds: [subnet-1, subnet-2]\n  SecurityGroupIds: [sg-1]\n\
             TracingConfig:\n  Mode: Active\n\
             EphemeralStorage:\n  Size: 1024\n",
        )
        .expect("settings parse");

        let patch = ConfigurationPatch::from_settings(&settings).expect("patch maps");

        assert_eq!(patch.handler.as_deref(), Some("app.handler"));
        assert_eq!(patch.timeout, Some(30));
        assert_eq!(patch.memory_size, Some(1024));
        assert_eq!(patch.runtime.as_deref(), Some("python3.12"));
        assert!(patch.kms_key_arn.is_some());
        assert_eq!(
            patch
                .environment
                .as_ref()
                .and_then(|env| env.variables.get("STAGE"))
                .map(String::as_str),
            Some("prod")
        );
        assert_eq!(
            patch.vpc_config.as_ref().map(|vpc| vpc.subnet_ids.len()),
            Some(2)
        );
        assert_eq!(
            patch.tracing_config.map(|tracing| tracing.mode),
            Some("Active".to_string())
        );
        assert_eq!(patch.ephemeral_storage.map(|storage| storage.size), Some(1024));
    }

    #[test]
    fn rejects_unknown_fields_as_registry_errors() {
        let settings = FunctionSettings::from_yaml_str("Handler: app.handler\nMemory: 512\n")
            .expect("settings parse");

        let error = ConfigurationPatch::from_settings(&settings).expect_err("unknown field");

        assert!(matches!(error, ReleaseError::Registry(_)));
        assert!(error.to_string().contains("Memory"));
    }

    #[test]
    fn rejects_wrongly_typed_values() {
        let settings =
            FunctionSettings::from_yaml_str("Timeout: soon\n").expect("settings parse");
        assert!(ConfigurationPatch::from_settings(&settings).is_err());
    }

    #[test]
    fn empty_settings_are_an_empty_patch() {
        let patch = ConfigurationPatch::from_settings(&FunctionSettings::default())
            .expect("empty patch");
        assert_eq!(patch, ConfigurationPatch::default());
    }
}
