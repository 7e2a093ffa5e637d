use lambda_release_core::settings::FunctionSettings;
use lambda_release_core::ReleaseResult;
use serde::{Deserialize, Serialize};

/// One page of alias names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasPage {
    pub names: Vec<String>,
    pub next_marker: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionStatus {
    pub last_update_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokePermission {
    pub qualified_function_name: String,
    pub statement_id: String,
    pub action: String,
    pub principal: String,
    pub source_arn: String,
}

/// Create, update, publish, and alias operations on a deployable function.
pub trait FunctionRegistry {
    fn update_configuration(
        &self,
        function_name: &str,
        settings: &FunctionSettings,
    ) -> ReleaseResult<()>;

    /// Uploads a zip archive. Returns the code digest the registry computed,
    /// when it reports one.
    fn update_code(&self, function_name: &str, archive: &[u8]) -> ReleaseResult<Option<String>>;

    fn publish_version(&self, function_name: &str, description: &str) -> ReleaseResult<String>;

    fn list_aliases(
        &self,
        function_name: &str,
        page_size: i32,
        marker: Option<&str>,
    ) -> ReleaseResult<AliasPage>;

    fn create_alias(&self, function_name: &str, alias: &str, version: &str) -> ReleaseResult<()>;

    fn add_invoke_permission(&self, permission: &InvokePermission) -> ReleaseResult<()>;

    /// `Ok(None)` when no provisioned concurrency is configured for the alias
    /// or the alias itself does not exist.
    fn provisioned_concurrency(&self, function_name: &str, alias: &str)
        -> ReleaseResult<Option<i32>>;

    fn put_provisioned_concurrency(
        &self,
        function_name: &str,
        alias: &str,
        executions: i32,
    ) -> ReleaseResult<()>;

    fn delete_provisioned_concurrency(&self, function_name: &str, alias: &str)
        -> ReleaseResult<()>;

    fn function_status(&self, function_name: &str) -> ReleaseResult<FunctionStatus>;
}
