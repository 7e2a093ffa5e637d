use std::future::Future;

use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::operation::update_function_configuration::builders::UpdateFunctionConfigurationFluentBuilder;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{
    DeadLetterConfig, Environment, EphemeralStorage, Runtime, TracingConfig, TracingMode,
    VpcConfig,
};
use lambda_release_core::settings::FunctionSettings;
use lambda_release_core::{ReleaseError, ReleaseResult};
use tokio::runtime::Handle;
use tracing::debug;

use crate::adapters::configuration::ConfigurationPatch;
use crate::adapters::registry::{AliasPage, FunctionRegistry, FunctionStatus, InvokePermission};

/// [`FunctionRegistry`] backed by the Lambda API.
///
/// Calls block the current thread on `runtime`, so they must not be made from
/// inside an async task running on that runtime.
pub struct LambdaFunctionRegistry {
    client: aws_sdk_lambda::Client,
    runtime: Handle,
}

impl LambdaFunctionRegistry {
    pub fn new(client: aws_sdk_lambda::Client, runtime: Handle) -> Self {
        Self { client, runtime }
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

fn registry_error<E>(action: &str, function_name: &str, error: E) -> ReleaseError
where
    E: std::error::Error,
{
    ReleaseError::registry(format!(
        "failed to {action} for '{function_name}': {}",
        DisplayErrorContext(&error)
    ))
}

fn apply_patch(
    mut request: UpdateFunctionConfigurationFluentBuilder,
    patch: ConfigurationPatch,
) -> ReleaseResult<UpdateFunctionConfigurationFluentBuilder> {
    request = request
        .set_role(patch.role)
        .set_handler(patch.handler)
        .set_description(patch.description)
        .set_timeout(patch.timeout)
        .set_memory_size(patch.memory_size)
        .set_runtime(patch.runtime.as_deref().map(Runtime::from))
        .set_kms_key_arn(patch.kms_key_arn)
        .set_layers(patch.layers);

    if let Some(environment) = patch.environment {
        request = request.environment(
            Environment::builder()
                .set_variables(Some(environment.variables))
                .build(),
        );
    }
    if let Some(vpc) = patch.vpc_config {
        request = request.vpc_config(
            VpcConfig::builder()
                .set_subnet_ids(Some(vpc.subnet_ids))
                .set_security_group_ids(Some(vpc.security_group_ids))
                .build(),
        );
    }
    if let Some(dead_letter) = patch.dead_letter_config {
        request = request.dead_letter_config(
            DeadLetterConfig::builder()
                .set_target_arn(dead_letter.target_arn)
                .build(),
        );
    }
    if let Some(tracing_config) = patch.tracing_config {
        request = request.tracing_config(
            TracingConfig::builder()
                .mode(TracingMode::from(tracing_config.mode.as_str()))
                .build(),
        );
    }
    if let Some(storage) = patch.ephemeral_storage {
        let storage = EphemeralStorage::builder()
            .size(storage.size)
            .build()
            .map_err(|error| ReleaseError::registry(format!("invalid EphemeralStorage: {error}")))?;
        request = request.ephemeral_storage(storage);
    }
    Ok(request)
}

impl FunctionRegistry for LambdaFunctionRegistry {
    fn update_configuration(
        &self,
        function_name: &str,
        settings: &FunctionSettings,
    ) -> ReleaseResult<()> {
        let patch = ConfigurationPatch::from_settings(settings)?;
        let request = apply_patch(
            self.client
                .update_function_configuration()
                .function_name(function_name),
            patch,
        )?;
        let output = self
            .block_on(request.send())
            .map_err(|error| registry_error("update function configuration", function_name, error))?;
        debug!(?output, "update_function_configuration response");
        Ok(())
    }

    fn update_code(&self, function_name: &str, archive: &[u8]) -> ReleaseResult<Option<String>> {
        let output = self
            .block_on(
                self.client
                    .update_function_code()
                    .function_name(function_name)
                    .zip_file(Blob::new(archive.to_vec()))
                    .send(),
            )
            .map_err(|error| registry_error("update function code", function_name, error))?;
        debug!(?output, "update_function_code response");
        Ok(output.code_sha256().map(str::to_string))
    }

    fn publish_version(&self, function_name: &str, description: &str) -> ReleaseResult<String> {
        let output = self
            .block_on(
                self.client
                    .publish_version()
                    .function_name(function_name)
                    .description(description)
                    .send(),
            )
            .map_err(|error| registry_error("publish version", function_name, error))?;
        debug!(?output, "publish_version response");
        output.version().map(str::to_string).ok_or_else(|| {
            ReleaseError::registry(format!(
                "publish version for '{function_name}' returned no version"
            ))
        })
    }

    fn list_aliases(
        &self,
        function_name: &str,
        page_size: i32,
        marker: Option<&str>,
    ) -> ReleaseResult<AliasPage> {
        let output = self
            .block_on(
                self.client
                    .list_aliases()
                    .function_name(function_name)
                    .max_items(page_size)
                    .set_marker(marker.map(str::to_string))
                    .send(),
            )
            .map_err(|error| registry_error("list aliases", function_name, error))?;
        Ok(AliasPage {
            names: output
                .aliases()
                .iter()
                .filter_map(|alias| alias.name().map(str::to_string))
                .collect(),
            next_marker: output.next_marker().map(str::to_string),
        })
    }

    fn create_alias(&self, function_name: &str, alias: &str, version: &str) -> ReleaseResult<()> {
        let output = self
            .block_on(
                self.client
                    .create_alias()
                    .function_name(function_name)
                    .name(alias)
                    .function_version(version)
                    .send(),
            )
            .map_err(|error| registry_error("create alias", function_name, error))?;
        debug!(?output, "create_alias response");
        Ok(())
    }

    fn add_invoke_permission(&self, permission: &InvokePermission) -> ReleaseResult<()> {
        let output = self
            .block_on(
                self.client
                    .add_permission()
                    .function_name(&permission.qualified_function_name)
                    .statement_id(&permission.statement_id)
                    .action(&permission.action)
                    .principal(&permission.principal)
                    .source_arn(&permission.source_arn)
                    .send(),
            )
            .map_err(|error| {
                registry_error(
                    "add invoke permission",
                    &permission.qualified_function_name,
                    error,
                )
            })?;
        debug!(?output, "add_permission response");
        Ok(())
    }

    fn provisioned_concurrency(
        &self,
        function_name: &str,
        alias: &str,
    ) -> ReleaseResult<Option<i32>> {
        let result = self.block_on(
            self.client
                .get_provisioned_concurrency_config()
                .function_name(function_name)
                .qualifier(alias)
                .send(),
        );

        match result {
            Ok(output) => {
                debug!(?output, "get_provisioned_concurrency_config response");
                Ok(output
                    .allocated_provisioned_concurrent_executions()
                    .or(output.requested_provisioned_concurrent_executions()))
            }
            Err(error) => {
                let absent = error.as_service_error().is_some_and(|service_error| {
                    service_error.is_provisioned_concurrency_config_not_found_exception()
                        || service_error.is_resource_not_found_exception()
                });
                if absent {
                    debug!(
                        function = function_name,
                        alias,
                        error = %DisplayErrorContext(&error),
                        "no provisioned concurrency config"
                    );
                    Ok(None)
                } else {
                    Err(registry_error(
                        "get provisioned concurrency",
                        function_name,
                        error,
                    ))
                }
            }
        }
    }

    fn put_provisioned_concurrency(
        &self,
        function_name: &str,
        alias: &str,
        executions: i32,
    ) -> ReleaseResult<()> {
        let output = self
            .block_on(
                self.client
                    .put_provisioned_concurrency_config()
                    .function_name(function_name)
                    .qualifier(alias)
                    .provisioned_concurrent_executions(executions)
                    .send(),
            )
            .map_err(|error| registry_error("put provisioned concurrency", function_name, error))?;
        debug!(?output, "put_provisioned_concurrency_config response");
        Ok(())
    }

    fn delete_provisioned_concurrency(
        &self,
        function_name: &str,
        alias: &str,
    ) -> ReleaseResult<()> {
        let output = self
            .block_on(
                self.client
                    .delete_provisioned_concurrency_config()
                    .function_name(function_name)
                    .qualifier(alias)
                    .send(),
            )
            .map_err(|error| {
                registry_error("delete provisioned concurrency", function_name, error)
            })?;
        debug!(?output, "delete_provisioned_concurrency_config response");
        Ok(())
    }

    fn function_status(&self, function_name: &str) -> ReleaseResult<FunctionStatus> {
        let output = self
            .block_on(
                self.client
                    .get_function()
                    .function_name(function_name)
                    .send(),
            )
            .map_err(|error| registry_error("get function", function_name, error))?;
        let configuration = output.configuration().ok_or_else(|| {
            ReleaseError::registry(format!(
                "get function for '{function_name}' returned no configuration"
            ))
        })?;

        Ok(FunctionStatus {
            last_update_status: configuration
                .last_update_status()
                .map(|status| status.as_str().to_string())
                .unwrap_or_default(),
            state: configuration.state().map(|state| state.as_str().to_string()),
            code_sha256: configuration.code_sha256().map(str::to_string),
            version: configuration.version().map(str::to_string),
        })
    }
}
