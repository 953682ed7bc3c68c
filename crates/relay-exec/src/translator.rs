//! Request translation: command resolution and environment merging.

use crate::bundle::{Bundle, BundleCatalog};
use crate::config::{DynamicConfigPolicy, RelayConfig};
use crate::dynamic_config::{DynamicConfigSource, FileDynamicConfig};
use crate::environment::{request_env, Env};
use crate::exec_request::ExecRequest;
use crate::{TranslateError, TranslateResult};
use relay_messages::{ExecutionRequest, Room};
use std::sync::Arc;
use tracing::{debug, warn};

/// Turns parsed execution requests into [`ExecRequest`]s.
///
/// Holds no per-request state and can be shared between tasks.
#[derive(Clone, Default)]
pub struct Translator {
    dynamic_config: Option<Arc<dyn DynamicConfigSource>>,
}

impl Translator {
    /// Translator without a dynamic config source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Translator that consults `source` when dynamic config is requested.
    pub fn with_dynamic_config(source: Arc<dyn DynamicConfigSource>) -> Self {
        Self {
            dynamic_config: Some(source),
        }
    }

    /// Translator backed by the file source configured in `config`, if any.
    pub fn from_config(config: &RelayConfig) -> Self {
        match &config.dynamic_config_root {
            Some(root) => Self::with_dynamic_config(Arc::new(FileDynamicConfig::new(root))),
            None => Self::new(),
        }
    }

    /// Whether a dynamic config source is attached.
    pub fn has_dynamic_config(&self) -> bool {
        self.dynamic_config.is_some()
    }

    /// Resolve the request's command in `bundle` and build its execution context.
    ///
    /// Environment layers are merged lowest precedence first: relay config,
    /// bundle, command, dynamic config, then the request's own `COG_*`
    /// variables. The returned flag tells whether dynamic config was applied.
    pub async fn translate(
        &self,
        request: &ExecutionRequest,
        bundle: &Bundle,
        relay_config: &RelayConfig,
        use_dynamic_config: bool,
    ) -> TranslateResult<(ExecRequest, bool)> {
        if !request.is_parsed() {
            return Err(TranslateError::NotParsed);
        }

        let command = bundle
            .lookup_command(request.command_name())
            .ok_or_else(|| TranslateError::CommandNotFound {
                bundle: request.bundle_name().to_string(),
                command: request.command_name().to_string(),
            })?;

        let mut env: Env = relay_config.env.clone();
        env.extend(bundle.env.clone());
        env.extend(command.env.clone());

        let dynamic = if use_dynamic_config {
            self.dynamic_layer(request, relay_config).await?
        } else {
            None
        };
        let dynamic_applied = dynamic.is_some();
        if let Some(layer) = dynamic {
            env.extend(layer);
        }

        env.extend(request_env(request));

        let mut exec = ExecRequest::new(&command.executable, env);
        if let Some(cog_env) = request.cog_env.as_ref().filter(|v| !v.is_null()) {
            let stdin = serde_json::to_vec(cog_env).map_err(TranslateError::EnvironmentEncoding)?;
            exec.stdin = Some(stdin);
        }

        debug!(
            bundle = %request.bundle_name(),
            command = %request.command_name(),
            pipeline_id = %request.pipeline_id(),
            executable = %exec.executable,
            dynamic_config = dynamic_applied,
            "Translated execution request"
        );

        Ok((exec, dynamic_applied))
    }

    /// Parse the request, find its bundle in `catalog` and translate it.
    pub async fn translate_from_catalog(
        &self,
        request: &mut ExecutionRequest,
        catalog: &BundleCatalog,
        relay_config: &RelayConfig,
        use_dynamic_config: bool,
    ) -> TranslateResult<(ExecRequest, bool)> {
        request.parse()?;

        let bundle = catalog
            .lookup_bundle(request.bundle_name())
            .ok_or_else(|| TranslateError::BundleNotFound {
                bundle: request.bundle_name().to_string(),
            })?;

        self.translate(request, &bundle, relay_config, use_dynamic_config)
            .await
    }

    /// Fetch the dynamic layer within the configured time bound.
    async fn dynamic_layer(
        &self,
        request: &ExecutionRequest,
        relay_config: &RelayConfig,
    ) -> TranslateResult<Option<Env>> {
        let Some(source) = &self.dynamic_config else {
            debug!("Dynamic config requested but no source is configured");
            return Ok(None);
        };

        let bundle = request.bundle_name();
        let lookup = source.lookup(bundle, request.room.name(), &request.requestor.handle);
        let reason = match tokio::time::timeout(relay_config.dynamic_config_timeout(), lookup).await
        {
            Ok(Ok(layer)) => return Ok(layer),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!(
                "lookup timed out after {}ms",
                relay_config.dynamic_config_timeout_ms
            ),
        };

        match relay_config.dynamic_config_policy {
            DynamicConfigPolicy::Strict => Err(TranslateError::DynamicConfigUnavailable {
                bundle: bundle.to_string(),
                reason,
            }),
            DynamicConfigPolicy::Lenient => {
                warn!(bundle = %bundle, reason = %reason, "Proceeding without dynamic config");
                Ok(None)
            }
        }
    }
}
