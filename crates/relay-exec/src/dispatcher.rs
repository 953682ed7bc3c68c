//! End-to-end handling of one execution request.

use crate::bundle::BundleCatalog;
use crate::config::RelayConfig;
use crate::engine::ExecutionEngine;
use crate::exec_request::ExecRequest;
use crate::output::{rejection_response, response_from_outcome};
use crate::translator::Translator;
use crate::{TranslateError, TranslateResult};
use relay_messages::{ExecutionRequest, ExecutionResponse, Room};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Parses, translates and executes requests, always answering with a response.
#[derive(Clone)]
pub struct Dispatcher {
    catalog: Arc<BundleCatalog>,
    relay_config: Arc<RelayConfig>,
    translator: Translator,
    engine: Arc<dyn ExecutionEngine>,
    use_dynamic_config: bool,
}

impl Dispatcher {
    /// Create a dispatcher. Dynamic config is used when the relay config
    /// names a dynamic config root.
    pub fn new(
        catalog: Arc<BundleCatalog>,
        relay_config: Arc<RelayConfig>,
        engine: Arc<dyn ExecutionEngine>,
    ) -> Self {
        let translator = Translator::from_config(&relay_config);
        let use_dynamic_config = translator.has_dynamic_config();
        Self {
            catalog,
            relay_config,
            translator,
            engine,
            use_dynamic_config,
        }
    }

    /// Replace the translator, e.g. to plug in another dynamic config source.
    pub fn with_translator(mut self, translator: Translator) -> Self {
        self.use_dynamic_config = translator.has_dynamic_config();
        self.translator = translator;
        self
    }

    /// Turn dynamic config resolution on or off.
    pub fn with_dynamic_config(mut self, enabled: bool) -> Self {
        self.use_dynamic_config = enabled;
        self
    }

    /// Parse the request and build its execution context without running it.
    pub async fn prepare(
        &self,
        request: &mut ExecutionRequest,
    ) -> TranslateResult<(ExecRequest, bool)> {
        self.translator
            .translate_from_catalog(
                request,
                &self.catalog,
                &self.relay_config,
                self.use_dynamic_config,
            )
            .await
    }

    /// Handle a decoded request.
    pub async fn handle(&self, mut request: ExecutionRequest) -> ExecutionResponse {
        let (exec, dynamic_config) = match self.prepare(&mut request).await {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!(
                    command = %request.command,
                    code = e.code(),
                    error = %e,
                    "Rejected execution request"
                );
                return rejection_response(&request, &e);
            }
        };

        info!(
            bundle = %request.bundle_name(),
            command = %request.command_name(),
            pipeline_id = %request.pipeline_id(),
            dynamic_config,
            "Dispatching command"
        );

        match self.engine.execute(exec).await {
            Ok(outcome) => response_from_outcome(&request, &outcome),
            Err(e) => {
                error!(
                    bundle = %request.bundle_name(),
                    command = %request.command_name(),
                    error = %e,
                    "Execution engine error"
                );
                ExecutionResponse::error(request.room.name(), request.bundle_name(), e.to_string())
            }
        }
    }

    /// Handle a raw JSON payload from the transport.
    pub async fn handle_json(&self, payload: &str) -> ExecutionResponse {
        match ExecutionRequest::from_json(payload) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                let e = TranslateError::from(e);
                warn!(code = e.code(), error = %e, "Undecodable execution request");
                ExecutionResponse::error("", "", e.to_string())
            }
        }
    }
}
