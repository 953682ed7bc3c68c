//! Execution request translation for the relay.
//!
//! This crate provides:
//! - Resolution of a request's command against an installed bundle
//! - Environment merging from relay, bundle, dynamic and request layers
//! - Mapping of command output back onto execution responses
//! - A dispatcher tying these together around a pluggable execution engine
//!
//! # Request lifecycle
//!
//! ```text
//! Received -> Decomposed -> Resolved -> Dispatched
//!     |            |
//!     +------------+------> Rejected
//! ```

pub mod bundle;
pub mod config;
pub mod dispatcher;
pub mod dynamic_config;
pub mod engine;
pub mod environment;
mod error;
pub mod exec_request;
mod logging;
pub mod output;
pub mod translator;

pub use bundle::{Bundle, BundleCatalog, Command};
pub use config::{DynamicConfigPolicy, RelayConfig};
pub use dispatcher::Dispatcher;
pub use dynamic_config::{DynamicConfigSource, FileDynamicConfig};
pub use engine::{ExecOutcome, ExecutionEngine};
pub use environment::Env;
pub use error::{
    ConfigError, ConfigResult, DynamicConfigError, EngineError, TranslateError, TranslateResult,
};
pub use exec_request::ExecRequest;
pub use logging::init_logging;
pub use output::{rejection_response, response_from_outcome};
pub use translator::Translator;

pub use relay_messages::{ExecutionRequest, ExecutionResponse};
