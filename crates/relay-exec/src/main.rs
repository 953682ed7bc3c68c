//! relay-exec binary entry point.
//!
//! Usage: relay-exec translate --request <file> --bundles <file> [--config <file>] [--dynamic]
//!
//! Prints the resolved execution context as JSON, or the error response the
//! bot would receive when the request is rejected.

use anyhow::Context;
use clap::{Parser, Subcommand};
use relay_exec::{
    init_logging, rejection_response, BundleCatalog, ExecutionRequest, RelayConfig, Translator,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Translate relay execution requests into command invocations.
#[derive(Parser, Debug)]
#[command(name = "relay-exec")]
#[command(about = "Translate relay execution requests into command invocations")]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Relay config file (JSON).
    #[arg(long, global = true, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a request against installed bundles and print the execution context.
    Translate {
        /// Execution request file (JSON).
        #[arg(long)]
        request: PathBuf,

        /// Bundle catalog file (JSON array of bundles).
        #[arg(long)]
        bundles: PathBuf,

        /// Apply dynamic config from the configured root.
        #[arg(long)]
        dynamic: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let relay_config = match &args.config {
        Some(path) => RelayConfig::load(path)
            .with_context(|| format!("failed to load relay config {}", path.display()))?,
        None => RelayConfig::new(),
    };

    init_logging(args.log_level.as_deref().unwrap_or(&relay_config.log_level));
    debug!(
        log_level = %relay_config.log_level,
        env_vars = relay_config.env.len(),
        dynamic_config_root = ?relay_config.dynamic_config_root,
        dynamic_config_timeout_ms = relay_config.dynamic_config_timeout_ms,
        dynamic_config_policy = ?relay_config.dynamic_config_policy,
        "Relay config loaded"
    );

    match args.command {
        Commands::Translate {
            request,
            bundles,
            dynamic,
        } => translate(&relay_config, &request, &bundles, dynamic).await,
    }
}

async fn translate(
    relay_config: &RelayConfig,
    request_path: &Path,
    bundles_path: &Path,
    use_dynamic_config: bool,
) -> anyhow::Result<()> {
    let payload = std::fs::read_to_string(request_path)
        .with_context(|| format!("failed to read request {}", request_path.display()))?;
    let catalog = BundleCatalog::load_from_file(bundles_path)
        .with_context(|| format!("failed to load bundles {}", bundles_path.display()))?;
    info!(bundles = catalog.len(), "Bundle catalog loaded");

    let mut request = ExecutionRequest::from_json(&payload)?;
    let translator = Translator::from_config(relay_config);

    let result = translator
        .translate_from_catalog(&mut request, &catalog, relay_config, use_dynamic_config)
        .await;

    match result {
        Ok((exec, dynamic_config_applied)) => {
            let out = serde_json::json!({
                "exec_request": exec,
                "dynamic_config_applied": dynamic_config_applied,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            Ok(())
        }
        Err(e) => {
            let response = rejection_response(&request, &e);
            println!("{}", response.to_json()?);
            std::process::exit(1);
        }
    }
}
