//! Logging initialization.

use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialize the logging system.
///
/// `RUST_LOG` takes precedence over `level` when set. Safe to call more
/// than once; only the first call installs a subscriber.
///
/// # Example
///
/// ```ignore
/// relay_exec::init_logging("info");
/// tracing::info!("Relay started");
/// ```
pub fn init_logging(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .finish()
        .try_init();
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}
