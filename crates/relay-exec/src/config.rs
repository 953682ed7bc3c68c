//! Process-wide relay configuration.

use crate::ConfigResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default upper bound on a dynamic config lookup.
pub const DEFAULT_DYNAMIC_CONFIG_TIMEOUT_MS: u64 = 2_000;

/// What to do when dynamic config cannot be fetched in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DynamicConfigPolicy {
    /// Log and continue without dynamic config.
    #[default]
    Lenient,
    /// Reject the request.
    Strict,
}

/// Relay configuration consulted while building execution contexts.
///
/// `Debug` output lists the names of the `env` layer but never its values.
#[derive(Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Environment applied to every command, lowest precedence.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Root directory of per-bundle dynamic config files.
    #[serde(default)]
    pub dynamic_config_root: Option<PathBuf>,
    /// Upper bound on a dynamic config lookup, in milliseconds.
    #[serde(default = "default_dynamic_config_timeout_ms")]
    pub dynamic_config_timeout_ms: u64,
    /// Behaviour when a dynamic config lookup fails or times out.
    #[serde(default)]
    pub dynamic_config_policy: DynamicConfigPolicy,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_dynamic_config_timeout_ms() -> u64 {
    DEFAULT_DYNAMIC_CONFIG_TIMEOUT_MS
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            env: BTreeMap::new(),
            dynamic_config_root: None,
            dynamic_config_timeout_ms: DEFAULT_DYNAMIC_CONFIG_TIMEOUT_MS,
            dynamic_config_policy: DynamicConfigPolicy::Lenient,
        }
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("log_level", &self.log_level)
            .field("env", &self.env.keys().collect::<Vec<_>>())
            .field("dynamic_config_root", &self.dynamic_config_root)
            .field("dynamic_config_timeout_ms", &self.dynamic_config_timeout_ms)
            .field("dynamic_config_policy", &self.dynamic_config_policy)
            .finish()
    }
}

impl RelayConfig {
    /// Create a new RelayConfig with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from a file, then override from environment.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let mut config = Self::load_from_file(path)?;
        config.load_from_env();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RelayConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Override configuration from environment variables.
    fn load_from_env(&mut self) {
        if let Ok(log_level) = std::env::var("RELAY_LOG_LEVEL") {
            self.log_level = log_level;
        }
        if let Ok(root) = std::env::var("RELAY_DYNAMIC_CONFIG_ROOT") {
            if !root.trim().is_empty() {
                self.dynamic_config_root = Some(PathBuf::from(root.trim()));
            }
        }
        if let Ok(strict) = std::env::var("RELAY_DYNAMIC_CONFIG_STRICT") {
            self.dynamic_config_policy = match strict.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => DynamicConfigPolicy::Strict,
                _ => DynamicConfigPolicy::Lenient,
            };
        }
    }

    /// Dynamic config lookup timeout as a Duration.
    pub fn dynamic_config_timeout(&self) -> Duration {
        Duration::from_millis(self.dynamic_config_timeout_ms)
    }
}
