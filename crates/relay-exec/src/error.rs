//! Error types for request translation and its collaborators.

use relay_messages::MessageError;
use std::path::PathBuf;
use thiserror::Error;

/// Why a request could not be turned into an execution context.
#[derive(Error, Debug)]
pub enum TranslateError {
    /// Malformed `command` or `reply_to`, or undecodable JSON
    #[error(transparent)]
    Message(#[from] MessageError),

    /// Translation was attempted before the request was parsed
    #[error("Request has not been parsed")]
    NotParsed,

    /// No bundle with this name is installed
    #[error("Bundle not found: {bundle}")]
    BundleNotFound { bundle: String },

    /// The bundle has no command with this name
    #[error("Command not found: {bundle}:{command}")]
    CommandNotFound { bundle: String, command: String },

    /// `cog_env` could not be serialized for the command's stdin
    #[error("Failed to encode cog_env: {0}")]
    EnvironmentEncoding(#[source] serde_json::Error),

    /// Dynamic config lookup failed or timed out under the strict policy
    #[error("Dynamic config unavailable for bundle {bundle}: {reason}")]
    DynamicConfigUnavailable { bundle: String, reason: String },
}

impl TranslateError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Message(err) => err.code(),
            Self::NotParsed => "not_parsed",
            Self::BundleNotFound { .. } => "bundle_not_found",
            Self::CommandNotFound { .. } => "command_not_found",
            Self::EnvironmentEncoding(_) => "environment_encoding",
            Self::DynamicConfigUnavailable { .. } => "dynamic_config_unavailable",
        }
    }
}

/// Result type alias using TranslateError.
pub type TranslateResult<T> = Result<T, TranslateError>;

/// Dynamic config source error.
#[derive(Error, Debug)]
pub enum DynamicConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A config layer is not a JSON object
    #[error("Invalid dynamic config layer {}: {reason}", .path.display())]
    InvalidLayer { path: PathBuf, reason: String },
}

/// Relay configuration error.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using ConfigError.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Execution engine error.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine could not accept the request
    #[error("Execution engine unavailable: {0}")]
    Unavailable(String),

    /// The engine accepted the request but could not run it
    #[error("Execution failed: {0}")]
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_errors_keep_their_code() {
        let err: TranslateError = MessageError::MalformedCommand {
            command: "nope".to_string(),
        }
        .into();

        assert_eq!(err.code(), "malformed_command");
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_command_not_found_display() {
        let err = TranslateError::CommandNotFound {
            bundle: "git".to_string(),
            command: "push".to_string(),
        };

        assert_eq!(err.to_string(), "Command not found: git:push");
        assert_eq!(err.code(), "command_not_found");
    }
}
