//! Message error types.

use thiserror::Error;

/// Errors raised while decoding or decomposing relay messages.
#[derive(Error, Debug)]
pub enum MessageError {
    /// `command` is not of the form `<bundle>:<command>`
    #[error("Malformed command '{command}': expected <bundle>:<command>")]
    MalformedCommand { command: String },

    /// `reply_to` has too few segments to carry a pipeline id
    #[error("Malformed reply address '{reply_to}': no pipeline id segment")]
    MalformedReplyAddress { reply_to: String },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MessageError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedCommand { .. } => "malformed_command",
            Self::MalformedReplyAddress { .. } => "malformed_reply_address",
            Self::Json(_) => "invalid_json",
        }
    }
}

/// Result type alias using MessageError.
pub type MessageResult<T> = Result<T, MessageError>;
