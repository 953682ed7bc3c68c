//! Execution engine interface.
//!
//! The engine owns process execution and sandboxing; the relay only hands
//! it a resolved [`ExecRequest`] and reads back the raw outcome.

use crate::exec_request::ExecRequest;
use crate::EngineError;
use async_trait::async_trait;

/// Raw result of running a command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    /// Whether the command exited successfully.
    pub success: bool,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ExecOutcome {
    pub fn succeeded(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    pub fn failed(stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            success: false,
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }
}

/// Runs resolved commands.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    async fn execute(&self, request: ExecRequest) -> Result<ExecOutcome, EngineError>;
}
