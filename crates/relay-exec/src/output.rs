//! Mapping command output onto execution responses.
//!
//! Commands talk back to the relay through marker lines on stdout:
//!
//! ```text
//! COG_TEMPLATE: <name>    rendering template for the bot
//! JSON                    remaining output is a JSON document
//! COGCMD_ACTION: abort    abort the rest of the pipeline
//! COGCMD_DEBUG: <msg>     log lines, never returned to chat
//! COGCMD_INFO: <msg>
//! COGCMD_WARN: <msg>
//! COGCMD_ERR: <msg>
//! ```
//!
//! `JSON` only counts as a marker before the first body line.

use crate::engine::ExecOutcome;
use crate::TranslateError;
use relay_messages::{ExecutionRequest, ExecutionResponse, Room};
use serde_json::Value;
use tracing::{debug, error, info, warn};

const TEMPLATE_PREFIX: &str = "COG_TEMPLATE:";
const JSON_MARKER: &str = "JSON";
const ACTION_PREFIX: &str = "COGCMD_ACTION:";
const ABORT_ACTION: &str = "abort";
const DEBUG_PREFIX: &str = "COGCMD_DEBUG:";
const INFO_PREFIX: &str = "COGCMD_INFO:";
const WARN_PREFIX: &str = "COGCMD_WARN:";
const ERR_PREFIX: &str = "COGCMD_ERR:";

#[derive(Debug, Default, PartialEq)]
struct ParsedOutput {
    template: String,
    is_json: bool,
    aborted: bool,
    body: Vec<String>,
}

fn parse_output(stdout: &str, bundle: &str, command: &str) -> ParsedOutput {
    let mut parsed = ParsedOutput::default();

    for line in stdout.lines() {
        if let Some(template) = line.strip_prefix(TEMPLATE_PREFIX) {
            parsed.template = template.trim().to_string();
        } else if line.trim() == JSON_MARKER && parsed.body.is_empty() && !parsed.is_json {
            parsed.is_json = true;
        } else if let Some(action) = line.strip_prefix(ACTION_PREFIX) {
            if action.trim() == ABORT_ACTION {
                parsed.aborted = true;
            }
        } else if let Some(msg) = line.strip_prefix(DEBUG_PREFIX) {
            debug!(bundle, command, "{}", msg.trim());
        } else if let Some(msg) = line.strip_prefix(INFO_PREFIX) {
            info!(bundle, command, "{}", msg.trim());
        } else if let Some(msg) = line.strip_prefix(WARN_PREFIX) {
            warn!(bundle, command, "{}", msg.trim());
        } else if let Some(msg) = line.strip_prefix(ERR_PREFIX) {
            error!(bundle, command, "{}", msg.trim());
        } else {
            parsed.body.push(line.to_string());
        }
    }

    parsed
}

/// Build the response for a command run.
///
/// A failed run yields an `error` response whose message is the command's
/// stderr, falling back to its stdout body.
pub fn response_from_outcome(
    request: &ExecutionRequest,
    outcome: &ExecOutcome,
) -> ExecutionResponse {
    let room = request.room.name();
    let bundle = request.bundle_name();
    let stdout = String::from_utf8_lossy(&outcome.stdout);
    let parsed = parse_output(&stdout, bundle, request.command_name());

    if !outcome.success {
        let stderr = String::from_utf8_lossy(&outcome.stderr);
        let message = if !stderr.trim().is_empty() {
            stderr.trim().to_string()
        } else if !parsed.body.is_empty() {
            parsed.body.join("\n")
        } else {
            format!("{}:{} failed", bundle, request.command_name())
        };
        let mut response = ExecutionResponse::error(room, bundle, message);
        response.aborted = parsed.aborted;
        return response;
    }

    let body = if parsed.is_json {
        match serde_json::from_str::<Value>(&parsed.body.join("\n")) {
            Ok(body) => body,
            Err(e) => {
                warn!(
                    bundle,
                    command = request.command_name(),
                    error = %e,
                    "Command returned invalid JSON"
                );
                return ExecutionResponse::error(
                    room,
                    bundle,
                    format!("Command returned invalid JSON: {}", e),
                );
            }
        }
    } else if parsed.body.is_empty() {
        Value::Null
    } else {
        Value::Array(parsed.body.into_iter().map(Value::String).collect())
    };

    let mut response = ExecutionResponse::new(room, bundle)
        .with_template(&parsed.template)
        .with_body(body, parsed.is_json);
    response.aborted = parsed.aborted;
    response
}

/// Build the response for a request that was rejected before execution.
pub fn rejection_response(request: &ExecutionRequest, err: &TranslateError) -> ExecutionResponse {
    ExecutionResponse::error(request.room.name(), request.bundle_name(), err.to_string())
}
