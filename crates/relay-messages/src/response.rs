//! Execution results sent back to the bot.

use crate::MessageResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The results of executing a command.
///
/// `is_json` and `aborted` are routing hints for the relay itself and are
/// never put on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionResponse {
    pub room: String,
    pub bundle: String,
    pub status: String,
    pub status_message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub template: String,
    pub body: Value,
    #[serde(skip)]
    pub is_json: bool,
    #[serde(skip)]
    pub aborted: bool,
}

impl ExecutionResponse {
    /// Status of a command that ran to completion.
    pub const STATUS_OK: &'static str = "ok";
    /// Status of a command that failed or was rejected.
    pub const STATUS_ERROR: &'static str = "error";

    /// Create an empty response routed to `room` for `bundle`.
    pub fn new(room: &str, bundle: &str) -> Self {
        Self {
            room: room.to_string(),
            bundle: bundle.to_string(),
            status: Self::STATUS_OK.to_string(),
            ..Default::default()
        }
    }

    /// Create an error response carrying `message`.
    pub fn error(room: &str, bundle: &str, message: impl Into<String>) -> Self {
        Self {
            status: Self::STATUS_ERROR.to_string(),
            status_message: message.into(),
            ..Self::new(room, bundle)
        }
    }

    /// Whether the status tag is `ok`.
    pub fn is_ok(&self) -> bool {
        self.status == Self::STATUS_OK
    }

    /// Set the rendering template.
    pub fn with_template(mut self, template: &str) -> Self {
        self.template = template.to_string();
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: Value, is_json: bool) -> Self {
        self.body = body;
        self.is_json = is_json;
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> MessageResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> MessageResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_roundtrip_drops_routing_hints() {
        let mut original = ExecutionResponse::new("ops", "operable")
            .with_template("text")
            .with_body(json!([{"name": "web-1"}]), true);
        original.status_message = "done".to_string();
        original.aborted = true;

        let parsed = ExecutionResponse::from_json(&original.to_json().unwrap()).unwrap();

        assert_eq!(parsed.room, "ops");
        assert_eq!(parsed.bundle, "operable");
        assert_eq!(parsed.status, "ok");
        assert_eq!(parsed.status_message, "done");
        assert_eq!(parsed.template, "text");
        assert_eq!(parsed.body, json!([{"name": "web-1"}]));
        assert!(!parsed.is_json);
        assert!(!parsed.aborted);
    }

    #[test]
    fn test_routing_hints_not_on_wire() {
        let resp = ExecutionResponse::new("ops", "operable").with_body(json!({"a": 1}), true);
        let json: Value = serde_json::from_str(&resp.to_json().unwrap()).unwrap();

        assert!(json.get("is_json").is_none());
        assert!(json.get("aborted").is_none());
        assert!(json.get("omit").is_none());
    }

    #[test]
    fn test_empty_template_omitted() {
        let resp = ExecutionResponse::new("ops", "operable");
        let json = resp.to_json().unwrap();

        assert!(!json.contains("\"template\""));
        assert!(json.contains("\"body\":null"));
    }

    #[test]
    fn test_error_response() {
        let resp = ExecutionResponse::error("ops", "git", "Command not found");

        assert!(!resp.is_ok());
        assert_eq!(resp.status, ExecutionResponse::STATUS_ERROR);
        assert_eq!(resp.status_message, "Command not found");
        assert_eq!(resp.room, "ops");
        assert_eq!(resp.bundle, "git");
    }

    #[test]
    fn test_deserialize_scalar_body() {
        let json = json!({
            "room": "ops",
            "bundle": "b",
            "status": "ok",
            "status_message": "",
            "body": "hello"
        });
        let resp = ExecutionResponse::from_json(&json.to_string()).unwrap();

        assert!(resp.is_ok());
        assert_eq!(resp.body, json!("hello"));
        assert_eq!(resp.template, "");
    }
}
