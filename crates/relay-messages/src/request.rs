//! Inbound execution requests.

use crate::{MessageError, MessageResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::fmt;

/// Separator between bundle and command in a qualified command name.
const COMMAND_SEPARATOR: char = ':';
/// Separator between segments of a reply address.
const REPLY_SEPARATOR: char = '/';
/// Maximum number of reply address segments considered.
const REPLY_MAX_SEGMENTS: usize = 5;
/// Position of the pipeline id inside a reply address.
const REPLY_PIPELINE_SEGMENT: usize = 3;

/// A request to execute a command as part of a pipeline.
///
/// Every wire field is optional; missing or `null` fields decode to their
/// empty value and a missing `command` or `reply_to` is rejected later by
/// [`parse`].
///
/// [`parse`]: ExecutionRequest::parse
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub options: HashMap<String, Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub args: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cog_env: Option<Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub invocation_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub invocation_step: String,
    /// Fully qualified command name, `<bundle>:<command>`.
    #[serde(deserialize_with = "null_as_default")]
    pub command: String,
    /// Reply routing address; the pipeline id is its fourth segment.
    #[serde(deserialize_with = "null_as_default")]
    pub reply_to: String,
    #[serde(deserialize_with = "null_as_default")]
    pub requestor: ChatUser,
    #[serde(deserialize_with = "null_as_default")]
    pub user: CogUser,
    #[serde(deserialize_with = "null_as_default")]
    pub room: ChatRoom,
    #[serde(deserialize_with = "null_as_default")]
    pub service_token: String,
    #[serde(deserialize_with = "null_as_default")]
    pub services_root: String,

    #[serde(skip)]
    bundle_name: String,
    #[serde(skip)]
    command_name: String,
    #[serde(skip)]
    pipeline_id: String,
    #[serde(skip)]
    parsed: bool,
}

impl ExecutionRequest {
    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> MessageResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> MessageResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Extract the bundle name, command name and pipeline id.
    ///
    /// Meant to run exactly once per request, before the request is
    /// translated. Running it again with the same inputs yields the same
    /// values. On failure none of the derived fields are touched.
    pub fn parse(&mut self) -> MessageResult<()> {
        let (bundle_name, command_name) = split_command(&self.command)?;
        let pipeline_id = pipeline_segment(&self.reply_to)?;

        self.bundle_name = bundle_name.to_string();
        self.command_name = command_name.to_string();
        self.pipeline_id = pipeline_id.to_string();
        self.parsed = true;
        Ok(())
    }

    /// Whether [`parse`](Self::parse) has succeeded on this request.
    pub fn is_parsed(&self) -> bool {
        self.parsed
    }

    /// Bundle part of the qualified command name. Empty until parsed.
    pub fn bundle_name(&self) -> &str {
        &self.bundle_name
    }

    /// Command part of the qualified command name. Empty until parsed.
    pub fn command_name(&self) -> &str {
        &self.command_name
    }

    /// Pipeline id taken from the reply address. Empty until parsed.
    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }
}

/// Decode `null` as the type's default, the way missing keys are decoded.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn split_command(command: &str) -> MessageResult<(&str, &str)> {
    match command.split_once(COMMAND_SEPARATOR) {
        Some((bundle, name)) if !bundle.is_empty() && !name.is_empty() => Ok((bundle, name)),
        _ => Err(MessageError::MalformedCommand {
            command: command.to_string(),
        }),
    }
}

fn pipeline_segment(reply_to: &str) -> MessageResult<&str> {
    match reply_to
        .splitn(REPLY_MAX_SEGMENTS, REPLY_SEPARATOR)
        .nth(REPLY_PIPELINE_SEGMENT)
    {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(MessageError::MalformedReplyAddress {
            reply_to: reply_to.to_string(),
        }),
    }
}

/// Chat platform identifier. Slack ids are strings, HipChat ids are integers.
///
/// Ids of any other JSON shape are kept as-is in `Other`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatUserId {
    Text(String),
    Numeric(Number),
    Other(Value),
}

impl fmt::Display for ChatUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(id) => f.write_str(id),
            Self::Numeric(id) => write!(f, "{}", id),
            Self::Other(id) => write!(f, "{}", id),
        }
    }
}

/// The submitter as known to the chat platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatUser {
    pub id: Option<ChatUserId>,
    #[serde(deserialize_with = "null_as_default")]
    pub handle: String,
    #[serde(deserialize_with = "null_as_default")]
    pub provider: String,
}

/// The submitter as known to the user directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CogUser {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(rename = "email_address", deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub username: String,
}

/// Anything that can name the room a request came from.
pub trait Room {
    fn name(&self) -> &str;
}

/// The room a request was initiated from.
///
/// Adapters only agree that a room carries a `name`; any other keys they
/// send are kept in `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRoom {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Room for ChatRoom {
    fn name(&self) -> &str {
        &self.name
    }
}
