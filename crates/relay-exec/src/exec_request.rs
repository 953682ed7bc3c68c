//! Fully resolved command invocation handed to the execution engine.

use crate::environment::Env;
use serde::{Deserialize, Serialize};

/// Executable, merged environment and stdin payload for one command run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecRequest {
    pub executable: String,
    #[serde(default)]
    pub env: Env,
    /// Bytes written to the command's stdin, base64 on the wire.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "stdin_base64"
    )]
    pub stdin: Option<Vec<u8>>,
}

impl ExecRequest {
    pub fn new(executable: &str, env: Env) -> Self {
        Self {
            executable: executable.to_string(),
            env,
            stdin: None,
        }
    }

    /// Value of an environment variable, if set.
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }
}

mod stdin_base64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(stdin: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match stdin {
            Some(bytes) => s.serialize_some(&STANDARD.encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(d)?;
        encoded
            .map(|s| STANDARD.decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
