//! Dynamic, per-invocation bundle configuration.
//!
//! Dynamic config lives outside the bundle definition and may differ per
//! room and per chat user. The file-backed source lays it out as:
//!
//! ```text
//! <root>/<bundle>/config.json           base layer
//! <root>/<bundle>/room_<room>.json      overrides for one room
//! <root>/<bundle>/user_<handle>.json    overrides for one user
//! ```
//!
//! Later layers win. Each file must hold a single JSON object.

use crate::environment::{render_value, Env};
use crate::DynamicConfigError;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source of dynamic configuration for a bundle.
#[async_trait]
pub trait DynamicConfigSource: Send + Sync {
    /// Fetch the merged dynamic config for a bundle invoked from `room` by
    /// `handle`.
    ///
    /// Returns `Ok(None)` when no dynamic config exists for the bundle.
    async fn lookup(
        &self,
        bundle: &str,
        room: &str,
        handle: &str,
    ) -> Result<Option<Env>, DynamicConfigError>;
}

/// Dynamic config read from JSON files under a root directory.
#[derive(Debug, Clone)]
pub struct FileDynamicConfig {
    root: PathBuf,
}

impl FileDynamicConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Candidate layer files, lowest precedence first.
    fn layer_paths(&self, bundle: &str, room: &str, handle: &str) -> Vec<PathBuf> {
        if !is_path_component(bundle) {
            return Vec::new();
        }
        let dir = self.root.join(bundle);
        let mut paths = vec![dir.join("config.json")];
        if is_path_component(room) {
            paths.push(dir.join(format!("room_{}.json", room)));
        }
        if is_path_component(handle) {
            paths.push(dir.join(format!("user_{}.json", handle)));
        }
        paths
    }
}

#[async_trait]
impl DynamicConfigSource for FileDynamicConfig {
    async fn lookup(
        &self,
        bundle: &str,
        room: &str,
        handle: &str,
    ) -> Result<Option<Env>, DynamicConfigError> {
        let mut merged: Option<Env> = None;
        for path in self.layer_paths(bundle, room, handle) {
            if let Some(layer) = read_layer(&path).await? {
                debug!(path = %path.display(), keys = layer.len(), "Loaded dynamic config layer");
                merged.get_or_insert_with(Env::new).extend(layer);
            }
        }
        Ok(merged)
    }
}

/// Names coming from chat must not escape the bundle's directory.
fn is_path_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

async fn read_layer(path: &Path) -> Result<Option<Env>, DynamicConfigError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    match serde_json::from_str::<Value>(&content)? {
        Value::Object(map) => Ok(Some(
            map.iter()
                .map(|(key, value)| (key.clone(), render_value(value)))
                .collect(),
        )),
        other => Err(DynamicConfigError::InvalidLayer {
            path: path.to_path_buf(),
            reason: format!("expected a JSON object, got {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(root: &Path, bundle: &str, file: &str, content: &str) {
        let dir = root.join(bundle);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(file), content).unwrap();
    }

    #[tokio::test]
    async fn test_missing_bundle_dir_is_none() {
        let dir = tempdir().unwrap();
        let source = FileDynamicConfig::new(dir.path());

        let result = source.lookup("git", "ops", "pat").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_base_layer_only() {
        let dir = tempdir().unwrap();
        write(dir.path(), "git", "config.json", r#"{"TOKEN": "base", "RETRIES": 3}"#);
        let source = FileDynamicConfig::new(dir.path());

        let env = source.lookup("git", "ops", "pat").await.unwrap().unwrap();
        assert_eq!(env["TOKEN"], "base");
        assert_eq!(env["RETRIES"], "3");
    }

    #[tokio::test]
    async fn test_room_then_user_layers_override() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "git",
            "config.json",
            r#"{"TOKEN": "base", "REGION": "us", "MODE": "base"}"#,
        );
        write(dir.path(), "git", "room_ops.json", r#"{"TOKEN": "room", "MODE": "room"}"#);
        write(dir.path(), "git", "user_pat.json", r#"{"MODE": "user"}"#);
        let source = FileDynamicConfig::new(dir.path());

        let env = source.lookup("git", "ops", "pat").await.unwrap().unwrap();
        assert_eq!(env["REGION"], "us");
        assert_eq!(env["TOKEN"], "room");
        assert_eq!(env["MODE"], "user");
    }

    #[tokio::test]
    async fn test_user_layer_without_base() {
        let dir = tempdir().unwrap();
        write(dir.path(), "git", "user_pat.json", r#"{"MODE": "user"}"#);
        let source = FileDynamicConfig::new(dir.path());

        let env = source.lookup("git", "dev", "pat").await.unwrap().unwrap();
        assert_eq!(env.len(), 1);
        assert_eq!(env["MODE"], "user");
    }

    #[tokio::test]
    async fn test_non_object_layer_is_rejected() {
        let dir = tempdir().unwrap();
        write(dir.path(), "git", "config.json", r#"["not", "a", "map"]"#);
        let source = FileDynamicConfig::new(dir.path());

        let err = source.lookup("git", "ops", "pat").await.unwrap_err();
        assert!(matches!(err, DynamicConfigError::InvalidLayer { .. }));
        assert!(err.to_string().contains("an array"));
    }

    #[tokio::test]
    async fn test_invalid_json_layer_is_an_error() {
        let dir = tempdir().unwrap();
        write(dir.path(), "git", "config.json", "{oops");
        let source = FileDynamicConfig::new(dir.path());

        let err = source.lookup("git", "ops", "pat").await.unwrap_err();
        assert!(matches!(err, DynamicConfigError::Json(_)));
    }

    #[tokio::test]
    async fn test_traversal_names_are_ignored() {
        let dir = tempdir().unwrap();
        write(dir.path(), "git", "config.json", r#"{"TOKEN": "base"}"#);
        std::fs::write(dir.path().join("user_x.json"), r#"{"TOKEN": "escaped"}"#).unwrap();
        let source = FileDynamicConfig::new(dir.path());

        let env = source.lookup("git", "../..", "../user_x").await.unwrap().unwrap();
        assert_eq!(env["TOKEN"], "base");

        assert!(source.lookup("..", "ops", "pat").await.unwrap().is_none());
    }

    #[test]
    fn test_is_path_component() {
        assert!(is_path_component("ops"));
        assert!(is_path_component("pat.doe"));
        assert!(!is_path_component(""));
        assert!(!is_path_component(".."));
        assert!(!is_path_component("a/b"));
        assert!(!is_path_component("a\\b"));
    }
}
