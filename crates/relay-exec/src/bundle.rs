//! Installed command bundles.

use crate::ConfigResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

/// A single command inside a bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Path of the executable that implements the command.
    pub executable: String,
    /// Static environment for this command; overrides the bundle's.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl Command {
    pub fn new(executable: &str) -> Self {
        Self {
            executable: executable.to_string(),
            env: BTreeMap::new(),
        }
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }
}

/// A versioned collection of commands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub name: String,
    #[serde(default)]
    pub version: String,
    /// Static environment shared by every command in the bundle.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub commands: HashMap<String, Command>,
}

impl Bundle {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            ..Default::default()
        }
    }

    pub fn with_command(mut self, name: &str, command: Command) -> Self {
        self.commands.insert(name.to_string(), command);
        self
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Look up a command by its unqualified name.
    pub fn lookup_command(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }
}

/// Read-only snapshot of installed bundles, keyed by bundle name.
#[derive(Debug, Clone, Default)]
pub struct BundleCatalog {
    bundles: HashMap<String, Arc<Bundle>>,
}

impl BundleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from bundle definitions. Later duplicates win.
    pub fn from_bundles(bundles: impl IntoIterator<Item = Bundle>) -> Self {
        let bundles = bundles
            .into_iter()
            .map(|bundle| (bundle.name.clone(), Arc::new(bundle)))
            .collect();
        Self { bundles }
    }

    /// Load a JSON array of bundle definitions.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let bundles: Vec<Bundle> = serde_json::from_str(&content)?;
        Ok(Self::from_bundles(bundles))
    }

    pub fn insert(&mut self, bundle: Bundle) {
        self.bundles.insert(bundle.name.clone(), Arc::new(bundle));
    }

    pub fn lookup_bundle(&self, name: &str) -> Option<Arc<Bundle>> {
        self.bundles.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lookup_command() {
        let bundle =
            Bundle::new("git", "1.0.0").with_command("commit", Command::new("/bin/commit"));

        assert_eq!(
            bundle.lookup_command("commit").map(|c| c.executable.as_str()),
            Some("/bin/commit")
        );
        assert!(bundle.lookup_command("push").is_none());
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = BundleCatalog::from_bundles(vec![
            Bundle::new("git", "1.0.0"),
            Bundle::new("operable", "0.5.0"),
        ]);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.lookup_bundle("operable").unwrap().version, "0.5.0");
        assert!(catalog.lookup_bundle("nosuchbundle").is_none());
    }

    #[test]
    fn test_catalog_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bundles.json");
        std::fs::write(
            &path,
            r#"[{
                "name": "git",
                "version": "1.2.0",
                "env": {"GIT_PAGER": "cat"},
                "commands": {
                    "commit": {"executable": "/bundles/git/commit", "env": {"GIT_AUTHOR": "relay"}}
                }
            }]"#,
        )
        .unwrap();

        let catalog = BundleCatalog::load_from_file(&path).unwrap();
        let bundle = catalog.lookup_bundle("git").unwrap();
        let command = bundle.lookup_command("commit").unwrap();

        assert_eq!(bundle.env["GIT_PAGER"], "cat");
        assert_eq!(command.executable, "/bundles/git/commit");
        assert_eq!(command.env["GIT_AUTHOR"], "relay");
    }

    #[test]
    fn test_catalog_insert_replaces() {
        let mut catalog = BundleCatalog::new();
        assert!(catalog.is_empty());

        catalog.insert(Bundle::new("git", "1.0.0"));
        catalog.insert(Bundle::new("git", "2.0.0"));

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.lookup_bundle("git").unwrap().version, "2.0.0");
    }
}
