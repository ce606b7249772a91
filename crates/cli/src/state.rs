//! Install-state file
//!
//! `db/user.json` is a flat user-state store; this module only touches its
//! `installedApps` list and preserves every other key untouched.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UserData {
    #[serde(default, rename = "installedApps")]
    pub installed_apps: Vec<String>,
    /// Keys owned by other parts of the platform, carried through verbatim
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl UserData {
    /// Load the state file; a missing file means an empty state
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Write the state file, deduplicating the installed list
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.installed_apps.sort();
        self.installed_apps.dedup();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let text = serde_json::to_string(self)?;
        fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn install(&mut self, app_id: &str) {
        if !self.installed_apps.iter().any(|id| id == app_id) {
            self.installed_apps.push(app_id.to_string());
        }
    }

    /// Remove an app from the installed list; false if it was not there
    pub fn remove(&mut self, app_id: &str) -> bool {
        let before = self.installed_apps.len();
        self.installed_apps.retain(|id| id != app_id);
        self.installed_apps.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_state() {
        let dir = TempDir::new().unwrap();
        let data = UserData::load(&dir.path().join("user.json")).unwrap();
        assert!(data.installed_apps.is_empty());
    }

    #[test]
    fn test_install_and_remove_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db").join("user.json");

        let mut data = UserData::default();
        data.install("files");
        data.install("files");
        data.save(&path).unwrap();

        let mut reloaded = UserData::load(&path).unwrap();
        assert_eq!(reloaded.installed_apps, vec!["files"]);
        assert!(reloaded.remove("files"));
        assert!(!reloaded.remove("files"));
    }

    #[test]
    fn test_foreign_keys_preserved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("user.json");
        fs::write(&path, r#"{"name":"node-owner","installedApps":["a"]}"#).unwrap();

        let mut data = UserData::load(&path).unwrap();
        data.install("b");
        data.save(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["name"], "node-owner");
        assert_eq!(raw["installedApps"], serde_json::json!(["a", "b"]));
    }
}
