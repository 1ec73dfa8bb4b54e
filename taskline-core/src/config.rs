//! Configuration management
//!
//! settings.json lives in the taskline directory:
//! ```json
//! {
//!   "app": { "demoMode": false },
//!   "firebase": { "apiKey": "...", "projectId": "...", "collection": "todos" }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
    #[serde(default)]
    firebase: FirebaseSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default)]
    demo_mode: bool,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Firebase project settings (the web app config values)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Live-query poll cadence for the REST watcher, in seconds.
    #[serde(default = "default_poll_seconds")]
    pub poll_seconds: u64,
}

fn default_collection() -> String {
    "todos".to_string()
}

fn default_poll_seconds() -> u64 {
    2
}

impl Default for FirebaseSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            project_id: String::new(),
            collection: default_collection(),
            poll_seconds: default_poll_seconds(),
        }
    }
}

/// Taskline configuration (simplified view of settings)
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub demo_mode: bool,
    pub firebase: FirebaseSettings,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Config {
    /// Load config from the taskline directory
    ///
    /// Demo mode can be enabled via:
    /// 1. Settings file
    /// 2. Environment variable TASKLINE_DEMO_MODE (for CI/testing)
    pub fn load(taskline_dir: &Path) -> Result<Self> {
        let settings_path = taskline_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        let demo_mode = match std::env::var("TASKLINE_DEMO_MODE").ok().as_deref() {
            Some("true" | "1" | "yes" | "TRUE" | "YES") => true,
            Some("false" | "0" | "no" | "FALSE" | "NO") => false,
            _ => raw.app.demo_mode,
        };

        Ok(Self {
            demo_mode,
            firebase: raw.firebase.clone(),
            _raw_settings: raw,
        })
    }

    /// Save config to the taskline directory
    /// Preserves other settings that this client doesn't manage
    pub fn save(&self, taskline_dir: &Path) -> Result<()> {
        let settings_path = taskline_dir.join("settings.json");

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        settings.app.demo_mode = self.demo_mode;
        settings.firebase = self.firebase.clone();

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_settings_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(!config.demo_mode);
        assert_eq!(config.firebase.collection, "todos");
        assert_eq!(config.firebase.poll_seconds, 2);
    }

    #[test]
    fn test_load_and_save_roundtrip() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{
                "app": { "demoMode": true, "theme": "dark" },
                "firebase": { "apiKey": "key-1", "projectId": "proj-1" }
            }"#,
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert!(config.demo_mode);
        assert_eq!(config.firebase.api_key, "key-1");
        assert_eq!(config.firebase.project_id, "proj-1");

        config.save(dir.path()).unwrap();
        let written = std::fs::read_to_string(dir.path().join("settings.json")).unwrap();
        // Unmanaged fields survive a save.
        assert!(written.contains("theme"));
    }

    #[test]
    fn test_malformed_settings_fall_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("settings.json"), "{not json").unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(!config.demo_mode);
    }
}
