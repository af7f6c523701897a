use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::auth::Token;

/// The two values the dashboard cannot run without.
///
/// Both must be non-empty before the system counts as configured; there is
/// no partial configuration state. A configuration is only created through
/// an explicit save in the setup form and persists across sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// GitLab personal access token
    pub token: Token,

    /// GitLab project path (e.g., 'group/project')
    pub project_path: String,
}

/// Colour mode for the dashboard.
///
/// `System` renders with the terminal's own palette; `Light` and `Dark`
/// force explicit palettes. Persisted alongside the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemeMode {
    /// Cycle order used by the header toggle.
    pub fn next(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::System,
            ThemeMode::System => ThemeMode::Light,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
            ThemeMode::System => "system",
        }
    }
}

/// On-disk settings for mrlens.
///
/// The token and project path are stored as two independent entries; either
/// may be missing and the file may predate the other being written. Reading
/// them back as a usable [`Configuration`] goes through
/// [`ConfigStore::configuration`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    /// GitLab personal access token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<Token>,

    /// GitLab project path (e.g., 'group/project')
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_path: Option<String>,

    /// GitLab instance base URL
    pub base_url: String,

    /// Colour mode preference
    pub theme: ThemeMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            token: None,
            project_path: None,
            base_url: default_base_url(),
            theme: ThemeMode::default(),
        }
    }
}

fn default_base_url() -> String {
    "https://gitlab.com".to_string()
}

/// Persistent store for [`Settings`], bound to one file on disk.
///
/// The file lives at the path given on the command line, or at
/// `<config_dir>/mrlens/config.toml`. TOML, JSON and YAML are accepted on
/// load; saves use the format implied by the file extension.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    pub settings: Settings,
}

impl ConfigStore {
    /// Open the store, loading existing settings if the file exists.
    ///
    /// A missing file is not an error; it simply yields default settings,
    /// which report no configuration until the user saves one.
    pub fn open(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_owned(),
            None => Self::default_path()?,
        };

        let settings = if path.exists() {
            Self::load_from_path(&path)?
        } else {
            Settings::default()
        };

        Ok(Self { path, settings })
    }

    /// Default config file location under the platform config directory.
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("No configuration directory found for this platform")?
            .join("mrlens");
        Ok(dir.join("config.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings from a specific file path.
    fn load_from_path(path: &Path) -> Result<Settings> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => {
                // Try TOML first, then JSON, then YAML
                toml::from_str(&contents)
                    .or_else(|_| serde_json::from_str(&contents))
                    .or_else(|_| serde_yaml::from_str(&contents))
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))
            }
        }
    }

    /// The stored configuration, if complete.
    ///
    /// Returns `None` unless both the token and the project path are present
    /// and non-empty.
    pub fn configuration(&self) -> Option<Configuration> {
        let token = self.settings.token.clone().filter(|t| !t.is_empty())?;
        let project_path = self
            .settings
            .project_path
            .clone()
            .filter(|p| !p.trim().is_empty())?;

        Some(Configuration {
            token,
            project_path,
        })
    }

    /// Write both configuration entries and persist the file.
    ///
    /// Persistence is the only side effect; re-initializing the client with
    /// the new token is the caller's responsibility.
    pub fn save_configuration(&mut self, configuration: Configuration) -> Result<()> {
        self.settings.token = Some(configuration.token);
        self.settings.project_path = Some(configuration.project_path);
        self.save()
    }

    pub fn set_theme(&mut self, theme: ThemeMode) -> Result<()> {
        self.settings.theme = theme;
        self.save()
    }

    /// Save settings to the store's file, creating parent directories as
    /// needed. The serialization format follows the file extension.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config dir: {}", parent.display()))?;
        }

        let contents = match self.path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::to_string_pretty(&self.settings)?,
            Some("yaml") | Some("yml") => serde_yaml::to_string(&self.settings)?,
            _ => toml::to_string_pretty(&self.settings)?,
        };

        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write config file: {}", self.path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.base_url, "https://gitlab.com");
        assert!(settings.token.is_none());
        assert!(settings.project_path.is_none());
        assert_eq!(settings.theme, ThemeMode::System);
    }

    #[test]
    fn test_missing_file_reports_absent_configuration() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let store = ConfigStore::open(Some(&path)).unwrap();
        assert!(store.configuration().is_none());
    }

    #[test]
    fn test_configuration_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut store = ConfigStore::open(Some(&path)).unwrap();
        store
            .save_configuration(Configuration {
                token: Token::from("glpat-test-token"),
                project_path: "group/project".to_string(),
            })
            .unwrap();

        let reloaded = ConfigStore::open(Some(&path)).unwrap();
        let configuration = reloaded.configuration().unwrap();
        assert_eq!(configuration.token.as_str(), "glpat-test-token");
        assert_eq!(configuration.project_path, "group/project");
    }

    #[test]
    fn test_partial_configuration_is_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "token = \"glpat-only-token\"\n").unwrap();

        let store = ConfigStore::open(Some(&path)).unwrap();
        assert!(store.configuration().is_none());

        let path = dir.path().join("other.toml");
        std::fs::write(&path, "project-path = \"group/project\"\n").unwrap();

        let store = ConfigStore::open(Some(&path)).unwrap();
        assert!(store.configuration().is_none());
    }

    #[test]
    fn test_empty_entries_are_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "token = \"\"\nproject-path = \"group/project\"\n").unwrap();

        let store = ConfigStore::open(Some(&path)).unwrap();
        assert!(store.configuration().is_none());
    }

    #[test]
    fn test_load_json_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
  "token": "glpat-json-token",
  "project-path": "group/json",
  "base-url": "https://gitlab.example.com"
}"#,
        )
        .unwrap();

        let store = ConfigStore::open(Some(&path)).unwrap();
        assert_eq!(store.settings.base_url, "https://gitlab.example.com");
        let configuration = store.configuration().unwrap();
        assert_eq!(configuration.project_path, "group/json");
    }

    #[test]
    fn test_load_yaml_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "token: glpat-yaml-token\nproject-path: group/yaml\n").unwrap();

        let store = ConfigStore::open(Some(&path)).unwrap();
        let configuration = store.configuration().unwrap();
        assert_eq!(configuration.token.as_str(), "glpat-yaml-token");
        assert_eq!(configuration.project_path, "group/yaml");
    }

    #[test]
    fn test_theme_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut store = ConfigStore::open(Some(&path)).unwrap();
        store.set_theme(ThemeMode::Dark).unwrap();

        let reloaded = ConfigStore::open(Some(&path)).unwrap();
        assert_eq!(reloaded.settings.theme, ThemeMode::Dark);
    }

    #[test]
    fn test_theme_cycle() {
        assert_eq!(ThemeMode::Light.next(), ThemeMode::Dark);
        assert_eq!(ThemeMode::Dark.next(), ThemeMode::System);
        assert_eq!(ThemeMode::System.next(), ThemeMode::Light);
    }
}
