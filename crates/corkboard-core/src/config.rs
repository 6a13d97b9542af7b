//! Configuration for corkboard
//!
//! Stored in corkboard.toml under the platform config directory

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::store::JsonFileStore;
use crate::workspace::DEFAULT_BOARD_PREFIX;

const CONFIG_DIR: &str = "corkboard";
const CONFIG_FILE: &str = "corkboard.toml";

/// corkboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Author recorded on generated activity entries
    pub actor: String,

    /// Prefix of new board ids (e.g. "board", "acme")
    pub id_prefix: String,

    /// Workspace data file (defaults to the platform data directory)
    pub data_file: Option<PathBuf>,

    /// Create the template board when a workspace is opened
    pub init_templates: bool,

    /// Display settings
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            actor: "system".to_string(),
            id_prefix: DEFAULT_BOARD_PREFIX.to_string(),
            data_file: None,
            init_templates: true,
            display: DisplayConfig::default(),
        }
    }
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Use colors in output
    pub colors: bool,

    /// Date format for display
    pub date_format: String,

    /// Show card counts next to list titles
    pub show_count: bool,

    /// Maximum title length before truncation
    pub max_title_length: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            colors: true,
            date_format: "%Y-%m-%d %H:%M".to_string(),
            show_count: true,
            max_title_length: 60,
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
            .join(CONFIG_FILE)
    }

    /// Load config from a TOML file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        Ok(config)
    }

    /// Save config to a TOML file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(format!("failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Resolved workspace data file
    pub fn data_path(&self) -> PathBuf {
        self.data_file.clone().unwrap_or_else(JsonFileStore::default_path)
    }

    /// Generate a default config file with comments
    pub fn default_with_comments() -> String {
        r#"# corkboard configuration

# Author recorded on generated activity entries (e.g. "created card")
actor = "system"

# Prefix of new board ids: <prefix>-xxxxxxxx
id_prefix = "board"

# Workspace data file (defaults to the platform data directory)
# data_file = "/home/me/boards/workspace.json"

# Create the Creative Request template board when a workspace is opened
init_templates = true

[display]
# Use colors in output
colors = true

# Date format for display (strftime format)
date_format = "%Y-%m-%d %H:%M"

# Show card counts next to list titles
show_count = true

# Maximum title length before truncation
max_title_length = 60
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(&temp.path().join("nope.toml")).unwrap();
        assert_eq!(config.actor, "system");
        assert!(config.init_templates);
    }

    #[test]
    fn test_commented_default_parses_to_default() {
        let parsed: Config = toml::from_str(&Config::default_with_comments()).unwrap();
        let default = Config::default();
        assert_eq!(parsed.actor, default.actor);
        assert_eq!(parsed.id_prefix, default.id_prefix);
        assert_eq!(parsed.init_templates, default.init_templates);
        assert_eq!(parsed.display.max_title_length, default.display.max_title_length);
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("conf").join("corkboard.toml");
        let config = Config {
            actor: "ana".into(),
            data_file: Some(temp.path().join("ws.json")),
            ..Config::default()
        };
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.actor, "ana");
        assert_eq!(loaded.data_path(), temp.path().join("ws.json"));
    }

    #[test]
    fn test_invalid_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("corkboard.toml");
        std::fs::write(&path, "actor = [").unwrap();
        assert!(matches!(Config::load(&path), Err(crate::Error::Config(_))));
    }
}
