//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/marknote/config.toml)
//! 3. Environment variables (MARKNOTE_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::keys::{Namespace, DEFAULT_ENTITY};

/// Environment variable prefix
const ENV_PREFIX: &str = "MARKNOTE";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Directory for data storage (key files, debug log)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Entity kind whose keys are edited ("article", "todo", ...)
    #[serde(default = "default_entity")]
    pub entity: String,

    /// Log file used when MARKNOTE_LOG is set (defaults to <data_dir>/debug.log)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            entity: default_entity(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (MARKNOTE_DATA_DIR, MARKNOTE_ENTITY)
    /// 2. Config file (~/.config/marknote/config.toml or MARKNOTE_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Read a config file as written, without environment overrides
    ///
    /// Used when the file itself is edited, so values that only come from
    /// the environment are not saved into it. A missing file reads as
    /// defaults.
    pub fn read_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // MARKNOTE_DATA_DIR
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            if !val.is_empty() {
                self.data_dir = PathBuf::from(val);
            }
        }

        // MARKNOTE_ENTITY
        if let Ok(val) = std::env::var(format!("{}_ENTITY", ENV_PREFIX)) {
            self.entity = if val.trim().is_empty() {
                default_entity()
            } else {
                val
            };
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with MARKNOTE_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("marknote")
            .join("config.toml")
    }

    /// Directory holding one file per storage key
    pub fn storage_dir(&self) -> PathBuf {
        self.data_dir.join("storage")
    }

    /// Where debug logs go
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("debug.log"))
    }

    /// Key family for the configured entity
    pub fn namespace(&self) -> Namespace {
        Namespace::new(&self.entity)
    }

    /// Set a field by name, as used by `marknote config set`
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "data_dir" => {
                if value.trim().is_empty() {
                    anyhow::bail!("data_dir must not be empty");
                }
                self.data_dir = PathBuf::from(value);
            }
            "entity" => {
                if value.trim().is_empty() {
                    anyhow::bail!("entity must not be empty");
                }
                self.entity = value.trim().to_string();
            }
            "log_file" => {
                self.log_file = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            other => anyhow::bail!(
                "Unknown config key '{}'. Valid keys: data_dir, entity, log_file",
                other
            ),
        }
        Ok(())
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("marknote")
}

fn default_entity() -> String {
    DEFAULT_ENTITY.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &["MARKNOTE_DATA_DIR", "MARKNOTE_ENTITY", "MARKNOTE_CONFIG"];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.entity, "article");
        assert!(config.log_file.is_none());
        assert!(config.data_dir.ends_with("marknote"));
    }

    #[test]
    fn test_file_paths() {
        let config = Config {
            data_dir: PathBuf::from("/data/marknote"),
            ..Config::default()
        };
        assert_eq!(config.storage_dir(), PathBuf::from("/data/marknote/storage"));
        assert_eq!(config.log_path(), PathBuf::from("/data/marknote/debug.log"));

        let config = Config {
            log_file: Some(PathBuf::from("/tmp/marknote.log")),
            ..config
        };
        assert_eq!(config.log_path(), PathBuf::from("/tmp/marknote.log"));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("MARKNOTE_DATA_DIR", "/tmp/marknote-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/marknote-test"));
    }

    #[test]
    fn test_env_override_entity() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("MARKNOTE_ENTITY", "todo");
        config.apply_env_overrides();
        assert_eq!(config.entity, "todo");
        assert_eq!(config.namespace().index_key(), "todos");

        // Blank falls back to the default
        env::set_var("MARKNOTE_ENTITY", " ");
        config.apply_env_overrides();
        assert_eq!(config.entity, "article");
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            entity = "todo"
            log_file = "/custom/log.txt"
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.entity, "todo");
        assert_eq!(config.log_file, Some(PathBuf::from("/custom/log.txt")));
    }

    #[test]
    fn test_load_from_str_partial() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config::load_from_str("data_dir = \"/only/data\"").unwrap();
        assert_eq!(config.entity, "article");
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        env::set_var("MARKNOTE_DATA_DIR", temp_dir.path().join("data"));

        let path = temp_dir.path().join("nonexistent.toml");
        let config = Config::load_from_path(&path).unwrap();

        assert_eq!(config.entity, "article");
        assert!(temp_dir.path().join("data").exists());
    }

    #[test]
    fn test_save_and_reload() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("conf").join("config.toml");

        let config = Config {
            data_dir: temp_dir.path().join("data"),
            entity: "todo".to_string(),
            log_file: None,
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_with_cli_override(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_set_field() {
        let mut config = Config::default();
        config.set_field("entity", "todo").unwrap();
        config.set_field("log_file", "/tmp/x.log").unwrap();
        assert_eq!(config.entity, "todo");
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/x.log")));

        config.set_field("log_file", "").unwrap();
        assert!(config.log_file.is_none());

        assert!(config.set_field("entity", "  ").is_err());
        assert!(config.set_field("sync_url", "x").is_err());
    }

    #[test]
    fn test_set_field_rejects_empty_data_dir() {
        let mut config = Config::default();
        let before = config.data_dir.clone();
        assert!(config.set_field("data_dir", "").is_err());
        assert!(config.set_field("data_dir", "  ").is_err());
        assert_eq!(config.data_dir, before);

        config.set_field("data_dir", "/srv/marknote").unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/marknote"));
    }

    #[test]
    fn test_read_file_ignores_env() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "data_dir = \"/from/file\"\n").unwrap();
        env::set_var("MARKNOTE_DATA_DIR", "/from/env");
        env::set_var("MARKNOTE_ENTITY", "todo");

        let mut config = Config::read_file(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/from/file"));
        assert_eq!(config.entity, "article");

        // Editing one key leaves the environment out of the file
        config.set_field("log_file", "/tmp/marknote.log").unwrap();
        config.save_to_path(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("/from/file"));
        assert!(!written.contains("/from/env"));
        assert!(!written.contains("todo"));

        let missing = temp_dir.path().join("missing.toml");
        assert_eq!(Config::read_file(&missing).unwrap(), Config::default());
    }

    #[test]
    fn test_save_to_default_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("marknote").join("config.toml");
        env::set_var("MARKNOTE_CONFIG", &path);

        let config = Config {
            data_dir: temp_dir.path().join("data"),
            entity: "note".to_string(),
            log_file: None,
        };
        config.save().unwrap();

        assert_eq!(Config::config_file_path(), path);
        assert_eq!(Config::read_file(&path).unwrap(), config);
    }
}
