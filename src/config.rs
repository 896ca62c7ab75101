// Configuration for where the process-wide stores live

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Application directory name under the platform data/config directories
pub const APP_NAME: &str = "hkutils";

const CONFIG_FILE: &str = "config.yml";

/// Store locations, loaded from YAML
///
/// Missing fields fall back to their defaults, so an empty file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base directory for everything this crate writes
    pub base_dir: PathBuf,
    /// Preference database filename, relative to `base_dir`
    pub preferences_file: String,
    /// Directory for file artifacts, relative to `base_dir`
    pub files_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        let base_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join(APP_NAME);
        Self::with_base_dir(base_dir)
    }
}

impl Config {
    /// Default layout rooted at `base_dir`
    pub fn with_base_dir<P: Into<PathBuf>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.into(),
            preferences_file: "preferences.db".to_string(),
            files_dir: "files".to_string(),
        }
    }

    /// Load a config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        debug!(path = ?path, ?config, "Loaded config");
        Ok(config)
    }

    /// Load the user's config file if there is one, otherwise the defaults
    ///
    /// A file that fails to parse is reported and ignored.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match Self::load(&path) {
            Ok(config) => {
                info!(path = ?path, "Using config file");
                config
            }
            Err(e) => {
                warn!(path = ?path, error = ?e, "Ignoring unreadable config file");
                Self::default()
            }
        }
    }

    /// `<config dir>/hkutils/config.yml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.base_dir.join(&self.preferences_file)
    }

    pub fn files_path(&self) -> PathBuf {
        self.base_dir.join(&self.files_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_with_base_dir_layout() {
        let config = Config::with_base_dir("/tmp/app");
        assert_eq!(config.preferences_path(), PathBuf::from("/tmp/app/preferences.db"));
        assert_eq!(config.files_path(), PathBuf::from("/tmp/app/files"));
    }

    #[test]
    fn test_default_ends_with_app_name() {
        let config = Config::default();
        assert!(config.base_dir.ends_with(APP_NAME));
    }

    #[test]
    fn test_load_partial_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        fs::write(&path, "base_dir: /var/lib/app\nfiles_dir: archive\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.base_dir, PathBuf::from("/var/lib/app"));
        assert_eq!(config.files_dir, "archive");
        assert_eq!(config.preferences_file, "preferences.db");
    }

    #[test]
    fn test_load_yaml_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        let config = Config::with_base_dir(temp.path());
        fs::write(&path, serde_yaml::to_string(&config).unwrap()).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_errors() {
        let temp = TempDir::new().unwrap();
        assert!(Config::load(temp.path().join("missing.yml")).is_err());

        let path = temp.path().join("bad.yml");
        fs::write(&path, "base_dir: [unterminated").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
