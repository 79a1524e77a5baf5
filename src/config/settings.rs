//! Engine installation layout and file-type settings
//!
//! Settings come from platform defaults, then an optional `config.toml`, then
//! environment overrides.
//!
//! ```toml
//! [engine]
//! install_root = "/opt/EnergyPlus-{version}"
//! executable = "energyplus"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{EpqcError, Result};

/// Placeholder replaced by the hyphenated version in `install_root`
pub const VERSION_PLACEHOLDER: &str = "{version}";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineLayout,
    pub model: ModelSettings,
    pub weather: WeatherSettings,
}

/// Where versioned engine installs live and what their files are called
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineLayout {
    /// Installation directory template containing `{version}`
    pub install_root: String,
    /// Executable file name inside an installation directory
    pub executable: String,
    /// Required executable extension, with dot; empty means none
    pub executable_ext: String,
    /// Extension of the companion dictionary file
    pub dictionary_ext: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub extension: String,
    /// Inserted before the extension of a rewritten model file
    pub mutation_suffix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSettings {
    pub extension: String,
}

impl Default for EngineLayout {
    fn default() -> Self {
        if cfg!(windows) {
            Self {
                install_root: r"C:\EnergyPlusV{version}".to_string(),
                executable: "energyplus.exe".to_string(),
                executable_ext: ".exe".to_string(),
                dictionary_ext: ".idd".to_string(),
            }
        } else if cfg!(target_os = "macos") {
            Self {
                install_root: "/Applications/EnergyPlus-{version}".to_string(),
                executable: "energyplus".to_string(),
                executable_ext: String::new(),
                dictionary_ext: ".idd".to_string(),
            }
        } else {
            Self {
                install_root: "/usr/local/EnergyPlus-{version}".to_string(),
                executable: "energyplus".to_string(),
                executable_ext: String::new(),
                dictionary_ext: ".idd".to_string(),
            }
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            extension: ".idf".to_string(),
            mutation_suffix: "_qc".to_string(),
        }
    }
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            extension: ".epw".to_string(),
        }
    }
}

impl EngineLayout {
    /// Canonical executable path for a version shorthand such as `9.5.0`
    pub fn executable_for_version(&self, version: &str) -> PathBuf {
        let root = self
            .install_root
            .replace(VERSION_PLACEHOLDER, &version.replace('.', "-"));
        PathBuf::from(root).join(&self.executable)
    }
}

impl Settings {
    /// Load settings from `path`, or from the default location when `None`.
    ///
    /// An explicit path must exist. A missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_settings_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        settings.merge_env_vars();
        debug!("Effective settings: {:?}", settings);
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| EpqcError::SettingsInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| EpqcError::SettingsInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn merge_env_vars(&mut self) {
        if let Ok(root) = std::env::var("EPQC_INSTALL_ROOT") {
            self.engine.install_root = root;
        }

        if let Ok(executable) = std::env::var("EPQC_EXECUTABLE") {
            self.engine.executable = executable;
        }
    }
}

/// `<config dir>/config.toml` for this tool
pub fn default_settings_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "epqc", "epqc")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}
