//! Configuration file support for hsigen.
//!
//! Settings are stored as JSON. Every field has a default, so partial or
//! older files still load.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_IMAGE_HEIGHT, DEFAULT_IMAGE_WIDTH, DEFAULT_NUM_BANDS};
use crate::error::{HsiError, Result};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Generator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Version of the configuration file format
    #[serde(default = "default_version")]
    pub version: u32,
    /// Generation defaults
    #[serde(default)]
    pub preferences: Preferences,
    /// Export defaults
    #[serde(default)]
    pub export: ExportPreferences,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

/// Defaults used when generating a layout and cube.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
    /// Spectral bands per exported cube
    #[serde(default = "default_num_bands")]
    pub num_bands: usize,
    /// Layout width in pixels
    #[serde(default = "default_image_width")]
    pub image_width: u32,
    /// Layout height in pixels
    #[serde(default = "default_image_height")]
    pub image_height: u32,
    /// Seed for random layouts; `None` draws from entropy
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_num_bands() -> usize {
    DEFAULT_NUM_BANDS
}

fn default_image_width() -> u32 {
    DEFAULT_IMAGE_WIDTH
}

fn default_image_height() -> u32 {
    DEFAULT_IMAGE_HEIGHT
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            num_bands: default_num_bands(),
            image_width: default_image_width(),
            image_height: default_image_height(),
            seed: None,
        }
    }
}

/// Export section of the config.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExportPreferences {
    /// Also write a NumPy `.npy` copy of every cube
    #[serde(default)]
    pub write_npy: bool,
    /// Folder that relative output paths are resolved against; empty means
    /// the working directory
    #[serde(default)]
    pub output_folder: String,
}

impl ExportPreferences {
    /// Resolve an output path against [`output_folder`](Self::output_folder).
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if self.output_folder.is_empty() || path.is_absolute() {
            path.to_path_buf()
        } else {
            Path::new(&self.output_folder).join(path)
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            preferences: Preferences::default(),
            export: ExportPreferences::default(),
        }
    }
}

impl GeneratorConfig {
    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(HsiError::invalid_format(format!(
                "Config version {} is newer than supported version {}",
                config.version, CONFIG_VERSION
            )));
        }

        Ok(config)
    }

    /// Get the default config file path.
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("hsigen").join("config.json"))
        } else {
            dirs::home_dir().map(|home| home.join(".config").join("hsigen").join("config.json"))
        }
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| HsiError::file_open(path, e))?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save the configuration, creating parent directories if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?).map_err(|e| HsiError::file_open(path, e))?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load from `path`, or from the default path when `None`.
    ///
    /// A missing file yields the defaults. An unreadable or invalid file is
    /// reported with a warning and also yields the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => path,
            None => return Self::default(),
        };
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_config_roundtrip() {
        let mut config = GeneratorConfig::default();
        config.preferences.num_bands = 32;
        config.preferences.seed = Some(7);
        config.preferences.log_level = LogLevel::Debug;
        config.export.write_npy = true;

        let json = config.to_json().expect("Failed to serialize");
        let loaded = GeneratorConfig::from_json(&json).expect("Failed to deserialize");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{ "preferences": { "num_bands": 12 } }"#;
        let config = GeneratorConfig::from_json(json).expect("Failed to deserialize");

        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.preferences.num_bands, 12);
        assert_eq!(config.preferences.image_width, DEFAULT_IMAGE_WIDTH);
        assert_eq!(config.preferences.image_height, DEFAULT_IMAGE_HEIGHT);
        assert_eq!(config.preferences.log_level, LogLevel::Info);
        assert_eq!(config.preferences.seed, None);
        assert!(!config.export.write_npy);
    }

    #[test]
    fn test_log_level_names() {
        let json = r#"{ "preferences": { "log_level": "warn" } }"#;
        let config = GeneratorConfig::from_json(json).expect("Failed to deserialize");
        assert_eq!(
            config.preferences.log_level.to_level_filter(),
            log::LevelFilter::Warn
        );
    }

    #[test]
    fn test_version_too_new() {
        let json = format!(r#"{{ "version": {} }}"#, CONFIG_VERSION + 1);
        let err = GeneratorConfig::from_json(&json).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("nested").join("config.json");
        let mut config = GeneratorConfig::default();
        config.preferences.image_width = 64;

        config.save(&path).expect("Failed to save");
        assert_eq!(GeneratorConfig::load(&path).expect("Failed to load"), config);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("absent.json");
        assert_eq!(
            GeneratorConfig::load_or_default(Some(&path)),
            GeneratorConfig::default()
        );
    }

    #[test]
    fn test_resolve_output_path() {
        let export = ExportPreferences {
            write_npy: false,
            output_folder: "out".to_string(),
        };
        assert_eq!(
            export.resolve(Path::new("cube.bsq")),
            PathBuf::from("out/cube.bsq")
        );
        assert_eq!(
            export.resolve(Path::new("/tmp/cube.bsq")),
            PathBuf::from("/tmp/cube.bsq")
        );
    }
}
