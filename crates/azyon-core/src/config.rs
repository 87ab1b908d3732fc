//! Editor configuration.
//!
//! ## Learning: Serde for Serialization
//!
//! `#[serde(default)]` fills missing fields from `Default::default()`, so a
//! config file only needs the keys the user wants to change.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main editor configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Editor behavior settings
    pub editor: EditorConfig,

    /// Terminal input settings
    pub input: InputConfig,

    /// Diagnostic log settings
    pub log: LogConfig,
}

impl Config {
    /// Loads config from the default location.
    ///
    /// A missing file yields defaults; an unreadable or invalid one is an
    /// error the caller may choose to ignore.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads config from a file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Returns the default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("azyon").join("config.toml"))
    }

    /// Renders the config as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Where diagnostics are written.
    pub fn log_file(&self) -> PathBuf {
        self.log
            .file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("azyon.log"))
    }
}

/// Editor behavior configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Directory scanned for `*.lua` plugins at startup
    pub plugin_dir: PathBuf,

    /// File shown on the welcome screen
    pub splash_file: PathBuf,

    /// Color digits when drawing the document
    pub highlight_digits: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            plugin_dir: PathBuf::from("plugins"),
            splash_file: PathBuf::from("WELCOMESPLASH"),
            highlight_digits: true,
        }
    }
}

/// Terminal input configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Milliseconds to wait for the rest of an escape sequence
    pub escape_timeout_ms: u16,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            escape_timeout_ms: 50,
        }
    }
}

/// Log configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log file; defaults to `azyon.log` in the temp directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config directory not found")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
