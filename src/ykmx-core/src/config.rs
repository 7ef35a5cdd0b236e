use crate::models::{ChromeStyle, PanelRect, UiBars};
use crate::paths::AppDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CURRENT_CONFIG_VERSION: u32 = 1;

pub const DEFAULT_OPEN_COMMAND: &str = "python.demo.open";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_config_version")]
    pub config_version: u32,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub panel_demo: PanelDemoConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            logging: LoggingConfig::default(),
            panel_demo: PanelDemoConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
    #[serde(default = "default_max_log_files")]
    pub max_log_files: usize,
    /// Mirror log output to stderr. Stdout is never used: it carries the protocol.
    #[serde(default)]
    pub stderr: bool,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_log_files: default_max_log_files(),
            stderr: false,
            file_name: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level `{other}`")),
        }
    }
}

/// Settings for the panel demo plugin: what it registers, how it dresses the
/// host chrome, and where the shell panel opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelDemoConfig {
    #[serde(default = "default_open_command")]
    pub open_command: String,
    /// Ignore the open command while a previously opened panel has not been
    /// focused yet. Off by default, so every command opens another panel.
    #[serde(default)]
    pub guard_duplicate_open: bool,
    #[serde(default = "default_ui_bars")]
    pub ui_bars: UiBars,
    #[serde(default = "default_chrome_style")]
    pub chrome_style: ChromeStyle,
    #[serde(default = "default_panel")]
    pub panel: PanelRect,
    #[serde(default = "default_panel_style")]
    pub panel_style: ChromeStyle,
}

impl Default for PanelDemoConfig {
    fn default() -> Self {
        Self {
            open_command: default_open_command(),
            guard_duplicate_open: false,
            ui_bars: default_ui_bars(),
            chrome_style: default_chrome_style(),
            panel: default_panel(),
            panel_style: default_panel_style(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("config validation failed: {0}")]
    Validation(ValidationError),
    #[error("failed to prepare configuration directories: {0}")]
    Directories(#[from] crate::paths::DirsError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unsupported config_version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("panel_demo.open_command must not be empty")]
    EmptyOpenCommand,
    #[error("panel_demo.panel must have a non-zero size, got {width}x{height}")]
    EmptyPanel { width: u32, height: u32 },
}

impl Config {
    pub fn load_or_default(dirs: &AppDirs) -> Result<Self, ConfigError> {
        dirs.ensure_exists()?;
        let path = Self::config_path(dirs);
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load an explicit config file. Unlike [`Config::load_or_default`], a
    /// missing file is an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate().map_err(ConfigError::Validation)?;
        Ok(config)
    }

    pub fn config_path(dirs: &AppDirs) -> PathBuf {
        dirs.config_dir().join("config.toml")
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.config_version != CURRENT_CONFIG_VERSION {
            return Err(ValidationError::UnsupportedVersion {
                found: self.config_version,
                expected: CURRENT_CONFIG_VERSION,
            });
        }
        if self.panel_demo.open_command.trim().is_empty() {
            return Err(ValidationError::EmptyOpenCommand);
        }
        let panel = &self.panel_demo.panel;
        if panel.width == 0 || panel.height == 0 {
            return Err(ValidationError::EmptyPanel {
                width: panel.width,
                height: panel.height,
            });
        }
        Ok(())
    }
}

fn default_config_version() -> u32 {
    CURRENT_CONFIG_VERSION
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

fn default_max_log_files() -> usize {
    7
}

fn default_open_command() -> String {
    DEFAULT_OPEN_COMMAND.to_string()
}

fn default_ui_bars() -> UiBars {
    UiBars {
        toolbar_line: format!(" python-demo | command: {DEFAULT_OPEN_COMMAND} "),
        tab_line: " python plugin runtime active ".to_string(),
        status_line: format!(" press bound key for {DEFAULT_OPEN_COMMAND} "),
    }
}

fn default_chrome_style() -> ChromeStyle {
    ChromeStyle::from_active("1;30;47", "30;47", "1;34;47")
}

fn default_panel() -> PanelRect {
    PanelRect {
        x: 10,
        y: 3,
        width: 90,
        height: 24,
        modal: false,
        show_border: true,
        show_controls: true,
        transparent_background: false,
    }
}

fn default_panel_style() -> ChromeStyle {
    ChromeStyle::from_active("1;37;45", "37;45", "1;33;45")
}
