pub mod config;
pub mod logging;
pub mod models;
pub mod paths;

pub use config::{Config, ConfigError, LogLevel, LoggingConfig, PanelDemoConfig, ValidationError};
pub use logging::{init_logging, LoggingError, LoggingGuard};
pub use models::{ChromeStyle, PanelRect, UiBars};
pub use paths::{AppDirs, DirsError};

pub const APP_NAME: &str = "ykmx-panel-demo";
pub const APP_AUTHOR: &str = "ykmx";
pub const APP_QUALIFIER: &str = "io";
