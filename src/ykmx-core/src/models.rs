//! Plain data shared between the plugin configuration and the wire protocol.

use serde::{Deserialize, Serialize};

/// Text rows the host draws as global chrome (toolbar, tab line, status line).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiBars {
    pub toolbar_line: String,
    pub tab_line: String,
    pub status_line: String,
}

/// Panel decoration styling as SGR parameter strings (e.g. `"1;30;47"`).
///
/// The values are passed through to the host untouched; nothing on the plugin
/// side interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChromeStyle {
    pub active_title_sgr: String,
    pub inactive_title_sgr: String,
    pub active_border_sgr: String,
    pub inactive_border_sgr: String,
    pub active_buttons_sgr: String,
    pub inactive_buttons_sgr: String,
}

impl ChromeStyle {
    /// Build a style from a title/border/buttons triple, deriving the inactive
    /// variants by dropping a leading bold (`1;`) parameter.
    pub fn from_active(title: &str, border: &str, buttons: &str) -> Self {
        Self {
            active_title_sgr: title.to_string(),
            inactive_title_sgr: strip_bold(title).to_string(),
            active_border_sgr: border.to_string(),
            inactive_border_sgr: strip_bold(border).to_string(),
            active_buttons_sgr: buttons.to_string(),
            inactive_buttons_sgr: strip_bold(buttons).to_string(),
        }
    }
}

fn strip_bold(sgr: &str) -> &str {
    sgr.strip_prefix("1;").unwrap_or(sgr)
}

/// Geometry and decoration flags for a new shell panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub modal: bool,
    pub show_border: bool,
    pub show_controls: bool,
    pub transparent_background: bool,
}
