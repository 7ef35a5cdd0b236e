//! Plugin runtime for the ykmx terminal host.
//!
//! This crate provides:
//! - The line-delimited JSON protocol spoken between the host and out-of-process plugins
//! - An event reader and action emitter over any `BufRead` / `Write` pair
//! - A single-threaded runtime loop driving a [`Plugin`] implementation
//! - The panel demo plugin
//! - An exec-based host for driving plugin processes end to end
//!
//! # Plugin Protocol
//!
//! Plugins talk to the host over stdin/stdout, one JSON object per line:
//! - The host sends [`Event`] messages tagged by `event` (`on_start`, `on_command`, ...)
//! - The plugin answers with [`Action`] messages tagged by `action`, always carrying `"v": 1`
//!
//! Blank and malformed input lines are skipped; unknown event kinds are ignored.
//!
//! # Example Plugin (pseudocode)
//!
//! ```text
//! for line in stdin:
//!     event = json_parse(line) or continue
//!     if event.event == "on_start":
//!         write_stdout({"v": 1, "action": "register_command", "command": "my.cmd"})
//!     elif event.event == "on_shutdown":
//!         write_stdout({"v": 1, "action": "clear_ui_bars"})
//!         break
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use ykmx_core::PanelDemoConfig;
//! use ykmx_plugin::{run_stdio, PanelDemo};
//!
//! let mut plugin = PanelDemo::new(PanelDemoConfig::default());
//! let _summary = run_stdio(&mut plugin)?;
//! # Ok::<(), ykmx_plugin::RuntimeError>(())
//! ```

mod demo;
mod emitter;
mod host;
pub mod protocol;
mod reader;
mod runtime;

pub use demo::{DemoState, PanelDemo};
pub use emitter::ActionEmitter;
pub use host::{ExecPluginHost, PluginConfig, PluginExit, PluginHostError};
pub use protocol::{
    encode_action, encode_event, validate_action_line, Action, ActionKind, ActionMessage, Event,
    PanelId, ProtocolError, RuntimeState, PROTOCOL_VERSION,
};
pub use reader::{decode_line, DecodedLine, EventReader};
pub use runtime::{run_stdio, ExitReason, Plugin, PluginRuntime, RunSummary, RuntimeError};
