//! The panel demo plugin.
//!
//! On start it registers one command and dresses the host chrome. When the
//! command fires it opens a shell panel, then restyles whichever panel the host
//! reports as focused next. On shutdown it clears the ui bars.

use crate::protocol::{Action, Event, RuntimeState};
use crate::runtime::Plugin;
use ykmx_core::PanelDemoConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoState {
    Idle,
    /// An open request went out and the next focused panel gets the panel style.
    AwaitingPanelFocus,
    ShutDown,
}

pub struct PanelDemo {
    settings: PanelDemoConfig,
    state: DemoState,
}

impl PanelDemo {
    pub fn new(settings: PanelDemoConfig) -> Self {
        Self {
            settings,
            state: DemoState::Idle,
        }
    }

    pub fn state(&self) -> DemoState {
        self.state
    }

    pub fn settings(&self) -> &PanelDemoConfig {
        &self.settings
    }

    fn on_start(&self) -> Vec<Action> {
        vec![
            Action::RegisterCommand {
                command: self.settings.open_command.clone(),
            },
            Action::SetUiBars(self.settings.ui_bars.clone()),
            Action::SetChromeStyle(self.settings.chrome_style.clone()),
        ]
    }

    fn on_command(&mut self, command: &str) -> Vec<Action> {
        if command != self.settings.open_command {
            return Vec::new();
        }
        if self.state == DemoState::AwaitingPanelFocus && self.settings.guard_duplicate_open {
            tracing::debug!(command, "panel open already pending, ignoring command");
            return Vec::new();
        }

        tracing::debug!(command, "opening shell panel");
        self.state = DemoState::AwaitingPanelFocus;
        vec![Action::OpenShellPanelRect(self.settings.panel)]
    }

    fn on_state_changed(&mut self, state: &RuntimeState) -> Vec<Action> {
        if self.state != DemoState::AwaitingPanelFocus {
            return Vec::new();
        }
        let Some(panel_id) = state.focused_panel() else {
            return Vec::new();
        };

        tracing::debug!(%panel_id, "styling newly focused panel");
        self.state = DemoState::Idle;
        vec![Action::SetPanelChromeStyleById {
            panel_id: panel_id.clone(),
            style: self.settings.panel_style.clone(),
        }]
    }

    /// Apply one host-provided setting. Returns whether it was taken.
    fn apply_setting(&mut self, key: &str, value: &str) -> bool {
        let settings = &mut self.settings;
        let value = value.trim();
        match key {
            "open_command" => {
                if value.is_empty() {
                    return false;
                }
                settings.open_command = value.to_string();
                true
            }
            "panel_x" => set_parsed(&mut settings.panel.x, value, 0),
            "panel_y" => set_parsed(&mut settings.panel.y, value, 0),
            "panel_width" => set_parsed(&mut settings.panel.width, value, 1),
            "panel_height" => set_parsed(&mut settings.panel.height, value, 1),
            "modal" => set_flag(&mut settings.panel.modal, value),
            "show_border" => set_flag(&mut settings.panel.show_border, value),
            "show_controls" => set_flag(&mut settings.panel.show_controls, value),
            "transparent_background" => set_flag(&mut settings.panel.transparent_background, value),
            "guard_duplicate_open" => set_flag(&mut settings.guard_duplicate_open, value),
            _ => false,
        }
    }
}

fn set_parsed(slot: &mut u32, value: &str, min: u32) -> bool {
    match value.parse::<i64>() {
        Ok(n) => {
            *slot = n.clamp(i64::from(min), i64::from(u32::MAX)) as u32;
            true
        }
        Err(_) => false,
    }
}

fn set_flag(slot: &mut bool, value: &str) -> bool {
    match parse_bool_like(value) {
        Some(flag) => {
            *slot = flag;
            true
        }
        None => false,
    }
}

fn parse_bool_like(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Plugin for PanelDemo {
    fn handle(&mut self, event: &Event) -> Vec<Action> {
        if self.state == DemoState::ShutDown {
            return Vec::new();
        }

        match event {
            Event::OnStart => self.on_start(),
            Event::OnCommand { command } => self.on_command(command),
            Event::OnStateChanged { state } => self.on_state_changed(state),
            Event::OnPluginConfig { key, value } => {
                if !self.apply_setting(key, value) {
                    tracing::warn!(%key, %value, "ignoring plugin setting");
                }
                Vec::new()
            }
            Event::OnShutdown => {
                self.state = DemoState::ShutDown;
                vec![Action::ClearUiBars]
            }
            Event::Unknown => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ActionKind, PanelId};

    fn demo() -> PanelDemo {
        PanelDemo::new(PanelDemoConfig::default())
    }

    fn command(name: &str) -> Event {
        Event::OnCommand {
            command: name.to_string(),
        }
    }

    fn state_changed(json: &str) -> Event {
        Event::OnStateChanged {
            state: serde_json::from_str(json).unwrap(),
        }
    }

    fn config(key: &str, value: &str) -> Event {
        Event::OnPluginConfig {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    fn kinds(actions: &[Action]) -> Vec<ActionKind> {
        actions.iter().map(Action::kind).collect()
    }

    #[test]
    fn start_registers_and_styles_in_order() {
        let mut plugin = demo();
        let actions = plugin.handle(&Event::OnStart);
        assert_eq!(
            kinds(&actions),
            vec![
                ActionKind::RegisterCommand,
                ActionKind::SetUiBars,
                ActionKind::SetChromeStyle
            ]
        );
        assert_eq!(
            actions[0],
            Action::RegisterCommand {
                command: "python.demo.open".into()
            }
        );
        assert_eq!(plugin.state(), DemoState::Idle);
    }

    #[test]
    fn matching_command_opens_panel_and_waits() {
        let mut plugin = demo();
        let actions = plugin.handle(&command("python.demo.open"));
        assert_eq!(
            actions,
            vec![Action::OpenShellPanelRect(PanelDemoConfig::default().panel)]
        );
        assert_eq!(plugin.state(), DemoState::AwaitingPanelFocus);
    }

    #[test]
    fn other_commands_are_ignored() {
        let mut plugin = demo();
        assert!(plugin.handle(&command("palette.open")).is_empty());
        assert_eq!(plugin.state(), DemoState::Idle);
    }

    #[test]
    fn focused_panel_gets_styled_once() {
        let mut plugin = demo();
        plugin.handle(&command("python.demo.open"));

        let actions =
            plugin.handle(&state_changed(r#"{"has_focused_panel":true,"focused_panel_id":"p7"}"#));
        let expected_id: PanelId = serde_json::from_str("\"p7\"").unwrap();
        assert_eq!(
            actions,
            vec![Action::SetPanelChromeStyleById {
                panel_id: expected_id,
                style: PanelDemoConfig::default().panel_style,
            }]
        );
        assert_eq!(plugin.state(), DemoState::Idle);

        let again =
            plugin.handle(&state_changed(r#"{"has_focused_panel":true,"focused_panel_id":"p8"}"#));
        assert!(again.is_empty());
    }

    #[test]
    fn unfocused_state_keeps_waiting() {
        let mut plugin = demo();
        plugin.handle(&command("python.demo.open"));
        assert!(plugin
            .handle(&state_changed(r#"{"has_focused_panel":false}"#))
            .is_empty());
        assert!(plugin.handle(&state_changed("{}")).is_empty());
        assert_eq!(plugin.state(), DemoState::AwaitingPanelFocus);
    }

    #[test]
    fn focus_without_panel_id_keeps_waiting() {
        let mut plugin = demo();
        plugin.handle(&command("python.demo.open"));
        for json in [
            r#"{"has_focused_panel":true}"#,
            r#"{"has_focused_panel":true,"focused_panel_id":null}"#,
        ] {
            assert!(plugin.handle(&state_changed(json)).is_empty(), "{json}");
            assert_eq!(plugin.state(), DemoState::AwaitingPanelFocus);
        }

        let actions =
            plugin.handle(&state_changed(r#"{"has_focused_panel":true,"focused_panel_id":4}"#));
        assert_eq!(kinds(&actions), vec![ActionKind::SetPanelChromeStyleById]);
        assert_eq!(plugin.state(), DemoState::Idle);
    }

    #[test]
    fn state_changes_while_idle_emit_nothing() {
        let mut plugin = demo();
        assert!(plugin
            .handle(&state_changed(r#"{"has_focused_panel":true,"focused_panel_id":1}"#))
            .is_empty());
    }

    #[test]
    fn repeated_open_reemits_by_default() {
        let mut plugin = demo();
        plugin.handle(&command("python.demo.open"));
        let actions = plugin.handle(&command("python.demo.open"));
        assert_eq!(kinds(&actions), vec![ActionKind::OpenShellPanelRect]);
        assert_eq!(plugin.state(), DemoState::AwaitingPanelFocus);
    }

    #[test]
    fn guarded_open_ignores_repeat_until_focus() {
        let mut plugin = PanelDemo::new(PanelDemoConfig {
            guard_duplicate_open: true,
            ..PanelDemoConfig::default()
        });
        assert_eq!(plugin.handle(&command("python.demo.open")).len(), 1);
        assert!(plugin.handle(&command("python.demo.open")).is_empty());

        plugin.handle(&state_changed(r#"{"has_focused_panel":true,"focused_panel_id":2}"#));
        assert_eq!(plugin.handle(&command("python.demo.open")).len(), 1);
    }

    #[test]
    fn shutdown_clears_bars_from_any_state() {
        for pending in [false, true] {
            let mut plugin = demo();
            if pending {
                plugin.handle(&command("python.demo.open"));
            }
            assert_eq!(plugin.handle(&Event::OnShutdown), vec![Action::ClearUiBars]);
            assert_eq!(plugin.state(), DemoState::ShutDown);
            assert!(plugin.handle(&Event::OnStart).is_empty());
        }
    }

    #[test]
    fn unknown_events_change_nothing() {
        let mut plugin = demo();
        plugin.handle(&command("python.demo.open"));
        assert!(plugin.handle(&Event::Unknown).is_empty());
        assert_eq!(plugin.state(), DemoState::AwaitingPanelFocus);
    }

    #[test]
    fn plugin_config_reshapes_the_panel() {
        let mut plugin = demo();
        for (key, value) in [
            ("open_command", " demo.panel "),
            ("panel_x", "0"),
            ("panel_y", "-4"),
            ("panel_width", "0"),
            ("panel_height", "12"),
            ("modal", "yes"),
            ("show_controls", "off"),
        ] {
            assert!(plugin.handle(&config(key, value)).is_empty());
        }

        let panel = plugin.settings().panel;
        assert_eq!(plugin.settings().open_command, "demo.panel");
        assert_eq!((panel.x, panel.y, panel.width, panel.height), (0, 0, 1, 12));
        assert!(panel.modal);
        assert!(!panel.show_controls);
        assert!(plugin.handle(&command("python.demo.open")).is_empty());
        assert_eq!(plugin.handle(&command("demo.panel")).len(), 1);
    }

    #[test]
    fn bad_plugin_config_is_ignored() {
        let mut plugin = demo();
        assert!(!plugin.apply_setting("panel_width", "wide"));
        assert!(!plugin.apply_setting("modal", "maybe"));
        assert!(!plugin.apply_setting("open_command", "  "));
        assert!(!plugin.apply_setting("colour", "red"));
        assert_eq!(plugin.settings(), &PanelDemoConfig::default());
    }
}
