//! Wire types for the ykmx plugin protocol.
//!
//! Every message is one JSON object on one line. The host sends events tagged
//! by `event`; the plugin answers with actions tagged by `action`, each carrying
//! the protocol version in `v`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;
use ykmx_core::models::{ChromeStyle, PanelRect, UiBars};

/// Protocol version stamped on every action.
pub const PROTOCOL_VERSION: u32 = 1;

/// Event sent from the host to a plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// The plugin has been started and may register commands.
    OnStart,
    /// A command was invoked.
    OnCommand {
        #[serde(default)]
        command: String,
    },
    /// Host runtime state changed (focus, layout, screen...).
    OnStateChanged {
        #[serde(default, deserialize_with = "null_as_default")]
        state: RuntimeState,
    },
    /// A `key = value` pair from the plugin's section of the host config.
    OnPluginConfig {
        #[serde(default)]
        key: String,
        #[serde(default, deserialize_with = "scalar_as_string")]
        value: String,
    },
    /// The host is going away; this is the last event the plugin handles.
    OnShutdown,
    /// Any event kind this runtime does not know about.
    #[serde(other)]
    Unknown,
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::OnStart => "on_start",
            Event::OnCommand { .. } => "on_command",
            Event::OnStateChanged { .. } => "on_state_changed",
            Event::OnPluginConfig { .. } => "on_plugin_config",
            Event::OnShutdown => "on_shutdown",
            Event::Unknown => "unknown",
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Host config values arrive as strings, but numbers and booleans are taken
/// in their JSON text form. `null` reads as empty.
fn scalar_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::new()),
        scalar @ (Value::Number(_) | Value::Bool(_)) => Ok(scalar.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a scalar config value, got {other}"
        ))),
    }
}

/// The subset of host state a plugin reads. Other fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeState {
    #[serde(default)]
    pub has_focused_panel: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focused_panel_id: Option<PanelId>,
}

impl RuntimeState {
    /// The focused panel, if the host reports one.
    pub fn focused_panel(&self) -> Option<&PanelId> {
        if self.has_focused_panel {
            self.focused_panel_id.as_ref()
        } else {
            None
        }
    }
}

/// Host-issued panel identifier.
///
/// Opaque to plugins: it can only be obtained from a host event and is echoed
/// back verbatim, whatever JSON shape the host chose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanelId(Value);

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

/// Action sent from a plugin to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    RegisterCommand {
        command: String,
    },
    SetUiBars(UiBars),
    SetChromeStyle(ChromeStyle),
    OpenShellPanelRect(PanelRect),
    SetPanelChromeStyleById {
        panel_id: PanelId,
        #[serde(flatten)]
        style: ChromeStyle,
    },
    ClearUiBars,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::RegisterCommand { .. } => ActionKind::RegisterCommand,
            Action::SetUiBars(_) => ActionKind::SetUiBars,
            Action::SetChromeStyle(_) => ActionKind::SetChromeStyle,
            Action::OpenShellPanelRect(_) => ActionKind::OpenShellPanelRect,
            Action::SetPanelChromeStyleById { .. } => ActionKind::SetPanelChromeStyleById,
            Action::ClearUiBars => ActionKind::ClearUiBars,
        }
    }
}

/// A versioned action as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionMessage {
    pub v: u32,
    #[serde(flatten)]
    pub action: Action,
}

impl ActionMessage {
    pub fn new(action: Action) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            action,
        }
    }
}

#[derive(Serialize)]
struct OutgoingAction<'a> {
    v: u32,
    #[serde(flatten)]
    action: &'a Action,
}

#[derive(Serialize)]
struct OutgoingEvent<'a> {
    v: u32,
    #[serde(flatten)]
    event: &'a Event,
}

const CHROME_STYLE_FIELDS: &[&str] = &[
    "active_title_sgr",
    "inactive_title_sgr",
    "active_border_sgr",
    "inactive_border_sgr",
    "active_buttons_sgr",
    "inactive_buttons_sgr",
];

const PANEL_CHROME_STYLE_FIELDS: &[&str] = &[
    "panel_id",
    "active_title_sgr",
    "inactive_title_sgr",
    "active_border_sgr",
    "inactive_border_sgr",
    "active_buttons_sgr",
    "inactive_buttons_sgr",
];

/// Discriminants of [`Action`] together with their fixed field sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    RegisterCommand,
    SetUiBars,
    SetChromeStyle,
    OpenShellPanelRect,
    SetPanelChromeStyleById,
    ClearUiBars,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::RegisterCommand,
        ActionKind::SetUiBars,
        ActionKind::SetChromeStyle,
        ActionKind::OpenShellPanelRect,
        ActionKind::SetPanelChromeStyleById,
        ActionKind::ClearUiBars,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::RegisterCommand => "register_command",
            ActionKind::SetUiBars => "set_ui_bars",
            ActionKind::SetChromeStyle => "set_chrome_style",
            ActionKind::OpenShellPanelRect => "open_shell_panel_rect",
            ActionKind::SetPanelChromeStyleById => "set_panel_chrome_style_by_id",
            ActionKind::ClearUiBars => "clear_ui_bars",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Fields an action of this kind carries besides `v` and `action`.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            ActionKind::RegisterCommand => &["command"],
            ActionKind::SetUiBars => &["toolbar_line", "tab_line", "status_line"],
            ActionKind::SetChromeStyle => CHROME_STYLE_FIELDS,
            ActionKind::OpenShellPanelRect => &[
                "x",
                "y",
                "width",
                "height",
                "modal",
                "show_border",
                "show_controls",
                "transparent_background",
            ],
            ActionKind::SetPanelChromeStyleById => PANEL_CHROME_STYLE_FIELDS,
            ActionKind::ClearUiBars => &[],
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from encoding, decoding, or validating protocol lines.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to read from input stream: {0}")]
    Read(std::io::Error),
    #[error("failed to write to output stream: {0}")]
    Write(std::io::Error),
    #[error("failed to encode message: {0}")]
    Encode(serde_json::Error),
    #[error("line is not valid UTF-8")]
    InvalidUtf8,
    #[error("line is not valid JSON: {0}")]
    Json(serde_json::Error),
    #[error("line is not a JSON object")]
    NotAnObject,
    #[error("event does not match its schema: {0}")]
    EventShape(serde_json::Error),
    #[error("action is missing protocol version `v`")]
    MissingVersion,
    #[error("unsupported protocol version {found}, expected {expected}")]
    UnsupportedVersion { found: Value, expected: u32 },
    #[error("action is missing its `action` discriminant")]
    MissingAction,
    #[error("unknown action `{0}`")]
    UnknownAction(String),
    #[error("{action} is missing field `{field}`")]
    MissingField {
        action: ActionKind,
        field: &'static str,
    },
    #[error("{action} carries unexpected field `{field}`")]
    UnexpectedField { action: ActionKind, field: String },
    #[error("{action} has an invalid field: {source}")]
    InvalidField {
        action: ActionKind,
        source: serde_json::Error,
    },
}

/// Encode an action as a single JSON line without the trailing newline.
pub fn encode_action(action: &Action) -> Result<String, ProtocolError> {
    serde_json::to_string(&OutgoingAction {
        v: PROTOCOL_VERSION,
        action,
    })
    .map_err(ProtocolError::Encode)
}

/// Encode an event the way a host sends it, stamped with `v`.
pub fn encode_event(event: &Event) -> Result<String, ProtocolError> {
    serde_json::to_string(&OutgoingEvent {
        v: PROTOCOL_VERSION,
        event,
    })
    .map_err(ProtocolError::Encode)
}

/// Check one action line against the version-1 schema.
///
/// Accepts only an object carrying `v: 1`, a known `action`, and exactly the
/// fields that action defines.
pub fn validate_action_line(line: &str) -> Result<ActionMessage, ProtocolError> {
    let value: Value = serde_json::from_str(line.trim()).map_err(ProtocolError::Json)?;
    let Value::Object(object) = value else {
        return Err(ProtocolError::NotAnObject);
    };

    let version = object.get("v").ok_or(ProtocolError::MissingVersion)?;
    if version.as_u64() != Some(u64::from(PROTOCOL_VERSION)) {
        return Err(ProtocolError::UnsupportedVersion {
            found: version.clone(),
            expected: PROTOCOL_VERSION,
        });
    }

    let name = object
        .get("action")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingAction)?;
    let kind = ActionKind::from_wire(name)
        .ok_or_else(|| ProtocolError::UnknownAction(name.to_string()))?;
    check_field_set(kind, &object)?;

    serde_json::from_value(Value::Object(object))
        .map_err(|source| ProtocolError::InvalidField { action: kind, source })
}

fn check_field_set(kind: ActionKind, object: &Map<String, Value>) -> Result<(), ProtocolError> {
    let expected = kind.fields();
    if let Some(field) = expected.iter().find(|f| !object.contains_key(**f)) {
        return Err(ProtocolError::MissingField {
            action: kind,
            field: *field,
        });
    }
    if let Some(field) = object
        .keys()
        .find(|k| *k != "v" && *k != "action" && !expected.contains(&k.as_str()))
    {
        return Err(ProtocolError::UnexpectedField {
            action: kind,
            field: field.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel_id(json: &str) -> PanelId {
        serde_json::from_str(json).unwrap()
    }

    fn sample_actions() -> Vec<Action> {
        let style = ChromeStyle::from_active("1;30;47", "30;47", "1;34;47");
        vec![
            Action::RegisterCommand {
                command: "python.demo.open".into(),
            },
            Action::SetUiBars(UiBars {
                toolbar_line: " a ".into(),
                tab_line: " b ".into(),
                status_line: " c ".into(),
            }),
            Action::SetChromeStyle(style.clone()),
            Action::OpenShellPanelRect(PanelRect {
                x: 10,
                y: 3,
                width: 90,
                height: 24,
                modal: false,
                show_border: true,
                show_controls: true,
                transparent_background: false,
            }),
            Action::SetPanelChromeStyleById {
                panel_id: panel_id("\"p7\""),
                style,
            },
            Action::ClearUiBars,
        ]
    }

    #[test]
    fn encoded_actions_pass_validation_with_exact_fields() {
        for action in sample_actions() {
            let line = encode_action(&action).unwrap();
            assert!(!line.contains('\n'));

            let value: Value = serde_json::from_str(&line).unwrap();
            let object = value.as_object().unwrap();
            let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
            keys.sort_unstable();
            let mut expected: Vec<_> = action.kind().fields().to_vec();
            expected.extend(["v", "action"]);
            expected.sort_unstable();
            assert_eq!(keys, expected, "field set of {}", action.kind());

            let parsed = validate_action_line(&line).expect("valid action");
            assert_eq!(parsed, ActionMessage::new(action));
        }
    }

    #[test]
    fn clear_ui_bars_is_just_the_envelope() {
        let line = encode_action(&Action::ClearUiBars).unwrap();
        assert_eq!(line, r#"{"v":1,"action":"clear_ui_bars"}"#);
    }

    #[test]
    fn panel_id_is_echoed_verbatim() {
        let action = Action::SetPanelChromeStyleById {
            panel_id: panel_id("42"),
            style: ChromeStyle::from_active("0", "0", "0"),
        };
        let line = encode_action(&action).unwrap();
        assert!(line.contains(r#""panel_id":42"#));
    }

    #[test]
    fn embedded_newlines_are_escaped() {
        let action = Action::RegisterCommand {
            command: "two\nlines".into(),
        };
        let line = encode_action(&action).unwrap();
        assert!(!line.contains('\n'));
        assert!(line.contains(r"two\nlines"));
    }

    #[test]
    fn validation_rejects_bad_envelopes() {
        assert!(matches!(
            validate_action_line("not json"),
            Err(ProtocolError::Json(_))
        ));
        assert!(matches!(
            validate_action_line("[1,2]"),
            Err(ProtocolError::NotAnObject)
        ));
        assert!(matches!(
            validate_action_line(r#"{"action":"clear_ui_bars"}"#),
            Err(ProtocolError::MissingVersion)
        ));
        assert!(matches!(
            validate_action_line(r#"{"v":2,"action":"clear_ui_bars"}"#),
            Err(ProtocolError::UnsupportedVersion { .. })
        ));
        assert!(matches!(
            validate_action_line(r#"{"v":1}"#),
            Err(ProtocolError::MissingAction)
        ));
        assert!(matches!(
            validate_action_line(r#"{"v":1,"action":"launch_rockets"}"#),
            Err(ProtocolError::UnknownAction(name)) if name == "launch_rockets"
        ));
    }

    #[test]
    fn validation_rejects_partial_and_padded_records() {
        let err = validate_action_line(
            r#"{"v":1,"action":"set_ui_bars","toolbar_line":"a","tab_line":"b"}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::MissingField {
                action: ActionKind::SetUiBars,
                field: "status_line"
            }
        ));

        let err = validate_action_line(
            r#"{"v":1,"action":"register_command","command":"x","enabled":true}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::UnexpectedField { field, .. } if field == "enabled"
        ));
    }

    #[test]
    fn validation_rejects_wrong_field_types() {
        let err = validate_action_line(
            r#"{"v":1,"action":"open_shell_panel_rect","x":"ten","y":3,"width":90,"height":24,"modal":false,"show_border":true,"show_controls":true,"transparent_background":false}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::InvalidField {
                action: ActionKind::OpenShellPanelRect,
                ..
            }
        ));
    }

    #[test]
    fn every_kind_round_trips_its_wire_name() {
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::from_wire(kind.as_str()), Some(kind));
        }
        assert_eq!(ActionKind::from_wire("open_shell_panel"), None);
    }

    #[test]
    fn unknown_event_kind_deserializes_to_unknown() {
        let event: Event = serde_json::from_str(r#"{"event":"on_tick","stats":{}}"#).unwrap();
        assert_eq!(event, Event::Unknown);
    }

    #[test]
    fn state_event_ignores_extra_host_fields() {
        let event: Event = serde_json::from_str(
            r#"{"v":1,"event":"on_state_changed","reason":"focus","state":{"layout":"grid","panel_count":1,"has_focused_panel":true,"focused_panel_id":3}}"#,
        )
        .unwrap();
        let Event::OnStateChanged { state } = event else {
            panic!("expected state event");
        };
        assert_eq!(state.focused_panel(), Some(&panel_id("3")));
    }

    #[test]
    fn focused_panel_requires_the_flag() {
        let state: RuntimeState =
            serde_json::from_str(r#"{"has_focused_panel":false,"focused_panel_id":3}"#).unwrap();
        assert_eq!(state.focused_panel(), None);
    }

    #[test]
    fn null_state_reads_as_no_focus() {
        let event: Event =
            serde_json::from_str(r#"{"event":"on_state_changed","state":null}"#).unwrap();
        assert_eq!(
            event,
            Event::OnStateChanged {
                state: RuntimeState::default()
            }
        );
    }

    #[test]
    fn plugin_config_value_accepts_scalars() {
        for (json, expected) in [
            (r#"{"event":"on_plugin_config","key":"panel_height","value":8}"#, "8"),
            (r#"{"event":"on_plugin_config","key":"modal","value":true}"#, "true"),
            (r#"{"event":"on_plugin_config","key":"cwd","value":null}"#, ""),
            (r#"{"event":"on_plugin_config","key":"cwd","value":"/tmp"}"#, "/tmp"),
        ] {
            let Event::OnPluginConfig { value, .. } = serde_json::from_str::<Event>(json).unwrap()
            else {
                panic!("expected plugin config event for {json}");
            };
            assert_eq!(value, expected);
        }
        assert!(serde_json::from_str::<Event>(
            r#"{"event":"on_plugin_config","key":"k","value":[1]}"#
        )
        .is_err());
    }

    #[test]
    fn command_event_defaults_missing_command() {
        let event: Event = serde_json::from_str(r#"{"event":"on_command"}"#).unwrap();
        assert_eq!(
            event,
            Event::OnCommand {
                command: String::new()
            }
        );
    }

    #[test]
    fn encoded_event_carries_version() {
        let line = encode_event(&Event::OnCommand {
            command: "python.demo.open".into(),
        })
        .unwrap();
        assert_eq!(
            line,
            r#"{"v":1,"event":"on_command","command":"python.demo.open"}"#
        );
    }
}
